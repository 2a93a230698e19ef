use std::env;

use crate::shared::validation::SQL_IDENTIFIER_REGEX;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub swagger: SwaggerConfig,
    pub events: EventsConfig,
    pub tables: TableNames,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// Run the bundled migrations on startup. Turn off when the schema is
    /// managed by the host application (e.g. with custom table names).
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct EventsConfig {
    /// Broadcast buffer size of the lifecycle event bus
    pub bus_capacity: usize,
}

/// Physical table names behind the fixed logical roles of the schema.
///
/// Every name is interpolated into SQL, so each one must match
/// [`SQL_IDENTIFIER_REGEX`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub countries: String,
    pub provinces: String,
    pub cities: String,
    pub districts: String,
    pub geo_areas: String,
    pub geo_area_relations: String,
    pub addresses: String,
    pub address_relations: String,
    pub locations: String,
    pub location_relations: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            events: EventsConfig::from_env()?,
            tables: TableNames::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 2 * 1024 * 1024; // 2MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        let run_migrations = env::var("DB_RUN_MIGRATIONS")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .map_err(|_| "DB_RUN_MIGRATIONS must be true or false".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            run_migrations,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Location Management API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Countries, provinces, cities, districts, geo-areas and addresses".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl EventsConfig {
    const DEFAULT_BUS_CAPACITY: usize = 1024;

    pub fn from_env() -> Result<Self, String> {
        let bus_capacity = env::var("EVENT_BUS_CAPACITY")
            .unwrap_or_else(|_| Self::DEFAULT_BUS_CAPACITY.to_string())
            .parse::<usize>()
            .map_err(|_| "EVENT_BUS_CAPACITY must be a valid number".to_string())?;

        if bus_capacity == 0 {
            return Err("EVENT_BUS_CAPACITY must be greater than zero".to_string());
        }

        Ok(Self { bus_capacity })
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            countries: "countries".to_string(),
            provinces: "provinces".to_string(),
            cities: "cities".to_string(),
            districts: "districts".to_string(),
            geo_areas: "geo_areas".to_string(),
            geo_area_relations: "geo_area_relations".to_string(),
            addresses: "addresses".to_string(),
            address_relations: "address_relations".to_string(),
            locations: "locations".to_string(),
            location_relations: "location_relations".to_string(),
        }
    }
}

impl TableNames {
    /// Reads `LOCATION_TABLE_<ROLE>` overrides on top of the defaults.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let pick = |role: &str, default: String| -> Result<String, String> {
            let key = format!("LOCATION_TABLE_{}", role);
            let name = lookup(&key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(default);
            if !SQL_IDENTIFIER_REGEX.is_match(&name) {
                return Err(format!("{} must be a plain SQL identifier, got '{}'", key, name));
            }
            Ok(name)
        };

        Ok(Self {
            countries: pick("COUNTRIES", defaults.countries)?,
            provinces: pick("PROVINCES", defaults.provinces)?,
            cities: pick("CITIES", defaults.cities)?,
            districts: pick("DISTRICTS", defaults.districts)?,
            geo_areas: pick("GEO_AREAS", defaults.geo_areas)?,
            geo_area_relations: pick("GEO_AREA_RELATIONS", defaults.geo_area_relations)?,
            addresses: pick("ADDRESSES", defaults.addresses)?,
            address_relations: pick("ADDRESS_RELATIONS", defaults.address_relations)?,
            locations: pick("LOCATIONS", defaults.locations)?,
            location_relations: pick("LOCATION_RELATIONS", defaults.location_relations)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_table_names_default_when_unset() {
        let tables = TableNames::from_lookup(|_| None).unwrap();
        assert_eq!(tables, TableNames::default());
    }

    #[test]
    fn test_table_names_override() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("LOCATION_TABLE_COUNTRIES", "geo_countries"),
            ("LOCATION_TABLE_CITIES", "  "),
        ]);
        let tables =
            TableNames::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(tables.countries, "geo_countries");
        // blank values fall back to the default
        assert_eq!(tables.cities, "cities");
    }

    #[test]
    fn test_table_names_reject_injection() {
        let result = TableNames::from_lookup(|key| {
            (key == "LOCATION_TABLE_PROVINCES").then(|| "provinces; DROP TABLE x".to_string())
        });
        assert!(result.is_err());
    }
}
