use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::locations::dtos::LocationFormDto;
use crate::features::locations::models::District;
use crate::shared::types::nullable;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDistrictDto {
    pub city_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: String,

    #[validate(length(max = 255, message = "The subtitle may not be greater than 255 characters."))]
    pub subtitle: Option<String>,

    /// Alternative names used when searching; every element must be a string
    #[schema(value_type = Option<Vec<String>>)]
    pub keywords: Option<Vec<Value>>,

    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDistrictDto {
    pub city_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "The name must be between 1 and 255 characters."))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    #[validate(length(max = 255, message = "The subtitle may not be greater than 255 characters."))]
    pub subtitle: Option<Option<String>>,

    #[schema(value_type = Option<Vec<String>>)]
    pub keywords: Option<Vec<Value>>,

    pub status: Option<bool>,
}

/// String elements of a checked keyword list
pub fn keyword_strings(keywords: &[Value]) -> Vec<String> {
    keywords
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DistrictResponseDto {
    pub id: Uuid,
    pub city_id: Uuid,
    pub name: String,
    pub subtitle: Option<String>,
    pub keywords: Vec<String>,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<District> for DistrictResponseDto {
    fn from(district: District) -> Self {
        Self {
            id: district.id,
            city_id: district.city_id,
            name: district.name,
            subtitle: district.subtitle,
            keywords: district.keywords,
            status: district.status,
            created_at: district.created_at,
            updated_at: district.updated_at,
            deleted_at: district.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DistrictEditDto {
    pub record: DistrictResponseDto,
    pub form: LocationFormDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keyword_strings_skips_blanks() {
        let keywords = vec![json!(" old town "), json!(""), json!("bazaar")];
        assert_eq!(keyword_strings(&keywords), vec!["old town", "bazaar"]);
    }

    #[test]
    fn test_non_string_keywords_deserialize_for_reporting() {
        let dto: CreateDistrictDto = serde_json::from_value(json!({
            "city_id": Uuid::now_v7(),
            "name": "Zand",
            "keywords": [123]
        }))
        .unwrap();
        assert_eq!(dto.keywords.unwrap(), vec![json!(123)]);
    }
}
