pub mod city_service;
pub mod country_service;
pub mod district_service;
pub mod province_service;

pub use city_service::CityService;
pub use country_service::CountryService;
pub use district_service::DistrictService;
pub use province_service::ProvinceService;

use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::TableNames;
use crate::features::events::EventBus;
use crate::features::locations::rules::PgLocationDirectory;

/// The four hierarchy services, sharing one directory
#[derive(Clone)]
pub struct LocationServices {
    pub directory: Arc<PgLocationDirectory>,
    pub countries: Arc<CountryService>,
    pub provinces: Arc<ProvinceService>,
    pub cities: Arc<CityService>,
    pub districts: Arc<DistrictService>,
}

impl LocationServices {
    pub fn new(pool: PgPool, tables: Arc<TableNames>, events: Arc<EventBus>) -> Self {
        let directory = Arc::new(PgLocationDirectory::new(pool.clone(), tables.clone()));
        Self {
            countries: Arc::new(CountryService::new(
                pool.clone(),
                tables.clone(),
                directory.clone(),
                events.clone(),
            )),
            provinces: Arc::new(ProvinceService::new(
                pool.clone(),
                tables.clone(),
                directory.clone(),
                events.clone(),
            )),
            cities: Arc::new(CityService::new(
                pool.clone(),
                tables.clone(),
                directory.clone(),
                events.clone(),
            )),
            districts: Arc::new(DistrictService::new(
                pool,
                tables,
                directory.clone(),
                events,
            )),
            directory,
        }
    }
}
