use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// One choice in a parent select box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LocationOptionDto {
    pub id: Uuid,
    pub name: String,
}

/// Choices needed to render a create or edit form
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LocationFormDto {
    /// Field the parent choices are for, e.g. `country_id`
    pub parent_field: Option<String>,
    pub parents: Vec<LocationOptionDto>,
}

/// Narrows the parent choices of a form to one grandparent
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FormQuery {
    /// Provinces of one country (city forms)
    #[serde(rename = "filter[country_id]")]
    pub filter_country_id: Option<Uuid>,

    /// Cities of one province (district forms)
    #[serde(rename = "filter[province_id]")]
    pub filter_province_id: Option<Uuid>,
}
