use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Card-level view of a center, used in listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CenterSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub address: String,
    pub town: String,
    pub state: String,
    pub sector: Option<String>,
    pub tel: Option<String>,
    pub featured: bool,
}

/// A center image in display order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CenterImageDto {
    pub id: String,
    pub storage_key: String,
    pub display_order: i32,
}

/// Everything shown on a center detail page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CenterDetail {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub address: String,
    pub town: String,
    pub state: String,
    pub state_slug: String,
    pub sector: Option<String>,
    pub tel: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub doctor_in_charge: Option<String>,
    pub services: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub featured: bool,
    /// Active images only, ordered by display order.
    pub images: Vec<CenterImageDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal payload for map pins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MapMarker {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub town: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}
