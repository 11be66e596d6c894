use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A contact request as shown to administrators.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct LeadDto {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message: Option<String>,
    pub center_id: Option<String>,
    /// Name of the linked center, if it still exists.
    pub center_name: Option<String>,
    pub created_at: DateTime<Utc>,
}
