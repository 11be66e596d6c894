//! Transport-layer types shared between the HTTP handlers and the listing
//! service. These mirror the JSON payloads of the public API so both sides
//! agree on field names without depending on the database entities.

mod center;
mod lead;
mod location;
mod slug;

pub use center::{CenterDetail, CenterImageDto, CenterSummary, MapMarker};
pub use lead::LeadDto;
pub use location::{CentersByState, LocationKind, NeighboringLocation, StateSummary, TownSummary};
pub use slug::slugify;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}
