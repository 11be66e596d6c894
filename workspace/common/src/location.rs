use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::CenterSummary;

/// A state with the number of centers listed in it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StateSummary {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub center_count: u64,
}

/// A town inside a state with the number of centers listed in it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TownSummary {
    pub name: String,
    pub slug: String,
    pub center_count: u64,
}

/// Result of a state (and optional town) lookup.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CentersByState {
    pub centers: Vec<CenterSummary>,
    pub total: u64,
}

impl CentersByState {
    pub fn empty() -> Self {
        Self {
            centers: Vec::new(),
            total: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    State,
    Town,
}

/// Another location shown as "nearby" on a state or town page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NeighboringLocation {
    pub kind: LocationKind,
    pub name: String,
    pub slug: String,
    /// Slug of the state the location belongs to. Equals `slug` for states.
    pub state_slug: String,
    pub center_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_kind_serializes_lowercase() {
        let location = NeighboringLocation {
            kind: LocationKind::Town,
            name: "Shah Alam".to_string(),
            slug: "shah-alam".to_string(),
            state_slug: "selangor".to_string(),
            center_count: 3,
        };

        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["kind"], "town");
        assert_eq!(json["center_count"], 3);
    }

    #[test]
    fn test_empty_centers_by_state() {
        let empty = CentersByState::empty();
        assert!(empty.centers.is_empty());
        assert_eq!(empty.total, 0);
    }
}
