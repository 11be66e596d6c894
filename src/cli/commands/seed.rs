use std::path::Path;

use anyhow::{Context, Result};
use listing::{centers, ListingError};
use model::entities::state;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use tracing::{debug, info, trace, warn};
use validator::Validate;

use crate::handlers::admin::CreateCenterRequest;

/// The thirteen states and three federal territories.
pub const MALAYSIAN_STATES: [&str; 16] = [
    "Johor",
    "Kedah",
    "Kelantan",
    "Kuala Lumpur",
    "Labuan",
    "Melaka",
    "Negeri Sembilan",
    "Pahang",
    "Perak",
    "Perlis",
    "Pulau Pinang",
    "Putrajaya",
    "Sabah",
    "Sarawak",
    "Selangor",
    "Terengganu",
];

/// Inserts any state that is not there yet. Returns how many were added.
pub async fn seed_states(db: &DatabaseConnection) -> Result<usize> {
    let existing: Vec<String> = state::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect();

    let mut added = 0;
    for name in MALAYSIAN_STATES {
        if existing.iter().any(|e| e.eq_ignore_ascii_case(name)) {
            continue;
        }
        state::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        added += 1;
    }
    Ok(added)
}

/// Imports centers from a JSON array. Returns (imported, skipped).
pub async fn seed_centers(db: &DatabaseConnection, path: &Path) -> Result<(usize, usize)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<CreateCenterRequest> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid center data in {}", path.display()))?;

    let (mut imported, mut skipped) = (0, 0);
    for record in records {
        if let Err(e) = record.validate() {
            warn!("Skipping center '{}': {}", record.name, e);
            skipped += 1;
            continue;
        }
        let name = record.name.clone();
        match centers::create_center(db, record.into()).await {
            Ok(center) => {
                debug!("Imported {}", center.slug);
                imported += 1;
            }
            Err(ListingError::Conflict(message) | ListingError::InvalidInput(message)) => {
                warn!("Skipping center '{}': {}", name, message);
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok((imported, skipped))
}

pub async fn seed(database_url: &str, centers_file: Option<&Path>) -> Result<()> {
    trace!("Entering seed function");
    let db = Database::connect(database_url).await?;

    let added = seed_states(&db).await?;
    info!("Added {} states", added);

    if let Some(path) = centers_file {
        let (imported, skipped) = seed_centers(&db, path).await?;
        info!("Imported {} centers, skipped {}", imported, skipped);
    }

    db.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_seed_states_is_idempotent() {
        let db = setup_test_db().await;

        assert_eq!(seed_states(&db).await.unwrap(), 16);
        assert_eq!(seed_states(&db).await.unwrap(), 0);
        assert_eq!(state::Entity::find().all(&db).await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_seed_centers_skips_duplicates() {
        let db = setup_test_db().await;
        seed_states(&db).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("centers.json");
        std::fs::write(
            &path,
            r#"[
                {"name": "Pusat Dialisis Ipoh", "address": "1 Jalan Sultan Idris", "town": "Ipoh", "state": "Perak"},
                {"name": "Pusat Dialisis Ipoh", "address": "2 Jalan Sultan Idris", "town": "Ipoh", "state": "perak"},
                {"name": "Nowhere Renal", "address": "3 Jalan Tiada", "town": "Nowhere", "state": "Atlantis"}
            ]"#,
        )
        .unwrap();

        let (imported, skipped) = seed_centers(&db, &path).await.unwrap();
        assert_eq!((imported, skipped), (1, 2));
    }
}
