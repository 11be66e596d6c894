//! Shared fixtures for the listing tests.

use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{center_image, dialysis_center, state};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

/// Create an in-memory SQLite database with all migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub struct Fixture {
    pub selangor_id: i32,
    pub kuala_lumpur_id: i32,
    pub perlis_id: i32,
    /// Featured center in Klang, Selangor.
    pub premier_klang_id: String,
    pub klang_care_id: String,
    pub shah_alam_id: String,
    pub kl_kidney_id: String,
}

async fn insert_state(db: &DatabaseConnection, name: &str) -> i32 {
    state::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert state")
    .id
}

async fn insert_center(
    db: &DatabaseConnection,
    id: &str,
    name: &str,
    town: &str,
    state_id: i32,
    featured: bool,
    coordinates: Option<(f64, f64)>,
    age_days: i64,
) -> String {
    let stamp = Utc::now() - Duration::days(age_days);
    dialysis_center::ActiveModel {
        id: Set(id.to_string()),
        slug: Set(common::slugify(name)),
        name: Set(name.to_string()),
        address: Set(format!("12 Jalan Besar, {}", town)),
        town: Set(town.to_string()),
        sector: Set(Some("Private".to_string())),
        tel: Set(Some("03-1234 5678".to_string())),
        phone: Set(None),
        email: Set(None),
        website: Set(None),
        doctor_in_charge: Set(Some("Dr. Aminah".to_string())),
        services: Set(Some("Haemodialysis".to_string())),
        latitude: Set(coordinates.map(|c| c.0)),
        longitude: Set(coordinates.map(|c| c.1)),
        featured: Set(featured),
        state_id: Set(state_id),
        created_at: Set(stamp),
        updated_at: Set(stamp),
    }
    .insert(db)
    .await
    .expect("Failed to insert center")
    .id
}

/// Seeds three states and four centers:
///
/// - Selangor: "Premier Dialysis Klang" (featured, Klang), "Klang Care
///   Dialysis" (Klang), "Shah Alam Renal Centre" (Shah Alam)
/// - Kuala Lumpur: "KL Kidney Centre" (Cheras)
/// - Perlis: no centers
pub async fn seed_directory(db: &DatabaseConnection) -> Fixture {
    let selangor_id = insert_state(db, "Selangor").await;
    let kuala_lumpur_id = insert_state(db, "Kuala Lumpur").await;
    let perlis_id = insert_state(db, "Perlis").await;

    let premier_klang_id = insert_center(
        db,
        "center-premier-klang",
        "Premier Dialysis Klang",
        "Klang",
        selangor_id,
        true,
        Some((3.0449, 101.4455)),
        3,
    )
    .await;
    let klang_care_id = insert_center(
        db,
        "center-klang-care",
        "Klang Care Dialysis",
        "Klang",
        selangor_id,
        false,
        None,
        2,
    )
    .await;
    let shah_alam_id = insert_center(
        db,
        "center-shah-alam",
        "Shah Alam Renal Centre",
        "Shah Alam",
        selangor_id,
        false,
        None,
        1,
    )
    .await;
    let kl_kidney_id = insert_center(
        db,
        "center-kl-kidney",
        "KL Kidney Centre",
        "Cheras",
        kuala_lumpur_id,
        false,
        Some((3.1073, 101.7260)),
        0,
    )
    .await;

    Fixture {
        selangor_id,
        kuala_lumpur_id,
        perlis_id,
        premier_klang_id,
        klang_care_id,
        shah_alam_id,
        kl_kidney_id,
    }
}

/// Inserts `count` active images for a center with orders 1..=count and
/// returns their ids in that order.
pub async fn seed_images(db: &DatabaseConnection, center_id: &str, count: usize) -> Vec<String> {
    let now = Utc::now();
    let mut ids = Vec::with_capacity(count);
    for position in 1..=count {
        let id = format!("{}-img-{}", center_id, position);
        center_image::ActiveModel {
            id: Set(id.clone()),
            center_id: Set(center_id.to_string()),
            storage_key: Set(format!("centers/{}/{}.jpg", center_id, position)),
            display_order: Set(position as i32),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to insert image");
        ids.push(id);
    }
    ids
}
