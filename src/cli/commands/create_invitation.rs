use anyhow::Result;
use chrono::Duration;
use model::entities::user::Role;
use sea_orm::Database;
use tracing::{info, trace};

use crate::auth::invitation;

pub async fn create_invitation(
    database_url: &str,
    email: Option<String>,
    role: Role,
    ttl_hours: i64,
) -> Result<()> {
    trace!("Entering create_invitation function");
    anyhow::ensure!(ttl_hours > 0, "ttl-hours must be positive");

    let db = Database::connect(database_url).await?;
    let created = invitation::create_invitation(
        &db,
        email.map(|e| e.trim().to_lowercase()),
        role,
        Duration::hours(ttl_hours),
    )
    .await?;
    db.close().await?;

    info!("Invitation for {:?} expires at {}", created.role, created.expires_at);
    println!("{}", created.token);
    Ok(())
}
