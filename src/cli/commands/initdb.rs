use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, info, trace};

/// Applies every pending migration on an open connection.
async fn apply_migrations(db: &DatabaseConnection) -> Result<usize> {
    let pending = Migrator::get_pending_migrations(db)
        .await
        .context("Failed to read migration status")?;
    if pending.is_empty() {
        info!("Schema is up to date");
        return Ok(0);
    }

    for migration in &pending {
        debug!("Pending migration: {}", migration.name());
    }
    Migrator::up(db, None)
        .await
        .context("Failed to apply migrations")?;

    info!("Applied {} migration(s)", pending.len());
    Ok(pending.len())
}

/// Creates or upgrades the directory schema, then closes the connection.
pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    apply_migrations(&db).await?;
    db.close().await?;
    info!("Database ready");
    Ok(())
}
