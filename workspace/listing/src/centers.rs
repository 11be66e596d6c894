use chrono::Utc;
use common::{CenterDetail, slugify};
use model::entities::{dialysis_center, state};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set, SqlErr,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ListingError, Result};
use crate::images::active_images;
use crate::locations::find_state;

/// Fields for a new center listing.
#[derive(Debug, Clone, Default)]
pub struct NewCenter {
    pub name: String,
    /// Derived from name and town when absent.
    pub slug: Option<String>,
    pub address: String,
    pub town: String,
    /// State display name or slug.
    pub state: String,
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
}

/// Partial update of a center. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CenterChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub town: Option<String>,
    pub state: Option<String>,
    pub sector: Option<String>,
    pub tel: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub doctor_in_charge: Option<String>,
    pub services: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub featured: Option<bool>,
}

/// Looks a center up by id first, then by slug.
pub async fn find_center_model(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<dialysis_center::Model>> {
    if let Some(center) = dialysis_center::Entity::find_by_id(key.to_string())
        .one(db)
        .await?
    {
        return Ok(Some(center));
    }

    Ok(dialysis_center::Entity::find()
        .filter(dialysis_center::Column::Slug.eq(key))
        .one(db)
        .await?)
}

/// Full detail of a center, or `None` when neither id nor slug matches.
#[instrument(skip(db))]
pub async fn find_center(db: &DatabaseConnection, key: &str) -> Result<Option<CenterDetail>> {
    match find_center_model(db, key).await? {
        Some(center) => Ok(Some(load_detail(db, center).await?)),
        None => {
            debug!("No center with id or slug '{}'", key);
            Ok(None)
        }
    }
}

async fn load_detail(db: &DatabaseConnection, center: dialysis_center::Model) -> Result<CenterDetail> {
    let state = state::Entity::find_by_id(center.state_id)
        .one(db)
        .await?
        .ok_or_else(|| ListingError::not_found("State", center.state_id.to_string()))?;

    let images = active_images(db, &center.id).await?;

    Ok(CenterDetail {
        id: center.id,
        slug: center.slug,
        name: center.name,
        address: center.address,
        town: center.town,
        state_slug: slugify(&state.name),
        state: state.name,
        sector: center.sector,
        tel: center.tel,
        phone: center.phone,
        email: center.email,
        website: center.website,
        doctor_in_charge: center.doctor_in_charge,
        services: center.services,
        latitude: center.latitude,
        longitude: center.longitude,
        featured: center.featured,
        images,
        created_at: center.created_at,
        updated_at: center.updated_at,
    })
}

async fn require_state(db: &DatabaseConnection, name: &str) -> Result<state::Model> {
    find_state(db, name)
        .await?
        .ok_or_else(|| ListingError::InvalidInput(format!("Unknown state '{}'", name)))
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ListingError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn slug_conflict(slug: &str) -> ListingError {
    ListingError::Conflict(format!("Slug '{}' is already in use", slug))
}

/// A concurrent create can still win the race for the slug between the
/// check and the insert; the unique index reports it.
fn insert_error(err: DbErr, slug: &str) -> ListingError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            warn!("Slug '{}' taken concurrently: {}", slug, detail);
            slug_conflict(slug)
        }
        _ => ListingError::Database(err),
    }
}

/// Creates a center listing.
///
/// Fails with `Conflict` when the slug is taken and `InvalidInput` when the
/// state is unknown or a required field is blank.
#[instrument(skip(db))]
pub async fn create_center(db: &DatabaseConnection, new: NewCenter) -> Result<CenterDetail> {
    require_text("name", &new.name)?;
    require_text("address", &new.address)?;
    require_text("town", &new.town)?;
    let state = require_state(db, &new.state).await?;

    let slug = match new.slug.as_deref().map(slugify).filter(|s| !s.is_empty()) {
        Some(slug) => slug,
        None => slugify(&format!("{} {}", new.name, new.town)),
    };

    // Lookups try ids before slugs, so a slug may not shadow an id either
    let taken = dialysis_center::Entity::find()
        .filter(
            Condition::any()
                .add(dialysis_center::Column::Slug.eq(slug.as_str()))
                .add(dialysis_center::Column::Id.eq(slug.as_str())),
        )
        .one(db)
        .await?
        .is_some();
    if taken {
        warn!("Slug '{}' is already in use", slug);
        return Err(slug_conflict(&slug));
    }

    let now = Utc::now();
    let center = dialysis_center::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        slug: Set(slug.clone()),
        name: Set(new.name.trim().to_string()),
        address: Set(new.address.trim().to_string()),
        town: Set(new.town.trim().to_string()),
        sector: Set(new.sector),
        tel: Set(new.tel),
        phone: Set(new.phone),
        email: Set(new.email),
        website: Set(new.website),
        doctor_in_charge: Set(new.doctor_in_charge),
        services: Set(new.services),
        latitude: Set(new.latitude),
        longitude: Set(new.longitude),
        featured: Set(new.featured),
        state_id: Set(state.id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| insert_error(e, &slug))?;

    info!("Created center {} ({})", center.id, center.slug);
    load_detail(db, center).await
}

/// Applies a partial update. The slug never changes so published URLs
/// keep working.
#[instrument(skip(db))]
pub async fn update_center(
    db: &DatabaseConnection,
    id: &str,
    changes: CenterChanges,
) -> Result<CenterDetail> {
    let existing = dialysis_center::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| ListingError::not_found("Center", id))?;

    let mut active: dialysis_center::ActiveModel = existing.into();

    if let Some(name) = changes.name {
        require_text("name", &name)?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(address) = changes.address {
        require_text("address", &address)?;
        active.address = Set(address.trim().to_string());
    }
    if let Some(town) = changes.town {
        require_text("town", &town)?;
        active.town = Set(town.trim().to_string());
    }
    if let Some(state) = changes.state {
        active.state_id = Set(require_state(db, &state).await?.id);
    }
    if let Some(sector) = changes.sector {
        active.sector = Set(Some(sector));
    }
    if let Some(tel) = changes.tel {
        active.tel = Set(Some(tel));
    }
    if let Some(phone) = changes.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(email) = changes.email {
        active.email = Set(Some(email));
    }
    if let Some(website) = changes.website {
        active.website = Set(Some(website));
    }
    if let Some(doctor) = changes.doctor_in_charge {
        active.doctor_in_charge = Set(Some(doctor));
    }
    if let Some(services) = changes.services {
        active.services = Set(Some(services));
    }
    if let Some(latitude) = changes.latitude {
        active.latitude = Set(Some(latitude));
    }
    if let Some(longitude) = changes.longitude {
        active.longitude = Set(Some(longitude));
    }
    if let Some(featured) = changes.featured {
        active.featured = Set(featured);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(db).await?;
    info!("Updated center {}", updated.id);
    load_detail(db, updated).await
}
