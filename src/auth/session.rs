use chrono::{DateTime, Duration, Utc};
use model::entities::{session, user};
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use tracing::{debug, info, trace};

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub async fn create_session(
    db: &DatabaseConnection,
    user_id: i32,
    ttl: Duration,
) -> Result<session::Model, DbErr> {
    let now = Utc::now();
    let created = session::ActiveModel {
        token: Set(generate_token()),
        user_id: Set(user_id),
        expires_at: Set(now + ttl),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!("Created session for user {}", user_id);
    Ok(created)
}

/// Looks up a live session and its user, stamping `updated_at`.
///
/// Expired sessions are deleted on sight and yield `None`.
pub async fn resolve_session(
    db: &DatabaseConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<(session::Model, user::Model)>, DbErr> {
    let Some((found, owner)) = session::Entity::find_by_id(token.to_string())
        .find_also_related(user::Entity)
        .one(db)
        .await?
    else {
        trace!("Unknown session token");
        return Ok(None);
    };

    if found.is_expired(now) {
        debug!("Session of user {} expired at {}", found.user_id, found.expires_at);
        session::Entity::delete_by_id(found.token).exec(db).await?;
        return Ok(None);
    }

    let Some(owner) = owner else {
        return Ok(None);
    };

    let mut touched: session::ActiveModel = found.into();
    touched.updated_at = Set(now);
    let touched = touched.update(db).await?;

    Ok(Some((touched, owner)))
}

pub async fn delete_session(db: &DatabaseConnection, token: &str) -> Result<bool, DbErr> {
    let result = session::Entity::delete_many()
        .filter(session::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
