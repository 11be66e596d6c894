//! Invitation checks for sign-up.

use std::fmt::Debug;

use chrono::{Duration, Utc};
use model::entities::invitation;
use model::entities::user::Role;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set,
};
use tracing::{info, warn};

use super::session::generate_token;
use super::AuthError;

/// Decides whether a sign-up token may be redeemed and which role it grants.
#[async_trait::async_trait]
pub trait InvitationVerifier: Send + Sync + Debug {
    /// Checks `token` for `email` and consumes it on success. The claim only
    /// sticks once `txn` commits.
    async fn redeem(&self, txn: &DatabaseTransaction, token: &str, email: &str) -> Result<Role, AuthError>;
}

/// Accepts any non-empty token and grants `BUSINESS_OWNER`.
#[derive(Debug, Clone, Copy)]
pub struct PresenceOnly;

#[async_trait::async_trait]
impl InvitationVerifier for PresenceOnly {
    async fn redeem(&self, _txn: &DatabaseTransaction, token: &str, _email: &str) -> Result<Role, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingInvitation);
        }
        Ok(Role::BusinessOwner)
    }
}

/// Tokens must match an unused, unexpired row in `invitations`.
#[derive(Debug, Clone, Copy)]
pub struct InvitationTable;

#[async_trait::async_trait]
impl InvitationVerifier for InvitationTable {
    async fn redeem(&self, txn: &DatabaseTransaction, token: &str, email: &str) -> Result<Role, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingInvitation);
        }

        let now = Utc::now();
        let found = invitation::Entity::find_by_id(token.trim().to_string())
            .one(txn)
            .await?
            .filter(|i| i.is_redeemable(email, now))
            .ok_or_else(|| {
                warn!("Rejected invitation token for {}", email);
                AuthError::InvalidInvitation
            })?;

        // Only one concurrent sign-up can flip used_at
        let claimed = invitation::Entity::update_many()
            .col_expr(invitation::Column::UsedAt, Expr::value(Some(now)))
            .filter(invitation::Column::Token.eq(found.token.as_str()))
            .filter(invitation::Column::UsedAt.is_null())
            .exec(txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(AuthError::InvalidInvitation);
        }

        info!("Invitation redeemed by {}", email);
        Ok(found.role)
    }
}

/// Issues a new invitation row.
pub async fn create_invitation(
    db: &DatabaseConnection,
    email: Option<String>,
    role: Role,
    ttl: Duration,
) -> Result<invitation::Model, DbErr> {
    let now = Utc::now();
    invitation::ActiveModel {
        token: Set(generate_token()),
        email: Set(email),
        role: Set(role),
        expires_at: Set(now + ttl),
        used_at: Set(None),
        created_at: Set(now),
    }
    .insert(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::setup_test_db;
    use sea_orm::TransactionTrait;

    async fn redeem_and_commit(
        verifier: &dyn InvitationVerifier,
        db: &DatabaseConnection,
        token: &str,
        email: &str,
    ) -> Result<Role, AuthError> {
        let txn = db.begin().await?;
        match verifier.redeem(&txn, token, email).await {
            Ok(role) => {
                txn.commit().await?;
                Ok(role)
            }
            Err(e) => {
                txn.rollback().await?;
                Err(e)
            }
        }
    }

    #[tokio::test]
    async fn test_presence_only_needs_a_token() {
        let db = setup_test_db().await;

        assert!(matches!(
            redeem_and_commit(&PresenceOnly, &db, "  ", "a@example.com").await,
            Err(AuthError::MissingInvitation)
        ));
        assert_eq!(
            redeem_and_commit(&PresenceOnly, &db, "anything", "a@example.com").await.unwrap(),
            Role::BusinessOwner
        );
    }

    #[tokio::test]
    async fn test_table_invitation_is_single_use() {
        let db = setup_test_db().await;
        let invite = create_invitation(&db, Some("owner@example.com".into()), Role::SuperAdmin, Duration::hours(1))
            .await
            .unwrap();

        // Wrong address
        assert!(matches!(
            redeem_and_commit(&InvitationTable, &db, &invite.token, "other@example.com").await,
            Err(AuthError::InvalidInvitation)
        ));

        let role = redeem_and_commit(&InvitationTable, &db, &invite.token, "Owner@Example.com")
            .await
            .unwrap();
        assert_eq!(role, Role::SuperAdmin);

        assert!(matches!(
            redeem_and_commit(&InvitationTable, &db, &invite.token, "owner@example.com").await,
            Err(AuthError::InvalidInvitation)
        ));
    }

    #[tokio::test]
    async fn test_rolled_back_redeem_keeps_invitation() {
        let db = setup_test_db().await;
        let invite = create_invitation(&db, None, Role::BusinessOwner, Duration::hours(1))
            .await
            .unwrap();

        let txn = db.begin().await.unwrap();
        InvitationTable
            .redeem(&txn, &invite.token, "first@example.com")
            .await
            .unwrap();
        txn.rollback().await.unwrap();

        let stored = invitation::Entity::find_by_id(invite.token.clone())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.used_at.is_none());

        let role = redeem_and_commit(&InvitationTable, &db, &invite.token, "second@example.com")
            .await
            .unwrap();
        assert_eq!(role, Role::BusinessOwner);
    }

    #[tokio::test]
    async fn test_table_rejects_expired_and_unknown() {
        let db = setup_test_db().await;
        let expired = create_invitation(&db, None, Role::BusinessOwner, Duration::hours(-1))
            .await
            .unwrap();

        assert!(matches!(
            redeem_and_commit(&InvitationTable, &db, &expired.token, "a@example.com").await,
            Err(AuthError::InvalidInvitation)
        ));
        assert!(matches!(
            redeem_and_commit(&InvitationTable, &db, "unknown", "a@example.com").await,
            Err(AuthError::InvalidInvitation)
        ));
    }
}
