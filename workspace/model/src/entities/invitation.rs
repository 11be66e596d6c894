use sea_orm::entity::prelude::*;

use super::user::Role;

/// Invite-only sign-up token.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invitations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    /// When set, only this address may redeem the invitation.
    pub email: Option<String>,
    pub role: Role,
    pub expires_at: DateTimeUtc,
    pub used_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// An invitation can be redeemed once, before it expires, by the
    /// address it was issued to (if any).
    pub fn is_redeemable(&self, email: &str, now: DateTimeUtc) -> bool {
        self.used_at.is_none()
            && self.expires_at > now
            && self
                .email
                .as_deref()
                .is_none_or(|invited| invited.eq_ignore_ascii_case(email))
    }
}
