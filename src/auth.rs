//! Session authentication and role capabilities.
//!
//! Handlers take an [`AuthUser`] argument to require a session and then call
//! [`AuthUser::require`] with the capability the route needs. Page routes
//! that redirect instead take `Option<AuthUser>`.

pub mod invitation;
pub mod password;
pub mod session;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use model::entities::user::Role;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::helpers::errors::{api_error, ApiError};
use crate::schemas::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Something a role is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ViewAdminArea,
    ManageCenters,
    ManageImages,
    ViewLeads,
    ViewDashboard,
}

pub fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::SuperAdmin => &[
            Capability::ViewAdminArea,
            Capability::ManageCenters,
            Capability::ManageImages,
            Capability::ViewLeads,
            Capability::ViewDashboard,
        ],
        Role::BusinessOwner => &[Capability::ViewDashboard],
    }
}

pub fn role_allows(role: Role, capability: Capability) -> bool {
    capabilities(role).contains(&capability)
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredentials,

    #[error("Session is invalid or expired")]
    InvalidSession,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An invitation token is required to sign up")]
    MissingInvitation,

    #[error("Invitation is invalid, expired or already used")]
    InvalidInvitation,

    #[error("An account with email '{0}' already exists")]
    EmailTaken(String),

    #[error("Missing permission: {0:?}")]
    Forbidden(Capability),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let (status, code) = match &err {
            AuthError::MissingCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::InvalidSession => (StatusCode::UNAUTHORIZED, "SESSION_EXPIRED"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::MissingInvitation => (StatusCode::BAD_REQUEST, "INVITATION_REQUIRED"),
            AuthError::InvalidInvitation => (StatusCode::BAD_REQUEST, "INVALID_INVITATION"),
            AuthError::EmailTaken(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            AuthError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AuthError::PasswordHash(_) | AuthError::Database(_) => {
                error!("Authentication backend error: {}", err);
                return api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error",
                );
            }
        };
        api_error(status, code, err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// The signed-in user behind a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub token: String,
}

impl AuthUser {
    pub fn can(&self, capability: Capability) -> bool {
        role_allows(self.role, capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if self.can(capability) {
            Ok(())
        } else {
            warn!("User {} lacks {:?}", self.user_id, capability);
            Err(AuthError::Forbidden(capability).into())
        }
    }
}

/// Reads the session token from `Authorization: Bearer` or the session
/// cookie.
pub fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AuthError::MissingCredentials)?;

        let (session, user) = session::resolve_session(&state.db, &token, Utc::now())
            .await?
            .ok_or(AuthError::InvalidSession)?;

        debug!("Authenticated user {} ({:?})", user.id, user.role);
        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            token: session.token,
        })
    }
}

/// Builds the `Set-Cookie` value for a session token.
pub fn session_cookie(token: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_seconds
    )
}

/// Clears the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
