use axum::{
    extract::State,
    http::{header, StatusCode},
    response::Json,
};
use chrono::Duration;
use model::entities::user::{self, Role};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{expired_session_cookie, session, session_cookie, AuthError, AuthUser};
use crate::helpers::errors::{bad_request, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Invitation-gated registration
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct SignUpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Required
    pub invitation_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// The signed-in user. `token` is only set right after sign-up or sign-in.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "BUSINESS_OWNER")]
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

type WithCookie<T> = (StatusCode, [(header::HeaderName, String); 1], Json<ApiResponse<T>>);

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_ttl(state: &AppState) -> Duration {
    Duration::hours(state.settings.session_ttl_hours)
}

async fn start_session(
    state: &AppState,
    account: user::Model,
    status: StatusCode,
    message: &str,
) -> Result<WithCookie<SessionResponse>, ApiError> {
    let ttl = session_ttl(state);
    let created = session::create_session(&state.db, account.id, ttl)
        .await
        .map_err(AuthError::from)?;

    let cookie = session_cookie(&created.token, ttl.num_seconds());
    let response = SessionResponse {
        user_id: account.id,
        email: account.email,
        name: account.name,
        role: account.role,
        token: Some(created.token),
    };
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok(response, message)),
    ))
}

fn insert_error(err: DbErr, email: &str) -> AuthError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            warn!("Sign-up for already registered {}", email);
            AuthError::EmailTaken(email.to_string())
        }
        _ => AuthError::from(err),
    }
}

/// Redeems the invitation and inserts the account inside `txn`, so a failed
/// insert leaves the invitation unspent once the caller rolls back.
async fn register(
    state: &AppState,
    txn: &DatabaseTransaction,
    token: &str,
    email: String,
    name: &str,
    password_hash: String,
) -> Result<user::Model, AuthError> {
    let role = state.invitations.redeem(txn, token, &email).await?;

    let now = chrono::Utc::now();
    user::ActiveModel {
        email: Set(email.clone()),
        name: Set(name.to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|e| insert_error(e, &email))
}

/// Create an account with an invitation token
#[utoipa::path(
    post,
    path = "/api/auth/sign-up",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = ApiResponse<SessionResponse>),
        (status = 400, description = "Missing or invalid invitation, or invalid fields", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<WithCookie<SessionResponse>, ApiError> {
    trace!("Entering sign_up function");
    let token = request
        .invitation_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            warn!("Sign-up attempt without invitation token");
            ApiError::from(AuthError::MissingInvitation)
        })?;

    request
        .validate()
        .map_err(|e| bad_request(format!("Invalid sign-up request: {}", e)))?;

    let email = normalize_email(&request.email);
    let password_hash = hash_password(&request.password)?;

    let txn = state.db.begin().await.map_err(AuthError::from)?;
    let registered = register(&state, &txn, token, email, request.name.trim(), password_hash).await;
    let account = match registered {
        Ok(account) => {
            txn.commit().await.map_err(AuthError::from)?;
            account
        }
        Err(e) => {
            txn.rollback().await.map_err(AuthError::from)?;
            return Err(e.into());
        }
    };

    info!("User {} signed up as {:?}", account.id, account.role);
    start_session(&state, account, StatusCode::CREATED, "Account created successfully").await
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/sign-in",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<SessionResponse>),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<WithCookie<SessionResponse>, ApiError> {
    trace!("Entering sign_in function");
    let email = normalize_email(&request.email);

    let account = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&state.db)
        .await
        .map_err(AuthError::from)?
        .filter(|account| verify_password(&request.password, &account.password_hash))
        .ok_or_else(|| {
            debug!("Failed sign-in for {}", email);
            ApiError::from(AuthError::InvalidCredentials)
        })?;

    info!("User {} signed in", account.id);
    start_session(&state, account, StatusCode::OK, "Signed in successfully").await
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/auth/sign-out",
    tag = "auth",
    responses(
        (status = 200, description = "Signed out"),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn sign_out(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<WithCookie<()>, ApiError> {
    trace!("Entering sign_out function");
    session::delete_session(&state.db, &user.token)
        .await
        .map_err(AuthError::from)?;

    info!("User {} signed out", user.user_id);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(ApiResponse::ok((), "Signed out successfully")),
    ))
}

/// The user behind the current session
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionResponse>),
        (status = 401, description = "Not signed in or session expired", body = ErrorResponse)
    )
)]
#[instrument(skip(user), fields(user_id = user.user_id))]
pub async fn get_session(user: AuthUser) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let response = SessionResponse {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
        role: user.role,
        token: None,
    };
    (StatusCode::OK, Json(ApiResponse::ok(response, "Session is active")))
}
