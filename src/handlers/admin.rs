use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use common::CenterDetail;
use listing::centers::{self, CenterChanges, NewCenter};
use model::entities::{center_image, dialysis_center, lead, state as state_entity};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, Capability};
use crate::helpers::errors::{bad_request, from_listing, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Fields for a new center
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCenterRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Derived from name and town when omitted
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub town: String,
    /// State name or slug
    pub state: String,
    pub sector: Option<String>,
    pub tel: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub doctor_in_charge: Option<String>,
    pub services: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub featured: bool,
}

impl From<CreateCenterRequest> for NewCenter {
    fn from(request: CreateCenterRequest) -> Self {
        NewCenter {
            name: request.name,
            slug: request.slug,
            address: request.address,
            town: request.town,
            state: request.state,
            sector: request.sector,
            tel: request.tel,
            phone: request.phone,
            email: request.email,
            website: request.website,
            doctor_in_charge: request.doctor_in_charge,
            services: request.services,
            latitude: request.latitude,
            longitude: request.longitude,
            featured: request.featured,
        }
    }
}

/// Partial center update. Omitted fields stay unchanged; the slug is fixed.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCenterRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub town: Option<String>,
    pub state: Option<String>,
    pub sector: Option<String>,
    pub tel: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub doctor_in_charge: Option<String>,
    pub services: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub featured: Option<bool>,
}

/// Directory totals shown in the admin area
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AdminSummary {
    pub user_name: String,
    pub states: u64,
    pub centers: u64,
    pub featured_centers: u64,
    pub active_images: u64,
    pub leads: u64,
}

/// Landing data for any signed-in user
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DashboardPage {
    pub user_name: String,
    pub email: String,
    pub can_view_admin: bool,
}

fn validation_error(err: validator::ValidationErrors) -> ApiError {
    bad_request(format!("Invalid request: {}", err))
}

/// Create a center
#[utoipa::path(
    post,
    path = "/api/admin/centers",
    tag = "admin",
    request_body = CreateCenterRequest,
    responses(
        (status = 201, description = "Center created", body = ApiResponse<CenterDetail>),
        (status = 400, description = "Invalid fields or unknown state", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 409, description = "Slug already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user, request), fields(user_id = user.user_id))]
pub async fn create_center(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateCenterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CenterDetail>>), ApiError> {
    trace!("Entering create_center function");
    user.require(Capability::ManageCenters)?;
    request.validate().map_err(validation_error)?;

    let created = centers::create_center(&state.db, request.into())
        .await
        .map_err(from_listing)?;

    state.cache.invalidate_all();
    info!("Center {} created by user {}", created.id, user.user_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(created, "Center created successfully")),
    ))
}

/// Update a center
#[utoipa::path(
    put,
    path = "/api/admin/centers/{id}",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Center id")
    ),
    request_body = UpdateCenterRequest,
    responses(
        (status = 200, description = "Center updated", body = ApiResponse<CenterDetail>),
        (status = 400, description = "Invalid fields or unknown state", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Center not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user, request), fields(user_id = user.user_id))]
pub async fn update_center(
    State(state): State<AppState>,
    user: AuthUser,
    Path(center_id): Path<String>,
    Json(request): Json<UpdateCenterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CenterDetail>>), ApiError> {
    trace!("Entering update_center function");
    user.require(Capability::ManageCenters)?;
    request.validate().map_err(validation_error)?;

    let updated = centers::update_center(
        &state.db,
        &center_id,
        CenterChanges {
            name: request.name,
            address: request.address,
            town: request.town,
            state: request.state,
            sector: request.sector,
            tel: request.tel,
            phone: request.phone,
            email: request.email,
            website: request.website,
            doctor_in_charge: request.doctor_in_charge,
            services: request.services,
            latitude: request.latitude,
            longitude: request.longitude,
            featured: request.featured,
        },
    )
    .await
    .map_err(from_listing)?;

    state.cache.invalidate_all();
    Ok((StatusCode::OK, Json(ApiResponse::ok(updated, "Center updated successfully"))))
}

async fn admin_summary(state: &AppState, user: &AuthUser) -> Result<AdminSummary, sea_orm::DbErr> {
    Ok(AdminSummary {
        user_name: user.name.clone(),
        states: state_entity::Entity::find().count(&state.db).await?,
        centers: dialysis_center::Entity::find().count(&state.db).await?,
        featured_centers: dialysis_center::Entity::find()
            .filter(dialysis_center::Column::Featured.eq(true))
            .count(&state.db)
            .await?,
        active_images: center_image::Entity::find()
            .filter(center_image::Column::IsActive.eq(true))
            .count(&state.db)
            .await?,
        leads: lead::Entity::find().count(&state.db).await?,
    })
}

/// Admin area page data
///
/// Super admins get directory totals. Other signed-in users are sent to
/// `/dashboard`, anonymous visitors to `/sign-in`.
#[instrument(skip(state, user))]
pub async fn admin_area(State(state): State<AppState>, user: Option<AuthUser>) -> Response {
    trace!("Entering admin_area function");
    let Some(user) = user else {
        debug!("Anonymous visit to /admin");
        return Redirect::to("/sign-in").into_response();
    };
    if !user.can(Capability::ViewAdminArea) {
        debug!("User {} ({:?}) redirected to dashboard", user.user_id, user.role);
        return Redirect::to("/dashboard").into_response();
    }

    match admin_summary(&state, &user).await {
        Ok(summary) => {
            (StatusCode::OK, Json(ApiResponse::ok(summary, "Admin summary"))).into_response()
        }
        Err(e) => from_listing(e.into()).into_response(),
    }
}

/// Dashboard page data for any signed-in user
#[instrument(skip(user))]
pub async fn dashboard(user: Option<AuthUser>) -> Response {
    let Some(user) = user else {
        return Redirect::to("/sign-in").into_response();
    };
    if !user.can(Capability::ViewDashboard) {
        return Redirect::to("/sign-in").into_response();
    }

    let page = DashboardPage {
        can_view_admin: user.can(Capability::ViewAdminArea),
        user_name: user.name,
        email: user.email,
    };
    (StatusCode::OK, Json(ApiResponse::ok(page, "Dashboard"))).into_response()
}
