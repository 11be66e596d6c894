use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use axum_valid::Valid;
use common::LeadDto;
use listing::leads::{self, NewLead};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, Capability};
use crate::helpers::errors::{from_listing, ApiError};
use crate::rate_limit::client_ip;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Contact request from the public site
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
    /// Center the request is about, if any
    pub center_id: Option<String>,
}

/// Identifier of the stored lead
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LeadCreated {
    pub id: i32,
}

/// Submit a contact request
///
/// Limited to 5 submissions per source address per hour.
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Lead stored", body = ApiResponse<LeadCreated>),
        (status = 400, description = "Invalid request or unknown center", body = ErrorResponse),
        (status = 429, description = "Too many submissions", body = ErrorResponse)
    )
)]
#[instrument(skip(state, headers, request))]
pub async fn create_lead(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Valid(Json(request)): Valid<Json<CreateLeadRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<LeadCreated>>), ApiError> {
    trace!("Entering create_lead function");
    let source_ip = client_ip(
        &headers,
        connect_info.map(|info| info.0),
        state.settings.trust_proxy_headers,
    );

    let lead = leads::create_lead(
        &state.db,
        NewLead {
            name: request.name,
            phone: request.phone,
            email: request.email,
            message: request.message,
            center_id: request.center_id.filter(|id| !id.trim().is_empty()),
            source_ip,
        },
    )
    .await
    .map_err(from_listing)?;

    info!("Lead {} received", lead.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(LeadCreated { id: lead.id }, "Thank you, we will be in touch")),
    ))
}

/// List leads, newest first
#[utoipa::path(
    get,
    path = "/api/admin/leads",
    tag = "leads",
    responses(
        (status = 200, description = "Leads retrieved successfully", body = ApiResponse<Vec<LeadDto>>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    )
)]
#[instrument(skip(state, user), fields(user_id = user.user_id))]
pub async fn get_leads(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<ApiResponse<Vec<LeadDto>>>), ApiError> {
    trace!("Entering get_leads function");
    user.require(Capability::ViewLeads)?;

    let leads = leads::list_leads(&state.db).await.map_err(from_listing)?;
    debug!("Returning {} leads", leads.len());
    Ok((StatusCode::OK, Json(ApiResponse::ok(leads, "Leads retrieved successfully"))))
}
