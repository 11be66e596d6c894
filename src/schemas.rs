use common::{
    CenterDetail, CenterImageDto, CenterSummary, CentersByState, LeadDto, LocationKind, MapMarker,
    NeighboringLocation, StateSummary, TownSummary,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::auth::invitation::InvitationVerifier;
use crate::config::Settings;
use crate::content::ContentStore;
use crate::rate_limit::RateLimiter;
use crate::storage::ObjectStorage;

pub use common::ApiResponse;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for directory-wide listings
    pub cache: Cache<String, CachedData>,
    /// Limiter for public lead submissions
    pub rate_limiter: RateLimiter,
    /// Where uploaded images go
    pub storage: Arc<dyn ObjectStorage>,
    /// Blog posts loaded at startup
    pub content: Arc<ContentStore>,
    /// Sign-up invitation check
    pub invitations: Arc<dyn InvitationVerifier>,
    pub settings: Arc<Settings>,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    States(Vec<StateSummary>),
    MapMarkers(Vec<MapMarker>),
}

pub const STATES_CACHE_KEY: &str = "states";
pub const MAP_CACHE_KEY: &str = "centers-map";

/// Query parameters for the state listing
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct CentersByStateQuery {
    /// State name or slug (required)
    pub state: Option<String>,
    /// Optional town name or slug
    pub town: Option<String>,
}

/// Query parameters for neighboring locations
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct NeighboringQuery {
    /// State name or slug (required)
    pub state: Option<String>,
    /// Current town; when present, sibling towns are returned instead of states
    pub city: Option<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
    /// Store behind the lead rate limiter: `redis` or `memory`
    pub rate_limit_store: String,
    /// Published blog posts loaded at startup
    pub blog_posts: usize,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::locations::get_states,
        crate::handlers::locations::get_centers_by_state,
        crate::handlers::locations::get_neighboring_locations,
        crate::handlers::centers::get_centers,
        crate::handlers::centers::get_centers_map,
        crate::handlers::centers::get_center,
        crate::handlers::images::reorder_images,
        crate::handlers::images::upload_image,
        crate::handlers::images::deactivate_image,
        crate::handlers::leads::create_lead,
        crate::handlers::leads::get_leads,
        crate::handlers::admin::create_center,
        crate::handlers::admin::update_center,
        crate::handlers::auth::sign_up,
        crate::handlers::auth::sign_in,
        crate::handlers::auth::sign_out,
        crate::handlers::auth::get_session,
        crate::handlers::pages::state_page,
        crate::handlers::pages::town_page,
        crate::handlers::pages::center_page,
        crate::handlers::blog::get_posts,
        crate::handlers::blog::get_post,
    ),
    components(
        schemas(
            ApiResponse<Vec<StateSummary>>,
            ApiResponse<CentersByState>,
            ApiResponse<CenterDetail>,
            ApiResponse<Vec<LeadDto>>,
            ApiResponse<Vec<crate::handlers::images::ImageResponse>>,
            ErrorResponse,
            HealthResponse,
            CentersByStateQuery,
            NeighboringQuery,
            StateSummary,
            TownSummary,
            CenterSummary,
            CenterDetail,
            CenterImageDto,
            CentersByState,
            MapMarker,
            NeighboringLocation,
            LocationKind,
            LeadDto,
            crate::handlers::images::ReorderImagesRequest,
            crate::handlers::images::ImageResponse,
            crate::handlers::leads::CreateLeadRequest,
            crate::handlers::leads::LeadCreated,
            crate::handlers::admin::CreateCenterRequest,
            crate::handlers::admin::UpdateCenterRequest,
            crate::handlers::admin::AdminSummary,
            crate::handlers::admin::DashboardPage,
            crate::handlers::auth::SignUpRequest,
            crate::handlers::auth::SignInRequest,
            crate::handlers::auth::SessionResponse,
            crate::handlers::pages::StatePage,
            crate::handlers::pages::TownPage,
            crate::handlers::pages::CenterPage,
            crate::handlers::blog::PostSummary,
            crate::handlers::blog::PostResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "locations", description = "States, towns and neighboring locations"),
        (name = "centers", description = "Dialysis center listings"),
        (name = "images", description = "Center image management"),
        (name = "leads", description = "Contact requests"),
        (name = "admin", description = "Directory administration"),
        (name = "auth", description = "Sign-up, sign-in and sessions"),
        (name = "pages", description = "Page data for the public site"),
        (name = "blog", description = "Blog posts"),
    ),
    info(
        title = "Dialysis Directory API",
        description = "Directory of dialysis centers in Malaysia",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
