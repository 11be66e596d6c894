//! Page data for the public site. Each endpoint bundles everything one page
//! renders so the front end needs a single request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::{
    slugify, CenterDetail, CenterSummary, CentersByState, NeighboringLocation, StateSummary,
    TownSummary,
};
use listing::{centers, locations, sitemap::center_path};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use utoipa::ToSchema;

use crate::handlers::locations::cached_states;
use crate::helpers::errors::{from_listing, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatePage {
    pub state: StateSummary,
    pub towns: Vec<TownSummary>,
    pub centers: CentersByState,
    /// Other states with centers
    pub neighbors: Vec<NeighboringLocation>,
    pub canonical_url: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TownPage {
    pub state: StateSummary,
    pub town: TownSummary,
    pub centers: CentersByState,
    /// Other towns of the same state
    pub neighbors: Vec<NeighboringLocation>,
    pub canonical_url: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CenterPage {
    pub center: CenterDetail,
    /// Public URLs of the active images, in display order
    pub image_urls: Vec<String>,
    /// Other centers in the same town
    pub nearby: Vec<CenterSummary>,
    pub canonical_url: String,
    pub og_image_url: String,
}

async fn resolve_state(state: &AppState, name_or_slug: &str) -> Result<StateSummary, ApiError> {
    let wanted = slugify(name_or_slug);
    cached_states(state)
        .await?
        .into_iter()
        .find(|s| s.slug == wanted)
        .ok_or_else(|| not_found("State", name_or_slug))
}

/// State page data
#[utoipa::path(
    get,
    path = "/api/pages/states/{state}",
    tag = "pages",
    params(
        ("state" = String, Path, description = "State slug")
    ),
    responses(
        (status = 200, description = "Page data", body = ApiResponse<StatePage>),
        (status = 404, description = "Unknown state", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn state_page(
    State(state): State<AppState>,
    Path(state_slug): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<StatePage>>), ApiError> {
    trace!("Entering state_page function");
    let summary = resolve_state(&state, &state_slug).await?;

    let towns = locations::towns_in_state(&state.db, summary.id)
        .await
        .map_err(from_listing)?;
    let centers = locations::centers_by_state(&state.db, &summary.name, None)
        .await
        .map_err(from_listing)?;
    let neighbors = locations::neighboring_locations(&state.db, &summary.name, None)
        .await
        .map_err(from_listing)?;

    debug!("State page {} with {} towns", summary.slug, towns.len());
    let page = StatePage {
        canonical_url: state.settings.absolute_url(&format!("/{}", summary.slug)),
        state: summary,
        towns,
        centers,
        neighbors,
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "State page"))))
}

/// Town page data
#[utoipa::path(
    get,
    path = "/api/pages/states/{state}/{city}",
    tag = "pages",
    params(
        ("state" = String, Path, description = "State slug"),
        ("city" = String, Path, description = "Town slug")
    ),
    responses(
        (status = 200, description = "Page data", body = ApiResponse<TownPage>),
        (status = 404, description = "Unknown state or town", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn town_page(
    State(state): State<AppState>,
    Path((state_slug, city)): Path<(String, String)>,
) -> Result<(StatusCode, Json<ApiResponse<TownPage>>), ApiError> {
    trace!("Entering town_page function");
    let summary = resolve_state(&state, &state_slug).await?;

    let city_slug = slugify(&city);
    let town = locations::towns_in_state(&state.db, summary.id)
        .await
        .map_err(from_listing)?
        .into_iter()
        .find(|t| t.slug == city_slug)
        .ok_or_else(|| not_found("Town", &city))?;

    let centers = locations::centers_by_state(&state.db, &summary.name, Some(&town.name))
        .await
        .map_err(from_listing)?;
    let neighbors = locations::neighboring_locations(&state.db, &summary.name, Some(&town.name))
        .await
        .map_err(from_listing)?;

    let page = TownPage {
        canonical_url: state
            .settings
            .absolute_url(&format!("/{}/{}", summary.slug, town.slug)),
        state: summary,
        town,
        centers,
        neighbors,
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Town page"))))
}

/// Center detail page data
///
/// Also serves the modal view opened from a listing.
#[utoipa::path(
    get,
    path = "/api/pages/centers/{key}",
    tag = "pages",
    params(
        ("key" = String, Path, description = "Center slug or id")
    ),
    responses(
        (status = 200, description = "Page data", body = ApiResponse<CenterPage>),
        (status = 404, description = "Center not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn center_page(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<CenterPage>>), ApiError> {
    trace!("Entering center_page function");
    let center = centers::find_center(&state.db, &key)
        .await
        .map_err(from_listing)?
        .ok_or_else(|| not_found("Center", &key))?;

    let nearby = locations::centers_by_state(&state.db, &center.state, Some(&center.town))
        .await
        .map_err(from_listing)?
        .centers
        .into_iter()
        .filter(|c| c.id != center.id)
        .collect();

    let image_urls = center
        .images
        .iter()
        .map(|image| state.storage.public_url(&image.storage_key))
        .collect();

    let page = CenterPage {
        canonical_url: state.settings.absolute_url(&center_path(&center.slug)),
        og_image_url: state
            .settings
            .absolute_url(&format!("/api/og/centers/{}", center.slug)),
        image_urls,
        nearby,
        center,
    };
    Ok((StatusCode::OK, Json(ApiResponse::ok(page, "Center page"))))
}
