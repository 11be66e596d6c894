use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::{CenterDetail, CenterSummary, MapMarker};
use listing::{centers, locations};
use tracing::{debug, instrument, trace, warn};

use crate::helpers::errors::{from_listing, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse, MAP_CACHE_KEY};

/// List every center
#[utoipa::path(
    get,
    path = "/api/centers",
    tag = "centers",
    responses(
        (status = 200, description = "Centers retrieved successfully", body = ApiResponse<Vec<CenterSummary>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_centers(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<CenterSummary>>>), ApiError> {
    trace!("Entering get_centers function");
    let centers = locations::all_centers(&state.db).await.map_err(from_listing)?;
    debug!("Returning {} centers", centers.len());
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(centers, "Centers retrieved successfully")),
    ))
}

/// Centers with coordinates, for the map view
#[utoipa::path(
    get,
    path = "/api/centers-map",
    tag = "centers",
    responses(
        (status = 200, description = "Map markers retrieved successfully", body = ApiResponse<Vec<MapMarker>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_centers_map(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<MapMarker>>>), ApiError> {
    trace!("Entering get_centers_map function");
    let markers = match state.cache.get(MAP_CACHE_KEY).await {
        Some(CachedData::MapMarkers(markers)) => markers,
        _ => {
            let markers = locations::centers_for_map(&state.db)
                .await
                .map_err(from_listing)?;
            state
                .cache
                .insert(MAP_CACHE_KEY.to_string(), CachedData::MapMarkers(markers.clone()))
                .await;
            markers
        }
    };

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(markers, "Map markers retrieved successfully")),
    ))
}

/// Get a center by id or slug
#[utoipa::path(
    get,
    path = "/api/centers/{key}",
    tag = "centers",
    params(
        ("key" = String, Path, description = "Center id or slug")
    ),
    responses(
        (status = 200, description = "Center retrieved successfully", body = ApiResponse<CenterDetail>),
        (status = 404, description = "Center not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_center(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<CenterDetail>>), ApiError> {
    trace!("Entering get_center function");
    match centers::find_center(&state.db, &key).await.map_err(from_listing)? {
        Some(center) => Ok((
            StatusCode::OK,
            Json(ApiResponse::ok(center, "Center retrieved successfully")),
        )),
        None => {
            warn!("Center '{}' not found", key);
            Err(not_found("Center", &key))
        }
    }
}
