use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use common::{CentersByState, NeighboringLocation, StateSummary};
use listing::locations;
use tracing::{debug, instrument, trace};

use crate::helpers::errors::{bad_request, from_listing, ApiError};
use crate::schemas::{
    ApiResponse, AppState, CachedData, CentersByStateQuery, ErrorResponse, NeighboringQuery,
    STATES_CACHE_KEY,
};

/// All states with center counts, served from the cache when warm.
pub async fn cached_states(state: &AppState) -> Result<Vec<StateSummary>, ApiError> {
    if let Some(CachedData::States(states)) = state.cache.get(STATES_CACHE_KEY).await {
        trace!("States served from cache");
        return Ok(states);
    }

    let states = locations::states_with_counts(&state.db)
        .await
        .map_err(from_listing)?;
    state
        .cache
        .insert(STATES_CACHE_KEY.to_string(), CachedData::States(states.clone()))
        .await;
    Ok(states)
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| bad_request(format!("The '{}' query parameter is required", name)))
}

/// List states with their center counts
#[utoipa::path(
    get,
    path = "/api/states",
    tag = "locations",
    responses(
        (status = 200, description = "States retrieved successfully", body = ApiResponse<Vec<StateSummary>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_states(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<StateSummary>>>), ApiError> {
    trace!("Entering get_states function");
    let states = cached_states(&state).await?;
    debug!("Returning {} states", states.len());
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(states, "States retrieved successfully")),
    ))
}

/// Centers of a state, optionally narrowed to a town
///
/// An unknown state, or one without centers, gives an empty list.
#[utoipa::path(
    get,
    path = "/api/centers-by-state",
    tag = "locations",
    params(CentersByStateQuery),
    responses(
        (status = 200, description = "Centers retrieved successfully", body = ApiResponse<CentersByState>),
        (status = 400, description = "Missing state parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_centers_by_state(
    State(state): State<AppState>,
    Query(query): Query<CentersByStateQuery>,
) -> Result<(StatusCode, Json<ApiResponse<CentersByState>>), ApiError> {
    trace!("Entering get_centers_by_state function");
    let state_name = required(&query.state, "state")?;

    let result = locations::centers_by_state(&state.db, state_name, query.town.as_deref())
        .await
        .map_err(from_listing)?;

    debug!("Found {} centers for {}", result.total, state_name);
    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(result, "Centers retrieved successfully")),
    ))
}

/// Other towns in the state (with `city`) or other states (without)
#[utoipa::path(
    get,
    path = "/api/neighboring-locations",
    tag = "locations",
    params(NeighboringQuery),
    responses(
        (status = 200, description = "Locations retrieved successfully", body = ApiResponse<Vec<NeighboringLocation>>),
        (status = 400, description = "Missing state parameter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_neighboring_locations(
    State(state): State<AppState>,
    Query(query): Query<NeighboringQuery>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<NeighboringLocation>>>), ApiError> {
    trace!("Entering get_neighboring_locations function");
    let state_name = required(&query.state, "state")?;

    let neighbors = locations::neighboring_locations(&state.db, state_name, query.city.as_deref())
        .await
        .map_err(from_listing)?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(neighbors, "Locations retrieved successfully")),
    ))
}
