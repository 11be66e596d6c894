use axum::{http::StatusCode, response::Json};
use listing::ListingError;
use tracing::error;

use crate::schemas::ErrorResponse;

/// Error half of every JSON handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

pub fn not_found(what: &str, key: &str) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("{} '{}' not found", what, key),
    )
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "INVALID_INPUT", message)
}

/// Maps a service error onto a status code. Database details are logged,
/// never returned.
pub fn from_listing(err: ListingError) -> ApiError {
    match err {
        ListingError::NotFound { entity, key } => not_found(entity, &key),
        ListingError::InvalidInput(message) => bad_request(message),
        ListingError::Conflict(message) => api_error(StatusCode::CONFLICT, "CONFLICT", message),
        ListingError::Database(db_error) => {
            error!("Database error: {}", db_error);
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Internal server error",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_errors_map_to_status() {
        let (status, body) = from_listing(ListingError::not_found("Center", "abc"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Center 'abc' not found");
        assert!(!body.success);

        let (status, _) = from_listing(ListingError::Conflict("taken".into()));
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = from_listing(ListingError::Database(sea_orm::DbErr::Custom(
            "connection reset".into(),
        )));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.contains("connection reset"));
    }
}
