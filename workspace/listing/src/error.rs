use thiserror::Error;

/// Error types for the listing service
#[derive(Error, Debug)]
pub enum ListingError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A referenced record does not exist
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    /// The caller supplied input the operation cannot accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The write would violate a uniqueness rule
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ListingError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        ListingError::NotFound {
            entity,
            key: key.into(),
        }
    }
}

/// Type alias for Result with ListingError
pub type Result<T> = std::result::Result<T, ListingError>;
