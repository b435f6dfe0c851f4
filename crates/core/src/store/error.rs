//! Datastore collaborator errors.

use tally_shared::AppError;
use thiserror::Error;

/// Errors raised by a datastore implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row that must exist does not.
    #[error("row not found: {0}")]
    NotFound(String),

    /// A uniqueness or lock conflict the caller may retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored row could not be mapped onto a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The backend failed (connection, SQL, pool).
    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Corrupt(_) | Self::Backend(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Corrupt(_) | Self::Backend(_) => 500,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            StoreError::Conflict(_) => Self::Conflict(err.to_string()),
            StoreError::Corrupt(_) | StoreError::Backend(_) => Self::Database(err.to_string()),
        }
    }
}
