//! Ledger error types.

use rust_decimal::Decimal;
use tally_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount must be strictly positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// A stored row points at both an asset and a liability.
    #[error("Transaction cannot be linked to both an asset and a liability")]
    AmbiguousAccount,

    // ========== Lookup Errors ==========
    /// Transaction not found (or not owned by the caller).
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    // ========== Datastore Errors ==========
    /// The datastore collaborator failed.
    #[error("Datastore error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::AmbiguousAccount => "AMBIGUOUS_ACCOUNT",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount(_) | Self::AmbiguousAccount => 400,
            Self::TransactionNotFound(_) => 404,
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount(_) | LedgerError::AmbiguousAccount => {
                Self::Validation(err.to_string())
            }
            LedgerError::TransactionNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InvalidAmount(dec!(0)).error_code(), "INVALID_AMOUNT");
        assert_eq!(
            LedgerError::TransactionNotFound(Uuid::nil()).error_code(),
            "TRANSACTION_NOT_FOUND"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::InvalidAmount(dec!(-1)).http_status_code(), 400);
        assert_eq!(
            LedgerError::TransactionNotFound(Uuid::nil()).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::Store(StoreError::Backend("down".into())).http_status_code(),
            500
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            LedgerError::InvalidAmount(dec!(-2.50)).to_string(),
            "Amount must be positive, got -2.50"
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::TransactionNotFound(Uuid::nil()).into();
        assert_eq!(app.status_code(), 404);
        let app: AppError = LedgerError::InvalidAmount(dec!(0)).into();
        assert_eq!(app.status_code(), 400);
    }
}
