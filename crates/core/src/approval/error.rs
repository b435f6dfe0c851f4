//! Approval error types.

use tally_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use super::types::PendingStatus;
use crate::ledger::LedgerError;
use crate::store::StoreError;

/// Errors that can occur while reviewing staged items.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// The staged item does not exist for this owner.
    #[error("Pending transaction not found: {0}")]
    NotFound(Uuid),

    /// Invalid status transition attempted.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: PendingStatus,
        /// Attempted target status.
        to: PendingStatus,
    },

    /// Only pending items can be edited.
    #[error("Pending transaction is {0} and can no longer be edited")]
    NotEditable(PendingStatus),

    /// Materializing the ledger transaction failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The datastore collaborator failed.
    #[error("Datastore error: {0}")]
    Store(#[from] StoreError),
}

impl ApprovalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PENDING_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::NotEditable(_) => "PENDING_NOT_EDITABLE",
            Self::Ledger(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidTransition { .. } | Self::NotEditable(_) => 409,
            Self::Ledger(e) => e.http_status_code(),
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<ApprovalError> for AppError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::NotFound(_) => Self::NotFound(err.to_string()),
            ApprovalError::InvalidTransition { .. } | ApprovalError::NotEditable(_) => {
                Self::Conflict(err.to_string())
            }
            ApprovalError::Ledger(e) => e.into(),
            ApprovalError::Store(e) => e.into(),
        }
    }
}
