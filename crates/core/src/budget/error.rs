//! Budget error types.

use chrono::NaiveDate;
use tally_shared::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Budget-related errors.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Unknown IANA timezone in configuration.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Unknown weekday name in configuration.
    #[error("Invalid week start: {0}")]
    InvalidWeekStart(String),

    /// The period window around a date is not representable.
    #[error("Budget period out of range around {0}")]
    PeriodOutOfRange(NaiveDate),

    /// The datastore collaborator failed.
    #[error("Datastore error: {0}")]
    Store(#[from] StoreError),
}

impl BudgetError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTimezone(_) => "INVALID_TIMEZONE",
            Self::InvalidWeekStart(_) => "INVALID_WEEK_START",
            Self::PeriodOutOfRange(_) => "PERIOD_OUT_OF_RANGE",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidTimezone(_) | Self::InvalidWeekStart(_) | Self::PeriodOutOfRange(_) => {
                500
            }
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::Store(e) => e.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}
