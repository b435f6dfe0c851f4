//! Ingestion error types.

use tally_shared::AppError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by the mailbox provider collaborator.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The credential was rejected (expired, revoked, wrong scope).
    #[error("Mailbox authorization failed: {0}")]
    Unauthorized(String),

    /// The provider throttled the call.
    #[error("Mailbox provider rate limit exceeded")]
    RateLimited,

    /// The provider returned an error status.
    #[error("Mailbox provider error ({status}): {message}")]
    Http {
        /// HTTP status.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// The call did not complete.
    #[error("Mailbox transport error: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("Mailbox response could not be decoded: {0}")]
    Decode(String),

    /// The call exceeded its timeout.
    #[error("Mailbox provider timed out")]
    Timeout,
}

/// Errors returned by the extraction service collaborator.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The service returned an error.
    #[error("Extraction service error: {0}")]
    Service(String),

    /// The service returned no usable text.
    #[error("Extraction service returned an empty response")]
    EmptyResponse,

    /// The call exceeded its timeout.
    #[error("Extraction service timed out")]
    Timeout,
}

/// Errors that abort a fetch or staging run for one owner.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No usable mailbox credential. Fatal for this owner's run only.
    #[error("Mailbox not authorized: {0}")]
    Unauthorized(String),

    /// The owner has no connected mailbox.
    #[error("No mailbox connected")]
    NotConnected,

    /// The mailbox provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The extraction service failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The datastore collaborator failed.
    #[error("Datastore error: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) | Self::Provider(ProviderError::Unauthorized(_)) => {
                "MAILBOX_UNAUTHORIZED"
            }
            Self::NotConnected => "MAILBOX_NOT_CONNECTED",
            Self::Provider(ProviderError::Timeout) | Self::Extract(ExtractError::Timeout) => {
                "EXTERNAL_SERVICE_TIMEOUT"
            }
            Self::Provider(_) => "MAILBOX_PROVIDER_ERROR",
            Self::Extract(_) => "EXTRACTION_ERROR",
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) | Self::Provider(ProviderError::Unauthorized(_)) => 401,
            Self::NotConnected => 409,
            Self::Provider(ProviderError::Timeout) | Self::Extract(ExtractError::Timeout) => 504,
            Self::Provider(_) | Self::Extract(_) => 502,
            Self::Store(e) => e.http_status_code(),
        }
    }

    /// Returns true if the error means the credential must be reconnected.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::Provider(ProviderError::Unauthorized(_))
        )
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Unauthorized(_) | IngestError::Provider(ProviderError::Unauthorized(_)) => {
                Self::Unauthorized(err.to_string())
            }
            IngestError::NotConnected => Self::Conflict(err.to_string()),
            IngestError::Provider(ProviderError::Timeout)
            | IngestError::Extract(ExtractError::Timeout) => Self::Timeout(err.to_string()),
            IngestError::Provider(_) | IngestError::Extract(_) => {
                Self::ExternalService(err.to_string())
            }
            IngestError::Store(e) => e.into(),
        }
    }
}
