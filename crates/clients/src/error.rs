//! Client construction errors and HTTP failure mapping.

use tally_core::ingest::{ExtractError, ProviderError};
use tally_core::notify::NotifyError;
use thiserror::Error;

/// Errors raised while constructing a client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// A configured URL is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Maps a transport failure onto the mailbox error taxonomy.
pub(crate) fn provider_transport(err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::Decode(err.to_string())
    } else {
        ProviderError::Transport(err.to_string())
    }
}

/// Maps an error status from the mailbox provider.
pub(crate) fn provider_status(status: reqwest::StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized(body),
        429 => ProviderError::RateLimited,
        code => ProviderError::Http {
            status: code,
            message: body,
        },
    }
}

pub(crate) fn extract_transport(err: &reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::Timeout
    } else {
        ExtractError::Service(err.to_string())
    }
}

pub(crate) fn notify_transport(err: &reqwest::Error) -> NotifyError {
    if err.is_timeout() {
        NotifyError::Timeout
    } else {
        NotifyError::Delivery(err.to_string())
    }
}
