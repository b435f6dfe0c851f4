//! reqwest implementations of Tally's external collaborators.
//!
//! - [`GmailProvider`] and [`OAuthRefresher`] for the mailbox
//! - [`GeminiExtractor`] for the generative extraction service
//! - [`WebhookNotifier`] and [`LogNotifier`] for budget alerts

pub mod error;
pub mod gemini;
pub mod gmail;
pub mod notifier;

pub use error::ClientError;
pub use gemini::GeminiExtractor;
pub use gmail::{GmailProvider, OAuthRefresher};
pub use notifier::{LogNotifier, WebhookNotifier};

use std::time::Duration;

/// Builds the shared HTTP client with a per-request timeout.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .user_agent(concat!("tally/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ClientError::Build)
}
