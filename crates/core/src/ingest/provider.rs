//! Mailbox provider collaborators and credential handling.
//!
//! Token refresh is explicit: before each batch of provider calls the credential is checked,
//! refreshed if it expires within the configured margin, and the rotated credential is
//! persisted before any call uses it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tally_shared::types::OwnerId;
use tracing::{debug, info};

use super::error::{IngestError, ProviderError};
use super::types::{CandidateMeta, MailboxCredential, MessageBody, MessagePage};
use crate::store::StoreError;

/// Message search and fetch against the user's mailbox.
#[async_trait]
pub trait MailboxProvider: Send + Sync {
    /// Lists message ids matching `query`.
    async fn list_messages(
        &self,
        credential: &MailboxCredential,
        query: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<MessagePage, ProviderError>;

    /// Fetches headers and snippet of one message.
    async fn get_metadata(
        &self,
        credential: &MailboxCredential,
        message_id: &str,
    ) -> Result<CandidateMeta, ProviderError>;

    /// Fetches and decodes the full body of one message.
    async fn get_message(
        &self,
        credential: &MailboxCredential,
        message_id: &str,
    ) -> Result<MessageBody, ProviderError>;
}

/// Mints a new access token from a refresh token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Returns the rotated credential.
    async fn refresh(&self, credential: &MailboxCredential)
    -> Result<MailboxCredential, ProviderError>;
}

/// Opaque per-owner credential persistence.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Loads the owner's credential, if a mailbox is connected.
    async fn load_credential(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<MailboxCredential>, StoreError>;

    /// Persists a rotated credential.
    async fn save_credential(
        &self,
        owner_id: OwnerId,
        credential: &MailboxCredential,
    ) -> Result<(), StoreError>;
}

/// Authorized, time-bounded access to one provider.
pub struct MailboxAccess {
    provider: Arc<dyn MailboxProvider>,
    refresher: Arc<dyn TokenRefresher>,
    credentials: Arc<dyn CredentialStore>,
    request_timeout: Duration,
    refresh_margin: chrono::Duration,
}

impl MailboxAccess {
    /// Creates a new access wrapper.
    #[must_use]
    pub fn new(
        provider: Arc<dyn MailboxProvider>,
        refresher: Arc<dyn TokenRefresher>,
        credentials: Arc<dyn CredentialStore>,
        request_timeout: Duration,
        refresh_margin: chrono::Duration,
    ) -> Self {
        Self {
            provider,
            refresher,
            credentials,
            request_timeout,
            refresh_margin,
        }
    }

    /// The underlying provider.
    #[must_use]
    pub fn provider(&self) -> &dyn MailboxProvider {
        self.provider.as_ref()
    }

    /// Returns a credential valid for at least the refresh margin.
    ///
    /// # Errors
    ///
    /// - `IngestError::NotConnected` if the owner has no credential
    /// - `IngestError::Unauthorized` if the token is expiring and cannot be refreshed
    pub async fn authorize(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> Result<MailboxCredential, IngestError> {
        let credential = self
            .credentials
            .load_credential(owner_id)
            .await?
            .ok_or(IngestError::NotConnected)?;

        if !credential.expires_within(now, self.refresh_margin) {
            return Ok(credential);
        }

        if credential.refresh_token.is_none() {
            return Err(IngestError::Unauthorized(
                "access token expired and no refresh token is stored".to_string(),
            ));
        }

        debug!(owner_id = %owner_id, "Refreshing mailbox access token");
        let refreshed = self
            .call(self.refresher.refresh(&credential))
            .await
            .map_err(|e| match e {
                ProviderError::Unauthorized(msg) => IngestError::Unauthorized(msg),
                other => IngestError::Provider(other),
            })?;

        // Providers may omit the refresh token on rotation
        let refreshed = MailboxCredential {
            refresh_token: refreshed.refresh_token.or(credential.refresh_token),
            ..refreshed
        };
        self.credentials.save_credential(owner_id, &refreshed).await?;
        info!(owner_id = %owner_id, "Mailbox access token rotated");

        Ok(refreshed)
    }

    /// Runs one provider call under the request timeout.
    ///
    /// # Errors
    ///
    /// Returns the call's own error, or `ProviderError::Timeout`.
    pub async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, ProviderError>> + Send,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.request_timeout, fut)
            .await
            .map_err(|_| ProviderError::Timeout)?
    }
}
