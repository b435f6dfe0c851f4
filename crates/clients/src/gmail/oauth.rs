//! OAuth2 refresh-token grant.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tally_core::ingest::{MailboxCredential, ProviderError, TokenRefresher};
use tracing::debug;

use crate::error::{provider_status, provider_transport};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Refreshes mailbox access tokens at the provider's token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthRefresher {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl OAuthRefresher {
    /// Creates a refresher for one OAuth client.
    #[must_use]
    pub fn new(client: Client, token_url: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            client,
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

#[async_trait]
impl TokenRefresher for OAuthRefresher {
    async fn refresh(
        &self,
        credential: &MailboxCredential,
    ) -> Result<MailboxCredential, ProviderError> {
        let Some(refresh_token) = credential.refresh_token.as_deref() else {
            return Err(ProviderError::Unauthorized(
                "credential has no refresh token".to_string(),
            ));
        };

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| provider_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // invalid_grant: the user revoked access or the token expired
            if status.as_u16() == 400 && body.contains("invalid_grant") {
                return Err(ProviderError::Unauthorized(body));
            }
            return Err(provider_status(status, body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        debug!(expires_in = ?token.expires_in, rotated = token.refresh_token.is_some(), "Access token refreshed");

        Ok(MailboxCredential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }
}
