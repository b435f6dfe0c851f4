//! Message search and fetch over the Gmail REST API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tally_core::ingest::{
    CandidateMeta, MailboxCredential, MailboxProvider, MessageBody, MessagePage, ProviderError,
};
use tracing::debug;

use super::mime::MessagePart;
use crate::error::{ClientError, provider_status, provider_transport};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageResponse {
    id: String,
    #[serde(default)]
    snippet: String,
    /// Milliseconds since the epoch, as a string.
    internal_date: Option<String>,
    #[serde(default)]
    payload: MessagePart,
}

impl MessageResponse {
    fn received_at(&self) -> Option<DateTime<Utc>> {
        self.internal_date
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis)
    }

    fn subject(&self) -> String {
        self.payload.header("Subject").unwrap_or_default().to_string()
    }
}

/// Gmail mailbox provider.
#[derive(Debug, Clone)]
pub struct GmailProvider {
    client: Client,
    messages_url: Url,
}

impl GmailProvider {
    /// Creates a provider against `api_base_url` (e.g. `https://gmail.googleapis.com/gmail/v1`).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the base URL is not an absolute URL that can carry a path.
    pub fn new(client: Client, api_base_url: &str) -> Result<Self, ClientError> {
        let raw = format!("{}/users/me/messages", api_base_url.trim_end_matches('/'));
        let messages_url = Url::parse(&raw)
            .map_err(|e| ClientError::Config(format!("mailbox api_base_url {api_base_url:?}: {e}")))?;
        if messages_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "mailbox api_base_url {api_base_url:?} cannot carry a path"
            )));
        }
        Ok(Self {
            client,
            messages_url,
        })
    }

    /// URL of one message. The id is percent-encoded as a single path segment.
    fn message_url(&self, message_id: &str) -> Result<Url, ProviderError> {
        if message_id.is_empty() || message_id == "." || message_id == ".." {
            return Err(ProviderError::Http {
                status: 400,
                message: format!("invalid message id {message_id:?}"),
            });
        }
        let mut url = self.messages_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::Transport("message URL cannot carry a path".to_string()))?
            .push(message_id);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &MailboxCredential,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&credential.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| provider_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(provider_status(status, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MailboxProvider for GmailProvider {
    async fn list_messages(
        &self,
        credential: &MailboxCredential,
        query: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<MessagePage, ProviderError> {
        let max_results = max_results.to_string();
        let mut params = vec![("q", query), ("maxResults", max_results.as_str())];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let list: ListResponse = self
            .get_json(credential, self.messages_url.clone(), &params)
            .await?;
        debug!(count = list.messages.len(), has_more = list.next_page_token.is_some(), "Listed messages");

        Ok(MessagePage {
            message_ids: list.messages.into_iter().map(|m| m.id).collect(),
            next_page_token: list.next_page_token,
        })
    }

    async fn get_metadata(
        &self,
        credential: &MailboxCredential,
        message_id: &str,
    ) -> Result<CandidateMeta, ProviderError> {
        let url = self.message_url(message_id)?;
        let message: MessageResponse = self
            .get_json(
                credential,
                url,
                &[
                    ("format", "metadata"),
                    ("metadataHeaders", "Subject"),
                    ("metadataHeaders", "From"),
                ],
            )
            .await?;

        Ok(CandidateMeta {
            subject: message.subject(),
            sender: message.payload.header("From").map(str::to_string),
            received_at: message.received_at(),
            snippet: message.snippet,
            message_id: message.id,
        })
    }

    async fn get_message(
        &self,
        credential: &MailboxCredential,
        message_id: &str,
    ) -> Result<MessageBody, ProviderError> {
        let url = self.message_url(message_id)?;
        let message: MessageResponse = self
            .get_json(credential, url, &[("format", "full")])
            .await?;

        let mut text = message.payload.text();
        if text.is_empty() {
            text.clone_from(&message.snippet);
        }

        Ok(MessageBody {
            subject: message.subject(),
            received_at: message.received_at(),
            text,
            message_id: message.id,
        })
    }
}
