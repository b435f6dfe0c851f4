//! Notification delivery.

use async_trait::async_trait;
use reqwest::Client;
use tally_core::notify::{Notification, Notifier, NotifyError};
use tracing::info;

use crate::error::notify_transport;

/// Posts each notification as JSON to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    /// Creates a notifier posting to `url`.
    #[must_use]
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .map_err(|e| notify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Delivery(format!("webhook returned {status}")));
        }
        Ok(())
    }
}

/// Writes notifications to the log. Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            owner_id = %notification.owner_id,
            budget_id = ?notification.budget_id,
            title = %notification.title,
            url = ?notification.url,
            "{}",
            notification.body
        );
        Ok(())
    }
}
