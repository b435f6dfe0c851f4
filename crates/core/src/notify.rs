//! Notification collaborator.
//!
//! Delivery is fire-and-forget from the caller's point of view: a failed send is logged and
//! never rolls back the mutation that triggered it.

use async_trait::async_trait;
use serde::Serialize;
use tally_shared::types::{BudgetId, OwnerId};
use thiserror::Error;

/// A message to deliver to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Recipient.
    pub owner_id: OwnerId,
    /// Short title.
    pub title: String,
    /// Message text.
    pub body: String,
    /// Budget the message is about, for routing.
    pub budget_id: Option<BudgetId>,
    /// Deep link.
    pub url: Option<String>,
}

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The delivery channel rejected or failed the message.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// The delivery channel did not answer in time.
    #[error("Notification delivery timed out")]
    Timeout,
}

/// Delivers notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
