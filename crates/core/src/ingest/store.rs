//! Datastore collaborators for the staging area and mailbox watermarks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tally_shared::types::{OwnerId, PendingTransactionId};

use super::types::Category;
use crate::approval::PendingTransaction;
use crate::scheduler::MailboxSyncState;
use crate::store::StoreError;

/// The pending-transaction staging area.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Inserts a staged row, or overwrites the existing row with the same
    /// `(owner_id, source_message_id)` while it is still pending.
    ///
    /// Returns false if the existing row is already approved or rejected and was left alone.
    async fn upsert_pending(&self, pending: &PendingTransaction) -> Result<bool, StoreError>;

    /// Lists an owner's pending rows, newest `occurred_at` first, then newest `created_at`.
    async fn list_pending(&self, owner_id: OwnerId)
    -> Result<Vec<PendingTransaction>, StoreError>;

    /// Fetches the owner's rows among `ids` in one read, whatever their status.
    async fn find_pending(
        &self,
        owner_id: OwnerId,
        ids: &[PendingTransactionId],
    ) -> Result<Vec<PendingTransaction>, StoreError>;

    /// Point lookup of a staged row.
    async fn get_pending(
        &self,
        owner_id: OwnerId,
        id: PendingTransactionId,
    ) -> Result<Option<PendingTransaction>, StoreError>;

    /// Lists the categories the extractor may choose from.
    async fn list_categories(&self, owner_id: OwnerId) -> Result<Vec<Category>, StoreError>;
}

/// Mailbox sync schedules and watermarks.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    /// Lists the state of every connected mailbox.
    async fn list_sync_states(&self) -> Result<Vec<MailboxSyncState>, StoreError>;

    /// Fetches one owner's state.
    async fn get_sync_state(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<MailboxSyncState>, StoreError>;

    /// Moves the owner's watermark to `at`.
    async fn advance_watermark(
        &self,
        owner_id: OwnerId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
