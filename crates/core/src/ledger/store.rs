//! Datastore collaborator for ledger mutations.
//!
//! Every mutation runs inside a [`LedgerUnit`]: one database transaction in which the rows it
//! touches are locked until `commit`. Dropping a unit without committing rolls it back.

use async_trait::async_trait;
use tally_shared::types::{OwnerId, PendingTransactionId, TransactionId};

use super::balance::BalanceDelta;
use super::types::{Account, AccountRef, Transaction};
use crate::approval::PendingTransaction;
use crate::store::StoreError;

/// Read access to the ledger plus the entry point for units of work.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a unit of work.
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError>;

    /// Point lookup of a transaction, scoped to its owner.
    async fn get_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Lists an owner's transactions, newest first.
    async fn list_transactions(
        &self,
        owner_id: OwnerId,
        limit: u64,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Point lookup of an account, scoped to its owner.
    async fn get_account(
        &self,
        owner_id: OwnerId,
        account: AccountRef,
    ) -> Result<Option<Account>, StoreError>;
}

/// One atomic unit of ledger work.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Inserts a new transaction row.
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Fetches a transaction and locks it against concurrent edits until the unit ends.
    async fn lock_transaction(
        &mut self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Persists new field values for an existing transaction.
    async fn update_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Deletes a transaction; returns false if it did not exist.
    async fn delete_transaction(
        &mut self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<bool, StoreError>;

    /// Atomically adds `delta` to the account's `current_value`.
    ///
    /// Returns false, without failing the unit, if the account does not exist for this owner.
    async fn adjust_balance(
        &mut self,
        owner_id: OwnerId,
        delta: &BalanceDelta,
    ) -> Result<bool, StoreError>;

    /// Fetches a staged item and locks it until the unit ends.
    async fn lock_pending(
        &mut self,
        owner_id: OwnerId,
        id: PendingTransactionId,
    ) -> Result<Option<PendingTransaction>, StoreError>;

    /// Persists a staged item's fields and status.
    async fn save_pending(&mut self, pending: &PendingTransaction) -> Result<(), StoreError>;

    /// Commits every change made through this unit.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
