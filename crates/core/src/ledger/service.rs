//! Ledger sync engine.
//!
//! Every create, edit and delete runs in one unit of work that also moves the linked
//! account's balance:
//!
//! - create: insert, apply
//! - edit: lock, reverse old, persist, re-read, apply new (even when only the description
//!   changed, and across account changes)
//! - delete: lock, delete, reverse
//!
//! A missing account does not block the mutation. The balance step is skipped and reported
//! as a [`BalanceWarning`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{CategoryId, OwnerId, TransactionId};
use tracing::{info, warn};

use super::balance::BalanceDelta;
use super::error::LedgerError;
use super::store::{LedgerStore, LedgerUnit};
use super::types::{AccountRef, Transaction, TransactionDraft, TransactionKind};
use crate::budget::BudgetMonitor;

/// Default page size for transaction listings.
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// A balance step that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceWarning {
    /// Account the step targeted.
    pub account: AccountRef,
    /// Signed change that was skipped.
    pub delta: Decimal,
    /// Human readable explanation.
    pub message: String,
}

impl BalanceWarning {
    fn missing_account(delta: &BalanceDelta) -> Self {
        Self {
            account: delta.account,
            delta: delta.delta,
            message: format!(
                "Linked account {} was not found; its balance was not updated",
                delta.account
            ),
        }
    }
}

/// Result of a ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerOutcome {
    /// The created, updated or deleted row.
    pub transaction: Transaction,
    /// Balance steps that were skipped.
    pub warnings: Vec<BalanceWarning>,
}

/// Applies transaction mutations and keeps account balances in step.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    monitor: Option<Arc<BudgetMonitor>>,
}

impl LedgerService {
    /// Creates a new service without budget monitoring.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            monitor: None,
        }
    }

    /// Re-checks budgets after every committed expense change.
    #[must_use]
    pub fn with_monitor(mut self, monitor: Arc<BudgetMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// The underlying datastore.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Creates a transaction and applies its balance effect.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` for a non-positive amount, or a datastore error.
    pub async fn create(
        &self,
        owner_id: OwnerId,
        draft: TransactionDraft,
        now: DateTime<Utc>,
    ) -> Result<LedgerOutcome, LedgerError> {
        let mut unit = self.store.begin().await?;
        let outcome = self.create_in(unit.as_mut(), owner_id, draft, now).await?;
        unit.commit().await?;

        info!(
            owner_id = %owner_id,
            transaction_id = %outcome.transaction.id,
            kind = outcome.transaction.kind.as_str(),
            "Transaction created"
        );
        self.after_commit(owner_id, &[&outcome.transaction], now).await;
        Ok(outcome)
    }

    /// Creates a transaction inside a caller-owned unit of work.
    ///
    /// The caller commits and then calls [`LedgerService::after_commit`].
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` for a non-positive amount, or a datastore error.
    pub async fn create_in(
        &self,
        unit: &mut dyn LedgerUnit,
        owner_id: OwnerId,
        draft: TransactionDraft,
        now: DateTime<Utc>,
    ) -> Result<LedgerOutcome, LedgerError> {
        let transaction = draft.validated()?.into_transaction(owner_id, now);
        unit.insert_transaction(&transaction).await?;

        let mut warnings = Vec::new();
        sync_balance(unit, owner_id, BalanceDelta::applying(&transaction), &mut warnings).await?;

        Ok(LedgerOutcome {
            transaction,
            warnings,
        })
    }

    /// Replaces a transaction's fields, reversing the old balance effect and applying the new.
    ///
    /// # Errors
    ///
    /// - `LedgerError::TransactionNotFound` if the row does not exist for this owner
    /// - `LedgerError::InvalidAmount` for a non-positive amount
    pub async fn update(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
        draft: TransactionDraft,
        now: DateTime<Utc>,
    ) -> Result<LedgerOutcome, LedgerError> {
        let draft = draft.validated()?;
        let mut unit = self.store.begin().await?;

        let old = unit
            .lock_transaction(owner_id, id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id.into_inner()))?;

        let mut warnings = Vec::new();
        sync_balance(unit.as_mut(), owner_id, BalanceDelta::reversing(&old), &mut warnings)
            .await?;

        unit.update_transaction(&draft.apply_to(&old, now)).await?;
        let new = unit
            .lock_transaction(owner_id, id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id.into_inner()))?;

        sync_balance(unit.as_mut(), owner_id, BalanceDelta::applying(&new), &mut warnings)
            .await?;
        unit.commit().await?;

        info!(owner_id = %owner_id, transaction_id = %id, "Transaction updated");
        self.after_commit(owner_id, &[&old, &new], now).await;
        Ok(LedgerOutcome {
            transaction: new,
            warnings,
        })
    }

    /// Deletes a transaction and reverses its balance effect.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TransactionNotFound` if the row does not exist for this owner.
    pub async fn delete(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<LedgerOutcome, LedgerError> {
        let mut unit = self.store.begin().await?;

        let old = unit
            .lock_transaction(owner_id, id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id.into_inner()))?;
        if !unit.delete_transaction(owner_id, id).await? {
            return Err(LedgerError::TransactionNotFound(id.into_inner()));
        }

        let mut warnings = Vec::new();
        sync_balance(unit.as_mut(), owner_id, BalanceDelta::reversing(&old), &mut warnings)
            .await?;
        unit.commit().await?;

        info!(owner_id = %owner_id, transaction_id = %id, "Transaction deleted");
        self.after_commit(owner_id, &[&old], now).await;
        Ok(LedgerOutcome {
            transaction: old,
            warnings,
        })
    }

    /// Fetches one transaction.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TransactionNotFound` if the row does not exist for this owner.
    pub async fn get(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        self.store
            .get_transaction(owner_id, id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id.into_inner()))
    }

    /// Lists an owner's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn list(
        &self,
        owner_id: OwnerId,
        limit: Option<u64>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self
            .store
            .list_transactions(owner_id, limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await?)
    }

    /// Re-checks budgets touched by committed rows.
    ///
    /// Runs only if one of the rows is an expense. Failures are logged and swallowed: an
    /// alert problem never undoes a committed mutation.
    pub async fn after_commit(
        &self,
        owner_id: OwnerId,
        touched: &[&Transaction],
        now: DateTime<Utc>,
    ) {
        let Some(monitor) = &self.monitor else {
            return;
        };

        let mut categories: Vec<Option<CategoryId>> = Vec::new();
        let mut seen = HashSet::new();
        for transaction in touched
            .iter()
            .filter(|t| t.kind == TransactionKind::Expense)
        {
            if seen.insert(transaction.category_id) {
                categories.push(transaction.category_id);
            }
        }

        for category in categories {
            if let Err(e) = monitor.check_alerts(owner_id, category, now).await {
                warn!(owner_id = %owner_id, error = %e, "Budget alert check failed");
            }
        }
    }
}

async fn sync_balance(
    unit: &mut dyn LedgerUnit,
    owner_id: OwnerId,
    delta: Option<BalanceDelta>,
    warnings: &mut Vec<BalanceWarning>,
) -> Result<(), LedgerError> {
    let Some(delta) = delta else {
        return Ok(());
    };
    if !unit.adjust_balance(owner_id, &delta).await? {
        warn!(
            owner_id = %owner_id,
            account = %delta.account,
            delta = %delta.delta,
            "Linked account missing, balance not updated"
        );
        warnings.push(BalanceWarning::missing_account(&delta));
    }
    Ok(())
}
