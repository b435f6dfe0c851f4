//! Review of staged items.
//!
//! Approving runs in one unit of work: lock the staged row, check it is pending, create the
//! ledger transaction (which moves the linked balance), mark the row approved, commit. Any
//! failure rolls the whole unit back and the row stays pending.
//!
//! Batches isolate failures per item. Each id gets its own unit of work; a failing item is
//! reported and left pending while the rest proceed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{OwnerId, PendingTransactionId};
use tracing::{info, warn};

use super::error::ApprovalError;
use super::types::{BatchResult, PendingEdit, PendingTransaction};
use super::workflow::PendingWorkflow;
use crate::ingest::StagingStore;
use crate::ledger::{BalanceWarning, LedgerError, LedgerService, Transaction};

/// Result of approving one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
    /// The staged row, now approved.
    pub pending: PendingTransaction,
    /// The ledger transaction it became.
    pub transaction: Transaction,
    /// Balance steps that were skipped.
    pub warnings: Vec<BalanceWarning>,
}

/// Approves, rejects, lists and edits staged items.
pub struct ApprovalService {
    ledger: Arc<LedgerService>,
    staging: Arc<dyn StagingStore>,
}

impl ApprovalService {
    /// Creates a new service.
    #[must_use]
    pub fn new(ledger: Arc<LedgerService>, staging: Arc<dyn StagingStore>) -> Self {
        Self { ledger, staging }
    }

    /// Approves one pending item, materializing it as a ledger transaction.
    ///
    /// # Errors
    ///
    /// - `ApprovalError::NotFound` if the item does not exist for this owner
    /// - `ApprovalError::InvalidTransition` if it was already approved or rejected
    /// - `ApprovalError::Ledger` if the transaction cannot be created; the item stays pending
    pub async fn approve(
        &self,
        owner_id: OwnerId,
        id: PendingTransactionId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, ApprovalError> {
        let mut unit = self.ledger.store().begin().await?;

        let mut pending = unit
            .lock_pending(owner_id, id)
            .await?
            .ok_or(ApprovalError::NotFound(id.into_inner()))?;
        let next = PendingWorkflow::approve(pending.status)?;

        let created = self
            .ledger
            .create_in(unit.as_mut(), owner_id, pending.to_draft(), now)
            .await?;

        pending.status = next;
        pending.updated_at = now;
        unit.save_pending(&pending).await?;
        unit.commit().await?;

        info!(
            owner_id = %owner_id,
            pending_id = %id,
            transaction_id = %created.transaction.id,
            "Pending transaction approved"
        );
        self.ledger
            .after_commit(owner_id, &[&created.transaction], now)
            .await;

        Ok(ApprovalOutcome {
            pending,
            transaction: created.transaction,
            warnings: created.warnings,
        })
    }

    /// Approves several items with per-item isolation.
    ///
    /// All requested rows are read in one query first; ids that do not resolve to a row of
    /// this owner are reported as failures. Duplicate ids are processed once.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial read fails.
    pub async fn approve_selected(
        &self,
        owner_id: OwnerId,
        ids: &[PendingTransactionId],
        now: DateTime<Utc>,
    ) -> Result<BatchResult, ApprovalError> {
        let ids = distinct(ids);
        let found = self.found_ids(owner_id, &ids).await?;

        let mut result = BatchResult::default();
        for id in ids {
            if !found.contains(&id) {
                result.failed(id.into_inner(), ApprovalError::NotFound(id.into_inner()).to_string());
                continue;
            }
            match self.approve(owner_id, id, now).await {
                Ok(outcome) => result.succeeded(id.into_inner(), Some(outcome.transaction.id)),
                Err(e) => {
                    warn!(owner_id = %owner_id, pending_id = %id, error = %e, "Batch approval item failed");
                    result.failed(id.into_inner(), e.to_string());
                }
            }
        }

        info!(
            owner_id = %owner_id,
            success_count = result.success_count,
            failure_count = result.failure_count,
            "Batch approval finished"
        );
        Ok(result)
    }

    /// Rejects one pending item. No ledger effect.
    ///
    /// # Errors
    ///
    /// - `ApprovalError::NotFound` if the item does not exist for this owner
    /// - `ApprovalError::InvalidTransition` if it was already approved or rejected
    pub async fn reject(
        &self,
        owner_id: OwnerId,
        id: PendingTransactionId,
        now: DateTime<Utc>,
    ) -> Result<PendingTransaction, ApprovalError> {
        let mut unit = self.ledger.store().begin().await?;

        let mut pending = unit
            .lock_pending(owner_id, id)
            .await?
            .ok_or(ApprovalError::NotFound(id.into_inner()))?;
        pending.status = PendingWorkflow::reject(pending.status)?;
        pending.updated_at = now;

        unit.save_pending(&pending).await?;
        unit.commit().await?;

        info!(owner_id = %owner_id, pending_id = %id, "Pending transaction rejected");
        Ok(pending)
    }

    /// Rejects several items with per-item isolation.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial read fails.
    pub async fn reject_selected(
        &self,
        owner_id: OwnerId,
        ids: &[PendingTransactionId],
        now: DateTime<Utc>,
    ) -> Result<BatchResult, ApprovalError> {
        let ids = distinct(ids);
        let found = self.found_ids(owner_id, &ids).await?;

        let mut result = BatchResult::default();
        for id in ids {
            if !found.contains(&id) {
                result.failed(id.into_inner(), ApprovalError::NotFound(id.into_inner()).to_string());
                continue;
            }
            match self.reject(owner_id, id, now).await {
                Ok(_) => result.succeeded(id.into_inner(), None),
                Err(e) => result.failed(id.into_inner(), e.to_string()),
            }
        }
        Ok(result)
    }

    /// Lists an owner's pending items, newest first.
    ///
    /// # Errors
    ///
    /// Returns a datastore error.
    pub async fn list_pending(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<PendingTransaction>, ApprovalError> {
        Ok(self.staging.list_pending(owner_id).await?)
    }

    /// Applies user corrections to an item that is still pending.
    ///
    /// # Errors
    ///
    /// - `ApprovalError::NotFound` if the item does not exist for this owner
    /// - `ApprovalError::NotEditable` if it was already approved or rejected
    /// - `ApprovalError::Ledger` with `InvalidAmount` for a non-positive amount
    pub async fn update_pending(
        &self,
        owner_id: OwnerId,
        id: PendingTransactionId,
        edit: PendingEdit,
        now: DateTime<Utc>,
    ) -> Result<PendingTransaction, ApprovalError> {
        if edit.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(edit.amount).into());
        }

        let mut unit = self.ledger.store().begin().await?;
        let mut pending = unit
            .lock_pending(owner_id, id)
            .await?
            .ok_or(ApprovalError::NotFound(id.into_inner()))?;
        if pending.status.is_terminal() {
            return Err(ApprovalError::NotEditable(pending.status));
        }

        pending.apply_edit(edit, now);
        unit.save_pending(&pending).await?;
        unit.commit().await?;
        Ok(pending)
    }

    async fn found_ids(
        &self,
        owner_id: OwnerId,
        ids: &[PendingTransactionId],
    ) -> Result<HashSet<PendingTransactionId>, ApprovalError> {
        Ok(self
            .staging
            .find_pending(owner_id, ids)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect())
    }
}

fn distinct(ids: &[PendingTransactionId]) -> Vec<PendingTransactionId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
