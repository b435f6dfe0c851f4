//! Staging-area domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{CategoryId, OwnerId, PendingTransactionId, TransactionId};
use uuid::Uuid;

use crate::ledger::{AccountRef, TransactionDraft, TransactionKind, ORIGIN_EMAIL_SYNC};

/// Review status of a staged item.
///
/// Valid transitions:
/// - Pending → Approved (materializes a ledger transaction)
/// - Pending → Rejected (no ledger effect)
///
/// Both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    /// Awaiting a decision.
    Pending,
    /// Accepted into the ledger.
    Approved,
    /// Discarded.
    Rejected,
}

impl PendingStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if no transition leaves this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected financial event waiting for user review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Unique identifier.
    pub id: PendingTransactionId,
    /// Owner of the item.
    pub owner_id: OwnerId,
    /// Income or expense.
    pub kind: TransactionKind,
    /// Extracted amount.
    pub amount: Decimal,
    /// Suggested category.
    pub category_id: Option<CategoryId>,
    /// Account the user chose to link on approval.
    pub account: Option<AccountRef>,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
    /// Extracted description.
    pub description: String,
    /// External message id; unique per owner.
    pub source_message_id: String,
    /// Review status.
    pub status: PendingStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl PendingTransaction {
    /// The ledger draft an approval materializes.
    #[must_use]
    pub fn to_draft(&self) -> TransactionDraft {
        TransactionDraft {
            kind: self.kind,
            amount: self.amount,
            category_id: self.category_id,
            account: self.account,
            occurred_at: self.occurred_at,
            description: self.description.clone(),
            origin_method: ORIGIN_EMAIL_SYNC.to_string(),
            source_message_id: Some(self.source_message_id.clone()),
        }
    }

    /// Overwrites the reviewable fields with a user's corrections.
    pub fn apply_edit(&mut self, edit: PendingEdit, now: DateTime<Utc>) {
        self.kind = edit.kind;
        self.amount = edit.amount;
        self.category_id = edit.category_id;
        self.account = edit.account;
        self.occurred_at = edit.occurred_at;
        self.description = edit.description.trim().to_string();
        self.updated_at = now;
    }
}

/// User corrections to a staged item before approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEdit {
    /// Income or expense.
    pub kind: TransactionKind,
    /// Corrected amount.
    pub amount: Decimal,
    /// Category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Account to link when approved.
    #[serde(default)]
    pub account: Option<AccountRef>,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
    /// Description.
    pub description: String,
}

/// Result for a single item in a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemResult {
    /// The staged item.
    pub pending_id: Uuid,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Ledger transaction created, for successful approvals.
    pub transaction_id: Option<TransactionId>,
    /// Error message if failed.
    pub error: Option<String>,
}

/// Result of a batch approve or reject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Results for each requested id, in request order.
    pub results: Vec<BatchItemResult>,
    /// Number of successful items.
    pub success_count: usize,
    /// Number of failed items.
    pub failure_count: usize,
}

impl BatchResult {
    pub(crate) fn succeeded(&mut self, pending_id: Uuid, transaction_id: Option<TransactionId>) {
        self.success_count += 1;
        self.results.push(BatchItemResult {
            pending_id,
            success: true,
            transaction_id,
            error: None,
        });
    }

    pub(crate) fn failed(&mut self, pending_id: Uuid, error: String) {
        self.failure_count += 1;
        self.results.push(BatchItemResult {
            pending_id,
            success: false,
            transaction_id: None,
            error: Some(error),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!(PendingStatus::parse("PENDING"), Some(PendingStatus::Pending));
        assert_eq!(PendingStatus::parse("approved"), Some(PendingStatus::Approved));
        assert_eq!(PendingStatus::parse("Rejected"), Some(PendingStatus::Rejected));
        assert_eq!(PendingStatus::parse("posted"), None);
        assert_eq!(PendingStatus::Rejected.to_string(), "rejected");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!PendingStatus::Pending.is_terminal());
        assert!(PendingStatus::Approved.is_terminal());
        assert!(PendingStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_draft_carries_email_origin() {
        let now = Utc::now();
        let pending = PendingTransaction {
            id: PendingTransactionId::new(),
            owner_id: OwnerId::new(),
            kind: TransactionKind::Expense,
            amount: dec!(42.10),
            category_id: None,
            account: None,
            occurred_at: now,
            description: "Grocer".to_string(),
            source_message_id: "msg-1".to_string(),
            status: PendingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let draft = pending.to_draft();
        assert_eq!(draft.origin_method, ORIGIN_EMAIL_SYNC);
        assert_eq!(draft.source_message_id.as_deref(), Some("msg-1"));
        assert_eq!(draft.amount, dec!(42.10));
    }

    #[test]
    fn test_batch_result_counts() {
        let mut result = BatchResult::default();
        result.succeeded(Uuid::nil(), None);
        result.failed(Uuid::nil(), "boom".to_string());
        result.failed(Uuid::nil(), "boom".to_string());
        assert_eq!(result.success_count, 1);
        assert_eq!(result.failure_count, 2);
        assert_eq!(result.results.len(), 3);
    }
}
