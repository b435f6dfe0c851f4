//! Ledger domain types.
//!
//! A transaction is a single-sided record (income or expense) that may be linked to at most
//! one account. The account it points at carries a running balance that the sync engine keeps
//! consistent with the transactions currently linked to it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{AssetId, CategoryId, LiabilityId, OwnerId, TransactionId};

use super::error::LedgerError;

/// Origin tag for transactions typed in by the user.
pub const ORIGIN_MANUAL: &str = "manual";

/// Origin tag for transactions materialized from an approved mailbox item.
pub const ORIGIN_EMAIL_SYNC: &str = "email-sync";

/// Description used when none survives trimming.
pub const DEFAULT_DESCRIPTION: &str = "Untitled transaction";

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses a kind from a string.
    ///
    /// Bank vocabulary is accepted as well: "credit" is income, "debit" is expense.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "credit" | "credited" | "refund" => Some(Self::Income),
            "expense" | "debit" | "debited" | "payment" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two kinds of balance-carrying accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Something the user owns (cash, bank, wallet).
    Asset,
    /// Something the user owes (card, loan).
    Liability,
}

/// Reference to the single account a transaction is linked to.
///
/// The enum makes "linked to both an asset and a liability" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRef {
    /// Linked to an asset.
    Asset(AssetId),
    /// Linked to a liability.
    Liability(LiabilityId),
}

impl AccountRef {
    /// Returns the kind of account referenced.
    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        match self {
            Self::Asset(_) => AccountKind::Asset,
            Self::Liability(_) => AccountKind::Liability,
        }
    }

    /// Builds a reference from the two nullable storage columns.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AmbiguousAccount` when both columns are set.
    pub fn from_columns(
        asset_id: Option<AssetId>,
        liability_id: Option<LiabilityId>,
    ) -> Result<Option<Self>, LedgerError> {
        match (asset_id, liability_id) {
            (Some(_), Some(_)) => Err(LedgerError::AmbiguousAccount),
            (Some(asset), None) => Ok(Some(Self::Asset(asset))),
            (None, Some(liability)) => Ok(Some(Self::Liability(liability))),
            (None, None) => Ok(None),
        }
    }

    /// Splits an optional reference back into the two storage columns.
    #[must_use]
    pub const fn to_columns(account: Option<Self>) -> (Option<AssetId>, Option<LiabilityId>) {
        match account {
            Some(Self::Asset(id)) => (Some(id), None),
            Some(Self::Liability(id)) => (None, Some(id)),
            None => (None, None),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset(id) => write!(f, "asset:{id}"),
            Self::Liability(id) => write!(f, "liability:{id}"),
        }
    }
}

/// A balance-carrying account (asset or liability).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Which account this is.
    pub reference: AccountRef,
    /// Owner of the account.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Free-form subtype ("bank", "credit_card", "loan", ...).
    pub account_type: String,
    /// Signed running balance.
    pub current_value: Decimal,
}

/// A committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Owner of the transaction.
    pub owner_id: OwnerId,
    /// Income or expense.
    pub kind: TransactionKind,
    /// Positive amount.
    pub amount: Decimal,
    /// Category, if any.
    pub category_id: Option<CategoryId>,
    /// Linked account, if any.
    pub account: Option<AccountRef>,
    /// When the transaction happened.
    pub occurred_at: DateTime<Utc>,
    /// Free text description.
    pub description: String,
    /// How the transaction entered the ledger ("manual", "email-sync", ...).
    pub origin_method: String,
    /// External message id for transactions materialized from the mailbox.
    pub source_message_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Field values for creating or editing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// Income or expense.
    pub kind: TransactionKind,
    /// Amount; must be positive.
    pub amount: Decimal,
    /// Category, if any.
    pub category_id: Option<CategoryId>,
    /// Linked account, if any.
    pub account: Option<AccountRef>,
    /// When the transaction happened.
    pub occurred_at: DateTime<Utc>,
    /// Free text description.
    pub description: String,
    /// Origin tag.
    pub origin_method: String,
    /// External message id, if any.
    pub source_message_id: Option<String>,
}

impl TransactionDraft {
    /// Validates the draft, normalizing the description.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` if the amount is zero or negative.
    pub fn validated(mut self) -> Result<Self, LedgerError> {
        if self.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(self.amount));
        }
        let description = self.description.trim();
        self.description = if description.is_empty() {
            DEFAULT_DESCRIPTION.to_string()
        } else {
            description.to_string()
        };
        if self.origin_method.trim().is_empty() {
            self.origin_method = ORIGIN_MANUAL.to_string();
        }
        Ok(self)
    }

    /// Materializes a new transaction row from a validated draft.
    #[must_use]
    pub fn into_transaction(self, owner_id: OwnerId, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            owner_id,
            kind: self.kind,
            amount: self.amount,
            category_id: self.category_id,
            account: self.account,
            occurred_at: self.occurred_at,
            description: self.description,
            origin_method: self.origin_method,
            source_message_id: self.source_message_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a validated draft onto an existing row, keeping its identity.
    #[must_use]
    pub fn apply_to(self, existing: &Transaction, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id: existing.id,
            owner_id: existing.owner_id,
            kind: self.kind,
            amount: self.amount,
            category_id: self.category_id,
            account: self.account,
            occurred_at: self.occurred_at,
            description: self.description,
            origin_method: self.origin_method,
            source_message_id: self.source_message_id,
            created_at: existing.created_at,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft(amount: Decimal, description: &str) -> TransactionDraft {
        TransactionDraft {
            kind: TransactionKind::Expense,
            amount,
            category_id: None,
            account: None,
            occurred_at: Utc::now(),
            description: description.to_string(),
            origin_method: String::new(),
            source_message_id: None,
        }
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(TransactionKind::parse("Income"), Some(TransactionKind::Income));
        assert_eq!(TransactionKind::parse(" expense "), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse("credited"), Some(TransactionKind::Income));
        assert_eq!(TransactionKind::parse("debit"), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse("transfer"), None);
    }

    #[test]
    fn test_draft_rejects_non_positive_amounts() {
        assert!(matches!(
            draft(dec!(0), "x").validated(),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            draft(dec!(-5), "x").validated(),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_draft_normalizes_description_and_origin() {
        let validated = draft(dec!(12.50), "   ").validated().unwrap();
        assert_eq!(validated.description, DEFAULT_DESCRIPTION);
        assert_eq!(validated.origin_method, ORIGIN_MANUAL);

        let validated = draft(dec!(12.50), "  Coffee ").validated().unwrap();
        assert_eq!(validated.description, "Coffee");
    }

    #[test]
    fn test_account_columns_roundtrip() {
        let asset = AssetId::new();
        let reference = AccountRef::from_columns(Some(asset), None).unwrap();
        assert_eq!(reference, Some(AccountRef::Asset(asset)));
        assert_eq!(AccountRef::to_columns(reference), (Some(asset), None));
        assert_eq!(AccountRef::from_columns(None, None).unwrap(), None);
    }

    #[test]
    fn test_account_columns_reject_both() {
        let result = AccountRef::from_columns(Some(AssetId::new()), Some(LiabilityId::new()));
        assert!(matches!(result, Err(LedgerError::AmbiguousAccount)));
    }

    #[test]
    fn test_apply_to_keeps_identity() {
        let owner = OwnerId::new();
        let created = Utc::now();
        let original = draft(dec!(10), "a")
            .validated()
            .unwrap()
            .into_transaction(owner, created);
        let edited = draft(dec!(20), "b")
            .validated()
            .unwrap()
            .apply_to(&original, created + chrono::Duration::minutes(5));
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.owner_id, owner);
        assert_eq!(edited.created_at, created);
        assert_eq!(edited.amount, dec!(20));
        assert!(edited.updated_at > edited.created_at);
    }
}
