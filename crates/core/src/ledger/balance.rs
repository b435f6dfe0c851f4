//! Balance synchronization rules.
//!
//! Account balances are maintained incrementally: every mutation of a linked transaction
//! produces a `BalanceDelta` that the datastore adds to the account's `current_value`.
//!
//! - Asset: income adds, expense subtracts
//! - Liability: expense adds (debt grows), income subtracts (debt shrinks)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{AccountKind, AccountRef, Transaction, TransactionKind};

impl AccountKind {
    /// Calculates the signed balance change a transaction causes on this kind of account.
    #[must_use]
    pub fn balance_change(self, kind: TransactionKind, amount: Decimal) -> Decimal {
        match (self, kind) {
            (Self::Asset, TransactionKind::Income) | (Self::Liability, TransactionKind::Expense) => {
                amount
            }
            (Self::Asset, TransactionKind::Expense) | (Self::Liability, TransactionKind::Income) => {
                -amount
            }
        }
    }
}

/// A signed change to one account's running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    /// The account to adjust.
    pub account: AccountRef,
    /// Amount added to `current_value` (may be negative).
    pub delta: Decimal,
}

impl BalanceDelta {
    /// The effect of committing a transaction on its account.
    #[must_use]
    pub fn apply(kind: TransactionKind, amount: Decimal, account: AccountRef) -> Self {
        Self {
            account,
            delta: account.kind().balance_change(kind, amount),
        }
    }

    /// The effect of withdrawing a transaction from its account.
    ///
    /// Always the negation of [`BalanceDelta::apply`], so apply followed by reverse is the
    /// identity on the balance.
    #[must_use]
    pub fn reverse(kind: TransactionKind, amount: Decimal, account: AccountRef) -> Self {
        Self::apply(kind, amount, account).negated()
    }

    /// The delta committing `transaction` causes, if it is linked to an account.
    #[must_use]
    pub fn applying(transaction: &Transaction) -> Option<Self> {
        transaction
            .account
            .map(|account| Self::apply(transaction.kind, transaction.amount, account))
    }

    /// The delta withdrawing `transaction` causes, if it is linked to an account.
    #[must_use]
    pub fn reversing(transaction: &Transaction) -> Option<Self> {
        transaction
            .account
            .map(|account| Self::reverse(transaction.kind, transaction.amount, account))
    }

    /// Returns the same adjustment with the opposite sign.
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            account: self.account,
            delta: -self.delta,
        }
    }
}

/// Replays signed effects onto an opening balance.
///
/// Used to check the ledger invariant: a balance equals its opening value plus the
/// signed effect of every transaction still linked to it.
#[must_use]
pub fn replay(opening: Decimal, deltas: impl IntoIterator<Item = BalanceDelta>) -> Decimal {
    deltas.into_iter().fold(opening, |balance, d| balance + d.delta)
}
