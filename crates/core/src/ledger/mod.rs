//! Transaction ledger and balance synchronization.
//!
//! This module implements:
//! - Transaction and account domain types
//! - The apply/reverse balance rules for assets and liabilities
//! - The datastore unit-of-work contract
//! - The ledger service that keeps balances consistent across create, edit and delete

pub mod balance;
pub mod error;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod service_props;

pub use balance::{BalanceDelta, replay};
pub use error::LedgerError;
pub use service::{BalanceWarning, LedgerOutcome, LedgerService};
pub use store::{LedgerStore, LedgerUnit};
pub use types::{
    Account, AccountKind, AccountRef, DEFAULT_DESCRIPTION, ORIGIN_EMAIL_SYNC, ORIGIN_MANUAL,
    Transaction, TransactionDraft, TransactionKind,
};
