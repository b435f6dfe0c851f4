//! Datastore collaborator support.
//!
//! The collaborator traits live next to the logic that needs them (`ledger::LedgerStore`,
//! `budget::BudgetStore`, `ingest::StagingStore`, ...). This module holds what they share:
//! the error type and an in-process implementation of every trait.

mod error;
pub mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;
