//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! External systems (datastore, mailbox provider, extraction service, notification channel)
//! are reached through the collaborator traits defined here.
//!
//! # Modules
//!
//! - `ledger` - Transactions and their effect on account balances
//! - `budget` - Budget progress and threshold alerts
//! - `ingest` - Mailbox candidate listing, extraction and staging
//! - `approval` - Review of staged transactions
//! - `scheduler` - When each mailbox syncs, and the periodic sweep
//! - `notify` - Notification collaborator
//! - `store` - Datastore errors and the in-memory datastore

pub mod approval;
pub mod budget;
pub mod ingest;
pub mod ledger;
pub mod notify;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod testing;
