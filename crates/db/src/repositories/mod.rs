//! Datastore implementations over PostgreSQL.
//!
//! Each repository implements one or more of the core collaborator traits, hiding the `SeaORM`
//! details from the services that use them.

pub mod budget;
pub mod ledger;
pub mod mailbox;
pub mod staging;

pub use budget::BudgetRepository;
pub use ledger::LedgerRepository;
pub use mailbox::MailboxRepository;
pub use staging::StagingRepository;
