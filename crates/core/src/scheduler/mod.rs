//! Mailbox sync scheduling.
//!
//! # Modules
//!
//! - `types` - Sync interval and per-owner state
//! - `policy` - Whether a mailbox is due
//! - `sweep` - Runs fetch and staging for every due mailbox

pub mod policy;
pub mod sweep;
pub mod types;


pub use policy::should_sync_now;
pub use sweep::{SweepReport, SyncSweep};
pub use types::{MailboxSyncState, SyncInterval};
