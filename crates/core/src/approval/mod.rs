//! Approval state machine for staged transactions.
//!
//! # Modules
//!
//! - `types` - Staged item, status and batch result types
//! - `workflow` - Pure status transitions
//! - `service` - Approve/reject (single and batch), listing and edits
//! - `error` - Approval-specific error types

pub mod error;
pub mod service;
pub mod types;
pub mod workflow;


pub use error::ApprovalError;
pub use service::{ApprovalOutcome, ApprovalService};
pub use types::{BatchItemResult, BatchResult, PendingEdit, PendingStatus, PendingTransaction};
pub use workflow::PendingWorkflow;
