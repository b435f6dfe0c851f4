//! Pure status transitions for staged items.

use super::error::ApprovalError;
use super::types::PendingStatus;

/// Stateless validator for staged-item transitions.
pub struct PendingWorkflow;

impl PendingWorkflow {
    /// Approve a pending item.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::InvalidTransition` unless the item is pending.
    pub fn approve(current: PendingStatus) -> Result<PendingStatus, ApprovalError> {
        Self::transition(current, PendingStatus::Approved)
    }

    /// Reject a pending item.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::InvalidTransition` unless the item is pending.
    pub fn reject(current: PendingStatus) -> Result<PendingStatus, ApprovalError> {
        Self::transition(current, PendingStatus::Rejected)
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: PendingStatus, to: PendingStatus) -> bool {
        matches!(
            (from, to),
            (
                PendingStatus::Pending,
                PendingStatus::Approved | PendingStatus::Rejected
            )
        )
    }

    fn transition(from: PendingStatus, to: PendingStatus) -> Result<PendingStatus, ApprovalError> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(ApprovalError::InvalidTransition { from, to })
        }
    }
}
