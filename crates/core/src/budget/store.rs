//! Datastore collaborator for budget monitoring.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tally_shared::types::{BudgetId, CategoryId, OwnerId};

use super::types::{AlertLevel, Budget};
use crate::store::StoreError;

/// Budget reads, expense range queries and the alert log.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Lists every budget of an owner.
    async fn list_budgets(&self, owner_id: OwnerId) -> Result<Vec<Budget>, StoreError>;

    /// Sums the owner's expenses with `from <= occurred_at < to`.
    ///
    /// A `Some` category restricts the sum to that category.
    async fn sum_expenses(
        &self,
        owner_id: OwnerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        category_id: Option<CategoryId>,
    ) -> Result<Decimal, StoreError>;

    /// Records that an alert was sent; returns false if it was already recorded.
    async fn record_alert(
        &self,
        budget_id: BudgetId,
        period_start: NaiveDate,
        level: AlertLevel,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
