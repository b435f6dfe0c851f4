//! Budget repository: budget rows, expense sums and the alert log.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tally_core::budget::{AlertLevel, Budget, BudgetStore};
use tally_core::store::StoreError;
use tally_shared::types::{BudgetId, CategoryId, OwnerId};

use crate::convert;
use crate::entities::{budget_alerts, budgets, sea_orm_active_enums::TransactionKind, transactions};
use crate::error::store_err;

/// Budget datastore backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    db: DatabaseConnection,
}

impl BudgetRepository {
    /// Creates a new budget repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BudgetStore for BudgetRepository {
    async fn list_budgets(&self, owner_id: OwnerId) -> Result<Vec<Budget>, StoreError> {
        let rows = budgets::Entity::find()
            .filter(budgets::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_asc(budgets::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(convert::budget).collect())
    }

    async fn sum_expenses(
        &self,
        owner_id: OwnerId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        category_id: Option<CategoryId>,
    ) -> Result<Decimal, StoreError> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(transactions::Column::Kind.eq(TransactionKind::Expense))
            .filter(transactions::Column::OccurredAt.gte(from))
            .filter(transactions::Column::OccurredAt.lt(to));
        if let Some(category_id) = category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id.into_inner()));
        }

        let total: Option<Option<Decimal>> = query
            .select_only()
            .column_as(Expr::col(transactions::Column::Amount).sum(), "total")
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(store_err)?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    async fn record_alert(
        &self,
        budget_id: BudgetId,
        period_start: NaiveDate,
        level: AlertLevel,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let row = budget_alerts::ActiveModel {
            budget_id: Set(budget_id.into_inner()),
            period_start: Set(period_start),
            level: Set(level.into()),
            sent_at: Set(sent_at.into()),
        };

        let inserted = budget_alerts::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    budget_alerts::Column::BudgetId,
                    budget_alerts::Column::PeriodStart,
                    budget_alerts::Column::Level,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(store_err)?;

        Ok(inserted > 0)
    }
}
