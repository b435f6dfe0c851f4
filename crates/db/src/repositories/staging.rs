//! Staging repository: pending transactions and categories.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};
use tally_core::approval::PendingTransaction;
use tally_core::ingest::{Category, StagingStore};
use tally_core::ledger::AccountRef;
use tally_core::store::StoreError;
use tally_shared::types::{AssetId, LiabilityId, OwnerId, PendingTransactionId};

use crate::convert;
use crate::entities::{categories, pending_transactions, sea_orm_active_enums::PendingStatus};
use crate::error::store_err;

/// Insert, or refresh the extracted fields of a row that is still pending. Reviewed rows match
/// the conflict but fail the `WHERE`, so nothing is written and no row is reported.
const UPSERT_PENDING_SQL: &str = r"
INSERT INTO pending_transactions (
    id, owner_id, kind, amount, category_id, asset_id, liability_id,
    occurred_at, description, source_message_id, status, created_at, updated_at
)
VALUES ($1, $2, $3::transaction_kind, $4, $5, $6, $7, $8, $9, $10, 'pending', $11, $12)
ON CONFLICT (owner_id, source_message_id) DO UPDATE SET
    kind = EXCLUDED.kind,
    amount = EXCLUDED.amount,
    category_id = EXCLUDED.category_id,
    occurred_at = EXCLUDED.occurred_at,
    description = EXCLUDED.description,
    updated_at = EXCLUDED.updated_at
WHERE pending_transactions.status = 'pending'
";

/// Staging datastore backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct StagingRepository {
    db: DatabaseConnection,
}

impl StagingRepository {
    /// Creates a new staging repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StagingStore for StagingRepository {
    async fn upsert_pending(&self, pending: &PendingTransaction) -> Result<bool, StoreError> {
        let (asset_id, liability_id) = AccountRef::to_columns(pending.account);
        let statement = Statement::from_sql_and_values(
            DbBackend::Postgres,
            UPSERT_PENDING_SQL,
            [
                pending.id.into_inner().into(),
                pending.owner_id.into_inner().into(),
                pending.kind.as_str().into(),
                pending.amount.into(),
                pending.category_id.map(|c| c.into_inner()).into(),
                asset_id.map(AssetId::into_inner).into(),
                liability_id.map(LiabilityId::into_inner).into(),
                pending.occurred_at.into(),
                pending.description.clone().into(),
                pending.source_message_id.clone().into(),
                pending.created_at.into(),
                pending.updated_at.into(),
            ],
        );

        let result = self.db.execute(statement).await.map_err(store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_pending(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<PendingTransaction>, StoreError> {
        pending_transactions::Entity::find()
            .filter(pending_transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(pending_transactions::Column::Status.eq(PendingStatus::Pending))
            .order_by_desc(pending_transactions::Column::OccurredAt)
            .order_by_desc(pending_transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(convert::pending)
            .collect()
    }

    async fn find_pending(
        &self,
        owner_id: OwnerId,
        ids: &[PendingTransactionId],
    ) -> Result<Vec<PendingTransaction>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        pending_transactions::Entity::find()
            .filter(pending_transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(
                pending_transactions::Column::Id
                    .is_in(ids.iter().map(|id| id.into_inner())),
            )
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(convert::pending)
            .collect()
    }

    async fn get_pending(
        &self,
        owner_id: OwnerId,
        id: PendingTransactionId,
    ) -> Result<Option<PendingTransaction>, StoreError> {
        pending_transactions::Entity::find_by_id(id.into_inner())
            .filter(pending_transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(convert::pending)
            .transpose()
    }

    async fn list_categories(&self, owner_id: OwnerId) -> Result<Vec<Category>, StoreError> {
        let rows = categories::Entity::find()
            .filter(categories::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(convert::category).collect())
    }
}
