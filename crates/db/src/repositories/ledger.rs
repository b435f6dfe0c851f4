//! Ledger repository: transactions, account balances and the unit of work.
//!
//! A unit of work is one database transaction. Rows it edits are taken with
//! `SELECT ... FOR UPDATE`, and balances move with `current_value = current_value + delta` so
//! concurrent units touching the same account never lose an update.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tally_core::approval::PendingTransaction;
use tally_core::ledger::{Account, AccountRef, BalanceDelta, LedgerStore, LedgerUnit, Transaction};
use tally_core::store::StoreError;
use tally_shared::types::{OwnerId, PendingTransactionId, TransactionId};
use tracing::debug;

use crate::convert;
use crate::entities::{assets, liabilities, pending_transactions, transactions};
use crate::error::store_err;

/// Ledger datastore backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn begin(&self) -> Result<Box<dyn LedgerUnit>, StoreError> {
        let txn = self.db.begin().await.map_err(store_err)?;
        Ok(Box::new(PgLedgerUnit { txn }))
    }

    async fn get_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(convert::transaction)
            .transpose()
    }

    async fn list_transactions(
        &self,
        owner_id: OwnerId,
        limit: u64,
    ) -> Result<Vec<Transaction>, StoreError> {
        transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .into_iter()
            .map(convert::transaction)
            .collect()
    }

    async fn get_account(
        &self,
        owner_id: OwnerId,
        account: AccountRef,
    ) -> Result<Option<Account>, StoreError> {
        let found = match account {
            AccountRef::Asset(id) => assets::Entity::find_by_id(id.into_inner())
                .filter(assets::Column::OwnerId.eq(owner_id.into_inner()))
                .one(&self.db)
                .await
                .map_err(store_err)?
                .map(convert::asset_account),
            AccountRef::Liability(id) => liabilities::Entity::find_by_id(id.into_inner())
                .filter(liabilities::Column::OwnerId.eq(owner_id.into_inner()))
                .one(&self.db)
                .await
                .map_err(store_err)?
                .map(convert::liability_account),
        };
        Ok(found)
    }
}

struct PgLedgerUnit {
    txn: DatabaseTransaction,
}

#[async_trait]
impl LedgerUnit for PgLedgerUnit {
    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        convert::transaction_active(transaction)
            .insert(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn lock_transaction(
        &mut self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find_by_id(id.into_inner())
            .filter(transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_err)?
            .map(convert::transaction)
            .transpose()
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        convert::transaction_active(transaction)
            .update(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn delete_transaction(
        &mut self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<bool, StoreError> {
        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::Id.eq(id.into_inner()))
            .filter(transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn adjust_balance(
        &mut self,
        owner_id: OwnerId,
        delta: &BalanceDelta,
    ) -> Result<bool, StoreError> {
        let now = Utc::now();
        let result = match delta.account {
            AccountRef::Asset(id) => {
                assets::Entity::update_many()
                    .col_expr(
                        assets::Column::CurrentValue,
                        Expr::col(assets::Column::CurrentValue).add(delta.delta),
                    )
                    .col_expr(assets::Column::UpdatedAt, Expr::value(now))
                    .filter(assets::Column::Id.eq(id.into_inner()))
                    .filter(assets::Column::OwnerId.eq(owner_id.into_inner()))
                    .exec(&self.txn)
                    .await
            }
            AccountRef::Liability(id) => {
                liabilities::Entity::update_many()
                    .col_expr(
                        liabilities::Column::CurrentValue,
                        Expr::col(liabilities::Column::CurrentValue).add(delta.delta),
                    )
                    .col_expr(liabilities::Column::UpdatedAt, Expr::value(now))
                    .filter(liabilities::Column::Id.eq(id.into_inner()))
                    .filter(liabilities::Column::OwnerId.eq(owner_id.into_inner()))
                    .exec(&self.txn)
                    .await
            }
        }
        .map_err(store_err)?;

        if result.rows_affected == 0 {
            debug!(account = %delta.account, "Balance adjustment matched no account");
        }
        Ok(result.rows_affected > 0)
    }

    async fn lock_pending(
        &mut self,
        owner_id: OwnerId,
        id: PendingTransactionId,
    ) -> Result<Option<PendingTransaction>, StoreError> {
        pending_transactions::Entity::find_by_id(id.into_inner())
            .filter(pending_transactions::Column::OwnerId.eq(owner_id.into_inner()))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(store_err)?
            .map(convert::pending)
            .transpose()
    }

    async fn save_pending(&mut self, pending: &PendingTransaction) -> Result<(), StoreError> {
        convert::pending_active(pending)
            .update(&self.txn)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(store_err)
    }
}
