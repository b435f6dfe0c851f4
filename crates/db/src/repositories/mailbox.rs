//! Mailbox repository: connection credentials, sync schedules and watermarks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tally_core::ingest::{CredentialStore, MailboxCredential, SyncStateStore};
use tally_core::scheduler::MailboxSyncState;
use tally_core::store::StoreError;
use tally_shared::types::OwnerId;

use crate::convert;
use crate::entities::mailbox_connections;
use crate::error::store_err;

/// Mailbox datastore backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct MailboxRepository {
    db: DatabaseConnection,
}

impl MailboxRepository {
    /// Creates a new mailbox repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<mailbox_connections::Model>, StoreError> {
        mailbox_connections::Entity::find_by_id(owner_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl SyncStateStore for MailboxRepository {
    async fn list_sync_states(&self) -> Result<Vec<MailboxSyncState>, StoreError> {
        mailbox_connections::Entity::find()
            .order_by_asc(mailbox_connections::Column::OwnerId)
            .all(&self.db)
            .await
            .map_err(store_err)?
            .iter()
            .map(convert::sync_state)
            .collect()
    }

    async fn get_sync_state(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<MailboxSyncState>, StoreError> {
        self.find(owner_id)
            .await?
            .as_ref()
            .map(convert::sync_state)
            .transpose()
    }

    async fn advance_watermark(
        &self,
        owner_id: OwnerId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = mailbox_connections::Entity::update_many()
            .col_expr(mailbox_connections::Column::LastSyncAt, Expr::value(at))
            .filter(mailbox_connections::Column::OwnerId.eq(owner_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("mailbox connection for owner {owner_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MailboxRepository {
    async fn load_credential(
        &self,
        owner_id: OwnerId,
    ) -> Result<Option<MailboxCredential>, StoreError> {
        Ok(self.find(owner_id).await?.map(convert::credential))
    }

    async fn save_credential(
        &self,
        owner_id: OwnerId,
        credential: &MailboxCredential,
    ) -> Result<(), StoreError> {
        let result = mailbox_connections::Entity::update_many()
            .col_expr(
                mailbox_connections::Column::AccessToken,
                Expr::value(credential.access_token.clone()),
            )
            .col_expr(
                mailbox_connections::Column::RefreshToken,
                Expr::value(credential.refresh_token.clone()),
            )
            .col_expr(
                mailbox_connections::Column::ExpiresAt,
                Expr::value(credential.expires_at),
            )
            .filter(mailbox_connections::Column::OwnerId.eq(owner_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("mailbox connection for owner {owner_id}")));
        }
        Ok(())
    }
}
