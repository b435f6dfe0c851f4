//! Conversions between database rows and domain types.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;
use tally_core::approval::{PendingStatus, PendingTransaction};
use tally_core::budget::{AlertLevel, Budget, PeriodType};
use tally_core::ingest::{Category, MailboxCredential};
use tally_core::ledger::{Account, AccountRef, Transaction, TransactionKind};
use tally_core::scheduler::{MailboxSyncState, SyncInterval};
use tally_core::store::StoreError;
use tally_shared::types::{AssetId, LiabilityId};

use crate::entities::{
    assets, budgets, categories, liabilities, mailbox_connections, pending_transactions,
    sea_orm_active_enums as db, transactions,
};

impl From<db::TransactionKind> for TransactionKind {
    fn from(kind: db::TransactionKind) -> Self {
        match kind {
            db::TransactionKind::Income => Self::Income,
            db::TransactionKind::Expense => Self::Expense,
        }
    }
}

impl From<TransactionKind> for db::TransactionKind {
    fn from(kind: TransactionKind) -> Self {
        match kind {
            TransactionKind::Income => Self::Income,
            TransactionKind::Expense => Self::Expense,
        }
    }
}

impl From<db::PendingStatus> for PendingStatus {
    fn from(status: db::PendingStatus) -> Self {
        match status {
            db::PendingStatus::Pending => Self::Pending,
            db::PendingStatus::Approved => Self::Approved,
            db::PendingStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<PendingStatus> for db::PendingStatus {
    fn from(status: PendingStatus) -> Self {
        match status {
            PendingStatus::Pending => Self::Pending,
            PendingStatus::Approved => Self::Approved,
            PendingStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<db::BudgetPeriod> for PeriodType {
    fn from(period: db::BudgetPeriod) -> Self {
        match period {
            db::BudgetPeriod::Daily => Self::Daily,
            db::BudgetPeriod::Weekly => Self::Weekly,
            db::BudgetPeriod::Monthly => Self::Monthly,
            db::BudgetPeriod::Yearly => Self::Yearly,
        }
    }
}

impl From<AlertLevel> for db::AlertLevel {
    fn from(level: AlertLevel) -> Self {
        match level {
            AlertLevel::NearLimit => Self::NearLimit,
            AlertLevel::Exceeded => Self::Exceeded,
        }
    }
}

pub(crate) fn utc(at: DateTime<FixedOffset>) -> DateTime<Utc> {
    at.with_timezone(&Utc)
}

fn account_ref(
    asset_id: Option<uuid::Uuid>,
    liability_id: Option<uuid::Uuid>,
) -> Result<Option<AccountRef>, StoreError> {
    AccountRef::from_columns(asset_id.map(AssetId::from), liability_id.map(LiabilityId::from))
        .map_err(|e| StoreError::Corrupt(e.to_string()))
}

pub(crate) fn transaction(model: transactions::Model) -> Result<Transaction, StoreError> {
    Ok(Transaction {
        id: model.id.into(),
        owner_id: model.owner_id.into(),
        kind: model.kind.into(),
        amount: model.amount,
        category_id: model.category_id.map(Into::into),
        account: account_ref(model.asset_id, model.liability_id)?,
        occurred_at: utc(model.occurred_at),
        description: model.description,
        origin_method: model.origin_method,
        source_message_id: model.source_message_id,
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

pub(crate) fn transaction_active(transaction: &Transaction) -> transactions::ActiveModel {
    let (asset_id, liability_id) = AccountRef::to_columns(transaction.account);
    transactions::ActiveModel {
        id: Set(transaction.id.into_inner()),
        owner_id: Set(transaction.owner_id.into_inner()),
        kind: Set(transaction.kind.into()),
        amount: Set(transaction.amount),
        category_id: Set(transaction.category_id.map(|c| c.into_inner())),
        asset_id: Set(asset_id.map(AssetId::into_inner)),
        liability_id: Set(liability_id.map(LiabilityId::into_inner)),
        occurred_at: Set(transaction.occurred_at.into()),
        description: Set(transaction.description.clone()),
        origin_method: Set(transaction.origin_method.clone()),
        source_message_id: Set(transaction.source_message_id.clone()),
        created_at: Set(transaction.created_at.into()),
        updated_at: Set(transaction.updated_at.into()),
    }
}

pub(crate) fn asset_account(model: assets::Model) -> Account {
    Account {
        reference: AccountRef::Asset(model.id.into()),
        owner_id: model.owner_id.into(),
        name: model.name,
        account_type: model.asset_type,
        current_value: model.current_value,
    }
}

pub(crate) fn liability_account(model: liabilities::Model) -> Account {
    Account {
        reference: AccountRef::Liability(model.id.into()),
        owner_id: model.owner_id.into(),
        name: model.name,
        account_type: model.liability_type,
        current_value: model.current_value,
    }
}

pub(crate) fn pending(model: pending_transactions::Model) -> Result<PendingTransaction, StoreError> {
    Ok(PendingTransaction {
        id: model.id.into(),
        owner_id: model.owner_id.into(),
        kind: model.kind.into(),
        amount: model.amount,
        category_id: model.category_id.map(Into::into),
        account: account_ref(model.asset_id, model.liability_id)?,
        occurred_at: utc(model.occurred_at),
        description: model.description,
        source_message_id: model.source_message_id,
        status: model.status.into(),
        created_at: utc(model.created_at),
        updated_at: utc(model.updated_at),
    })
}

pub(crate) fn pending_active(pending: &PendingTransaction) -> pending_transactions::ActiveModel {
    let (asset_id, liability_id) = AccountRef::to_columns(pending.account);
    pending_transactions::ActiveModel {
        id: Set(pending.id.into_inner()),
        owner_id: Set(pending.owner_id.into_inner()),
        kind: Set(pending.kind.into()),
        amount: Set(pending.amount),
        category_id: Set(pending.category_id.map(|c| c.into_inner())),
        asset_id: Set(asset_id.map(AssetId::into_inner)),
        liability_id: Set(liability_id.map(LiabilityId::into_inner)),
        occurred_at: Set(pending.occurred_at.into()),
        description: Set(pending.description.clone()),
        source_message_id: Set(pending.source_message_id.clone()),
        status: Set(pending.status.into()),
        created_at: Set(pending.created_at.into()),
        updated_at: Set(pending.updated_at.into()),
    }
}

pub(crate) fn budget(model: budgets::Model) -> Budget {
    Budget {
        id: model.id.into(),
        owner_id: model.owner_id.into(),
        name: model.name,
        category_id: model.category_id.map(Into::into),
        amount: model.amount,
        period_type: model.period_type.into(),
        alert_at_percentage: model.alert_at_percentage,
        created_at: utc(model.created_at),
    }
}

pub(crate) fn category(model: categories::Model) -> Category {
    Category {
        id: model.id.into(),
        owner_id: model.owner_id.into(),
        name: model.name,
        kind: model.kind.into(),
    }
}

pub(crate) fn sync_state(model: &mailbox_connections::Model) -> Result<MailboxSyncState, StoreError> {
    let sync_interval = SyncInterval::from_hours(model.sync_interval_hours).ok_or_else(|| {
        StoreError::Corrupt(format!(
            "mailbox {} has sync interval {}h",
            model.owner_id, model.sync_interval_hours
        ))
    })?;
    let preferred_hour = model
        .preferred_hour
        .map(|h| {
            u32::try_from(h).map_err(|_| {
                StoreError::Corrupt(format!("mailbox {} has preferred hour {h}", model.owner_id))
            })
        })
        .transpose()?;

    Ok(MailboxSyncState {
        owner_id: model.owner_id.into(),
        last_sync_at: model.last_sync_at.map(utc),
        sync_interval,
        preferred_hour,
    })
}

pub(crate) fn credential(model: mailbox_connections::Model) -> MailboxCredential {
    MailboxCredential {
        access_token: model.access_token,
        refresh_token: model.refresh_token,
        expires_at: model.expires_at.map(utc),
    }
}
