//! Staging, budget and mailbox repositories against PostgreSQL.

mod common;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use tally_core::approval::{PendingStatus, PendingTransaction};
use tally_core::budget::{AlertLevel, BudgetStore};
use tally_core::ingest::{CredentialStore, MailboxCredential, StagingStore, SyncStateStore};
use tally_core::ledger::{LedgerService, ORIGIN_MANUAL, TransactionDraft, TransactionKind};
use tally_db::entities::sea_orm_active_enums::{BudgetPeriod, PendingStatus as DbPendingStatus};
use tally_db::entities::{budgets, pending_transactions};
use tally_db::{BudgetRepository, LedgerRepository, MailboxRepository, StagingRepository};
use tally_shared::types::{BudgetId, CategoryId, OwnerId, PendingTransactionId};
use uuid::Uuid;

fn staged(owner: OwnerId, source: &str, description: &str) -> PendingTransaction {
    let now = Utc::now();
    PendingTransaction {
        id: PendingTransactionId::new(),
        owner_id: owner,
        kind: TransactionKind::Expense,
        amount: dec!(12.50),
        category_id: None,
        account: None,
        occurred_at: now,
        description: description.to_string(),
        source_message_id: source.to_string(),
        status: PendingStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database at DATABASE_URL"]
async fn test_upsert_refreshes_pending_and_spares_reviewed_rows() {
    let Some(db) = common::connect().await else {
        return;
    };
    let repo = StagingRepository::new(db.clone());
    let owner = OwnerId::new();

    assert!(repo.upsert_pending(&staged(owner, "m1", "First pass")).await.unwrap());
    assert!(repo.upsert_pending(&staged(owner, "m1", "Second pass")).await.unwrap());

    let rows = repo.list_pending(owner).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].description, "Second pass");

    let reviewed = rows[0].clone();
    pending_transactions::ActiveModel {
        id: Set(reviewed.id.into_inner()),
        status: Set(DbPendingStatus::Rejected),
        ..Default::default()
    }
    .update(&db)
    .await
    .unwrap();

    assert!(!repo.upsert_pending(&staged(owner, "m1", "Third pass")).await.unwrap());
    let stored = repo.get_pending(owner, reviewed.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PendingStatus::Rejected);
    assert_eq!(stored.description, "Second pass");
    assert!(repo.list_pending(owner).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database at DATABASE_URL"]
async fn test_find_pending_is_owner_scoped() {
    let Some(db) = common::connect().await else {
        return;
    };
    let repo = StagingRepository::new(db);
    let owner = OwnerId::new();
    let stranger = OwnerId::new();

    let mine = staged(owner, "a", "Mine");
    let theirs = staged(stranger, "a", "Theirs");
    repo.upsert_pending(&mine).await.unwrap();
    repo.upsert_pending(&theirs).await.unwrap();

    let found = repo.find_pending(owner, &[mine.id, theirs.id]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, mine.id);
    assert!(repo.get_pending(owner, theirs.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database at DATABASE_URL"]
async fn test_expense_sums_and_alert_log() {
    let Some(db) = common::connect().await else {
        return;
    };
    let owner = OwnerId::new();
    let food = CategoryId::from(common::insert_category(&db, owner.into_inner(), "Food").await);

    let ledger = LedgerService::new(std::sync::Arc::new(LedgerRepository::new(db.clone())));
    let now = Utc::now();
    for (amount, category, kind) in [
        (dec!(40), Some(food), TransactionKind::Expense),
        (dec!(15), None, TransactionKind::Expense),
        (dec!(500), None, TransactionKind::Income),
    ] {
        ledger
            .create(
                owner,
                TransactionDraft {
                    kind,
                    amount,
                    category_id: category,
                    account: None,
                    occurred_at: now,
                    description: "Spend".to_string(),
                    origin_method: ORIGIN_MANUAL.to_string(),
                    source_message_id: None,
                },
                now,
            )
            .await
            .unwrap();
    }

    let budget_id = Uuid::now_v7();
    budgets::ActiveModel {
        id: Set(budget_id),
        owner_id: Set(owner.into_inner()),
        name: Set("Food".to_string()),
        category_id: Set(Some(food.into_inner())),
        amount: Set(dec!(100)),
        period_type: Set(BudgetPeriod::Monthly),
        alert_at_percentage: Set(dec!(80)),
        created_at: Set(now.into()),
    }
    .insert(&db)
    .await
    .unwrap();

    let repo = BudgetRepository::new(db);
    let from = now - Duration::hours(1);
    let to = now + Duration::hours(1);
    assert_eq!(repo.sum_expenses(owner, from, to, None).await.unwrap(), dec!(55));
    assert_eq!(repo.sum_expenses(owner, from, to, Some(food)).await.unwrap(), dec!(40));
    assert_eq!(
        repo.sum_expenses(owner, to, to + Duration::days(1), None).await.unwrap(),
        dec!(0)
    );

    let budgets = repo.list_budgets(owner).await.unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].category_id, Some(food));

    let id = BudgetId::from(budget_id);
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert!(repo.record_alert(id, start, AlertLevel::NearLimit, now).await.unwrap());
    assert!(!repo.record_alert(id, start, AlertLevel::NearLimit, now).await.unwrap());
    assert!(repo.record_alert(id, start, AlertLevel::Exceeded, now).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database at DATABASE_URL"]
async fn test_mailbox_watermark_and_credential_rotation() {
    let Some(db) = common::connect().await else {
        return;
    };
    let repo = MailboxRepository::new(db.clone());
    let owner = OwnerId::new();

    assert!(repo.get_sync_state(owner).await.unwrap().is_none());
    assert!(repo.advance_watermark(owner, Utc::now()).await.is_err());

    common::insert_connection(&db, owner.into_inner()).await;
    let at = Utc::now();
    repo.advance_watermark(owner, at).await.unwrap();
    let state = repo.get_sync_state(owner).await.unwrap().unwrap();
    assert_eq!(
        state.last_sync_at.map(|t| t.timestamp_micros()),
        Some(at.timestamp_micros())
    );

    let rotated = MailboxCredential {
        access_token: "rotated".to_string(),
        refresh_token: Some("refresh".to_string()),
        expires_at: Some(at + Duration::hours(1)),
    };
    repo.save_credential(owner, &rotated).await.unwrap();
    let loaded = repo.load_credential(owner).await.unwrap().unwrap();
    assert_eq!(loaded.access_token, "rotated");
    assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
}
