//! Fetch and staging tests with scripted collaborators.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use rust_decimal_macros::dec;
use tally_shared::types::OwnerId;

use super::*;
use crate::approval::PendingStatus;
use crate::scheduler::{MailboxSyncState, SyncInterval};
use crate::store::MemoryStore;
use crate::testing::{FakeExtractor, FakeMailbox, FakeRefresher, live_credential};

const COFFEE: &str = r#"{"amount": 4.5, "description": "Blue Bottle", "type": "expense", "date": "2024-03-12"}"#;

struct Fixture {
    store: Arc<MemoryStore>,
    mailbox: Arc<FakeMailbox>,
    extractor: Arc<FakeExtractor>,
    refresher: Arc<FakeRefresher>,
    access: Arc<MailboxAccess>,
    owner: OwnerId,
    now: DateTime<Utc>,
}

impl Fixture {
    fn pipeline(&self) -> StagingPipeline {
        StagingPipeline::new(
            self.access.clone(),
            self.extractor.clone(),
            self.store.clone(),
            PipelineSettings::default(),
        )
    }

    fn fetcher(&self, settings: FetcherSettings) -> CandidateFetcher {
        CandidateFetcher::new(self.access.clone(), self.store.clone(), settings)
    }

    async fn connect(&self, owner: OwnerId, credential: MailboxCredential) {
        self.store.put_credential(owner, credential).await;
        self.store
            .put_sync_state(MailboxSyncState {
                owner_id: owner,
                last_sync_at: None,
                sync_interval: SyncInterval::Daily,
                preferred_hour: None,
            })
            .await;
    }
}

async fn fixture(mailbox: FakeMailbox) -> Fixture {
    let now: DateTime<Utc> = "2024-03-13T08:00:00Z".parse().unwrap();
    let store = Arc::new(MemoryStore::new());
    let mailbox = Arc::new(mailbox);
    let extractor = Arc::new(FakeExtractor::default());
    let refresher = Arc::new(FakeRefresher::default());
    let access = Arc::new(MailboxAccess::new(
        mailbox.clone(),
        refresher.clone(),
        store.clone(),
        StdDuration::from_secs(5),
        Duration::minutes(5),
    ));
    let f = Fixture {
        store,
        mailbox,
        extractor,
        refresher,
        access,
        owner: OwnerId::new(),
        now,
    };
    f.connect(f.owner, live_credential(now)).await;
    f
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn test_restaging_overwrites_pending_row() {
    let f = fixture(FakeMailbox::default()).await;
    f.mailbox.add_message("m1", "Card charge", "You paid $4.50 at Blue Bottle [m1]");
    f.extractor.reply("[m1]", COFFEE);

    let first = f.pipeline().stage(f.owner, &ids(&["m1"]), f.now).await.unwrap();
    assert_eq!(first.staged, 1);

    f.extractor.reply(
        "[m1]",
        r#"{"amount": 5.25, "description": "Blue Bottle Coffee", "type": "expense"}"#,
    );
    let second = f.pipeline().stage(f.owner, &ids(&["m1"]), f.now).await.unwrap();
    assert_eq!(second.staged, 1);

    let rows = f.store.all_pending(f.owner).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, dec!(5.25));
    assert_eq!(rows[0].description, "Blue Bottle Coffee");
    assert_eq!(rows[0].source_message_id, "m1");
    assert_eq!(rows[0].status, PendingStatus::Pending);
}

#[tokio::test]
async fn test_reviewed_row_is_not_touched() {
    let f = fixture(FakeMailbox::default()).await;
    f.mailbox.add_message("m1", "Card charge", "[m1]");
    f.extractor.reply("[m1]", COFFEE);
    f.pipeline().stage(f.owner, &ids(&["m1"]), f.now).await.unwrap();

    let mut row = f.store.all_pending(f.owner).await.remove(0);
    row.status = PendingStatus::Rejected;
    f.store.put_pending(row).await;

    f.extractor.reply("[m1]", r#"{"amount": 99}"#);
    let report = f.pipeline().stage(f.owner, &ids(&["m1"]), f.now).await.unwrap();

    assert_eq!(report.staged, 0);
    assert_eq!(report.skipped, 1);
    let rows = f.store.all_pending(f.owner).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, dec!(4.5));
    assert_eq!(rows[0].status, PendingStatus::Rejected);
}

#[tokio::test]
async fn test_same_message_id_is_scoped_per_owner() {
    let f = fixture(FakeMailbox::default()).await;
    let other = OwnerId::new();
    f.connect(other, live_credential(f.now)).await;
    f.mailbox.add_message("m1", "Card charge", "[m1]");
    f.extractor.reply("[m1]", COFFEE);

    f.pipeline().stage(f.owner, &ids(&["m1"]), f.now).await.unwrap();
    f.pipeline().stage(other, &ids(&["m1"]), f.now).await.unwrap();

    assert_eq!(f.store.all_pending(f.owner).await.len(), 1);
    assert_eq!(f.store.all_pending(other).await.len(), 1);
}

#[tokio::test]
async fn test_failing_messages_do_not_stop_siblings() {
    let f = fixture(FakeMailbox::default()).await;
    f.mailbox.add_message("ok", "Receipt", "[ok]");
    f.mailbox.add_message("gone", "Receipt", "[gone]");
    f.mailbox.break_message("gone");
    f.mailbox.add_message("flaky", "Receipt", "[flaky]");
    f.extractor.fail_on("[flaky]");
    f.mailbox.add_message("promo", "Big sale", "[promo]");
    f.extractor.reply("[ok]", COFFEE);

    let report = f
        .pipeline()
        .stage(f.owner, &ids(&["ok", "gone", "flaky", "promo"]), f.now)
        .await
        .unwrap();

    assert_eq!(
        report,
        StageReport {
            attempted: 4,
            staged: 1,
            skipped: 1,
            failed: 2,
        }
    );
    assert_eq!(f.store.all_pending(f.owner).await.len(), 1);
}

#[tokio::test]
async fn test_duplicate_ids_are_processed_once() {
    let f = fixture(FakeMailbox::default()).await;
    f.mailbox.add_message("m1", "Receipt", "[m1]");
    f.extractor.reply("[m1]", COFFEE);

    let report = f
        .pipeline()
        .stage(f.owner, &ids(&["m1", "m1", " m1 ", ""]), f.now)
        .await
        .unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.staged, 1);
    assert_eq!(f.extractor.calls(), 1);
}

#[tokio::test]
async fn test_missing_date_falls_back_to_received_time() {
    let f = fixture(FakeMailbox::default()).await;
    f.mailbox.add_message("m1", "Receipt", "[m1]");
    f.extractor.reply("[m1]", r#"{"amount": "₹250", "description": "Auto"}"#);

    f.pipeline().stage(f.owner, &ids(&["m1"]), f.now).await.unwrap();

    let row = f.store.all_pending(f.owner).await.remove(0);
    assert_eq!(row.amount, dec!(250));
    assert_eq!(row.occurred_at.to_rfc3339(), "2024-03-12T10:00:00+00:00");
}

#[tokio::test]
async fn test_stage_without_mailbox_is_not_connected() {
    let f = fixture(FakeMailbox::default()).await;
    let stranger = OwnerId::new();

    let result = f.pipeline().stage(stranger, &ids(&["m1"]), f.now).await;

    assert!(matches!(result, Err(IngestError::NotConnected)));
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_and_persisted() {
    let f = fixture(FakeMailbox::default()).await;
    f.store
        .put_credential(
            f.owner,
            MailboxCredential {
                access_token: "stale".to_string(),
                refresh_token: Some("keep-me".to_string()),
                expires_at: Some(f.now + Duration::minutes(1)),
            },
        )
        .await;
    f.mailbox.reject_token("stale");
    f.mailbox.add_message("m1", "Receipt", "[m1]");
    f.extractor.reply("[m1]", COFFEE);

    let report = f.pipeline().stage(f.owner, &ids(&["m1"]), f.now).await.unwrap();

    assert_eq!(report.staged, 1);
    assert_eq!(f.refresher.calls(), 1);
    assert_eq!(f.mailbox.tokens(), vec!["fresh-1".to_string()]);
    let saved = f.store.load_credential(f.owner).await.unwrap().unwrap();
    assert_eq!(saved.access_token, "fresh-1");
    assert_eq!(saved.refresh_token.as_deref(), Some("keep-me"));
}

#[tokio::test]
async fn test_refused_refresh_is_an_auth_failure() {
    let f = fixture(FakeMailbox::default()).await;
    f.store
        .put_credential(
            f.owner,
            MailboxCredential {
                access_token: "stale".to_string(),
                refresh_token: Some("revoked".to_string()),
                expires_at: Some(f.now - Duration::minutes(1)),
            },
        )
        .await;
    f.refresher.refuse();

    let err = f
        .pipeline()
        .stage(f.owner, &ids(&["m1"]), f.now)
        .await
        .unwrap_err();

    assert!(err.is_auth_failure());
    assert_eq!(err.http_status_code(), 401);
    assert_eq!(f.extractor.calls(), 0);
}

#[tokio::test]
async fn test_stage_receipt() {
    let f = fixture(FakeMailbox::default()).await;
    f.extractor.reply_to_images(
        r#"{"amount": 18.20, "description": "Corner Deli", "type": "expense", "date": "2024-03-11"}"#,
    );

    let staged = f
        .pipeline()
        .stage_receipt(f.owner, "image/jpeg", vec![0xFF, 0xD8, 0xFF], f.now)
        .await
        .unwrap()
        .unwrap();

    assert!(staged.source_message_id.starts_with("receipt:"));
    assert_eq!(staged.amount, dec!(18.20));
    assert_eq!(staged.status, PendingStatus::Pending);
    assert_eq!(f.store.all_pending(f.owner).await.len(), 1);
}

#[tokio::test]
async fn test_stage_receipt_without_transaction() {
    let f = fixture(FakeMailbox::default()).await;

    let staged = f
        .pipeline()
        .stage_receipt(f.owner, "image/png", vec![0x89, 0x50], f.now)
        .await
        .unwrap();

    assert!(staged.is_none());
    assert!(f.store.all_pending(f.owner).await.is_empty());
}

#[tokio::test]
async fn test_first_listing_uses_lookback_then_watermark() {
    let f = fixture(FakeMailbox::with_pages(vec![vec![]])).await;
    let fetcher = f.fetcher(FetcherSettings::default());

    let first = fetcher.list_candidates(f.owner, true, f.now).await.unwrap();
    assert!(first.is_empty());
    let lookback = (f.now - Duration::days(30)).timestamp();
    assert!(f.mailbox.queries()[0].starts_with(&format!("after:{lookback} ")));

    let state = f.store.get_sync_state(f.owner).await.unwrap().unwrap();
    assert_eq!(state.last_sync_at, Some(f.now));

    let later = f.now + Duration::hours(6);
    fetcher.list_candidates(f.owner, true, later).await.unwrap();
    assert!(f.mailbox.queries()[1].starts_with(&format!("after:{} ", f.now.timestamp())));

    fetcher.list_candidates(f.owner, false, later).await.unwrap();
    let full = (later - Duration::days(30)).timestamp();
    assert!(f.mailbox.queries()[2].starts_with(&format!("after:{full} ")));
}

#[tokio::test]
async fn test_failed_listing_keeps_watermark() {
    let mailbox = FakeMailbox::with_pages(vec![vec!["m1"]]);
    mailbox.fail_listing();
    let f = fixture(mailbox).await;

    let result = f
        .fetcher(FetcherSettings::default())
        .list_candidates(f.owner, true, f.now)
        .await;

    assert!(matches!(result, Err(IngestError::Provider(_))));
    let state = f.store.get_sync_state(f.owner).await.unwrap().unwrap();
    assert_eq!(state.last_sync_at, None);
}

#[tokio::test]
async fn test_listing_is_capped_and_skips_broken_metadata() {
    let f = fixture(FakeMailbox::with_pages(vec![
        vec!["a", "b"],
        vec!["c", "d"],
        vec!["e", "f"],
    ]))
    .await;
    for id in ["a", "b", "c", "d", "e", "f"] {
        f.mailbox.add_message(id, &format!("Receipt {id}"), "paid");
    }
    f.mailbox.break_message("b");

    let settings = FetcherSettings {
        max_pages: 5,
        max_candidates: 3,
        ..FetcherSettings::default()
    };
    let candidates = f
        .fetcher(settings)
        .list_candidates(f.owner, false, f.now)
        .await
        .unwrap();

    let listed: Vec<_> = candidates.iter().map(|c| c.message_id.as_str()).collect();
    assert_eq!(listed, vec!["a", "c"]);
    assert_eq!(f.mailbox.queries().len(), 2);
}

#[tokio::test]
async fn test_listing_stops_at_page_limit() {
    let f = fixture(FakeMailbox::with_pages(vec![vec!["a"], vec!["b"], vec!["c"]])).await;
    for id in ["a", "b", "c"] {
        f.mailbox.add_message(id, "Receipt", "paid");
    }

    let settings = FetcherSettings {
        max_pages: 2,
        ..FetcherSettings::default()
    };
    let candidates = f
        .fetcher(settings)
        .list_candidates(f.owner, false, f.now)
        .await
        .unwrap();

    assert_eq!(candidates.len(), 2);
    assert_eq!(f.mailbox.queries().len(), 2);
}
