//! Periodic sweep over every connected mailbox.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tally_shared::types::OwnerId;
use tracing::{info, warn};

use super::policy::should_sync_now;
use super::types::MailboxSyncState;
use crate::ingest::{CandidateFetcher, IngestError, StageReport, StagingPipeline, SyncStateStore};

/// Outcome counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Connected mailboxes evaluated.
    pub checked: usize,
    /// Mailboxes whose turn it was.
    pub due: usize,
    /// Due mailboxes that completed fetch and staging.
    pub synced: usize,
    /// Transactions staged across all users.
    pub staged: usize,
    /// Due mailboxes whose run failed.
    pub failed: usize,
}

/// Runs fetch and staging for every mailbox that is due.
pub struct SyncSweep {
    sync_states: Arc<dyn SyncStateStore>,
    fetcher: Arc<CandidateFetcher>,
    pipeline: Arc<StagingPipeline>,
    user_concurrency: usize,
}

impl SyncSweep {
    /// Creates a new sweep.
    #[must_use]
    pub fn new(
        sync_states: Arc<dyn SyncStateStore>,
        fetcher: Arc<CandidateFetcher>,
        pipeline: Arc<StagingPipeline>,
        user_concurrency: usize,
    ) -> Self {
        Self {
            sync_states,
            fetcher,
            pipeline,
            user_concurrency: user_concurrency.max(1),
        }
    }

    /// Runs one sweep. A failing user is logged and counted; the others carry on.
    ///
    /// # Errors
    ///
    /// Returns an error only if the list of mailboxes cannot be read.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SweepReport, IngestError> {
        let states = self.sync_states.list_sync_states().await?;
        let due: Vec<MailboxSyncState> = states
            .iter()
            .filter(|state| should_sync_now(state, now))
            .cloned()
            .collect();

        let mut report = SweepReport {
            checked: states.len(),
            due: due.len(),
            ..SweepReport::default()
        };

        let results: Vec<(OwnerId, Result<StageReport, IngestError>)> = stream::iter(due)
            .map(|state| async move {
                let owner_id = state.owner_id;
                (owner_id, self.sync_user(&state, now).await)
            })
            .buffer_unordered(self.user_concurrency)
            .collect()
            .await;

        for (owner_id, result) in results {
            match result {
                Ok(stage) => {
                    report.synced += 1;
                    report.staged += stage.staged;
                }
                Err(e) if e.is_auth_failure() => {
                    warn!(owner_id = %owner_id, error = %e, "Mailbox needs reconnecting, skipping user");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(owner_id = %owner_id, error = %e, "Mailbox sync failed, skipping user");
                    report.failed += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            due = report.due,
            synced = report.synced,
            staged = report.staged,
            failed = report.failed,
            "Sync sweep finished"
        );
        Ok(report)
    }

    async fn sync_user(
        &self,
        state: &MailboxSyncState,
        now: DateTime<Utc>,
    ) -> Result<StageReport, IngestError> {
        let incremental = state.last_sync_at.is_some();
        let candidates = self
            .fetcher
            .list_candidates(state.owner_id, incremental, now)
            .await?;
        let ids: Vec<String> = candidates.into_iter().map(|c| c.message_id).collect();
        self.pipeline.stage(state.owner_id, &ids, now).await
    }
}
