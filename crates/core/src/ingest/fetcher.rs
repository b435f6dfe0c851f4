//! Incremental candidate listing.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use tally_shared::config::MailboxConfig;
use tally_shared::types::OwnerId;
use tracing::{debug, info, warn};

use super::error::IngestError;
use super::provider::MailboxAccess;
use super::query::CandidateQuery;
use super::store::SyncStateStore;
use super::types::{CandidateMeta, MailboxCredential};

/// Limits applied to one listing run.
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    /// Lookback window when not running incrementally.
    pub lookback_days: i64,
    /// Maximum listing pages per run.
    pub max_pages: u32,
    /// Page size requested from the provider.
    pub page_size: u32,
    /// Maximum candidates returned per run.
    pub max_candidates: usize,
    /// Concurrent metadata fetches.
    pub concurrency: usize,
}

impl FetcherSettings {
    /// Builds settings from the mailbox config section.
    #[must_use]
    pub fn from_config(config: &MailboxConfig, concurrency: usize) -> Self {
        Self {
            lookback_days: config.lookback_days,
            max_pages: config.max_pages,
            page_size: config.page_size,
            max_candidates: config.max_candidates,
            concurrency: concurrency.max(1),
        }
    }
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            max_pages: 5,
            page_size: 25,
            max_candidates: 50,
            concurrency: 4,
        }
    }
}

/// Lists candidate messages and advances the owner's watermark.
pub struct CandidateFetcher {
    access: Arc<MailboxAccess>,
    sync_states: Arc<dyn SyncStateStore>,
    settings: FetcherSettings,
}

impl CandidateFetcher {
    /// Creates a new fetcher.
    #[must_use]
    pub fn new(
        access: Arc<MailboxAccess>,
        sync_states: Arc<dyn SyncStateStore>,
        settings: FetcherSettings,
    ) -> Self {
        Self {
            access,
            sync_states,
            settings,
        }
    }

    /// Lists candidate messages for an owner.
    ///
    /// With `incremental` and a previous sync, only messages after the watermark are listed;
    /// otherwise the lookback window applies. Once listing succeeds the watermark moves to
    /// `now`, even if nothing matched. A failing metadata fetch drops that message only.
    ///
    /// # Errors
    ///
    /// - `IngestError::NotConnected` / `IngestError::Unauthorized` for credential problems
    /// - `IngestError::Provider` if listing fails; the watermark is left untouched
    pub async fn list_candidates(
        &self,
        owner_id: OwnerId,
        incremental: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<CandidateMeta>, IngestError> {
        let state = self.sync_states.get_sync_state(owner_id).await?;
        let watermark = state.as_ref().and_then(|s| s.last_sync_at);
        let after = match (incremental, watermark) {
            (true, Some(at)) => at,
            _ => now - Duration::days(self.settings.lookback_days),
        };
        let query = CandidateQuery::after(after);

        let credential = self.access.authorize(owner_id, now).await?;
        let ids = self.list_ids(&credential, &query).await?;

        if state.is_some() {
            self.sync_states.advance_watermark(owner_id, now).await?;
        } else {
            debug!(owner_id = %owner_id, "No sync state row, watermark not recorded");
        }

        let candidates: Vec<CandidateMeta> = stream::iter(ids)
            .map(|id| {
                let credential = &credential;
                async move {
                    let result = self
                        .access
                        .call(self.access.provider().get_metadata(credential, &id))
                        .await;
                    (id, result)
                }
            })
            .buffered(self.settings.concurrency)
            .filter_map(|(id, result)| async move {
                match result {
                    Ok(meta) => Some(meta),
                    Err(e) => {
                        warn!(owner_id = %owner_id, message_id = %id, error = %e, "Skipping candidate metadata");
                        None
                    }
                }
            })
            .collect()
            .await;

        info!(
            owner_id = %owner_id,
            incremental,
            after = %query.lower_bound(),
            candidates = candidates.len(),
            "Mailbox candidates listed"
        );
        Ok(candidates)
    }

    async fn list_ids(
        &self,
        credential: &MailboxCredential,
        query: &CandidateQuery,
    ) -> Result<Vec<String>, IngestError> {
        let rendered = query.render();
        let mut ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..self.settings.max_pages {
            let page = self
                .access
                .call(self.access.provider().list_messages(
                    credential,
                    &rendered,
                    page_token.as_deref(),
                    self.settings.page_size,
                ))
                .await?;

            for id in page.message_ids {
                if ids.len() >= self.settings.max_candidates {
                    break;
                }
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() || ids.len() >= self.settings.max_candidates {
                break;
            }
        }

        Ok(ids)
    }
}
