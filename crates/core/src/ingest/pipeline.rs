//! Staging pipeline: fetch, extract, upsert.
//!
//! Every message is processed independently. A message that fails to fetch, extract or store
//! is counted and logged, and never stops its siblings.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tally_shared::types::{OwnerId, PendingTransactionId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::{ExtractError, IngestError};
use super::extraction::{Extractor, parse_extraction};
use super::provider::MailboxAccess;
use super::store::StagingStore;
use super::types::{
    Category, ExtractedTransaction, Extraction, ExtractionInput, ExtractionRequest,
    MailboxCredential, StageReport,
};
use crate::approval::{PendingStatus, PendingTransaction};

/// Message bodies are cut to this many characters before extraction.
pub const MAX_BODY_CHARS: usize = 20_000;

/// Concurrency and time limits of one staging run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Messages processed at once.
    pub concurrency: usize,
    /// Timeout of one extraction call.
    pub extraction_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            extraction_timeout: Duration::from_secs(45),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MessageOutcome {
    Staged,
    Skipped,
}

/// Turns messages and receipts into staged transactions.
pub struct StagingPipeline {
    access: Arc<MailboxAccess>,
    extractor: Arc<dyn Extractor>,
    staging: Arc<dyn StagingStore>,
    settings: PipelineSettings,
}

impl StagingPipeline {
    /// Creates a new pipeline.
    #[must_use]
    pub fn new(
        access: Arc<MailboxAccess>,
        extractor: Arc<dyn Extractor>,
        staging: Arc<dyn StagingStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            access,
            extractor,
            staging,
            settings,
        }
    }

    /// Stages the given messages for an owner.
    ///
    /// Duplicate ids are processed once. Staging the same message again overwrites the
    /// pending row with the newer extraction; rows already approved or rejected are skipped.
    ///
    /// # Errors
    ///
    /// Only errors that abort the whole run: missing or unusable credentials and failure to
    /// load the owner's categories. Per-message failures are counted in the report.
    pub async fn stage(
        &self,
        owner_id: OwnerId,
        message_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<StageReport, IngestError> {
        let mut seen = HashSet::new();
        let ids: Vec<&str> = message_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .collect();

        let mut report = StageReport {
            attempted: ids.len(),
            ..StageReport::default()
        };
        if ids.is_empty() {
            return Ok(report);
        }

        let categories = self.staging.list_categories(owner_id).await?;
        let credential = self.access.authorize(owner_id, now).await?;

        let outcomes: Vec<(String, Result<MessageOutcome, IngestError>)> = stream::iter(ids.into_iter().map(str::to_owned))
            .map(|id: String| {
                let credential = &credential;
                let categories = categories.as_slice();
                async move {
                    let outcome = self
                        .stage_message(owner_id, credential, categories, &id, now)
                        .await;
                    (id, outcome)
                }
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        for (id, outcome) in outcomes {
            match outcome {
                Ok(MessageOutcome::Staged) => report.staged += 1,
                Ok(MessageOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    warn!(owner_id = %owner_id, message_id = %id, error = %e, "Failed to stage message");
                    report.failed += 1;
                }
            }
        }

        info!(
            owner_id = %owner_id,
            attempted = report.attempted,
            staged = report.staged,
            skipped = report.skipped,
            failed = report.failed,
            "Staging run finished"
        );
        Ok(report)
    }

    /// Extracts a transaction from a receipt image and stages it.
    ///
    /// Returns `None` if the image shows no transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or storage fails.
    pub async fn stage_receipt(
        &self,
        owner_id: OwnerId,
        mime_type: &str,
        data: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingTransaction>, IngestError> {
        let categories = self.staging.list_categories(owner_id).await?;
        let request = ExtractionRequest {
            input: ExtractionInput::Image {
                mime_type: mime_type.to_string(),
                data,
            },
            categories,
            reference_time: now,
        };
        let raw = self.extract(&request).await?;

        let Extraction::Recognized(extracted) = parse_extraction(&raw, &request.categories, now)
        else {
            debug!(owner_id = %owner_id, "Receipt holds no transaction");
            return Ok(None);
        };

        let source_id = format!("receipt:{}", Uuid::now_v7());
        let pending = pending_from(owner_id, source_id, extracted, now);
        self.staging.upsert_pending(&pending).await?;
        info!(owner_id = %owner_id, pending_id = %pending.id, "Receipt staged");
        Ok(Some(pending))
    }

    async fn stage_message(
        &self,
        owner_id: OwnerId,
        credential: &MailboxCredential,
        categories: &[Category],
        message_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MessageOutcome, IngestError> {
        let message = self
            .access
            .call(self.access.provider().get_message(credential, message_id))
            .await?;

        let text: String = format!("Subject: {}\n\n{}", message.subject, message.text)
            .chars()
            .take(MAX_BODY_CHARS)
            .collect();
        let reference_time = message.received_at.unwrap_or(now);
        let request = ExtractionRequest {
            input: ExtractionInput::Text(text),
            categories: categories.to_vec(),
            reference_time,
        };
        let raw = self.extract(&request).await?;

        let Extraction::Recognized(extracted) = parse_extraction(&raw, categories, reference_time)
        else {
            debug!(owner_id = %owner_id, message_id, "Message holds no transaction");
            return Ok(MessageOutcome::Skipped);
        };

        let pending = pending_from(owner_id, message_id.to_string(), extracted, now);
        if self.staging.upsert_pending(&pending).await? {
            Ok(MessageOutcome::Staged)
        } else {
            debug!(owner_id = %owner_id, message_id, "Message already reviewed");
            Ok(MessageOutcome::Skipped)
        }
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<String, ExtractError> {
        tokio::time::timeout(
            self.settings.extraction_timeout,
            self.extractor.extract(request),
        )
        .await
        .map_err(|_| ExtractError::Timeout)?
    }
}

fn pending_from(
    owner_id: OwnerId,
    source_message_id: String,
    extracted: ExtractedTransaction,
    now: DateTime<Utc>,
) -> PendingTransaction {
    PendingTransaction {
        id: PendingTransactionId::new(),
        owner_id,
        kind: extracted.kind,
        amount: extracted.amount,
        category_id: extracted.category_id,
        account: None,
        occurred_at: extracted.occurred_at,
        description: extracted.description,
        source_message_id,
        status: PendingStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}
