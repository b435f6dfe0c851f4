//! Ingestion domain types.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{CategoryId, OwnerId};

use crate::ledger::TransactionKind;

/// A user-defined transaction category offered to the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category ID.
    pub id: CategoryId,
    /// Owner of the category.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Whether the category is for income or expenses.
    pub kind: TransactionKind,
}

/// Persisted OAuth2 credential for a connected mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxCredential {
    /// Bearer token for provider calls.
    pub access_token: String,
    /// Token used to mint new access tokens.
    pub refresh_token: Option<String>,
    /// When the access token stops working.
    pub expires_at: Option<DateTime<Utc>>,
}

impl MailboxCredential {
    /// Returns true if the access token expires within `margin` of `now`.
    ///
    /// A credential without an expiry is treated as fresh.
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at.is_some_and(|at| at - now <= margin)
    }
}

/// Lightweight metadata for a candidate message. Bodies are fetched only when staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMeta {
    /// Provider message id.
    pub message_id: String,
    /// Subject header.
    pub subject: String,
    /// Provider snippet.
    pub snippet: String,
    /// From header.
    pub sender: Option<String>,
    /// Provider timestamp.
    pub received_at: Option<DateTime<Utc>>,
}

/// One page of a message search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    /// Message ids on this page.
    pub message_ids: Vec<String>,
    /// Token for the next page, if any.
    pub next_page_token: Option<String>,
}

/// A fully fetched and decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody {
    /// Provider message id.
    pub message_id: String,
    /// Subject header.
    pub subject: String,
    /// Decoded plain text of the body.
    pub text: String,
    /// Provider timestamp.
    pub received_at: Option<DateTime<Utc>>,
}

/// What the extractor is asked to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionInput {
    /// Message text.
    Text(String),
    /// Receipt photo or scan.
    Image {
        /// MIME type of the image.
        mime_type: String,
        /// Raw image bytes.
        data: Vec<u8>,
    },
}

/// A call to the extraction service.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Content to read.
    pub input: ExtractionInput,
    /// Categories the extractor may choose from.
    pub categories: Vec<Category>,
    /// Anchor for relative dates ("yesterday").
    pub reference_time: DateTime<Utc>,
}

/// A financial event read out of a message or receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedTransaction {
    /// Positive amount.
    pub amount: Decimal,
    /// Merchant or purpose.
    pub description: String,
    /// One of the offered categories, if the extractor picked a known one.
    pub category_id: Option<CategoryId>,
    /// Income or expense.
    pub kind: TransactionKind,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
}

/// Validated extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The content describes a financial event.
    Recognized(ExtractedTransaction),
    /// Nothing usable was found.
    NotATransaction,
}

/// Outcome counts of one staging run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Distinct message ids attempted.
    pub attempted: usize,
    /// Messages written to the staging area.
    pub staged: usize,
    /// Messages with no transaction, or already reviewed.
    pub skipped: usize,
    /// Messages that failed to fetch, extract or store.
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expires_in: Option<i64>, now: DateTime<Utc>) -> MailboxCredential {
        MailboxCredential {
            access_token: "token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: expires_in.map(|secs| now + Duration::seconds(secs)),
        }
    }

    #[test]
    fn test_credential_expiry_margin() {
        let now = Utc::now();
        let margin = Duration::seconds(300);
        assert!(credential(Some(60), now).expires_within(now, margin));
        assert!(credential(Some(-10), now).expires_within(now, margin));
        assert!(!credential(Some(3600), now).expires_within(now, margin));
        assert!(!credential(None, now).expires_within(now, margin));
    }
}
