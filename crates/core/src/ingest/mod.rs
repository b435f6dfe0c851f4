//! Mailbox ingestion: candidate listing, extraction and staging.
//!
//! # Modules
//!
//! - `types` - Credentials, message and extraction types
//! - `query` - Provider search query for candidate messages
//! - `provider` - Mailbox provider collaborators and token refresh
//! - `extraction` - Extraction collaborator and reply validation
//! - `fetcher` - Incremental candidate listing and watermark
//! - `pipeline` - Per-message extraction into the staging area
//! - `store` - Datastore collaborators for staging and sync state
//! - `error` - Ingestion error types

pub mod error;
pub mod extraction;
pub mod fetcher;
pub mod pipeline;
pub mod provider;
pub mod query;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{ExtractError, IngestError, ProviderError};
pub use extraction::{Extractor, extraction_prompt, parse_extraction};
pub use fetcher::{CandidateFetcher, FetcherSettings};
pub use pipeline::{PipelineSettings, StagingPipeline};
pub use provider::{CredentialStore, MailboxAccess, MailboxProvider, TokenRefresher};
pub use query::CandidateQuery;
pub use store::{StagingStore, SyncStateStore};
pub use types::{
    CandidateMeta, Category, ExtractedTransaction, Extraction, ExtractionInput,
    ExtractionRequest, MailboxCredential, MessageBody, MessagePage, StageReport,
};
