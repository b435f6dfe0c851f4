//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for the ledger, the staging area and budgets
//! - The scheduler trigger endpoint
//! - JSON error responses

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tally_core::approval::ApprovalService;
use tally_core::budget::BudgetMonitor;
use tally_core::ingest::{CandidateFetcher, StagingPipeline};
use tally_core::ledger::LedgerService;
use tally_core::scheduler::SyncSweep;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger sync engine.
    pub ledger: Arc<LedgerService>,
    /// Review of staged transactions.
    pub approvals: Arc<ApprovalService>,
    /// Budget progress and alerts.
    pub budgets: Arc<BudgetMonitor>,
    /// Mailbox candidate listing.
    pub fetcher: Arc<CandidateFetcher>,
    /// Extraction and staging.
    pub pipeline: Arc<StagingPipeline>,
    /// Periodic sync sweep.
    pub sweep: Arc<SyncSweep>,
    /// Shared secret expected from the scheduler trigger.
    pub cron_secret: Arc<str>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
