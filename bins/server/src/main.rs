//! Tally API Server
//!
//! Main entry point: configuration, database, external clients, services, router.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::{AppState, create_router};
use tally_clients::{
    GeminiExtractor, GmailProvider, LogNotifier, OAuthRefresher, WebhookNotifier, http_client,
};
use tally_core::approval::ApprovalService;
use tally_core::budget::{BudgetMonitor, MonitorSettings};
use tally_core::ingest::{
    CandidateFetcher, FetcherSettings, MailboxAccess, PipelineSettings, StagingPipeline,
};
use tally_core::ledger::LedgerService;
use tally_core::notify::Notifier;
use tally_core::scheduler::SyncSweep;
use tally_db::{BudgetRepository, LedgerRepository, MailboxRepository, StagingRepository, connect};
use tally_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let ledger_store = Arc::new(LedgerRepository::new(db.clone()));
    let budget_store = Arc::new(BudgetRepository::new(db.clone()));
    let staging_store = Arc::new(StagingRepository::new(db.clone()));
    let mailbox_store = Arc::new(MailboxRepository::new(db));

    // External collaborators
    let mailbox_timeout = Duration::from_secs(config.mailbox.request_timeout_secs);
    let mailbox_http = http_client(mailbox_timeout)?;
    let provider = GmailProvider::new(mailbox_http.clone(), &config.mailbox.api_base_url)?;
    let refresher = OAuthRefresher::new(
        mailbox_http,
        &config.mailbox.token_url,
        &config.mailbox.client_id,
        &config.mailbox.client_secret,
    );

    let extraction_timeout = Duration::from_secs(config.extraction.request_timeout_secs);
    let extractor = GeminiExtractor::new(
        http_client(extraction_timeout)?,
        &config.extraction.api_base_url,
        &config.extraction.api_key,
        &config.extraction.model,
    );

    let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
        Some(url) => {
            info!(url = %url, "Budget alerts delivered by webhook");
            Arc::new(WebhookNotifier::new(
                http_client(Duration::from_secs(config.notifications.request_timeout_secs))?,
                url,
            ))
        }
        None => {
            info!("No notification webhook configured, budget alerts are logged only");
            Arc::new(LogNotifier)
        }
    };

    // Services
    let monitor = Arc::new(BudgetMonitor::new(
        budget_store,
        notifier,
        MonitorSettings::from_config(&config.budget, &config.notifications.app_base_url)?,
    ));
    let ledger = Arc::new(LedgerService::new(ledger_store).with_monitor(monitor.clone()));
    let approvals = Arc::new(ApprovalService::new(ledger.clone(), staging_store.clone()));

    let access = Arc::new(MailboxAccess::new(
        Arc::new(provider),
        Arc::new(refresher),
        mailbox_store.clone(),
        mailbox_timeout,
        chrono::Duration::seconds(config.mailbox.refresh_margin_secs),
    ));
    let fetcher = Arc::new(CandidateFetcher::new(
        access.clone(),
        mailbox_store.clone(),
        FetcherSettings::from_config(&config.mailbox, config.sync.message_concurrency),
    ));
    let pipeline = Arc::new(StagingPipeline::new(
        access,
        Arc::new(extractor),
        staging_store,
        PipelineSettings {
            concurrency: config.sync.message_concurrency.max(1),
            extraction_timeout,
        },
    ));
    let sweep = Arc::new(SyncSweep::new(
        mailbox_store,
        fetcher.clone(),
        pipeline.clone(),
        config.sync.user_concurrency,
    ));

    if config.sync.cron_secret.is_empty() {
        warn!("sync.cron_secret is not set; the scheduler trigger will reject every call");
    }

    // Create application state
    let state = AppState {
        ledger,
        approvals,
        budgets: monitor,
        fetcher,
        pipeline,
        sweep,
        cron_secret: Arc::from(config.sync.cron_secret.as_str()),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
