//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Mailbox provider configuration.
    #[serde(default)]
    pub mailbox: MailboxConfig,
    /// Extraction service configuration.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Notification delivery configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Scheduler sweep configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Budget monitoring configuration.
    #[serde(default)]
    pub budget: BudgetConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Mailbox provider (OAuth2 + message API) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailboxConfig {
    /// OAuth2 client id.
    #[serde(default)]
    pub client_id: String,
    /// OAuth2 client secret.
    #[serde(default)]
    pub client_secret: String,
    /// OAuth2 token endpoint used for refresh.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Base URL of the message API.
    #[serde(default = "default_mailbox_api_base")]
    pub api_base_url: String,
    /// Lookback window for a first-time sync.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Maximum number of listing pages fetched per run.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Page size requested from the provider.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Maximum number of candidates returned per run.
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Timeout applied to every provider call.
    #[serde(default = "default_mailbox_timeout")]
    pub request_timeout_secs: u64,
    /// Refresh the access token when it expires within this many seconds.
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin_secs: i64,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token_url: default_token_url(),
            api_base_url: default_mailbox_api_base(),
            lookback_days: default_lookback_days(),
            max_pages: default_max_pages(),
            page_size: default_page_size(),
            max_candidates: default_max_candidates(),
            request_timeout_secs: default_mailbox_timeout(),
            refresh_margin_secs: default_refresh_margin(),
        }
    }
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_mailbox_api_base() -> String {
    "https://gmail.googleapis.com/gmail/v1".to_string()
}

fn default_lookback_days() -> i64 {
    30
}

fn default_max_pages() -> u32 {
    5
}

fn default_page_size() -> u32 {
    25
}

fn default_max_candidates() -> usize {
    50
}

fn default_mailbox_timeout() -> u64 {
    20
}

fn default_refresh_margin() -> i64 {
    300 // 5 minutes
}

/// Generative extraction service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Base URL of the extraction API.
    #[serde(default = "default_extraction_api_base")]
    pub api_base_url: String,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// Model name.
    #[serde(default = "default_extraction_model")]
    pub model: String,
    /// Timeout applied to every extraction call.
    #[serde(default = "default_extraction_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_extraction_api_base(),
            api_key: String::new(),
            model: default_extraction_model(),
            request_timeout_secs: default_extraction_timeout(),
        }
    }
}

fn default_extraction_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_extraction_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_extraction_timeout() -> u64 {
    45
}

/// Notification delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Webhook receiving alert payloads. Alerts are only logged when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Public base URL used to build deep links in alerts.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,
    /// Timeout applied to every delivery.
    #[serde(default = "default_notify_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            app_base_url: default_app_base_url(),
            request_timeout_secs: default_notify_timeout(),
        }
    }
}

fn default_app_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_notify_timeout() -> u64 {
    10
}

/// Scheduler sweep configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Shared secret expected from the periodic trigger.
    #[serde(default)]
    pub cron_secret: String,
    /// Messages processed concurrently within one user's run.
    #[serde(default = "default_message_concurrency")]
    pub message_concurrency: usize,
    /// Users processed concurrently within one sweep.
    #[serde(default = "default_user_concurrency")]
    pub user_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cron_secret: String::new(),
            message_concurrency: default_message_concurrency(),
            user_concurrency: default_user_concurrency(),
        }
    }
}

fn default_message_concurrency() -> usize {
    4
}

fn default_user_concurrency() -> usize {
    2
}

/// Budget monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// IANA timezone used to decide what "today" is for period windows.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// First day of a weekly period (e.g. "sunday").
    #[serde(default = "default_week_start")]
    pub week_start: String,
    /// Suppress repeated alerts for the same crossing within one period.
    #[serde(default = "default_dedupe_alerts")]
    pub dedupe_alerts: bool,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            week_start: default_week_start(),
            dedupe_alerts: default_dedupe_alerts(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_week_start() -> String {
    "sunday".to_string()
}

fn default_dedupe_alerts() -> bool {
    true
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
