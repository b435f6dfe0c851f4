//! Budget threshold monitor.
//!
//! Progress is recomputed from the ledger on every call and never cached. `check_alerts` runs
//! after every expense-affecting ledger mutation and hands alerts to the [`Notifier`].

use std::sync::Arc;

use chrono::{DateTime, Utc, Weekday};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use tally_shared::config::BudgetConfig;
use tally_shared::types::{CategoryId, OwnerId};
use tracing::{debug, info, warn};

use super::error::BudgetError;
use super::period::{PeriodWindow, local_today, parse_timezone, parse_week_start};
use super::service::BudgetService;
use super::store::BudgetStore;
use super::types::{AlertLevel, Budget, BudgetAlert, BudgetProgress};
use crate::notify::{Notification, Notifier};

/// Settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Timezone in which "today" is decided.
    pub timezone: Tz,
    /// First day of weekly periods.
    pub week_start: Weekday,
    /// Send each (budget, period, level) alert only once.
    pub dedupe_alerts: bool,
    /// Base URL for deep links.
    pub app_base_url: String,
}

impl MonitorSettings {
    /// Resolves settings from the budget config section.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown timezone or weekday.
    pub fn from_config(config: &BudgetConfig, app_base_url: &str) -> Result<Self, BudgetError> {
        Ok(Self {
            timezone: parse_timezone(&config.timezone)?,
            week_start: parse_week_start(&config.week_start)?,
            dedupe_alerts: config.dedupe_alerts,
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            week_start: Weekday::Sun,
            dedupe_alerts: true,
            app_base_url: String::new(),
        }
    }
}

/// Recomputes budget progress and raises threshold alerts.
pub struct BudgetMonitor {
    store: Arc<dyn BudgetStore>,
    notifier: Arc<dyn Notifier>,
    settings: MonitorSettings,
}

impl BudgetMonitor {
    /// Creates a new monitor.
    #[must_use]
    pub fn new(
        store: Arc<dyn BudgetStore>,
        notifier: Arc<dyn Notifier>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    /// Progress of one budget over the period containing `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense query fails.
    pub async fn progress(
        &self,
        budget: &Budget,
        now: DateTime<Utc>,
    ) -> Result<BudgetProgress, BudgetError> {
        let today = local_today(now, self.settings.timezone);
        let window = PeriodWindow::current(budget.period_type, today, self.settings.week_start)?;
        let (from, to) = window.utc_bounds(self.settings.timezone)?;
        let spent = self
            .store
            .sum_expenses(budget.owner_id, from, to, budget.category_id)
            .await?;
        Ok(BudgetService::progress(budget, spent, window))
    }

    /// Progress of every budget an owner has.
    ///
    /// # Errors
    ///
    /// Returns an error if a datastore query fails.
    pub async fn progress_for_owner(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> Result<Vec<BudgetProgress>, BudgetError> {
        let budgets = self.store.list_budgets(owner_id).await?;
        let mut progress = Vec::with_capacity(budgets.len());
        for budget in &budgets {
            progress.push(self.progress(budget, now).await?);
        }
        Ok(progress)
    }

    /// Re-evaluates the owner's budgets that cover `category` and sends any alerts due.
    ///
    /// Returns the alerts that were raised. Notification failures are logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a datastore query fails.
    pub async fn check_alerts(
        &self,
        owner_id: OwnerId,
        category: Option<CategoryId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<BudgetAlert>, BudgetError> {
        let budgets = self.store.list_budgets(owner_id).await?;
        let mut raised = Vec::new();

        for budget in budgets.iter().filter(|b| b.covers(category)) {
            let progress = self.progress(budget, now).await?;
            let Some(level) = BudgetService::evaluate(budget, progress.spent) else {
                continue;
            };

            if self.settings.dedupe_alerts
                && !self
                    .store
                    .record_alert(budget.id, progress.period_start, level, now)
                    .await?
            {
                debug!(budget_id = %budget.id, level = level.as_str(), "Alert already sent this period");
                continue;
            }

            let alert = BudgetAlert {
                budget_id: budget.id,
                owner_id,
                level,
                progress_pct: progress.progress_pct,
                overage: match level {
                    AlertLevel::Exceeded => progress.overage,
                    AlertLevel::NearLimit => Decimal::ZERO,
                },
                period_start: progress.period_start,
                message: BudgetService::alert_message(budget, level, &progress),
                url: format!("{}/budgets/{}", self.settings.app_base_url, budget.id),
            };
            info!(
                budget_id = %budget.id,
                owner_id = %owner_id,
                level = level.as_str(),
                progress_pct = %alert.progress_pct,
                "Budget threshold crossed"
            );
            self.deliver(budget, &alert).await;
            raised.push(alert);
        }

        Ok(raised)
    }

    async fn deliver(&self, budget: &Budget, alert: &BudgetAlert) {
        let title = match alert.level {
            AlertLevel::NearLimit => format!("{} budget almost used", budget.name),
            AlertLevel::Exceeded => format!("{} budget exceeded", budget.name),
        };
        let notification = Notification {
            owner_id: alert.owner_id,
            title,
            body: alert.message.clone(),
            budget_id: Some(alert.budget_id),
            url: Some(alert.url.clone()),
        };
        if let Err(e) = self.notifier.send(&notification).await {
            warn!(budget_id = %alert.budget_id, error = %e, "Failed to deliver budget alert");
        }
    }
}
