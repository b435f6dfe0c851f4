//! Budget progress and threshold evaluation.

use rust_decimal::Decimal;

use super::period::PeriodWindow;
use super::types::{AlertLevel, Budget, BudgetProgress};

/// Budget service for business logic.
pub struct BudgetService;

impl BudgetService {
    /// Calculate progress of `spent` against a budget's limit.
    ///
    /// - remaining = max(amount - spent, 0)
    /// - overage = max(spent - amount, 0)
    /// - progress = spent / amount * 100, rounded to 2 places; 0 for a zero limit
    #[must_use]
    pub fn progress(budget: &Budget, spent: Decimal, period: PeriodWindow) -> BudgetProgress {
        let progress_pct = Self::raw_percent(budget.amount, spent).round_dp(2);

        BudgetProgress {
            budget_id: budget.id,
            name: budget.name.clone(),
            amount: budget.amount,
            spent,
            remaining: (budget.amount - spent).max(Decimal::ZERO),
            progress_pct,
            overage: (spent - budget.amount).max(Decimal::ZERO),
            period_start: period.start,
            period_end: period.end,
        }
    }

    /// Decide which alert, if any, a budget's progress warrants.
    ///
    /// Thresholds compare unrounded values so 99.999% is never reported as exceeded.
    /// A zero limit never alerts.
    #[must_use]
    pub fn evaluate(budget: &Budget, spent: Decimal) -> Option<AlertLevel> {
        if budget.amount <= Decimal::ZERO {
            return None;
        }
        if spent >= budget.amount {
            return Some(AlertLevel::Exceeded);
        }
        if Self::raw_percent(budget.amount, spent) >= budget.alert_at_percentage {
            return Some(AlertLevel::NearLimit);
        }
        None
    }

    /// Text shown to the user for an alert.
    #[must_use]
    pub fn alert_message(budget: &Budget, level: AlertLevel, progress: &BudgetProgress) -> String {
        match level {
            AlertLevel::NearLimit => format!(
                "You've used {}% of your {} budget ({} of {}).",
                progress.progress_pct.normalize(),
                budget.name,
                progress.spent,
                budget.amount
            ),
            AlertLevel::Exceeded => format!(
                "You've exceeded your {} budget by {}.",
                budget.name, progress.overage
            ),
        }
    }

    fn raw_percent(amount: Decimal, spent: Decimal) -> Decimal {
        if amount.is_zero() {
            Decimal::ZERO
        } else {
            spent / amount * Decimal::ONE_HUNDRED
        }
    }
}
