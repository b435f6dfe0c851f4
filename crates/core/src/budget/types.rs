//! Budget data types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tally_shared::types::{BudgetId, CategoryId, OwnerId};

/// Length of the window a budget's spend is measured over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Today only.
    Daily,
    /// The current calendar week.
    Weekly,
    /// The current calendar month.
    Monthly,
    /// The current calendar year.
    Yearly,
}

impl PeriodType {
    /// Returns the string representation of the period type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Parses a period type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" | "annual" => Some(Self::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spending limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Budget ID.
    pub id: BudgetId,
    /// Owner of the budget.
    pub owner_id: OwnerId,
    /// Display name.
    pub name: String,
    /// Category scope; `None` counts every expense.
    pub category_id: Option<CategoryId>,
    /// Limit for one period.
    pub amount: Decimal,
    /// Period the limit applies to.
    pub period_type: PeriodType,
    /// Percentage at which a near-limit alert is raised.
    pub alert_at_percentage: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Budget {
    /// Returns true if expenses in `category` count against this budget.
    ///
    /// A `None` filter matches every budget.
    #[must_use]
    pub fn covers(&self, category: Option<CategoryId>) -> bool {
        match (category, self.category_id) {
            (None, _) | (Some(_), None) => true,
            (Some(wanted), Some(own)) => wanted == own,
        }
    }
}

/// Spend against a budget over its current period. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetProgress {
    /// Budget ID.
    pub budget_id: BudgetId,
    /// Budget name.
    pub name: String,
    /// Limit for the period.
    pub amount: Decimal,
    /// Sum of matching expenses in the period.
    pub spent: Decimal,
    /// Amount left before the limit, never negative.
    pub remaining: Decimal,
    /// Spent as a percentage of the limit, 2 decimal places.
    pub progress_pct: Decimal,
    /// Amount spent beyond the limit, never negative.
    pub overage: Decimal,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period (inclusive).
    pub period_end: NaiveDate,
}

/// Severity of a budget alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// At or above the alert percentage, below 100%.
    NearLimit,
    /// At or above 100%.
    Exceeded,
}

impl AlertLevel {
    /// Returns the string representation of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NearLimit => "near_limit",
            Self::Exceeded => "exceeded",
        }
    }

    /// Parses a level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "near_limit" => Some(Self::NearLimit),
            "exceeded" => Some(Self::Exceeded),
            _ => None,
        }
    }
}

/// An alert raised by a threshold check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetAlert {
    /// Budget that crossed a threshold.
    pub budget_id: BudgetId,
    /// Owner to notify.
    pub owner_id: OwnerId,
    /// Severity.
    pub level: AlertLevel,
    /// Progress at the time of the check.
    pub progress_pct: Decimal,
    /// Spent beyond the limit (zero for near-limit alerts).
    pub overage: Decimal,
    /// First day of the period the alert belongs to.
    pub period_start: NaiveDate,
    /// Human readable text.
    pub message: String,
    /// Deep link to the budget.
    pub url: String,
}
