//! Period windows.
//!
//! A window is a closed range of local calendar days. Spend queries use the half-open UTC
//! range from local midnight of the first day to local midnight after the last day.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::error::BudgetError;
use super::types::PeriodType;

/// The calendar days a budget period covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// First day of the period.
    pub start: NaiveDate,
    /// Last day of the period (inclusive).
    pub end: NaiveDate,
}

impl PeriodWindow {
    /// Computes the period of `period_type` that contains `today`.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PeriodOutOfRange` at the edges of the representable calendar.
    pub fn current(
        period_type: PeriodType,
        today: NaiveDate,
        week_start: Weekday,
    ) -> Result<Self, BudgetError> {
        let out_of_range = || BudgetError::PeriodOutOfRange(today);

        let (start, end) = match period_type {
            PeriodType::Daily => (today, today),
            PeriodType::Weekly => {
                let offset = (7 + today.weekday().num_days_from_monday()
                    - week_start.num_days_from_monday())
                    % 7;
                let start = today
                    .checked_sub_days(Days::new(u64::from(offset)))
                    .ok_or_else(out_of_range)?;
                let end = start.checked_add_days(Days::new(6)).ok_or_else(out_of_range)?;
                (start, end)
            }
            PeriodType::Monthly => {
                let start = today.with_day(1).ok_or_else(out_of_range)?;
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(out_of_range)?;
                (start, end)
            }
            PeriodType::Yearly => {
                let start =
                    NaiveDate::from_ymd_opt(today.year(), 1, 1).ok_or_else(out_of_range)?;
                let end =
                    NaiveDate::from_ymd_opt(today.year(), 12, 31).ok_or_else(out_of_range)?;
                (start, end)
            }
        };

        Ok(Self { start, end })
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Half-open UTC range `[start, end)` covering the window's local days in `tz`.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::PeriodOutOfRange` if the day after the window is unrepresentable.
    pub fn utc_bounds(&self, tz: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>), BudgetError> {
        let after = self
            .end
            .succ_opt()
            .ok_or(BudgetError::PeriodOutOfRange(self.end))?;
        Ok((local_midnight(self.start, tz), local_midnight(after, tz)))
    }
}

/// The calendar date of `now` in `tz`.
#[must_use]
pub fn local_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Parses an IANA timezone name.
///
/// # Errors
///
/// Returns `BudgetError::InvalidTimezone` for unknown names.
pub fn parse_timezone(name: &str) -> Result<Tz, BudgetError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| BudgetError::InvalidTimezone(name.to_string()))
}

/// Parses a weekday name ("sunday", "Mon", ...).
///
/// # Errors
///
/// Returns `BudgetError::InvalidWeekStart` for anything else.
pub fn parse_week_start(name: &str) -> Result<Weekday, BudgetError> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| BudgetError::InvalidWeekStart(name.to_string()))
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    // Midnight can be skipped by a DST jump; fall back to reading it as UTC
    tz.from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
}
