//! Property-based tests for budget progress and threshold evaluation.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tally_shared::types::{BudgetId, OwnerId};

use super::period::PeriodWindow;
use super::service::BudgetService;
use super::types::{AlertLevel, Budget, PeriodType};

/// Strategy to generate non-negative amounts (0.00 to 10,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn budget(limit: Decimal, alert_at: u32) -> Budget {
    Budget {
        id: BudgetId::new(),
        owner_id: OwnerId::new(),
        name: "Food".to_string(),
        category_id: None,
        amount: limit,
        period_type: PeriodType::Monthly,
        alert_at_percentage: Decimal::from(alert_at),
        created_at: Utc::now(),
    }
}

fn march() -> PeriodWindow {
    PeriodWindow {
        start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// remaining and overage are never negative, at most one is non-zero,
    /// and remaining - overage == amount - spent
    #[test]
    fn prop_remaining_and_overage_partition(limit in amount(), spent in amount()) {
        let progress = BudgetService::progress(&budget(limit, 80), spent, march());

        prop_assert!(progress.remaining >= Decimal::ZERO);
        prop_assert!(progress.overage >= Decimal::ZERO);
        prop_assert!(progress.remaining.is_zero() || progress.overage.is_zero());
        prop_assert_eq!(progress.remaining - progress.overage, limit - spent);
    }

    /// Exceeded exactly when spent reaches a positive limit; a zero limit never alerts
    #[test]
    fn prop_exceeded_iff_spent_reaches_limit(
        limit in amount(),
        spent in amount(),
        alert_at in 1u32..=100,
    ) {
        let level = BudgetService::evaluate(&budget(limit, alert_at), spent);

        if limit.is_zero() {
            prop_assert_eq!(level, None);
        } else {
            prop_assert_eq!(level == Some(AlertLevel::Exceeded), spent >= limit);
        }
    }

    /// Below the limit, near-limit fires exactly when the threshold is reached
    #[test]
    fn prop_near_limit_respects_threshold(
        limit in 1i64..1_000_000i64,
        spent_cents in 0i64..1_000_000i64,
        alert_at in 1u32..=100,
    ) {
        let limit = Decimal::new(limit, 2);
        let spent = Decimal::new(spent_cents, 2);
        prop_assume!(spent < limit);

        let level = BudgetService::evaluate(&budget(limit, alert_at), spent);
        let reached = spent * Decimal::ONE_HUNDRED >= limit * Decimal::from(alert_at);
        prop_assert_eq!(level == Some(AlertLevel::NearLimit), reached);
        prop_assert_ne!(level, Some(AlertLevel::Exceeded));
    }
}
