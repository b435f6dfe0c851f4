//! Pure sync scheduling decision.

use chrono::{DateTime, Duration, Timelike, Utc};

use super::types::{MailboxSyncState, SyncInterval};

/// Minimum elapsed time before a daily sync at the preferred hour fires again.
///
/// Shorter than a day so a trigger that runs a little late still fires once per day.
pub const DAILY_TOLERANCE_HOURS: i64 = 20;

/// Decides whether `now` is this mailbox's turn to sync.
#[must_use]
pub fn should_sync_now(state: &MailboxSyncState, now: DateTime<Utc>) -> bool {
    let Some(last) = state.last_sync_at else {
        return true;
    };
    let elapsed = now - last;

    match (state.sync_interval, state.preferred_hour) {
        (SyncInterval::Daily, Some(hour)) => {
            now.hour() == hour && elapsed >= Duration::hours(DAILY_TOLERANCE_HOURS)
        }
        (interval, _) => elapsed >= Duration::hours(i64::from(interval.hours())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tally_shared::types::OwnerId;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        format!("2024-03-13T{hour:02}:05:00Z").parse().unwrap()
    }

    fn state(
        synced_hours_ago: Option<i64>,
        interval: SyncInterval,
        preferred_hour: Option<u32>,
        now: DateTime<Utc>,
    ) -> MailboxSyncState {
        MailboxSyncState {
            owner_id: OwnerId::new(),
            last_sync_at: synced_hours_ago.map(|h| now - Duration::hours(h)),
            sync_interval: interval,
            preferred_hour,
        }
    }

    #[rstest]
    #[case::never_synced_hourly(None, SyncInterval::Hourly, None, 3, true)]
    #[case::never_synced_daily(None, SyncInterval::Daily, Some(14), 9, true)]
    #[case::daily_tolerance_not_met(Some(10), SyncInterval::Daily, Some(14), 14, false)]
    #[case::daily_at_preferred_hour(Some(21), SyncInterval::Daily, Some(14), 14, true)]
    #[case::daily_wrong_hour(Some(21), SyncInterval::Daily, Some(14), 9, false)]
    #[case::daily_exact_tolerance(Some(20), SyncInterval::Daily, Some(14), 14, true)]
    #[case::daily_no_hour_too_soon(Some(23), SyncInterval::Daily, None, 9, false)]
    #[case::daily_no_hour_due(Some(24), SyncInterval::Daily, None, 9, true)]
    #[case::six_hours_due(Some(7), SyncInterval::SixHours, None, 5, true)]
    #[case::six_hours_ignores_preferred_hour(Some(7), SyncInterval::SixHours, Some(14), 5, true)]
    #[case::six_hours_too_soon(Some(5), SyncInterval::SixHours, None, 5, false)]
    #[case::twelve_hours_due(Some(12), SyncInterval::TwelveHours, None, 0, true)]
    #[case::hourly_due(Some(1), SyncInterval::Hourly, None, 22, true)]
    #[case::hourly_too_soon(Some(0), SyncInterval::Hourly, None, 22, false)]
    fn test_should_sync_now(
        #[case] synced_hours_ago: Option<i64>,
        #[case] interval: SyncInterval,
        #[case] preferred_hour: Option<u32>,
        #[case] now_hour: u32,
        #[case] expected: bool,
    ) {
        let now = at_hour(now_hour);
        let state = state(synced_hours_ago, interval, preferred_hour, now);
        assert_eq!(should_sync_now(&state, now), expected);
    }
}
