//! Scheduler domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::OwnerId;

/// How often a mailbox is synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum SyncInterval {
    /// Every hour.
    Hourly,
    /// Every 6 hours.
    SixHours,
    /// Every 12 hours.
    TwelveHours,
    /// Once a day.
    Daily,
}

impl SyncInterval {
    /// Interval length in hours.
    #[must_use]
    pub const fn hours(self) -> i32 {
        match self {
            Self::Hourly => 1,
            Self::SixHours => 6,
            Self::TwelveHours => 12,
            Self::Daily => 24,
        }
    }

    /// Parses an interval from its length in hours.
    #[must_use]
    pub const fn from_hours(hours: i32) -> Option<Self> {
        match hours {
            1 => Some(Self::Hourly),
            6 => Some(Self::SixHours),
            12 => Some(Self::TwelveHours),
            24 => Some(Self::Daily),
            _ => None,
        }
    }
}

impl TryFrom<i32> for SyncInterval {
    type Error = String;

    fn try_from(hours: i32) -> Result<Self, Self::Error> {
        Self::from_hours(hours).ok_or_else(|| format!("unsupported sync interval: {hours}h"))
    }
}

impl From<SyncInterval> for i32 {
    fn from(interval: SyncInterval) -> Self {
        interval.hours()
    }
}

/// Per-owner mailbox sync schedule and watermark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxSyncState {
    /// Owner of the mailbox.
    pub owner_id: OwnerId,
    /// Watermark: when candidates were last listed. `None` if never synced.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// How often to sync.
    pub sync_interval: SyncInterval,
    /// UTC hour (0-23) at which daily syncs should run.
    pub preferred_hour: Option<u32>,
}
