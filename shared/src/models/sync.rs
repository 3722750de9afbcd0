//! Sync pass reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::SyncTrigger;

/// Counters collected over one pass across all locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSummary {
    pub trigger: SyncTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Locations returned by the location store
    pub locations_seen: usize,
    /// Disabled locations that were not fetched
    pub locations_skipped: usize,
    /// Snapshots persisted
    pub weather_count: usize,
    /// New alerts persisted
    pub alert_count: usize,
    /// Alerts dropped because an identical one is already active
    pub duplicate_count: usize,
    /// Alerts dropped because their expiry had already passed
    pub expired_count: usize,
}

impl SyncSummary {
    pub fn begin(trigger: SyncTrigger) -> Self {
        let now = Utc::now();
        Self {
            trigger,
            started_at: now,
            finished_at: now,
            locations_seen: 0,
            locations_skipped: 0,
            weather_count: 0,
            alert_count: 0,
            duplicate_count: 0,
            expired_count: 0,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
