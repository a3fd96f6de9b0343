use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Raw records kept when no retention period is configured
pub const DEFAULT_DAYS_TO_KEEP: u32 = 90;

/// Longest honoured retention period, about 2700 years. Larger values are
/// clamped so both cutoffs stay within the timestamp range of the database.
pub const MAX_DAYS_TO_KEEP: u32 = 1_000_000;

/// Points in time before which records are deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionCutoffs {
    /// Raw detections, state history and system events
    pub raw_before: DateTime<Utc>,
    /// Aggregated analytics rows live twice as long as raw records
    pub aggregated_before: NaiveDate,
}

impl RetentionCutoffs {
    pub fn new(now: DateTime<Utc>, days_to_keep: u32) -> Self {
        let days = i64::from(days_to_keep.min(MAX_DAYS_TO_KEEP));
        Self {
            raw_before: now - Duration::days(days),
            aggregated_before: (now - Duration::days(days * 2)).date_naive(),
        }
    }
}

/// Rows removed by one retention sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub cutoffs: RetentionCutoffs,
    pub detections_deleted: u64,
    pub state_history_deleted: u64,
    pub events_deleted: u64,
    pub analytics_deleted: u64,
}

impl CleanupReport {
    pub fn total(&self) -> u64 {
        self.detections_deleted
            + self.state_history_deleted
            + self.events_deleted
            + self.analytics_deleted
    }
}
