use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Lifecycle status of a monitored target, as persisted in the store.
///
/// A target is `Active` only while its most recent probe came back with an
/// HTTP 200; every other outcome (including redirects and client errors)
/// marks it `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Active,
    Inactive,
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetStatus::Active => write!(f, "active"),
            TargetStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl TargetStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => TargetStatus::Active,
            _ => TargetStatus::Inactive,
        }
    }
}

/// MonitorTarget model - a registered endpoint under monitoring
///
/// The persistence store owns this record; the engine re-reads it every poll
/// cycle instead of caching it, so interval and URL edits take effect on the
/// next iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorTarget {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub interval_seconds: i64,
    pub status: TargetStatus,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl MonitorTarget {
    /// Create a new target with the given cadence
    pub fn new(name: String, url: String, interval_seconds: i64) -> Self {
        let now = SystemTime::now();
        Self {
            id: 0,
            name,
            url,
            interval_seconds,
            status: TargetStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Configured polling cadence, or None when the stored interval is not a
    /// positive number of seconds.
    pub fn cadence(&self) -> Option<Duration> {
        if self.interval_seconds > 0 {
            Some(Duration::from_secs(self.interval_seconds as u64))
        } else {
            None
        }
    }

    /// Convert SystemTime to Unix timestamp
    pub fn timestamp_to_i64(time: SystemTime) -> i64 {
        time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
    }

    /// Convert Unix timestamp to SystemTime
    pub fn i64_to_timestamp(timestamp: i64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64)
    }
}

/// PollResult model - one recorded health check outcome
///
/// `status_code` 0 is the sentinel for "probe never completed" (timeout, DNS,
/// connect or TLS failure). Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResult {
    pub id: Option<i64>,
    pub target_id: i64,
    pub status_code: u16,
    pub latency_ms: f64,
    pub timestamp: SystemTime,
}

impl PollResult {
    pub fn new(target_id: i64, status_code: u16, latency_ms: f64) -> Self {
        Self { id: None, target_id, status_code, latency_ms, timestamp: SystemTime::now() }
    }

    /// Whether the probed endpoint counts as up (strictly 200)
    pub fn is_healthy(&self) -> bool {
        self.status_code == 200
    }
}
