use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::PollResult;

/// Wire message pushed to live subscribers after each poll.
///
/// Serializes as `{"status": <code>, "latency": <ms>, "timestamp": "HH:MM:SS"}`.
/// `status` is the HTTP status code, or 0 when the probe never completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub status: u16,
    pub latency: f64,
    pub timestamp: String,
}

impl LiveUpdate {
    pub fn from_result(result: &PollResult) -> Self {
        let when: DateTime<Utc> = result.timestamp.into();
        Self {
            status: result.status_code,
            latency: result.latency_ms,
            timestamp: when.format("%H:%M:%S").to_string(),
        }
    }
}
