use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

use super::types::LiveUpdate;
use crate::database::Database;
use crate::database::models::{MonitorTarget, PollResult, TargetStatus};
use crate::live::BroadcastRegistry;

/// Sentinel outcome code recorded when a probe never completes
/// (timeout, DNS failure, refused connection, TLS failure).
pub const UNREACHABLE: u16 = 0;

/// Executes one health check against a target and records the outcome.
///
/// Classification is strictly binary: a completed request yields its HTTP
/// status code and the target is `active` only on exactly 200; any transport
/// failure yields the sentinel 0. Redirects and error responses therefore
/// count as `inactive` even though the request completed.
pub struct Prober {
    client: reqwest::Client,
    database: Arc<dyn Database>,
    registry: Arc<BroadcastRegistry>,
}

impl Prober {
    pub fn new(
        database: Arc<dyn Database>,
        registry: Arc<BroadcastRegistry>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, database, registry })
    }

    /// Probe the target once, persist the status update and result, then
    /// fan the result out to live subscribers.
    ///
    /// The broadcast happens strictly after the persisted writes succeed;
    /// observers never see a result that was not stored.
    pub async fn probe(&self, target: &MonitorTarget) -> Result<PollResult> {
        let start = Instant::now();

        let status_code = match self.client.get(&target.url).send().await {
            Ok(response) => response.status().as_u16(),
            Err(e) => {
                debug!(target_id = target.id, error = %e, "probe did not complete");
                UNREACHABLE
            }
        };

        let latency_ms = round_to_hundredths(start.elapsed().as_secs_f64() * 1000.0);

        let mut updated = target.clone();
        updated.status =
            if status_code == 200 { TargetStatus::Active } else { TargetStatus::Inactive };
        updated.updated_at = SystemTime::now();
        self.database.update_target(&updated).await?;

        let result = PollResult::new(target.id, status_code, latency_ms);
        self.database.insert_result(&result).await?;

        self.registry.broadcast(target.id, LiveUpdate::from_result(&result)).await;

        debug!(
            target_id = target.id,
            url = %target.url,
            status_code,
            latency_ms,
            "probe completed"
        );

        Ok(result)
    }
}

fn round_to_hundredths(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
