use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::prober::Prober;
use super::scheduler::Scheduler;
use crate::database::Database;
use crate::live::BroadcastRegistry;

/// Tunables for the polling engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Cadence of the reconciliation loop, independent of any target's interval
    pub reconcile_interval: Duration,
    /// Outbound probe timeout
    pub probe_timeout: Duration,
    /// Sleep applied when a target's interval is invalid or an iteration failed
    pub fallback_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(10),
            fallback_interval: Duration::from_secs(60),
        }
    }
}

/// Handle to the running polling engine.
///
/// `start` launches the reconciliation loop as a background task; `stop`
/// requests cancellation and waits for the scheduler to tear down every poll
/// task before returning.
pub struct MonitorEngine {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl MonitorEngine {
    pub fn start(
        database: Arc<dyn Database>,
        registry: Arc<BroadcastRegistry>,
        settings: EngineSettings,
    ) -> Result<Self> {
        let prober = Arc::new(Prober::new(database.clone(), registry, settings.probe_timeout)?);
        let scheduler = Scheduler::new(database, prober, settings.fallback_interval);

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let tick = settings.reconcile_interval;

        info!(
            reconcile_interval = ?tick,
            probe_timeout = ?settings.probe_timeout,
            "starting monitor engine"
        );
        let handle = tokio::spawn(scheduler.run(token, tick));

        Ok(Self { shutdown, handle })
    }

    /// Cancel the scheduler and wait for full teardown
    pub async fn stop(self) {
        info!("stopping monitor engine");
        self.shutdown.cancel();
        if let Err(e) = self.handle.await {
            error!(error = %e, "scheduler task ended abnormally");
        }
        info!("monitor engine stopped");
    }
}
