use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::prober::Prober;
use crate::database::Database;

/// Shared dependencies of every poll task
pub(crate) struct PollContext {
    pub database: Arc<dyn Database>,
    pub prober: Arc<Prober>,
    /// Sleep applied when the target's interval is invalid or an iteration failed
    pub fallback_interval: Duration,
}

/// Body of one poll task: polls a single target at its own cadence until the
/// target disappears or the task is cancelled.
///
/// Each iteration re-reads the target from the store, so URL and interval
/// edits take effect on the next cycle. Transient failures are logged and
/// mapped to the fallback interval; only cancellation (task abort, observed
/// at any await point) terminates the loop early.
pub(crate) async fn poll_loop(ctx: Arc<PollContext>, target_id: i64) {
    loop {
        let sleep_for = match poll_once(&ctx, target_id).await {
            Ok(Some(cadence)) => cadence,
            Ok(None) => {
                debug!(target_id, "target no longer exists, poll task exiting");
                return;
            }
            Err(e) => {
                warn!(target_id, error = %e, "poll iteration failed, retrying after fallback interval");
                ctx.fallback_interval
            }
        };

        tokio::time::sleep(sleep_for).await;
    }
}

/// One iteration: re-read config, probe, report the next sleep duration.
/// Returns None when the target has been removed from the store.
async fn poll_once(ctx: &PollContext, target_id: i64) -> Result<Option<Duration>> {
    let Some(target) = ctx.database.get_target(target_id).await? else {
        return Ok(None);
    };

    ctx.prober.probe(&target).await?;

    Ok(Some(target.cadence().unwrap_or(ctx.fallback_interval)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryDatabase;
    use crate::database::models::MonitorTarget;
    use crate::live::BroadcastRegistry;
    use tokio::time::timeout;

    fn context(db: Arc<MemoryDatabase>, fallback: Duration) -> Arc<PollContext> {
        let registry = Arc::new(BroadcastRegistry::new());
        let prober = Arc::new(Prober::new(db.clone(), registry, Duration::from_secs(2)).unwrap());
        Arc::new(PollContext { database: db, prober, fallback_interval: fallback })
    }

    fn refused_target(name: &str, interval: i64) -> MonitorTarget {
        MonitorTarget::new(name.into(), "http://127.0.0.1:1/".into(), interval)
    }

    #[tokio::test]
    async fn exits_cleanly_when_target_is_missing() {
        let db = Arc::new(MemoryDatabase::new());
        let ctx = context(db, Duration::from_millis(100));

        timeout(Duration::from_secs(1), poll_loop(ctx, 42))
            .await
            .expect("poll task should exit when its target does not exist");
    }

    #[tokio::test]
    async fn exits_on_next_iteration_after_deletion() {
        let db = Arc::new(MemoryDatabase::new());
        let id = db.put_target(refused_target("gone-soon", 1));
        let ctx = context(db.clone(), Duration::from_millis(100));

        let handle = tokio::spawn(poll_loop(ctx, id));

        // Let the first iteration complete, then pull the target out from under it
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!db.results_for(id).is_empty());
        db.remove_target(id);

        timeout(Duration::from_secs(2), handle)
            .await
            .expect("poll task should exit after its target is deleted")
            .unwrap();
    }

    #[tokio::test]
    async fn survives_read_failures_on_fallback_interval() {
        let db = Arc::new(MemoryDatabase::new());
        let id = db.put_target(refused_target("flaky-store", 1));
        db.set_fail_get(true);

        let ctx = context(db.clone(), Duration::from_millis(50));
        let handle = tokio::spawn(poll_loop(ctx, id));

        // Several failing iterations must not terminate the task
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!handle.is_finished());
        assert_eq!(db.result_count(), 0);

        // Once the store recovers, the removed target ends the loop cleanly
        db.remove_target(id);
        db.set_fail_get(false);
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("poll task should exit once the store recovers and the target is gone")
            .unwrap();
    }

    #[tokio::test]
    async fn invalid_interval_falls_back_to_default() {
        let db = Arc::new(MemoryDatabase::new());
        let id = db.put_target(refused_target("no-cadence", 0));
        let ctx = context(db.clone(), Duration::from_millis(500));

        let next = poll_once(&ctx, id).await.unwrap();
        assert_eq!(next, Some(Duration::from_millis(500)));
        assert_eq!(db.results_for(id).len(), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_the_task() {
        let db = Arc::new(MemoryDatabase::new());
        // Long cadence: the task spends nearly all its time suspended
        let id = db.put_target(refused_target("long-sleeper", 3600));
        let ctx = context(db.clone(), Duration::from_secs(60));

        let handle = tokio::spawn(poll_loop(ctx, id));
        tokio::time::sleep(Duration::from_millis(300)).await;

        handle.abort();
        let join = timeout(Duration::from_secs(1), handle)
            .await
            .expect("aborted poll task should terminate promptly");
        assert!(join.unwrap_err().is_cancelled());
    }
}
