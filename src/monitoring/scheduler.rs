use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::poller::{PollContext, poll_loop};
use super::prober::Prober;
use crate::database::Database;

/// Reconciliation loop keeping the running poll tasks equal to the live
/// target set.
///
/// The handle table has a single writer (this scheduler); at most one poll
/// task exists per target id. Removed targets get their task aborted and the
/// abort is awaited before the handle is discarded, so no orphaned activity
/// survives a removal or shutdown.
pub struct Scheduler {
    context: Arc<PollContext>,
    tasks: HashMap<i64, JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(
        database: Arc<dyn Database>,
        prober: Arc<Prober>,
        fallback_interval: Duration,
    ) -> Self {
        let context = Arc::new(PollContext { database, prober, fallback_interval });
        Self { context, tasks: HashMap::new() }
    }

    /// One reconciliation tick: diff the stored target set against running
    /// tasks, start tasks for new ids, cancel tasks for removed ids.
    ///
    /// A fetch failure degrades this tick to "no targets observed"; the next
    /// tick retries naturally.
    pub async fn reconcile(&mut self) {
        // A task that returned on its own (its target vanished mid-cycle)
        // leaves a finished handle behind; drop those so a re-added id gets
        // a fresh task.
        self.tasks.retain(|_, handle| !handle.is_finished());

        let targets = match self.context.database.list_targets().await {
            Ok(targets) => targets,
            Err(e) => {
                warn!(error = %e, "target list fetch failed, treating as empty for this tick");
                Vec::new()
            }
        };

        let current: HashSet<i64> = targets.iter().map(|t| t.id).collect();

        for id in &current {
            if !self.tasks.contains_key(id) {
                debug!(target_id = id, "starting poll task");
                let context = self.context.clone();
                let id = *id;
                self.tasks.insert(id, tokio::spawn(poll_loop(context, id)));
            }
        }

        let removed: Vec<i64> =
            self.tasks.keys().filter(|id| !current.contains(id)).copied().collect();
        for id in removed {
            if let Some(handle) = self.tasks.remove(&id) {
                debug!(target_id = id, "cancelling poll task for removed target");
                handle.abort();
                // The task may also have finished on its own; either join
                // outcome means it is no longer running.
                let _ = handle.await;
            }
        }
    }

    /// Ids of targets with a currently-running poll task
    pub fn running_ids(&self) -> HashSet<i64> {
        self.tasks.iter().filter(|(_, h)| !h.is_finished()).map(|(id, _)| *id).collect()
    }

    /// Cancel every poll task and wait for all of them to terminate
    pub async fn shutdown(&mut self) {
        let handles: Vec<JoinHandle<()>> = self
            .tasks
            .drain()
            .map(|(_, handle)| {
                handle.abort();
                handle
            })
            .collect();

        let _ = futures::future::join_all(handles).await;
    }

    /// Run the reconciliation loop until `shutdown_token` is cancelled, then
    /// tear down every remaining poll task before returning.
    pub async fn run(mut self, shutdown_token: CancellationToken, tick: Duration) {
        loop {
            self.reconcile().await;

            tokio::select! {
                _ = shutdown_token.cancelled() => break,
                _ = tokio::time::sleep(tick) => {}
            }
        }

        info!(tasks = self.tasks.len(), "scheduler stopping, cancelling poll tasks");
        self.shutdown().await;
    }
}
