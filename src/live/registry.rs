use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::monitoring::types::LiveUpdate;

/// Per-subscriber buffer; a subscriber that falls this far behind starts
/// losing updates rather than stalling the broadcaster.
const SUBSCRIBER_BUFFER: usize = 32;

struct Subscriber {
    id: Uuid,
    tx: mpsc::Sender<LiveUpdate>,
}

/// Registry of live observer channels, keyed by target id.
///
/// Poll tasks call `broadcast` concurrently while the connection layer calls
/// `subscribe`/`unsubscribe`; the whole map sits behind one async mutex so a
/// broadcast never observes a half-applied mutation of a subscriber set.
#[derive(Default)]
pub struct BroadcastRegistry {
    channels: Mutex<HashMap<i64, Vec<Subscriber>>>,
}

impl BroadcastRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer for a target. Returns the subscriber id (for
    /// `unsubscribe`) and the receiving end of its channel.
    pub async fn subscribe(&self, target_id: i64) -> (Uuid, mpsc::Receiver<LiveUpdate>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = Uuid::new_v4();

        let mut channels = self.channels.lock().await;
        channels.entry(target_id).or_default().push(Subscriber { id, tx });
        debug!(target_id, subscriber = %id, "live subscriber added");

        (id, rx)
    }

    /// Remove an observer. A no-op when the subscriber or target id is
    /// already gone, so disconnect paths can call it unconditionally.
    pub async fn unsubscribe(&self, target_id: i64, subscriber_id: Uuid) {
        let mut channels = self.channels.lock().await;
        if let Some(subscribers) = channels.get_mut(&target_id) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                channels.remove(&target_id);
            }
        }
    }

    /// Deliver an update to every subscriber of `target_id`.
    ///
    /// Closed channels are pruned here instead of erroring; a slow subscriber
    /// with a full buffer just misses this update.
    pub async fn broadcast(&self, target_id: i64, update: LiveUpdate) {
        let mut channels = self.channels.lock().await;
        let Some(subscribers) = channels.get_mut(&target_id) else {
            return;
        };

        subscribers.retain(|subscriber| match subscriber.tx.try_send(update.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(target_id, subscriber = %subscriber.id, "live subscriber lagging, dropping update");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(target_id, subscriber = %subscriber.id, "live subscriber disconnected, removing");
                false
            }
        });

        if subscribers.is_empty() {
            channels.remove(&target_id);
        }
    }

    /// Number of observers currently registered for a target
    pub async fn subscriber_count(&self, target_id: i64) -> usize {
        self.channels.lock().await.get(&target_id).map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(status: u16) -> LiveUpdate {
        LiveUpdate { status, latency: 1.5, timestamp: "12:00:00".to_string() }
    }

    #[tokio::test]
    async fn broadcast_reaches_only_matching_target() {
        let registry = BroadcastRegistry::new();

        let (_a1, mut rx_a1) = registry.subscribe(1).await;
        let (_a2, mut rx_a2) = registry.subscribe(1).await;
        let (_b, mut rx_b) = registry.subscribe(2).await;

        registry.broadcast(1, update(200)).await;

        assert_eq!(rx_a1.recv().await.unwrap().status, 200);
        assert_eq!(rx_a2.recv().await.unwrap().status, 200);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let registry = BroadcastRegistry::new();

        let (id, _rx) = registry.subscribe(1).await;
        registry.unsubscribe(1, id).await;
        registry.unsubscribe(1, id).await;
        registry.unsubscribe(99, id).await;

        assert_eq!(registry.subscriber_count(1).await, 0);
    }

    #[tokio::test]
    async fn unsubscribed_channel_misses_later_broadcasts() {
        let registry = BroadcastRegistry::new();

        let (id, mut rx_gone) = registry.subscribe(1).await;
        let (_other, mut rx_kept) = registry.subscribe(1).await;

        registry.unsubscribe(1, id).await;
        registry.broadcast(1, update(503)).await;

        assert!(rx_gone.try_recv().is_err());
        assert_eq!(rx_kept.recv().await.unwrap().status, 503);
    }

    #[tokio::test]
    async fn closed_subscriber_is_pruned_without_failing_others() {
        let registry = BroadcastRegistry::new();

        let (_dead, rx_dead) = registry.subscribe(1).await;
        let (_live, mut rx_live) = registry.subscribe(1).await;
        drop(rx_dead);

        registry.broadcast(1, update(200)).await;

        assert_eq!(rx_live.recv().await.unwrap().status, 200);
        assert_eq!(registry.subscriber_count(1).await, 1);
    }

    #[tokio::test]
    async fn broadcast_to_unknown_target_is_a_noop() {
        let registry = BroadcastRegistry::new();
        registry.broadcast(42, update(200)).await;
        assert_eq!(registry.subscriber_count(42).await, 0);
    }
}
