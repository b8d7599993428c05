//! Store change notifier.
//!
//! Observers register explicitly with [`StoreNotifier::subscribe`] and get a
//! [`Subscription`] that receives every [`StoreEvent`] published afterwards.
//! Dropping the subscription unsubscribes it.
//!
//! Delivery goes through unbounded channels: publishing never waits on an
//! observer, and each observer drains its events on whatever task owns the
//! subscription.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use super::diff::ChangeSet;

/// Event published to store observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The whole dataset was replaced; re-read everything.
    Reload,
    /// Fine-grained update with the affected identifiers.
    Change(ChangeSet),
}

type Subscribers = Mutex<HashMap<Uuid, UnboundedSender<StoreEvent>>>;

/// Fan-out of store events to registered observers.
#[derive(Default)]
pub struct StoreNotifier {
    subscribers: Arc<Subscribers>,
}

impl StoreNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.lock().insert(id, tx);
        debug!("[Store] Observer {} subscribed", id);
        Subscription {
            id,
            rx,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    /// Publish an event to every observer. Non-blocking.
    ///
    /// Observers whose receiving side is gone are dropped from the registry.
    pub fn notify(&self, event: StoreEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|id, tx| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                debug!("[Store] Pruning closed observer {}", id);
            }
            delivered
        });
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Handle held by an observer. Unsubscribes on drop.
pub struct Subscription {
    id: Uuid,
    rx: UnboundedReceiver<StoreEvent>,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the notifier is gone and all pending events have
    /// been drained.
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        self.rx.recv().await
    }

    /// Take the next pending event without waiting.
    pub fn try_recv(&mut self) -> Option<StoreEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain every pending event.
    pub fn drain(&mut self) -> Vec<StoreEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Stop receiving events.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.lock().remove(&self.id);
            debug!("[Store] Observer {} unsubscribed", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::diff::ChangeScope;

    #[test]
    fn test_every_subscriber_receives() {
        let notifier = StoreNotifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        assert_ne!(a.id(), b.id());

        notifier.notify(StoreEvent::Reload);

        assert_eq!(a.try_recv(), Some(StoreEvent::Reload));
        assert_eq!(b.try_recv(), Some(StoreEvent::Reload));
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let notifier = StoreNotifier::new();
        let sub = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        drop(sub);
        assert_eq!(notifier.subscriber_count(), 0);

        let sub = notifier.subscribe();
        sub.unsubscribe();
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_events_arrive_in_order() {
        let notifier = StoreNotifier::new();
        let mut sub = notifier.subscribe();

        notifier.notify(StoreEvent::Reload);
        notifier.notify(StoreEvent::Change(ChangeSet::new(ChangeScope::Sensors)));

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StoreEvent::Reload);
        assert!(matches!(events[1], StoreEvent::Change(_)));
    }

    #[test]
    fn test_subscription_outlives_notifier() {
        let notifier = StoreNotifier::new();
        let mut sub = notifier.subscribe();
        notifier.notify(StoreEvent::Reload);
        drop(notifier);

        // Pending events are still readable; dropping is a no-op
        assert_eq!(sub.try_recv(), Some(StoreEvent::Reload));
        drop(sub);
    }

    #[tokio::test]
    async fn test_recv_ends_when_notifier_dropped() {
        let notifier = StoreNotifier::new();
        let mut sub = notifier.subscribe();
        drop(notifier);
        assert_eq!(sub.recv().await, None);
    }
}
