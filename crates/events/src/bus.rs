//! In-process observer hub backed by a `tokio::sync::broadcast` channel.
//!
//! [`BroadcastHub`] is the fan-out point for pipeline results. It is shared
//! via `Arc<BroadcastHub>`; publishing never blocks, and each observer has
//! its own bounded view of the channel so a stalled observer only loses its
//! own oldest events.

use std::sync::atomic::{AtomicU64, Ordering};

use hydrowatch_core::contamination::ContaminationState;
use hydrowatch_core::result::EnrichedResult;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

// ---------------------------------------------------------------------------
// HubEvent
// ---------------------------------------------------------------------------

/// Notice that a contamination alert was delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFired {
    pub consecutive_count: u32,
    /// Timestamp of the reading that triggered the alert.
    pub reading_timestamp: String,
    /// When the alert was delivered (RFC 3339, local time).
    pub timestamp: String,
}

/// An event pushed to observers.
///
/// Serializes as `{"event": "<snake_case name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum HubEvent {
    /// A reading finished processing.
    PredictionUpdate(EnrichedResult),
    /// A contamination alert was sent.
    AlertFired(AlertFired),
    /// Contamination snapshot sent once when an observer registers.
    ConnectionStatus(ContaminationState),
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// What an observer pulls off the hub.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Event(HubEvent),
    /// The observer fell behind and the given number of oldest events were
    /// dropped from its buffer. Later events are still delivered.
    Lagged(u64),
}

/// A registered observer.
///
/// Dropping it (or passing it to [`BroadcastHub::unregister`]) removes it
/// from the hub.
pub struct Observer {
    id: u64,
    snapshot: ContaminationState,
    receiver: broadcast::Receiver<HubEvent>,
}

impl Observer {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Contamination state at the moment of registration.
    pub fn snapshot(&self) -> ContaminationState {
        self.snapshot
    }

    /// The registration snapshot as a pushable event.
    pub fn snapshot_event(&self) -> HubEvent {
        HubEvent::ConnectionStatus(self.snapshot)
    }

    /// Wait for the next delivery. Returns `None` once the hub is dropped.
    pub async fn recv(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Ok(event) => Some(Delivery::Event(event)),
            Err(broadcast::error::RecvError::Lagged(n)) => Some(Delivery::Lagged(n)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BroadcastHub
// ---------------------------------------------------------------------------

/// Default per-observer buffer capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Fan-out hub for [`HubEvent`]s.
///
/// ```rust
/// use hydrowatch_events::bus::{BroadcastHub, HubEvent};
///
/// let hub = BroadcastHub::default();
/// let observer = hub.register();
/// assert_eq!(observer.snapshot().consecutive_count, 0);
/// hub.unregister(observer);
/// ```
pub struct BroadcastHub {
    sender: broadcast::Sender<HubEvent>,
    state: watch::Sender<ContaminationState>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    /// Create a hub whose observers each buffer up to `capacity` events.
    ///
    /// When an observer's buffer is full the oldest events are dropped and
    /// the observer sees [`Delivery::Lagged`].
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        let (state, _) = watch::channel(ContaminationState::default());
        Self {
            sender,
            state,
            next_id: AtomicU64::new(1),
        }
    }

    /// Deliver an event to every registered observer.
    ///
    /// Never blocks. Returns how many observers the event was queued for;
    /// zero observers is not an error.
    pub fn publish(&self, event: HubEvent) -> usize {
        if let HubEvent::PredictionUpdate(result) = &event {
            self.state.send_replace(result.contamination());
        }
        self.sender.send(event).unwrap_or(0)
    }

    /// Register a new observer carrying the current contamination snapshot.
    pub fn register(&self) -> Observer {
        // Subscribe before reading the snapshot so no event published in
        // between is missed.
        let receiver = self.sender.subscribe();
        let snapshot = *self.state.borrow();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(observer_id = id, "Observer registered");
        Observer {
            id,
            snapshot,
            receiver,
        }
    }

    pub fn unregister(&self, observer: Observer) {
        tracing::debug!(observer_id = observer.id, "Observer unregistered");
        drop(observer);
    }

    /// Contamination state as of the last published result.
    pub fn snapshot(&self) -> ContaminationState {
        *self.state.borrow()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(count: u32) -> HubEvent {
        HubEvent::AlertFired(AlertFired {
            consecutive_count: count,
            reading_timestamp: "2025-01-01T00:00:00".into(),
            timestamp: "2025-01-01T00:00:01".into(),
        })
    }

    #[tokio::test]
    async fn publish_reaches_every_observer() {
        let hub = BroadcastHub::default();
        let mut a = hub.register();
        let mut b = hub.register();

        assert_eq!(hub.publish(alert(5)), 2);

        assert_eq!(a.recv().await, Some(Delivery::Event(alert(5))));
        assert_eq!(b.recv().await, Some(Delivery::Event(alert(5))));
    }

    #[test]
    fn publish_with_no_observers_does_not_panic() {
        let hub = BroadcastHub::default();
        assert_eq!(hub.publish(alert(1)), 0);
    }

    #[tokio::test]
    async fn lagging_observer_skips_oldest_and_keeps_receiving() {
        let hub = BroadcastHub::new(2);
        let mut slow = hub.register();

        for count in 1..=5 {
            hub.publish(alert(count));
        }

        assert_eq!(slow.recv().await, Some(Delivery::Lagged(3)));
        assert_eq!(slow.recv().await, Some(Delivery::Event(alert(4))));
        assert_eq!(slow.recv().await, Some(Delivery::Event(alert(5))));
    }

    #[tokio::test]
    async fn observer_sees_close_when_hub_dropped() {
        let hub = BroadcastHub::default();
        let mut observer = hub.register();
        drop(hub);
        assert_eq!(observer.recv().await, None);
    }

    #[test]
    fn unregister_removes_observer() {
        let hub = BroadcastHub::default();
        let observer = hub.register();
        let other = hub.register();
        assert_ne!(observer.id(), other.id());
        assert_eq!(hub.observer_count(), 2);

        hub.unregister(observer);
        assert_eq!(hub.observer_count(), 1);
    }

    #[test]
    fn events_serialize_with_tag_and_data() {
        let json = serde_json::to_value(alert(7)).unwrap();
        assert_eq!(json["event"], "alert_fired");
        assert_eq!(json["data"]["consecutive_count"], 7);

        let status = HubEvent::ConnectionStatus(ContaminationState {
            consecutive_count: 2,
            alert_armed: false,
        });
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["event"], "connection_status");
        assert_eq!(json["data"]["consecutive_count"], 2);
    }
}
