//! Push channel
//!
//! One-to-many broadcast of display events. The latest event is retained so
//! a freshly connected client has something to paint before the next zone
//! change comes in.

use crate::snapshot::DisplayEvent;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DisplayEvent>,
    latest: Arc<RwLock<Option<DisplayEvent>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            tx: broadcast::channel(CHANNEL_CAPACITY).0,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    /// Fire-and-forget broadcast; publishing with no subscribers is fine
    pub fn publish(&self, event: DisplayEvent) {
        *self.latest.write().unwrap() = Some(event.clone());
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.tx.subscribe()
    }

    /// The most recently published event, if any
    pub fn latest(&self) -> Option<DisplayEvent> {
        self.latest.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ZoneSnapshot;
    use rofroon::PlaybackState;

    fn event(state: PlaybackState) -> DisplayEvent {
        DisplayEvent {
            snapshot: ZoneSnapshot::placeholder(state, "z1", 600),
            display_state: false,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(event(PlaybackState::Playing));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.snapshot.state, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(event(PlaybackState::Stopped));
        assert_eq!(
            bus.latest().unwrap().snapshot.state,
            PlaybackState::Stopped
        );
    }

    #[tokio::test]
    async fn test_latest_tracks_most_recent() {
        let bus = EventBus::new();
        assert!(bus.latest().is_none());

        bus.publish(event(PlaybackState::Playing));
        bus.publish(event(PlaybackState::Paused));
        assert_eq!(bus.latest().unwrap().snapshot.state, PlaybackState::Paused);
    }
}
