//! The zone bridge proper
//!
//! Holds the single tracked zone, derives snapshots from the adapter's zone
//! table and republishes them on every vendor callback.

use crate::bus::EventBus;
use crate::snapshot::{DisplayEvent, ZoneSnapshot};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rofdisplay::{DisplayPower, PlaybackSource};
use rofroon::{PlaybackState, RoonAdapter, VendorEvent, ZoneView};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Case-sensitive exact match of the tracked zone in a zone table
pub fn find_tracked<'a>(zones: &'a [ZoneView], zone_name: &str) -> Option<&'a ZoneView> {
    zones.iter().find(|zone| zone.display_name == zone_name)
}

/// Picks the active item out of a queue-changed payload
///
/// First match wins: the head of an `items` list, else the first item of
/// the first `insert` operation in a `changes` list. Payloads with neither
/// shape yield nothing.
pub fn extract_queue_item(payload: &Value) -> Option<&Value> {
    if let Some(items) = payload.get("items").and_then(Value::as_array) {
        if let Some(first) = items.first() {
            return Some(first);
        }
    }

    if let Some(changes) = payload.get("changes").and_then(Value::as_array) {
        for change in changes {
            if change.get("operation").and_then(Value::as_str) == Some("insert") {
                if let Some(first) = change.get("items").and_then(Value::as_array).and_then(|i| i.first()) {
                    return Some(first);
                }
            }
        }
    }

    None
}

/// Bridge between the Roon adapter and the push channel
pub struct ZoneBridge {
    adapter: RoonAdapter,
    power: Arc<DisplayPower>,
    bus: EventBus,
    image_size: u32,
}

impl ZoneBridge {
    pub fn new(adapter: RoonAdapter, power: Arc<DisplayPower>, image_size: u32) -> Self {
        Self {
            adapter,
            power,
            bus: EventBus::new(),
            image_size,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Snapshot of the tracked zone, or `None` when it is absent from the
    /// current zone table
    ///
    /// Absence (renamed zone, unreachable core) is "no data", not an error:
    /// nothing is published and clients keep the last snapshot they saw.
    pub async fn get_zone_snapshot(&self) -> Option<ZoneSnapshot> {
        let table = self.adapter.zone_table().await;
        let zone = find_tracked(&table, self.adapter.zone_name())?;
        Some(self.snapshot_for_zone(zone).await)
    }

    /// Consumes vendor events until the adapter side closes the channel
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<VendorEvent>) {
        info!("Zone bridge running");
        while let Some(event) = events.recv().await {
            match event {
                VendorEvent::QueueChanged(payload) => self.handle_queue_changed(&payload).await,
                VendorEvent::ZonesChanged => self.handle_zones_changed().await,
            }
        }
        info!("Zone bridge stopped, vendor channel closed");
    }

    /// Recomputes and publishes the current snapshot (new client, settings
    /// page probes)
    pub async fn publish_current(&self) {
        match self.get_zone_snapshot().await {
            Some(snapshot) => self.publish(snapshot),
            None => debug!("Tracked zone absent, nothing to publish"),
        }
    }

    async fn handle_queue_changed(&self, payload: &Value) {
        let Some(item) = extract_queue_item(payload) else {
            debug!("Queue payload carries no inserted item, skipping");
            return;
        };

        let table = self.adapter.zone_table().await;
        let zone = find_tracked(&table, self.adapter.zone_name());
        let state = zone.map(|z| z.state).unwrap_or(PlaybackState::Unknown);
        let zone_id = zone.map(|z| z.zone_id.clone()).unwrap_or_default();

        let mut snapshot = ZoneSnapshot::placeholder(state, zone_id, self.image_size);
        snapshot.track = line(item, "line1");
        snapshot.artist = line(item, "line2");
        snapshot.title = line(item, "line3");

        if let Some(image_key) = item.get("image_key").and_then(Value::as_str) {
            snapshot.cover_url = self.cover_data_uri(image_key).await;
        }

        self.publish(snapshot);
    }

    async fn handle_zones_changed(&self) {
        // A vanished zone means no publish for this tick; stale-but-available
        // is acceptable on the clients
        self.publish_current().await;
    }

    async fn snapshot_for_zone(&self, zone: &ZoneView) -> ZoneSnapshot {
        let mut snapshot =
            ZoneSnapshot::placeholder(zone.state, zone.zone_id.clone(), self.image_size);

        let track_active = zone.state.has_current_track();
        if let (true, Some(now_playing)) = (track_active, zone.now_playing.as_ref()) {
            snapshot.track = now_playing.track.clone();
            snapshot.artist = now_playing.artist.clone();
            snapshot.title = now_playing.title.clone();

            if let Some(image_key) = now_playing.image_key.as_deref() {
                snapshot.cover_url = self.cover_data_uri(image_key).await;
            }
        }

        snapshot
    }

    /// Cover art as a data URI, degrading to the placeholder on any failure
    async fn cover_data_uri(&self, image_key: &str) -> String {
        match self.adapter.fetch_cover(image_key, self.image_size).await {
            Ok(cover) => format!(
                "data:{};base64,{}",
                cover.content_type,
                BASE64.encode(&cover.data)
            ),
            Err(err) => {
                warn!(error = %err, image_key, "Cover fetch failed, using placeholder");
                crate::snapshot::PLACEHOLDER_COVER.to_string()
            }
        }
    }

    fn publish(&self, snapshot: ZoneSnapshot) {
        let active = snapshot.state.is_active();
        let event = DisplayEvent {
            snapshot,
            display_state: self.power.is_on(),
        };
        debug!(state = %event.snapshot.state, "Publishing display event");
        self.bus.publish(event);

        // Playback-change notifications wake the display without waiting
        // for the next scheduler tick
        if active {
            self.power.set(true);
        }
    }
}

fn line(item: &Value, key: &str) -> String {
    item.get("three_line")
        .and_then(|lines| lines.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl PlaybackSource for ZoneBridge {
    async fn playback_state(&self) -> PlaybackState {
        let table = self.adapter.zone_table().await;
        find_tracked(&table, self.adapter.zone_name())
            .map(|zone| zone.state)
            .unwrap_or(PlaybackState::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rofroon::NowPlayingView;
    use serde_json::json;

    fn zone(name: &str, state: PlaybackState) -> ZoneView {
        ZoneView {
            zone_id: format!("id-{name}"),
            display_name: name.to_string(),
            state,
            now_playing: Some(NowPlayingView {
                track: "Track".into(),
                artist: "Artist".into(),
                title: "Album".into(),
                image_key: None,
            }),
        }
    }

    #[test]
    fn test_find_tracked_exact_match() {
        let table = vec![
            zone("Kitchen", PlaybackState::Stopped),
            zone("Living Room", PlaybackState::Playing),
        ];

        let found = find_tracked(&table, "Living Room").unwrap();
        assert_eq!(found.zone_id, "id-Living Room");
    }

    #[test]
    fn test_find_tracked_is_case_sensitive() {
        let table = vec![zone("Kitchen", PlaybackState::Playing)];
        assert!(find_tracked(&table, "kitchen").is_none());
        assert!(find_tracked(&table, "Kitchen ").is_none());
        assert!(find_tracked(&[], "Kitchen").is_none());
    }

    #[test]
    fn test_extract_from_items_list() {
        let payload = json!({"items": [{"n": 1}, {"n": 2}]});
        assert_eq!(extract_queue_item(&payload), Some(&json!({"n": 1})));
    }

    #[test]
    fn test_extract_from_insert_change() {
        let payload = json!({
            "changes": [
                {"operation": "remove", "index": 0, "count": 2},
                {"operation": "insert", "items": [{"n": 7}, {"n": 8}]},
            ]
        });
        assert_eq!(extract_queue_item(&payload), Some(&json!({"n": 7})));
    }

    #[test]
    fn test_items_list_wins_over_changes() {
        let payload = json!({
            "items": [{"n": 1}],
            "changes": [{"operation": "insert", "items": [{"n": 9}]}],
        });
        assert_eq!(extract_queue_item(&payload), Some(&json!({"n": 1})));
    }

    #[test]
    fn test_malformed_payloads_yield_nothing() {
        assert!(extract_queue_item(&json!({})).is_none());
        assert!(extract_queue_item(&json!({"items": []})).is_none());
        assert!(
            extract_queue_item(&json!({"changes": [{"operation": "remove", "count": 1}]}))
                .is_none()
        );
        assert!(extract_queue_item(&json!({"changes": "garbage"})).is_none());
        assert!(extract_queue_item(&json!(null)).is_none());
    }

    #[test]
    fn test_line_extraction_tolerates_missing_fields() {
        let item = json!({"three_line": {"line1": "Song"}});
        assert_eq!(line(&item, "line1"), "Song");
        assert_eq!(line(&item, "line2"), "");

        let empty = json!({});
        assert_eq!(line(&empty, "line1"), "");
    }
}
