//! Normalized "now playing" snapshot

use rofroon::PlaybackState;
use serde::Serialize;

/// 1×1 transparent GIF shown when no cover art is available
pub const PLACEHOLDER_COVER: &str =
    "data:image/gif;base64,R0lGODdhAQABAIABAAAAAAAAACwAAAAAAQABAAACAkwBADs=";

/// Now-playing data derived from the zone table at a point in time
///
/// Plain values, produced fresh on every query, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSnapshot {
    pub state: PlaybackState,
    pub zone_id: String,
    /// Artist (display line 2)
    pub artist: String,
    /// Album or work (display line 3)
    pub title: String,
    /// Track title (display line 1)
    pub track: String,
    /// Cover art as a data URI, or the placeholder
    pub cover_url: String,
    /// Square pixel size the cover was requested at
    pub image_size: u32,
}

impl ZoneSnapshot {
    /// Blank snapshot carrying only the playback state
    pub fn placeholder(state: PlaybackState, zone_id: impl Into<String>, image_size: u32) -> Self {
        Self {
            state,
            zone_id: zone_id.into(),
            artist: String::new(),
            title: String::new(),
            track: String::new(),
            cover_url: PLACEHOLDER_COVER.to_string(),
            image_size,
        }
    }
}

/// What actually goes over the push channel: the snapshot plus the current
/// display power intent
#[derive(Debug, Clone, Serialize)]
pub struct DisplayEvent {
    #[serde(flatten)]
    pub snapshot: ZoneSnapshot,
    pub display_state: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_preserves_state() {
        let snapshot = ZoneSnapshot::placeholder(PlaybackState::Paused, "z1", 600);
        assert_eq!(snapshot.state, PlaybackState::Paused);
        assert_eq!(snapshot.cover_url, PLACEHOLDER_COVER);
        assert!(snapshot.artist.is_empty());
        assert!(snapshot.track.is_empty());
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = DisplayEvent {
            snapshot: ZoneSnapshot::placeholder(PlaybackState::Stopped, "z1", 600),
            display_state: true,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["state"], "stopped");
        assert_eq!(value["zone_id"], "z1");
        assert_eq!(value["display_state"], true);
    }
}
