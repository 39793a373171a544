//! Normalized zone model
//!
//! Converts the SDK's zone structures into the small views the rest of the
//! application consumes. Views are plain data: produced fresh on every
//! update, never mutated in place.

use roon_api::transport::{self, Zone};
use serde::{Deserialize, Serialize};

/// Connection lifecycle of the adapter
///
/// Owned solely by the adapter. Transitions are driven by explicit
/// `connect()` calls; a lost core never self-heals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Playback state of a zone, normalized across the wire values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Stopped,
    Paused,
    Playing,
    Loading,
    /// Zone missing from the table, or state not yet reported
    Unknown,
}

impl PlaybackState {
    /// True for the states that should light the display on their own
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Loading)
    }

    /// True for the states where a current track carries usable metadata
    pub fn has_current_track(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Paused => "paused",
            PlaybackState::Playing => "playing",
            PlaybackState::Loading => "loading",
            PlaybackState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current track of a zone, as three display lines plus the art key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingView {
    /// Track title (line 1)
    pub track: String,
    /// Artist (line 2)
    pub artist: String,
    /// Album or work (line 3)
    pub title: String,
    pub image_key: Option<String>,
}

/// One entry of the normalized zone table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneView {
    pub zone_id: String,
    pub display_name: String,
    pub state: PlaybackState,
    pub now_playing: Option<NowPlayingView>,
}

impl ZoneView {
    pub(crate) fn from_roon(zone: &Zone) -> Self {
        let state = match zone.state {
            transport::State::Playing => PlaybackState::Playing,
            transport::State::Paused => PlaybackState::Paused,
            transport::State::Loading => PlaybackState::Loading,
            transport::State::Stopped => PlaybackState::Stopped,
        };

        let now_playing = zone.now_playing.as_ref().map(|np| NowPlayingView {
            track: np.three_line.line1.clone(),
            artist: np.three_line.line2.clone(),
            title: np.three_line.line3.clone(),
            image_key: np.image_key.clone(),
        });

        Self {
            zone_id: zone.zone_id.clone(),
            display_name: zone.display_name.clone(),
            state,
            now_playing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(PlaybackState::Playing.is_active());
        assert!(PlaybackState::Loading.is_active());
        assert!(!PlaybackState::Paused.is_active());
        assert!(!PlaybackState::Stopped.is_active());
        assert!(!PlaybackState::Unknown.is_active());
    }

    #[test]
    fn test_current_track_states() {
        assert!(PlaybackState::Playing.has_current_track());
        assert!(PlaybackState::Paused.has_current_track());
        assert!(!PlaybackState::Loading.has_current_track());
        assert!(!PlaybackState::Stopped.has_current_track());
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&PlaybackState::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
        let back: PlaybackState = serde_json::from_str("\"loading\"").unwrap();
        assert_eq!(back, PlaybackState::Loading);
    }
}
