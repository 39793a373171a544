//! Immutable settings snapshot
//!
//! Collaborators never read the store directly; they receive a
//! [`FrameSettings`] built once at (re)initialization. Applying new
//! settings means building a fresh snapshot and re-wiring the affected
//! components, not mutating shared state under running tasks.

use crate::SettingsStore;
use std::path::PathBuf;

/// Typed, immutable view of the settings at a point in time
#[derive(Debug, Clone)]
pub struct FrameSettings {
    /// Operator-chosen device name (also the extension display name)
    pub name: String,
    pub display_on_hour: u32,
    pub display_off_hour: u32,
    /// Whether the scheduler actually drives the panel power
    pub display_control: bool,
    pub slideshow_enabled: bool,
    pub slideshow_folder: PathBuf,
    pub slideshow_transition_seconds: u32,
    /// Clock overlay ratio in percent (0–100)
    pub slideshow_clock_ratio: u32,
    pub clock_size: u32,
    pub clock_offset: u32,
    pub host: String,
    pub port: u16,
    pub lock_settings: bool,
    /// The single tracked zone; empty until pairing picked one
    pub zone_name: String,
    /// Square pixel size requested for cover art
    pub image_size: u32,
}

impl FrameSettings {
    pub fn from_store(store: &SettingsStore) -> Self {
        Self {
            name: store.get_name(),
            display_on_hour: store.get_display_on_hour(),
            display_off_hour: store.get_display_off_hour(),
            display_control: store.get_display_control(),
            slideshow_enabled: store.get_slideshow_enabled(),
            slideshow_folder: store.get_slideshow_folder(),
            slideshow_transition_seconds: store.get_transition_seconds(),
            slideshow_clock_ratio: store.get_clock_ratio(),
            clock_size: store.get_clock_size(),
            clock_offset: store.get_clock_offset(),
            host: store.get_host(),
            port: store.get_port(),
            lock_settings: store.get_lock_settings(),
            zone_name: store.get("ROON_ZONE").unwrap_or_default(),
            image_size: store.get_image_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().to_str().unwrap()).unwrap();

        store.set("NAME", "Kitchen Frame").unwrap();
        store.set("ROON_ZONE", "Kitchen").unwrap();
        store.set_display_on_hour(7).unwrap();

        let snapshot = FrameSettings::from_store(&store);
        assert_eq!(snapshot.name, "Kitchen Frame");
        assert_eq!(snapshot.zone_name, "Kitchen");
        assert_eq!(snapshot.display_on_hour, 7);
        assert_eq!(snapshot.port, 5006);

        // Mutating the store afterwards does not touch the snapshot
        store.set_display_on_hour(10).unwrap();
        assert_eq!(snapshot.display_on_hour, 7);
    }
}
