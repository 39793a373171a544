//! On/off-hour window logic

use rofroon::PlaybackState;

/// True when `hour` falls inside the configured on-window.
///
/// - equal hours: degenerate window, always off
/// - `on_hour < off_hour`: plain same-day window `[on_hour, off_hour)`
/// - `on_hour > off_hour`: overnight window, on outside `[off_hour, on_hour)`
pub fn is_within_on_window(hour: u32, on_hour: u32, off_hour: u32) -> bool {
    if on_hour == off_hour {
        return false;
    }
    if on_hour < off_hour {
        on_hour <= hour && hour < off_hour
    } else {
        !(off_hour <= hour && hour < on_hour)
    }
}

/// Scheduler decision: active playback always wins, the window covers the rest
pub fn should_display(state: PlaybackState, hour: u32, on_hour: u32, off_hour: u32) -> bool {
    state.is_active() || is_within_on_window(hour, on_hour, off_hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_range_screen_on() {
        assert!(is_within_on_window(10, 9, 17));
        assert!(is_within_on_window(16, 9, 17));
    }

    #[test]
    fn test_normal_range_screen_off() {
        assert!(!is_within_on_window(8, 9, 17));
        assert!(!is_within_on_window(18, 9, 17));
    }

    #[test]
    fn test_overnight_range_screen_on() {
        assert!(is_within_on_window(23, 22, 6));
        assert!(is_within_on_window(2, 22, 6));
    }

    #[test]
    fn test_overnight_range_screen_off() {
        assert!(!is_within_on_window(21, 22, 6));
        assert!(!is_within_on_window(7, 22, 6));
    }

    #[test]
    fn test_same_on_and_off_hour_always_off() {
        for hour in 0..24 {
            assert!(!is_within_on_window(hour, 9, 9));
        }
    }

    #[test]
    fn test_edge_cases() {
        // Boundaries are inclusive on the on-hour, exclusive on the off-hour
        assert!(is_within_on_window(9, 9, 17));
        assert!(!is_within_on_window(17, 9, 17));
        assert!(is_within_on_window(22, 22, 6));
        assert!(!is_within_on_window(6, 22, 6));
    }

    #[test]
    fn test_overnight_partition() {
        // (22, 6): off exactly on [6, 22), on everywhere else
        for hour in 0..24 {
            let expected = !(6..22).contains(&hour);
            assert_eq!(is_within_on_window(hour, 22, 6), expected, "hour {hour}");
        }
    }

    #[test]
    fn test_stopped_outside_window_keeps_display_off() {
        // Window (9, 23), 3 in the morning, nothing playing
        assert!(!should_display(PlaybackState::Stopped, 3, 9, 23));
    }

    #[test]
    fn test_playing_wins_at_any_hour() {
        for hour in 0..24 {
            assert!(should_display(PlaybackState::Playing, hour, 9, 23));
            assert!(should_display(PlaybackState::Loading, hour, 9, 9));
        }
    }

    #[test]
    fn test_paused_follows_the_window() {
        assert!(should_display(PlaybackState::Paused, 12, 9, 23));
        assert!(!should_display(PlaybackState::Paused, 3, 9, 23));
        assert!(!should_display(PlaybackState::Unknown, 3, 9, 23));
    }
}
