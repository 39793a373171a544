//! Settings form validation
//!
//! Validates the tunables submitted by the settings page and returns the
//! normalized key/value pairs ready to be merged into the store. Rejections
//! carry a message suitable for showing to the operator as-is; nothing is
//! persisted on failure.

use anyhow::{Result, bail};
use std::collections::BTreeMap;

fn field(form: &BTreeMap<String, String>, key: &str, default: &str) -> String {
    match form.get(key) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

fn parse_u32(raw: &str, message: &str) -> Result<u32> {
    match raw.parse::<u32>() {
        Ok(v) => Ok(v),
        Err(_) => bail!("{}", message),
    }
}

/// Validates and normalizes the settings form fields
///
/// Missing fields fall back to their defaults; out-of-range values are
/// rejected with a descriptive message. Returns the normalized map of
/// validated keys only — the caller decides what else (zone name, …) to
/// merge alongside.
pub fn validate_settings_form(
    form: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    let on_hour = parse_u32(
        &field(form, "DISPLAY_ON_HOUR", "9"),
        "Display hours must be between 0 and 23.",
    )?;
    let off_hour = parse_u32(
        &field(form, "DISPLAY_OFF_HOUR", "23"),
        "Display hours must be between 0 and 23.",
    )?;
    if on_hour > 23 || off_hour > 23 {
        bail!("Display hours must be between 0 and 23.");
    }

    let transition = parse_u32(
        &field(form, "SLIDESHOW_TRANSITION_SECONDS", "15"),
        "Slideshow transition seconds must be a positive integer.",
    )?;
    if transition == 0 {
        bail!("Slideshow transition seconds must be a positive integer.");
    }

    let clock_ratio = parse_u32(
        &field(form, "SLIDESHOW_CLOCK_RATIO", "0"),
        "Slideshow clock ratio must be between 0 and 100.",
    )?;
    if clock_ratio > 100 {
        bail!("Slideshow clock ratio must be between 0 and 100.");
    }

    let clock_size = parse_u32(
        &field(form, "CLOCK_SIZE", "0"),
        "Clock size must be a non-negative integer.",
    )?;
    let clock_offset = parse_u32(
        &field(form, "CLOCK_OFFSET", "0"),
        "Clock offset must be a non-negative integer.",
    )?;

    let display_control = normalize_flag(&field(form, "DISPLAY_CONTROL", "off"));
    let slideshow = normalize_flag(&field(form, "SLIDESHOW", "on"));
    let lock_settings = normalize_flag(&field(form, "LOCK_SETTINGS", "off"));

    let mut validated = BTreeMap::new();
    validated.insert("DISPLAY_ON_HOUR".to_string(), on_hour.to_string());
    validated.insert("DISPLAY_OFF_HOUR".to_string(), off_hour.to_string());
    validated.insert(
        "SLIDESHOW_TRANSITION_SECONDS".to_string(),
        transition.to_string(),
    );
    validated.insert("SLIDESHOW_CLOCK_RATIO".to_string(), clock_ratio.to_string());
    validated.insert("CLOCK_SIZE".to_string(), clock_size.to_string());
    validated.insert("CLOCK_OFFSET".to_string(), clock_offset.to_string());
    validated.insert("DISPLAY_CONTROL".to_string(), display_control);
    validated.insert("SLIDESHOW".to_string(), slideshow);
    validated.insert("LOCK_SETTINGS".to_string(), lock_settings);

    if let Some(folder) = form.get("SLIDESHOW_FOLDER") {
        if !folder.trim().is_empty() {
            validated.insert("SLIDESHOW_FOLDER".to_string(), folder.trim().to_string());
        }
    }

    Ok(validated)
}

// Anything that is not exactly "on" collapses to "off"
fn normalize_flag(raw: &str) -> String {
    if raw == "on" { "on" } else { "off" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_apply_for_missing_fields() {
        let validated = validate_settings_form(&BTreeMap::new()).unwrap();
        assert_eq!(validated["DISPLAY_ON_HOUR"], "9");
        assert_eq!(validated["DISPLAY_OFF_HOUR"], "23");
        assert_eq!(validated["SLIDESHOW_TRANSITION_SECONDS"], "15");
        assert_eq!(validated["LOCK_SETTINGS"], "off");
    }

    #[test]
    fn test_hours_out_of_range_rejected() {
        let err = validate_settings_form(&form(&[("DISPLAY_ON_HOUR", "24")])).unwrap_err();
        assert!(err.to_string().contains("between 0 and 23"));

        let err = validate_settings_form(&form(&[("DISPLAY_OFF_HOUR", "-1")])).unwrap_err();
        assert!(err.to_string().contains("between 0 and 23"));
    }

    #[test]
    fn test_transition_must_be_positive() {
        let err =
            validate_settings_form(&form(&[("SLIDESHOW_TRANSITION_SECONDS", "0")])).unwrap_err();
        assert!(err.to_string().contains("positive integer"));
    }

    #[test]
    fn test_clock_ratio_bounds() {
        let ok = validate_settings_form(&form(&[("SLIDESHOW_CLOCK_RATIO", "100")])).unwrap();
        assert_eq!(ok["SLIDESHOW_CLOCK_RATIO"], "100");

        let err = validate_settings_form(&form(&[("SLIDESHOW_CLOCK_RATIO", "101")])).unwrap_err();
        assert!(err.to_string().contains("between 0 and 100"));
    }

    #[test]
    fn test_non_numeric_rejected_with_message() {
        let err = validate_settings_form(&form(&[("CLOCK_SIZE", "big")])).unwrap_err();
        assert!(err.to_string().contains("non-negative integer"));
    }

    #[test]
    fn test_unexpected_flag_collapses_to_off() {
        let validated = validate_settings_form(&form(&[("LOCK_SETTINGS", "maybe")])).unwrap();
        assert_eq!(validated["LOCK_SETTINGS"], "off");
    }
}
