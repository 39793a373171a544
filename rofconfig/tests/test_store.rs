use rofconfig::SettingsStore;
use std::collections::BTreeMap;

fn open(dir: &tempfile::TempDir) -> SettingsStore {
    SettingsStore::open(dir.path().to_str().unwrap()).unwrap()
}

#[test]
fn test_round_trip_identical_map() {
    let dir = tempfile::tempdir().unwrap();

    let mut entries = BTreeMap::new();
    entries.insert("NAME".to_string(), "Salon".to_string());
    entries.insert("DISPLAY_ON_HOUR".to_string(), "8".to_string());
    entries.insert("ROON_ZONE".to_string(), "Living Room".to_string());
    entries.insert("WEIRD_VALUE".to_string(), "a=b=c".to_string());

    {
        let store = open(&dir);
        store.set_many(entries.clone()).unwrap();
    }

    // Fresh load sees the identical map
    let reloaded = open(&dir).dump();
    for (key, value) in &entries {
        assert_eq!(reloaded.get(key), Some(value), "key {key} should survive");
    }
}

#[test]
fn test_unknown_keys_preserved_on_rewrite() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = open(&dir);
        store.set("SOME_FUTURE_KEY", "kept verbatim").unwrap();
        // Rewrites triggered by recognized keys must not drop it
        store.set_display_on_hour(10).unwrap();
        store.set_lock_settings(true).unwrap();
    }

    let store = open(&dir);
    assert_eq!(store.get("SOME_FUTURE_KEY").as_deref(), Some("kept verbatim"));
    assert_eq!(store.get_display_on_hour(), 10);
    assert!(store.get_lock_settings());
}

#[test]
fn test_file_is_sorted_one_entry_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);

    store.set("ZEBRA", "z").unwrap();
    store.set("ALPHA", "a").unwrap();
    store.set("MIDDLE", "m").unwrap();

    let contents = std::fs::read_to_string(store.path()).unwrap();
    let keys: Vec<&str> = contents
        .lines()
        .map(|l| l.split_once('=').expect("every line is KEY=value").0)
        .collect();

    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted, "keys must be written in sorted order");
}

#[test]
fn test_save_leaves_no_temp_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(&dir);
    store.set("NAME", "Frame").unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty(), "atomic save must clean up its temp file");
}

#[test]
fn test_migrate_legacy_credential_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("roon_core_id.txt"), "core-42\n").unwrap();
    std::fs::write(dir.path().join("roon_token.txt"), "tok-abc\n").unwrap();

    let store = open(&dir);
    store.migrate_legacy().unwrap();

    assert_eq!(store.get("ROON_CORE_ID").as_deref(), Some("core-42"));
    assert_eq!(store.get("ROON_API_TOKEN").as_deref(), Some("tok-abc"));
    assert!(!dir.path().join("roon_core_id.txt").exists());
    assert!(!dir.path().join("roon_token.txt").exists());
}
