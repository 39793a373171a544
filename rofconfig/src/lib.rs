//! # RoFrame Settings Store
//!
//! This crate manages the persisted settings of a frame instance:
//! - a flat `KEY=value` text file, one entry per line, keys written in
//!   sorted order so rewrites are deterministic
//! - unknown keys are preserved verbatim on rewrite
//! - whole-file atomic saves (fresh temp file, then rename)
//! - typed getters/setters for the recognized keys
//! - an immutable [`FrameSettings`] snapshot handed to collaborators at
//!   construction time
//!
//! ## Usage
//!
//! ```no_run
//! use rofconfig::{FrameSettings, SettingsStore};
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = SettingsStore::open("")?;
//! let settings = FrameSettings::from_store(&store);
//! println!("serving on {}:{}", settings.host, settings.port);
//! store.set("DISPLAY_ON_HOUR", "8")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{info, warn};

mod snapshot;
mod validate;

pub use snapshot::FrameSettings;
pub use validate::validate_settings_form;

const ENV_CONFIG_DIR: &str = "ROFRAME_CONFIG";
const SETTINGS_FILE: &str = "settings.conf";
const DEFAULT_CONFIG_DIR: &str = ".roframe";

// Legacy single-value credential files migrated into the store
const LEGACY_CORE_ID_FILE: &str = "roon_core_id.txt";
const LEGACY_TOKEN_FILE: &str = "roon_token.txt";

/// Macro to generate getter/setter for u32 values with default
macro_rules! impl_u32_setting {
    ($getter:ident, $setter:ident, $key:expr, $default:expr) => {
        pub fn $getter(&self) -> u32 {
            self.get($key)
                .and_then(|v| v.parse().ok())
                .unwrap_or($default)
        }

        pub fn $setter(&self, value: u32) -> Result<()> {
            self.set($key, &value.to_string())
        }
    };
}

/// Macro to generate getter/setter for on/off flags with default
macro_rules! impl_flag_setting {
    ($getter:ident, $setter:ident, $key:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get($key) {
                Some(v) => v == "on",
                None => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set($key, if value { "on" } else { "off" })
        }
    };
}

/// Settings store for a frame instance
///
/// Holds the full key/value map in memory behind a mutex; every mutation is
/// written back immediately. The store itself is the only writer of the
/// settings file in a running process.
#[derive(Debug)]
pub struct SettingsStore {
    config_dir: PathBuf,
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl SettingsStore {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> PathBuf {
        // 1. Try provided directory
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying config dir from env");
            return PathBuf::from(env_path);
        }

        // 3. Try current directory
        if Path::new(DEFAULT_CONFIG_DIR).exists() {
            return PathBuf::from(DEFAULT_CONFIG_DIR);
        }

        // 4. Try home directory
        if let Ok(home) = env::var("HOME") {
            let home_config = Path::new(&home).join(DEFAULT_CONFIG_DIR);
            if home_config.exists() {
                return home_config;
            }
        }

        // Default fallback
        PathBuf::from(DEFAULT_CONFIG_DIR)
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!("Le chemin de configuration n'est pas un répertoire"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Opens (or creates) the settings store
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `ROFRAME_CONFIG` environment variable
    /// 3. `.roframe` in the current directory
    /// 4. `.roframe` in the user's home directory
    ///
    /// The directory is created if missing and probed for write permission.
    /// Lines of the settings file without a `=` separator are discarded;
    /// everything else — recognized key or not — is kept as-is.
    pub fn open(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::validate_config_dir(&config_dir)?;
        info!(config_dir = %config_dir.display(), "Using config directory");

        let path = config_dir.join(SETTINGS_FILE);

        let mut data = BTreeMap::new();
        if let Ok(contents) = fs::read_to_string(&path) {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    data.insert(key.to_string(), value.to_string());
                }
            }
            info!(settings_file = %path.display(), entries = data.len(), "Loaded settings file");
        } else {
            info!(settings_file = %path.display(), "Settings file not found, starting empty");
        }

        // The lock flag always exists so the settings UI can rely on it
        data.entry("LOCK_SETTINGS".to_string())
            .or_insert_with(|| "off".to_string());

        let store = Self {
            config_dir,
            path,
            data: Mutex::new(data),
        };
        store.save()?;
        Ok(store)
    }

    /// The resolved configuration directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a raw value
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// Sets a raw value and saves the file
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Merges several values in one atomic rewrite
    pub fn set_many(&self, updates: BTreeMap<String, String>) -> Result<()> {
        {
            let mut data = self.data.lock().unwrap();
            for (key, value) in updates {
                data.insert(key, value);
            }
        }
        self.save()
    }

    /// Full copy of the current map (settings UI, tests)
    pub fn dump(&self) -> BTreeMap<String, String> {
        self.data.lock().unwrap().clone()
    }

    /// Saves the current map to the settings file
    ///
    /// The file is rewritten whole: keys in sorted order, one `KEY=value`
    /// per line. The write goes to a fresh temp file in the same directory
    /// which then replaces the previous file, so a crash mid-write never
    /// leaves a truncated settings file behind.
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().unwrap();
        let mut out = String::new();
        for (key, value) in data.iter() {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        drop(data);

        let tmp = self.path.with_extension("conf.tmp");
        fs::write(&tmp, out)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Migrates legacy single-value credential files into the store
    ///
    /// Early deployments kept the Roon pairing credential in two standalone
    /// text files next to the settings. Their content is folded into the
    /// settings file once, then the files are removed.
    pub fn migrate_legacy(&self) -> Result<()> {
        self.migrate_legacy_file(LEGACY_CORE_ID_FILE, "ROON_CORE_ID")?;
        self.migrate_legacy_file(LEGACY_TOKEN_FILE, "ROON_API_TOKEN")?;
        Ok(())
    }

    fn migrate_legacy_file(&self, file_name: &str, key: &str) -> Result<()> {
        let legacy = self.config_dir.join(file_name);
        if legacy.exists() {
            let value = fs::read_to_string(&legacy)?;
            self.set(key, value.trim())?;
            fs::remove_file(&legacy)?;
            warn!(file = %legacy.display(), key, "Migrated legacy credential file");
        }
        Ok(())
    }

    impl_u32_setting!(get_display_on_hour, set_display_on_hour, "DISPLAY_ON_HOUR", 9);
    impl_u32_setting!(get_display_off_hour, set_display_off_hour, "DISPLAY_OFF_HOUR", 23);
    impl_u32_setting!(
        get_transition_seconds,
        set_transition_seconds,
        "SLIDESHOW_TRANSITION_SECONDS",
        15
    );
    impl_u32_setting!(get_clock_ratio, set_clock_ratio, "SLIDESHOW_CLOCK_RATIO", 0);
    impl_u32_setting!(get_clock_size, set_clock_size, "CLOCK_SIZE", 0);
    impl_u32_setting!(get_clock_offset, set_clock_offset, "CLOCK_OFFSET", 0);
    impl_u32_setting!(get_image_size, set_image_size, "ROON_IMAGE_SIZE", 600);

    impl_flag_setting!(get_display_control, set_display_control, "DISPLAY_CONTROL", false);
    impl_flag_setting!(get_slideshow_enabled, set_slideshow_enabled, "SLIDESHOW", true);
    impl_flag_setting!(get_lock_settings, set_lock_settings, "LOCK_SETTINGS", false);

    /// Operator-chosen device name, set during pairing
    pub fn get_name(&self) -> String {
        self.get("NAME").unwrap_or_default()
    }

    /// HTTP bind address
    pub fn get_host(&self) -> String {
        self.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string())
    }

    /// HTTP port, falling back to the historical default
    pub fn get_port(&self) -> u16 {
        match self.get("PORT") {
            Some(v) => match v.parse() {
                Ok(port) => port,
                Err(_) => {
                    warn!(value = %v, "Invalid PORT setting, using default 5006");
                    5006
                }
            },
            None => 5006,
        }
    }

    /// Slideshow directory, relative paths resolved against the config dir
    pub fn get_slideshow_folder(&self) -> PathBuf {
        let raw = self
            .get("SLIDESHOW_FOLDER")
            .unwrap_or_else(|| "pictures".to_string());
        let path = PathBuf::from(&raw);
        if path.is_absolute() {
            path
        } else {
            self.config_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::open(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert_eq!(store.get_display_on_hour(), 9);
        assert_eq!(store.get_display_off_hour(), 23);
        assert_eq!(store.get_port(), 5006);
        assert!(store.get_slideshow_enabled());
        assert!(!store.get_display_control());
        assert!(!store.get_lock_settings());
    }

    #[test]
    fn test_lock_flag_always_present() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        assert_eq!(store.get("LOCK_SETTINGS").as_deref(), Some("off"));
    }

    #[test]
    fn test_flag_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.set_display_control(true).unwrap();
        assert!(store.get_display_control());
        assert_eq!(store.get("DISPLAY_CONTROL").as_deref(), Some("on"));
    }

    #[test]
    fn test_relative_slideshow_folder_resolves_under_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.set("SLIDESHOW_FOLDER", "pics").unwrap();
        assert_eq!(store.get_slideshow_folder(), dir.path().join("pics"));

        store.set("SLIDESHOW_FOLDER", "/srv/pics").unwrap();
        assert_eq!(store.get_slideshow_folder(), PathBuf::from("/srv/pics"));
    }
}
