//! Small preferences that survive page loads.
//!
//! Values are stored as JSON strings under `quevedo.<name>` keys. Reading
//! never fails: a missing or unreadable value falls back to the caller's
//! default.

use std::collections::BTreeMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::PREFERENCE_PREFIX;
use crate::error::PreferenceError;

/// Names of the preferences the tagger keeps.
pub mod names {
    /// Last filter applied to the record list
    pub const LAST_FILTER: &str = "last_filter";
    /// Last user function run on a record
    pub const LAST_FUNCTION: &str = "last_function";
    /// Current UI mode (e.g. drawing boxes or edges)
    pub const UI_MODE: &str = "ui_mode";
}

/// Keyed string storage.
pub trait PreferenceStore {
    /// Raw stored string under `key`, if any.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    fn set_raw(&mut self, key: &str, value: String) -> Result<(), PreferenceError>;
}

fn storage_key(name: &str) -> String {
    format!("{PREFERENCE_PREFIX}{name}")
}

/// Preferences kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Preferences kept in a JSON file, rewritten on every change.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Default filename for the preference file.
    pub fn default_filename() -> &'static str {
        "preferences.json"
    }

    /// Default preference file under the user's config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|dir| dir.join("quevedo").join(Self::default_filename()))
    }

    /// Open the preference file at `path`. A missing or corrupt file starts
    /// out empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable preference file {:?}: {}", path, e);
                BTreeMap::new()
            }),
            Err(_) => {
                log::debug!("No preference file at {:?}", path);
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PreferenceStore for FileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}

/// A preference value, loaded once and written back on change.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedPreference<T> {
    name: String,
    value: T,
}

impl<T: Serialize + DeserializeOwned> PersistedPreference<T> {
    /// Read preference `name` from `store`, or `default` if it is missing or
    /// cannot be parsed.
    pub fn load(store: &impl PreferenceStore, name: &str, default: T) -> Self {
        let value = match store.get_raw(&storage_key(name)) {
            Some(raw) => parse_stored(name, &raw).unwrap_or(default),
            None => default,
        };
        Self {
            name: name.to_string(),
            value,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the value and persist it.
    ///
    /// The in-memory value changes even when persisting fails.
    pub fn set(&mut self, store: &mut impl PreferenceStore, value: T) -> Result<(), PreferenceError> {
        let json = serde_json::to_string(&value)?;
        self.value = value;
        store.set_raw(&storage_key(&self.name), json)
    }
}

/// Values written by older versions may be bare strings rather than JSON.
fn parse_stored<T: DeserializeOwned>(name: &str, raw: &str) -> Option<T> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.to_string())))
        .map_err(|e| log::warn!("Ignoring stored preference '{}': {}", name, e))
        .ok()
}
