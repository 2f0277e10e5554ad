// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Persisted user settings.
//!
//! The store is a flat JSON object used as a key/value map.  Only the theme
//! is written today, under [`THEME_KEY`]; keys written by anything else are
//! left untouched on save.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Key the theme is stored under.
pub const THEME_KEY: &str = "chat-theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub theme: Theme,
}

impl Settings {
    fn from_map(map: &Map<String, Value>) -> Self {
        let theme = map
            .get(THEME_KEY)
            .and_then(Value::as_str)
            .and_then(Theme::parse)
            .unwrap_or_default();
        Self { theme }
    }

    fn write_into(&self, map: &mut Map<String, Value>) {
        map.insert(THEME_KEY.into(), Value::String(self.theme.as_str().into()));
    }
}

/// Where settings are read from at startup and written to on change.
pub trait SettingsStore: Send {
    fn load(&self) -> anyhow::Result<Settings>;
    fn save(&self, settings: &Settings) -> anyhow::Result<()>;
}

/// Per-user settings file: `<config_dir>/chatweb/settings.json`.
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        })
        .join("chatweb")
        .join("settings.json")
}

/// JSON-file backed store.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file contents as a map.  A missing file is an empty map; an
    /// unparsable one is reported and treated as empty.
    fn read_map(&self) -> anyhow::Result<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "settings file is not a JSON object; ignoring it");
                Ok(Map::new())
            }
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> anyhow::Result<Settings> {
        let settings = Settings::from_map(&self.read_map()?);
        debug!(path = %self.path.display(), theme = %settings.theme, "settings loaded");
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut map = self.read_map()?;
        settings.write_into(&mut map);
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating settings directory {}", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(&Value::Object(map))?;
        fs::write(&self.path, text)
            .with_context(|| format!("writing settings to {}", self.path.display()))?;
        debug!(path = %self.path.display(), theme = %settings.theme, "settings saved");
        Ok(())
    }
}

/// In-memory store.  Clones share the same map, so a test can hand one clone
/// to the view and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    entries: Arc<Mutex<Map<String, Value>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok().and_then(|m| m.get(key).cloned())
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> anyhow::Result<Settings> {
        let map = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("settings store poisoned"))?;
        Ok(Settings::from_map(&map))
    }

    fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut map = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("settings store poisoned"))?;
        settings.write_into(&mut map);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileSettingsStore {
        FileSettingsStore::new(dir.path().join("nested").join("settings.json"))
    }

    #[test]
    fn theme_toggle_round_trips() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
    }

    #[test]
    fn theme_strings() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("Dark"), None);
        assert_eq!(Theme::Dark.to_string(), "dark");
    }

    #[test]
    fn missing_file_loads_light() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.load().unwrap().theme, Theme::Light);
    }

    #[test]
    fn save_creates_file_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&Settings { theme: Theme::Dark }).unwrap();
        assert_eq!(store.load().unwrap().theme, Theme::Dark);

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw[THEME_KEY], "dark");
    }

    #[test]
    fn save_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"other": 7, "chat-theme": "light"}"#).unwrap();
        let store = FileSettingsStore::new(&path);
        store.save(&Settings { theme: Theme::Dark }).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["other"], 7);
        assert_eq!(raw[THEME_KEY], "dark");
    }

    #[test]
    fn garbage_file_loads_light() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json at all").unwrap();
        let store = FileSettingsStore::new(&path);
        assert_eq!(store.load().unwrap().theme, Theme::Light);
    }

    #[test]
    fn unknown_theme_value_loads_light() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"chat-theme": "sepia"}"#).unwrap();
        assert_eq!(FileSettingsStore::new(&path).load().unwrap().theme, Theme::Light);
    }

    #[test]
    fn memory_store_clones_share_state() {
        let a = MemorySettingsStore::new();
        let b = a.clone();
        assert!(b.is_empty());
        a.save(&Settings { theme: Theme::Dark }).unwrap();
        assert_eq!(b.get(THEME_KEY), Some(Value::String("dark".into())));
        assert_eq!(b.load().unwrap().theme, Theme::Dark);
    }
}
