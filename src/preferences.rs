//! Preference manager that merges config.toml defaults with stored overrides.
//!
//! Config values serve as defaults; values in local storage win over them.
//! Writes go to storage, never to the config file.
use std::collections::HashMap;

use anyhow::Result;

use crate::config::Config;
use crate::storage::{Database, DARK_MODE_KEY};

/// Prefix for keybinding entries, e.g. `keybind.quit`.
const KEYBIND_PREFIX: &str = "keybind.";

// ============================================================================
// PreferenceManager
// ============================================================================

/// Merged preference map: config defaults plus local storage overrides.
pub struct PreferenceManager {
    prefs: HashMap<String, String>,
}

impl PreferenceManager {
    /// Flatten the config, then layer `darkMode` and `keybind.*` items from
    /// storage on top.
    pub async fn load(config: &Config, db: &Database) -> Result<Self> {
        let mut prefs = Self::flatten_config(config);

        if let Some(dark) = db.get_item(DARK_MODE_KEY).await? {
            prefs.insert(DARK_MODE_KEY.to_string(), dark);
        }
        for (key, value) in db.items_by_prefix(KEYBIND_PREFIX).await? {
            prefs.insert(key, value);
        }

        Ok(Self { prefs })
    }

    /// Config only. Fallback for when storage cannot be read.
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefs: Self::flatten_config(config),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.prefs.get(key).map(String::as_str)
    }

    /// Whether the dark palette is active.
    ///
    /// A stored `"true"`/`"false"` decides; anything else falls back to the
    /// configured theme.
    pub fn dark_mode(&self) -> bool {
        match self.get(DARK_MODE_KEY) {
            Some("true") => true,
            Some("false") => false,
            _ => self.get("theme") != Some("light"),
        }
    }

    pub async fn set_dark_mode(&mut self, db: &Database, dark: bool) -> Result<()> {
        let value = if dark { "true" } else { "false" };
        db.set_item(DARK_MODE_KEY, value).await?;
        self.prefs
            .insert(DARK_MODE_KEY.to_string(), value.to_string());
        Ok(())
    }

    /// Keybinding overrides keyed by action name.
    pub fn keybinding_overrides(&self) -> HashMap<String, String> {
        self.prefs
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(KEYBIND_PREFIX)
                    .map(|action| (action.to_string(), v.clone()))
            })
            .collect()
    }

    fn flatten_config(config: &Config) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("theme".to_string(), config.theme.clone());
        for (action, key_str) in &config.keybindings {
            map.insert(format!("{}{}", KEYBIND_PREFIX, action), key_str.clone());
        }
        map
    }
}

// ============================================================================
// Tests
// ============================================================================
