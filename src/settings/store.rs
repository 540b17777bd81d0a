//! Settings persistence
//!
//! Settings live as one JSON blob under the `settings` key. Older releases
//! wrote the network endpoints flat at the top level, kept the theme under a
//! standalone `theme` key, and pointed at hostnames that no longer exist;
//! `migrate` rewrites all of these into the current nested schema.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{Settings, SettingsPatch, SettingsSection, ThemeType};
use crate::error::StorageError;
use crate::storage::{KeyValueStore, DEPRECATED_THEME_KEY, SETTINGS_KEY};

const NETWORK_FIELDS: [&str; 3] = ["nodeHost", "explorerApiHost", "explorerUrl"];

/// (field, deprecated host, replacement)
const DEPRECATED_HOSTS: [(&str, &str, &str); 6] = [
    (
        "explorerApiHost",
        "https://mainnet-backend.alephium.org",
        "https://backend-v18.mainnet.alephium.org",
    ),
    (
        "explorerApiHost",
        "https://testnet-backend.alephium.org",
        "https://backend-v18.testnet.alephium.org",
    ),
    (
        "explorerUrl",
        "https://explorer.alephium.org",
        "https://explorer-v18.mainnet.alephium.org",
    ),
    (
        "explorerUrl",
        "https://testnet.alephium.org",
        "https://explorer-v18.testnet.alephium.org",
    ),
    (
        "nodeHost",
        "https://mainnet-wallet.alephium.org",
        "https://wallet-v18.mainnet.alephium.org",
    ),
    (
        "nodeHost",
        "https://testnet-wallet.alephium.org",
        "https://wallet-v18.testnet.alephium.org",
    ),
];

#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load persisted settings merged over the defaults
    ///
    /// Missing or malformed data yields the defaults; this never fails.
    pub fn load(&self) -> Settings {
        match self.load_raw() {
            Some(raw) => merge_over_defaults(&raw),
            None => Settings::default(),
        }
    }

    /// Persist the full settings object
    pub fn store(&self, settings: &Settings) -> Result<(), StorageError> {
        let json = serde_json::to_string(settings)?;
        self.store.set(SETTINGS_KEY, &json)
    }

    /// Shallow-merge `patch` into its section of the persisted settings
    ///
    /// Returns `None` when nothing was persisted to update against or the
    /// write failed.
    pub fn update(&self, patch: &SettingsPatch) -> Option<Settings> {
        let mut raw = self.load_raw()?;
        let patch_value = match patch.to_value() {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to serialize settings patch: {}", e);
                return None;
            }
        };

        let root = raw.as_object_mut()?;
        let section = root
            .entry(patch.section().key())
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }
        if let (Some(section), Some(values)) = (section.as_object_mut(), patch_value.as_object()) {
            for (key, value) in values {
                section.insert(key.clone(), value.clone());
            }
        }

        let json = match serde_json::to_string(&raw) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Failed to serialize updated settings: {}", e);
                return None;
            }
        };
        if let Err(e) = self.store.set(SETTINGS_KEY, &json) {
            log::warn!("Failed to persist updated settings: {}", e);
            return None;
        }

        log::debug!("Updated '{}' settings", patch.section().key());
        Some(merge_over_defaults(&raw))
    }

    /// Whether anything written by an older release is still present
    pub fn deprecated_settings_exist(&self) -> bool {
        if self.deprecated_theme().is_some() {
            return true;
        }

        let raw = match self.load_raw() {
            Some(raw) => raw,
            None => return false,
        };

        if raw.get("general").is_none() || raw.get("network").is_none() {
            return true;
        }

        raw.get("network")
            .map(|network| {
                DEPRECATED_HOSTS
                    .iter()
                    .any(|(field, old, _)| network.get(*field).and_then(Value::as_str) == Some(*old))
            })
            .unwrap_or(false)
    }

    /// Rewrite older schemas into the current one and persist the result
    ///
    /// Applying this twice gives the same result as applying it once.
    pub fn migrate(&self) -> Settings {
        let raw = self
            .load_raw()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let theme = self.deprecated_theme();

        let migrated = migrate_value(&raw, theme);
        let settings = merge_over_defaults(&migrated);

        match self.store(&settings) {
            Ok(()) => {
                if let Err(e) = self.store.remove(DEPRECATED_THEME_KEY) {
                    log::warn!("Failed to remove deprecated theme setting: {}", e);
                }
                log::info!("Migrated settings to the current schema");
            }
            Err(e) => log::warn!("Failed to persist migrated settings: {}", e),
        }

        settings
    }

    /// Whether a readable settings object is persisted for updates to merge into
    pub fn is_persisted(&self) -> bool {
        self.load_raw().is_some()
    }

    /// Raw persisted JSON object, `None` when absent or unreadable
    fn load_raw(&self) -> Option<Value> {
        let contents = match self.store.get(SETTINGS_KEY) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to read settings, using defaults: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(value) if value.is_object() => Some(value),
            Ok(_) => {
                log::warn!("Stored settings are not an object, using defaults");
                None
            }
            Err(e) => {
                log::warn!("Malformed settings JSON, using defaults: {}", e);
                None
            }
        }
    }

    fn deprecated_theme(&self) -> Option<ThemeType> {
        let raw = match self.store.get(DEPRECATED_THEME_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Failed to read deprecated theme setting: {}", e);
                return None;
            }
        };
        let name = raw.trim().trim_matches('"');
        match serde_json::from_value::<ThemeType>(Value::String(name.to_string())) {
            Ok(theme) => Some(theme),
            Err(_) => {
                log::warn!("Ignoring unknown deprecated theme '{}'", name);
                None
            }
        }
    }
}

/// Deep merge of `source` into `target`; non-object values (null included) replace
pub(crate) fn merge_json(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Defaults with every persisted key laid over them
///
/// A persisted field that does not fit the schema falls back to its default
/// on its own; the other persisted fields are kept.
fn merge_over_defaults(raw: &Value) -> Settings {
    let defaults = match serde_json::to_value(Settings::default()) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to serialize default settings: {}", e);
            return Settings::default();
        }
    };
    let mut merged = defaults.clone();
    merge_json(&mut merged, raw);

    if let Ok(settings) = serde_json::from_value(merged.clone()) {
        return settings;
    }

    for section in [SettingsSection::General, SettingsSection::Network] {
        drop_invalid_fields(&mut merged, &defaults, section.key());
    }

    serde_json::from_value(merged).unwrap_or_else(|e| {
        log::warn!("Stored settings do not match the schema, using defaults: {}", e);
        Settings::default()
    })
}

/// Reset every field of `section` that fails to deserialize on top of the defaults
fn drop_invalid_fields(merged: &mut Value, defaults: &Value, section: &str) {
    let default_section = defaults.get(section).cloned().unwrap_or(Value::Null);
    let Some(fields) = merged.get(section).and_then(Value::as_object).cloned() else {
        log::warn!("Stored '{}' settings are not an object, using defaults", section);
        merged[section] = default_section;
        return;
    };

    for (key, value) in fields {
        let mut candidate = defaults.clone();
        candidate[section][key.as_str()] = value;
        if serde_json::from_value::<Settings>(candidate).is_ok() {
            continue;
        }

        log::warn!("Ignoring invalid stored setting '{}.{}'", section, key);
        let Some(target) = merged[section].as_object_mut() else {
            continue;
        };
        match default_section.get(key.as_str()) {
            Some(default) => {
                target.insert(key, default.clone());
            }
            None => {
                target.remove(&key);
            }
        }
    }
}

/// Pure schema migration of a raw settings object
fn migrate_value(raw: &Value, theme: Option<ThemeType>) -> Value {
    let mut network = match raw.get("network").and_then(Value::as_object) {
        Some(network) => network.clone(),
        None => {
            // Flat schema: endpoints lived at the top level
            let mut network = Map::new();
            for field in NETWORK_FIELDS {
                if let Some(value) = raw.get(field) {
                    network.insert(field.to_string(), value.clone());
                }
            }
            network
        }
    };

    for (field, old, new) in DEPRECATED_HOSTS {
        if network.get(field).and_then(Value::as_str) == Some(old) {
            network.insert(field.to_string(), Value::String(new.to_string()));
        }
    }

    let mut general = raw
        .get("general")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    if let Some(theme) = theme {
        if let Ok(theme) = serde_json::to_value(theme) {
            general.insert("theme".to_string(), theme);
        }
    }

    json!({
        "general": Value::Object(general),
        "network": Value::Object(network),
    })
}
