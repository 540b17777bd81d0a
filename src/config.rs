//! Storage configuration from environment variables
//!
//! Chooses where the file-backed key-value store lives. Everything the user
//! can change at runtime is in `Settings`, not here.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::storage::{FileStore, KeyValueStore};

pub const DATA_DIR_ENV: &str = "ALPH_WALLET_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "./wallet-data";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding one JSON file per storage key
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `ALPH_WALLET_DATA_DIR`: storage directory (default `./wallet-data`)
    ///
    /// ```bash
    /// ALPH_WALLET_DATA_DIR=/tmp/alph alph-wallet settings
    /// ```
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let data_dir = match lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => {
                log::info!("📁 Wallet data directory: {}", dir);
                PathBuf::from(dir)
            }
            None => {
                log::info!("📁 Wallet data directory: {} (default)", DEFAULT_DATA_DIR);
                PathBuf::from(DEFAULT_DATA_DIR)
            }
        };

        Self { data_dir }
    }

    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        Arc::new(FileStore::new_with_base_dir(self.data_dir.clone()))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_data_dir() {
        let config = StorageConfig::from_lookup(|_| None);
        assert_eq!(config, StorageConfig::default());
    }

    #[test]
    fn test_data_dir_override() {
        let config = StorageConfig::from_lookup(|name| {
            (name == DATA_DIR_ENV).then(|| "/var/lib/alph".to_string())
        });
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/alph"));
    }

    #[test]
    fn test_blank_value_falls_back() {
        let config = StorageConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
    }

    #[test]
    fn test_open_store_uses_data_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
        };
        let store = config.open_store();
        store.set("settings", "{}").unwrap();
        assert!(dir.path().join("settings.json").exists());
    }
}
