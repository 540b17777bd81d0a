use std::fs;
use std::path::PathBuf;

use super::KeyValueStore;
use crate::error::StorageError;

const VALUE_EXTENSION: &str = "json";

/// File-backed key-value store, one file per key under a base directory
#[derive(Clone, Debug)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store with the default base directory ("./wallet-data")
    pub fn new() -> Self {
        Self {
            base_path: PathBuf::from(crate::config::DEFAULT_DATA_DIR),
        }
    }

    /// Create a store with a custom base directory (for testing)
    pub fn new_with_base_dir(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the base directory path
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    /// Get the file path for a key, rejecting keys that would escape the base directory
    fn value_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key == "."
            || key == ".."
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self
            .base_path
            .join(format!("{}.{}", key, VALUE_EXTENSION)))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.value_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.value_path(key)?;
        fs::create_dir_all(&self.base_path)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.value_path(key)?;
        if path.exists() {
            log::debug!("Removing stored key '{}'", key);
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
