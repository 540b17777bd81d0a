//! Storage and persistence layer
//!
//! - Key-value store abstraction (the local-storage shape the wallet persists into)
//! - File system and in-memory backends
//! - Storage key naming

mod file_system;
mod keys;
mod memory;

pub use file_system::FileStore;
pub use keys::{
    address_metadata_key, legacy_address_metadata_key, pending_transactions_key, wallet_key,
    DEPRECATED_THEME_KEY, SETTINGS_KEY, WALLET_KEY_PREFIX,
};
pub use memory::MemoryStore;

use std::sync::Arc;

use crate::error::StorageError;

/// String-keyed JSON blob store
///
/// Every persisted object (settings, address metadata, wallets, pending
/// transactions) lives under a single key as a serialized string.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Result<Vec<String>, StorageError>;

    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }
}
