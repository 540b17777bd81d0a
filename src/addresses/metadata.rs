//! Per-address metadata persistence
//!
//! One JSON array per wallet under `addresses-metadata-<walletName>`. Entries
//! are keyed by derivation index, which the derivation sequence guarantees to
//! be unique, never by address hash.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::AddressSettings;
use crate::error::StorageError;
use crate::storage::{address_metadata_key, legacy_address_metadata_key, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressMetadata {
    pub index: u32,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AddressMetadata {
    pub fn settings(&self) -> AddressSettings {
        AddressSettings {
            is_main: self.is_main,
            label: self.label.clone(),
            color: self.color.clone(),
        }
    }

    /// Replace every setting; a `None` label or color clears it
    fn apply(&mut self, settings: &AddressSettings) {
        self.is_main = settings.is_main;
        self.label = settings.label.clone();
        self.color = settings.color.clone();
    }
}

#[derive(Clone)]
pub struct AddressMetadataStore {
    store: Arc<dyn KeyValueStore>,
}

impl AddressMetadataStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load all metadata of a wallet, empty when none is stored or it is unreadable
    pub fn load(&self, wallet_name: &str) -> Vec<AddressMetadata> {
        let key = address_metadata_key(wallet_name);
        let contents = match self.store.get(&key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to read address metadata of '{}': {}", wallet_name, e);
                return Vec::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Malformed address metadata of '{}': {}", wallet_name, e);
            Vec::new()
        })
    }

    /// Upsert the metadata of the address at `index`
    pub fn store(
        &self,
        wallet_name: &str,
        index: u32,
        settings: &AddressSettings,
    ) -> Result<(), StorageError> {
        let mut metadata = self.load(wallet_name);

        match metadata.iter_mut().find(|entry| entry.index == index) {
            Some(existing) => existing.apply(settings),
            None => metadata.push(AddressMetadata {
                index,
                is_main: settings.is_main,
                label: settings.label.clone(),
                color: settings.color.clone(),
            }),
        }

        log::info!("Storing address index {} metadata locally", index);
        let json = serde_json::to_string(&metadata)?;
        self.store.set(&address_metadata_key(wallet_name), &json)
    }

    /// Remove the whole metadata collection of a wallet
    pub fn delete(&self, wallet_name: &str) -> Result<(), StorageError> {
        log::warn!("Deleting address metadata of wallet '{}'", wallet_name);
        self.store.remove(&address_metadata_key(wallet_name))
    }

    /// Move metadata from the legacy `<walletName>-addresses-metadata` key
    ///
    /// Returns whether anything was migrated. Once the legacy key is gone this
    /// is a no-op.
    pub fn migrate_legacy_key(&self, wallet_name: &str) -> Result<bool, StorageError> {
        let legacy_key = legacy_address_metadata_key(wallet_name);
        let data = match self.store.get(&legacy_key)? {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(false),
        };

        self.store.set(&address_metadata_key(wallet_name), &data)?;
        self.store.remove(&legacy_key)?;
        log::info!("Migrated address metadata of wallet '{}'", wallet_name);
        Ok(true)
    }

    /// Run the legacy key migration for every given wallet
    pub fn migrate_all<S: AsRef<str>>(&self, wallet_names: &[S]) -> Result<usize, StorageError> {
        let mut migrated = 0;
        for name in wallet_names {
            if self.migrate_legacy_key(name.as_ref())? {
                migrated += 1;
            }
        }
        Ok(migrated)
    }
}
