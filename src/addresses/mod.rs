//! Wallet addresses
//!
//! - Address model held by the wallet session
//! - Base58 validation and group derivation
//! - Persisted per-address metadata (label, color, main flag)

mod group;
mod metadata;

pub use group::{group_of_address, TOTAL_NUMBER_OF_GROUPS};
pub use metadata::{AddressMetadata, AddressMetadataStore};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use zeroize::Zeroizing;

use crate::error::ClassificationError;

pub type AddressHash = String;

/// User metadata attached to an address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSettings {
    pub is_main: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A derived key-pair position in a wallet
///
/// Key material is opaque here; it is produced and consumed by the keystore.
/// At most one address per wallet should have `settings.is_main` set, which is
/// up to the caller.
#[derive(Clone)]
pub struct Address {
    pub hash: AddressHash,
    pub index: u32,
    pub group: u8,
    pub public_key: String,
    private_key: Zeroizing<String>,
    pub settings: AddressSettings,
    /// Timestamp (ms) of the latest transaction seen for this address
    pub last_used: Option<i64>,
}

impl Address {
    pub fn new(
        hash: impl Into<String>,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        index: u32,
    ) -> Result<Self, ClassificationError> {
        let hash = hash.into();
        let group = group_of_address(&hash)?;
        Ok(Self {
            hash,
            index,
            group,
            public_key: public_key.into(),
            private_key: Zeroizing::new(private_key.into()),
            settings: AddressSettings::default(),
            last_used: None,
        })
    }

    pub fn with_settings(mut self, settings: AddressSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Apply stored metadata if it belongs to this address' derivation index
    pub fn apply_metadata(&mut self, metadata: &[AddressMetadata]) {
        if let Some(stored) = metadata.iter().find(|m| m.index == self.index) {
            self.settings = stored.settings();
        }
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Address")
            .field("hash", &self.hash)
            .field("index", &self.index)
            .field("group", &self.group)
            .field("settings", &self.settings)
            .field("last_used", &self.last_used)
            .finish_non_exhaustive()
    }
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Whether `address` is a non-empty string of base58 characters
pub fn is_address_valid(address: &str) -> bool {
    !address.is_empty() && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

/// Main address first, then most recently used first
pub fn sort_address_list(addresses: &mut [Address]) {
    addresses.sort_by(|a, b| match (a.settings.is_main, b.settings.is_main) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.last_used.unwrap_or(0).cmp(&a.last_used.unwrap_or(0)),
    });
}
