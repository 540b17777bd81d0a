//! Password-encrypted wallet records
//!
//! Each wallet is stored under `wallet-<id>` as `{ id, name, encrypted }`.
//! Only the secret material is encrypted; the name stays readable so wallets
//! can be listed before unlocking.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::{self, EncryptedBlob};
use crate::error::{StorageError, WalletError};
use crate::storage::{wallet_key, KeyValueStore, WALLET_KEY_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWallet {
    pub id: String,
    pub name: String,
    pub encrypted: EncryptedBlob,
}

/// Decrypted wallet, alive only while the wallet is unlocked
pub struct UnencryptedWallet {
    pub id: String,
    pub name: String,
    pub mnemonic: Zeroizing<String>,
}

impl std::fmt::Debug for UnencryptedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnencryptedWallet")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize, Deserialize)]
struct WalletSecrets {
    mnemonic: String,
}

#[derive(Clone)]
pub struct WalletStorage {
    store: Arc<dyn KeyValueStore>,
}

impl WalletStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All readable wallet records; unparsable or nameless entries are skipped
    pub fn list(&self) -> Result<Vec<StoredWallet>, StorageError> {
        let mut wallets = Vec::new();

        for key in self.store.keys()? {
            if !key.starts_with(WALLET_KEY_PREFIX) {
                continue;
            }
            let Some(data) = self.store.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<StoredWallet>(&data) {
                Ok(wallet) if !wallet.name.is_empty() => wallets.push(wallet),
                Ok(_) => log::debug!("Skipping nameless wallet record {}", key),
                Err(e) => log::warn!("Skipping unreadable wallet record {}: {}", key, e),
            }
        }

        Ok(wallets)
    }

    pub fn wallet_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.list()?.into_iter().map(|wallet| wallet.name).collect())
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<StoredWallet>, StorageError> {
        Ok(self.list()?.into_iter().find(|wallet| wallet.name == name))
    }

    /// Encrypt and store a new wallet under a freshly generated id
    pub fn store(&self, name: &str, password: &str, mnemonic: &str) -> Result<StoredWallet, WalletError> {
        if password.is_empty() {
            return Err(WalletError::PasswordNotSet(name.to_string()));
        }

        let secrets = Zeroizing::new(serde_json::to_vec(&WalletSecrets {
            mnemonic: mnemonic.to_string(),
        }).map_err(StorageError::from)?);

        let wallet = StoredWallet {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            encrypted: crypto::encrypt(&secrets, password)?,
        };

        let json = serde_json::to_string(&wallet).map_err(StorageError::from)?;
        self.store.set(&wallet_key(&wallet.id), &json)?;
        log::info!("Stored wallet '{}' ({})", wallet.name, wallet.id);

        Ok(wallet)
    }

    /// Decrypt the wallet `id` with `password`
    pub fn load(&self, id: &str, password: &str) -> Result<UnencryptedWallet, WalletError> {
        if password.is_empty() {
            return Err(WalletError::PasswordNotSet(id.to_string()));
        }

        let data = self
            .store
            .get(&wallet_key(id))?
            .ok_or_else(|| WalletError::UnknownWalletName(id.to_string()))?;
        let wallet: StoredWallet = serde_json::from_str(&data).map_err(StorageError::from)?;

        let plaintext = crypto::decrypt(&wallet.encrypted, password).map_err(|e| match e {
            StorageError::Crypto(_) => WalletError::InvalidPassword,
            other => WalletError::Storage(other),
        })?;
        let secrets: WalletSecrets = serde_json::from_slice(&plaintext).map_err(StorageError::from)?;

        Ok(UnencryptedWallet {
            id: wallet.id,
            name: wallet.name,
            mnemonic: Zeroizing::new(secrets.mnemonic),
        })
    }

    pub fn delete(&self, id: &str) -> Result<(), StorageError> {
        log::warn!("Deleting wallet {}", id);
        self.store.remove(&wallet_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const MNEMONIC: &str = "vault alarm sad mass witness property virus style good flower rice alpha";

    fn new_storage() -> (Arc<MemoryStore>, WalletStorage) {
        let backend = Arc::new(MemoryStore::new());
        (backend.clone(), WalletStorage::new(backend))
    }

    #[test]
    fn test_store_then_load() {
        let (_, storage) = new_storage();
        let stored = storage.store("main", "pw", MNEMONIC).unwrap();

        let wallet = storage.load(&stored.id, "pw").unwrap();
        assert_eq!(wallet.name, "main");
        assert_eq!(wallet.mnemonic.as_str(), MNEMONIC);
    }

    #[test]
    fn test_wrong_password() {
        let (_, storage) = new_storage();
        let stored = storage.store("main", "pw", MNEMONIC).unwrap();

        assert!(matches!(
            storage.load(&stored.id, "nope"),
            Err(WalletError::InvalidPassword)
        ));
    }

    #[test]
    fn test_unknown_and_passwordless() {
        let (_, storage) = new_storage();
        assert!(matches!(
            storage.load("missing", "pw"),
            Err(WalletError::UnknownWalletName(_))
        ));
        assert!(matches!(
            storage.load("missing", ""),
            Err(WalletError::PasswordNotSet(_))
        ));
        assert!(matches!(
            storage.store("main", "", MNEMONIC),
            Err(WalletError::PasswordNotSet(_))
        ));
    }

    #[test]
    fn test_list_skips_bad_records() {
        let (backend, storage) = new_storage();
        storage.store("main", "pw", MNEMONIC).unwrap();
        backend.set("wallet-broken", "{").unwrap();
        backend.set("settings", "{}").unwrap();

        let names = storage.wallet_names().unwrap();
        assert_eq!(names, vec!["main".to_string()]);
    }

    #[test]
    fn test_mnemonic_not_stored_in_clear() {
        let (backend, storage) = new_storage();
        let stored = storage.store("main", "pw", MNEMONIC).unwrap();
        let raw = backend.get(&format!("wallet-{}", stored.id)).unwrap().unwrap();
        assert!(!raw.contains("vault"));
        assert!(raw.contains("\"name\":\"main\""));
    }

    #[test]
    fn test_delete() {
        let (_, storage) = new_storage();
        let stored = storage.store("main", "pw", MNEMONIC).unwrap();
        storage.delete(&stored.id).unwrap();
        assert!(storage.find_by_name("main").unwrap().is_none());
    }
}
