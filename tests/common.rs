//! Common test utilities for wallet core integration tests
//!
//! - Logger initialisation
//! - File-backed store in a temporary directory
//! - Address fixtures

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;

use alph_wallet_core::{Address, FileStore, KeyValueStore};

pub const MNEMONIC: &str =
    "vault alarm sad mass witness property virus style good flower rice alpha";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// File store rooted in a directory removed on drop
pub struct TestStore {
    pub temp_dir: TempDir,
    pub store: Arc<FileStore>,
}

impl TestStore {
    pub fn new() -> anyhow::Result<Self> {
        init_logger();
        let temp_dir = TempDir::new()?;
        log::info!("📁 Test directory: {:?}", temp_dir.path());
        let store = Arc::new(FileStore::new_with_base_dir(temp_dir.path().to_path_buf()));
        Ok(Self { temp_dir, store })
    }

    pub fn shared(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }
}

/// P2PKH address whose key hash is `seed` repeated
pub fn address_hash(seed: u8) -> String {
    let mut bytes = vec![0u8];
    bytes.extend_from_slice(&[seed; 32]);
    bs58::encode(bytes).into_string()
}

pub fn address(seed: u8, index: u32) -> anyhow::Result<Address> {
    Ok(Address::new(
        address_hash(seed),
        format!("pub-{}", seed),
        format!("priv-{}", seed),
        index,
    )?)
}
