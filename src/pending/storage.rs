//! Encrypted persistence of pending transactions per wallet

use std::collections::HashSet;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::crypto::{self, EncryptedBlob};
use crate::error::StorageError;
use crate::storage::{pending_transactions_key, KeyValueStore};
use crate::transactions::PendingTx;

/// What the pending set is encrypted with
pub struct EncryptionProps {
    pub wallet_id: String,
    pub mnemonic: Zeroizing<String>,
    pub is_passphrase_used: bool,
}

impl EncryptionProps {
    /// Passphrase-derived wallets are not identified by the mnemonic alone, so
    /// their pending set is never written
    pub fn allows_persistence(&self) -> bool {
        !self.wallet_id.is_empty() && !self.mnemonic.is_empty() && !self.is_passphrase_used
    }
}

impl std::fmt::Debug for EncryptionProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionProps")
            .field("wallet_id", &self.wallet_id)
            .field("is_passphrase_used", &self.is_passphrase_used)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct PendingTransactionsStorage {
    store: Arc<dyn KeyValueStore>,
}

impl PendingTransactionsStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored pending set, empty when absent or undecryptable
    pub fn load(&self, props: &EncryptionProps) -> Vec<PendingTx> {
        match self.try_load(props) {
            Ok(transactions) => transactions,
            Err(e) => {
                log::warn!(
                    "Could not load pending transactions of wallet {}: {}",
                    props.wallet_id,
                    e
                );
                Vec::new()
            }
        }
    }

    fn try_load(&self, props: &EncryptionProps) -> Result<Vec<PendingTx>, StorageError> {
        let Some(raw) = self.store.get(&pending_transactions_key(&props.wallet_id))? else {
            return Ok(Vec::new());
        };
        let blob: EncryptedBlob = serde_json::from_str(&raw)?;
        let plaintext = crypto::decrypt(&blob, &props.mnemonic)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    pub fn store(&self, transactions: &[PendingTx], props: &EncryptionProps) -> Result<(), StorageError> {
        let json = serde_json::to_vec(transactions)?;
        let blob = crypto::encrypt(&json, &props.mnemonic)?;
        self.store.set(
            &pending_transactions_key(&props.wallet_id),
            &serde_json::to_string(&blob)?,
        )
    }

    pub fn delete(&self, wallet_id: &str) -> Result<(), StorageError> {
        self.store.remove(&pending_transactions_key(wallet_id))
    }

    /// Rewrite the stored set when it differs from `transactions` by id
    ///
    /// Returns whether a write happened. Nothing is written for wallets that
    /// do not allow persistence.
    pub fn persist_if_changed(
        &self,
        transactions: &[PendingTx],
        props: &EncryptionProps,
    ) -> Result<bool, StorageError> {
        if !props.allows_persistence() {
            return Ok(false);
        }

        let stored = self.load(props);
        let current_ids: HashSet<&str> = transactions.iter().map(|tx| tx.tx_id.as_str()).collect();
        let stored_ids: HashSet<&str> = stored.iter().map(|tx| tx.tx_id.as_str()).collect();

        if current_ids.symmetric_difference(&stored_ids).next().is_none() {
            return Ok(false);
        }

        log::debug!(
            "Storing {} pending transactions of wallet {}",
            transactions.len(),
            props.wallet_id
        );
        self.store(transactions, props)?;
        Ok(true)
    }
}
