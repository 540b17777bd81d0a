//! Pending transaction lifecycle
//!
//! A pending entry is created when a transaction is sent and removed when a
//! confirmed transaction with the same hash is observed, or when the wallet is
//! locked, switched or deleted. There is no expiry.

mod storage;

pub use storage::{EncryptionProps, PendingTransactionsStorage};

use std::collections::HashSet;
use std::sync::Arc;

use crate::addresses::AddressHash;
use crate::settings::NetworkName;
use crate::transactions::{sort_transactions, PendingTx, Transaction};

/// Wallet lifecycle events after which no pending entry may survive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEvent {
    Locked,
    Switched,
    ActiveWalletDeleted,
}

/// In-memory pending set of the active wallet
///
/// Mutations replace the shared list, so snapshots handed to readers never
/// change underneath them.
#[derive(Debug, Clone, Default)]
pub struct PendingTransactions {
    entries: Arc<Vec<PendingTx>>,
}

impl PendingTransactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Vec<PendingTx>> {
        Arc::clone(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, tx_id: &str) -> bool {
        self.entries.iter().any(|tx| tx.tx_id == tx_id)
    }

    /// Record a sent transaction; an id already pending is ignored
    pub fn transaction_sent(&mut self, tx: PendingTx) -> bool {
        if self.contains(&tx.tx_id) {
            log::debug!("Transaction {} already pending", tx.tx_id);
            return false;
        }
        log::debug!("Transaction {} sent from {}", tx.tx_id, tx.from_address);
        let mut entries = (*self.entries).clone();
        entries.push(tx);
        self.entries = Arc::new(entries);
        true
    }

    /// Merge entries restored from storage after unlocking
    pub fn stored_loaded(&mut self, stored: Vec<PendingTx>) -> usize {
        let mut added = 0;
        for tx in stored {
            if self.transaction_sent(tx) {
                added += 1;
            }
        }
        added
    }

    /// Drop every pending entry whose id is among `confirmed_hashes`
    ///
    /// Returns the number removed; applying the same hashes twice removes
    /// nothing the second time.
    pub fn remove_confirmed<'a, I>(&mut self, confirmed_hashes: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let confirmed: HashSet<&str> = confirmed_hashes.into_iter().collect();
        if confirmed.is_empty() {
            return 0;
        }

        let before = self.entries.len();
        let remaining: Vec<PendingTx> = self
            .entries
            .iter()
            .filter(|tx| !confirmed.contains(tx.tx_id.as_str()))
            .cloned()
            .collect();
        let removed = before - remaining.len();

        if removed > 0 {
            log::debug!("Removed {} confirmed pending transactions", removed);
            self.entries = Arc::new(remaining);
        }
        removed
    }

    /// Reconcile against a sync response of confirmed transactions
    pub fn apply_sync_response(&mut self, confirmed: &[Transaction]) -> usize {
        self.remove_confirmed(confirmed.iter().map(|tx| tx.hash.as_str()))
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries = Arc::new(Vec::new());
        }
    }

    pub fn handle_wallet_event(&mut self, event: WalletEvent) {
        log::debug!("Clearing pending transactions on {:?}", event);
        self.clear();
    }

    /// Pending entries sent from one of `addresses` on the active network,
    /// newest first
    pub fn for_addresses(&self, addresses: &[AddressHash], active_network: NetworkName) -> Vec<PendingTx> {
        let mut displayable: Vec<PendingTx> = self
            .entries
            .iter()
            .filter(|tx| tx.is_displayable_on(active_network))
            .filter(|tx| addresses.iter().any(|address| *address == tx.from_address))
            .cloned()
            .collect();
        sort_transactions(&mut displayable);
        displayable
    }
}
