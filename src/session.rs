//! Wallet session: the single writer over settings, the active wallet and its
//! pending transactions
//!
//! Coordinates the stores; everything persisted is a snapshot of the state
//! held here and is only read back when loading.

use std::collections::HashMap;
use std::sync::Arc;

use crate::addresses::{sort_address_list, Address, AddressHash, AddressMetadataStore, AddressSettings};
use crate::error::WalletError;
use crate::pending::{EncryptionProps, PendingTransactions, PendingTransactionsStorage, WalletEvent};
use crate::settings::{NetworkName, NetworkSettings, NetworkSettingsPatch, Settings, SettingsPatch, SettingsStore};
use crate::storage::KeyValueStore;
use crate::sync::AddressTransactions;
use crate::transactions::{
    classify_transaction, merge_address_transactions, sort_transactions, BelongingToAddress,
    PendingTx, Transaction, TransactionInfo, TransactionStatus, TransactionVariant, TransactionView,
};
use crate::wallet_storage::{StoredWallet, WalletStorage};

/// The unlocked wallet
pub struct ActiveWallet {
    pub name: String,
    pub addresses: Vec<Address>,
    encryption: EncryptionProps,
}

impl ActiveWallet {
    pub fn id(&self) -> &str {
        &self.encryption.wallet_id
    }

    pub fn is_passphrase_used(&self) -> bool {
        self.encryption.is_passphrase_used
    }

    fn address_hashes(&self) -> Vec<AddressHash> {
        self.addresses.iter().map(|a| a.hash.clone()).collect()
    }
}

pub struct WalletSession {
    settings_store: SettingsStore,
    metadata: AddressMetadataStore,
    wallets: WalletStorage,
    pending_storage: PendingTransactionsStorage,
    settings: Settings,
    active_wallet: Option<ActiveWallet>,
    pending: PendingTransactions,
    confirmed: HashMap<AddressHash, Vec<Transaction>>,
}

impl WalletSession {
    // ============================================================================
    // Constructor
    // ============================================================================

    /// Load settings (migrating older schemas) and bring stored address
    /// metadata up to date
    pub fn init(store: Arc<dyn KeyValueStore>) -> Self {
        let settings_store = SettingsStore::new(store.clone());
        let metadata = AddressMetadataStore::new(store.clone());
        let wallets = WalletStorage::new(store.clone());

        let settings = if settings_store.deprecated_settings_exist() {
            log::info!("Migrating deprecated settings");
            settings_store.migrate()
        } else {
            settings_store.load()
        };

        // Updates need a readable persisted object to merge into
        if !settings_store.is_persisted() {
            if let Err(e) = settings_store.store(&settings) {
                log::warn!("Failed to persist default settings: {}", e);
            }
        }

        match wallets.wallet_names() {
            Ok(names) => match metadata.migrate_all(names.as_slice()) {
                Ok(0) => {}
                Ok(count) => log::info!("Migrated address metadata of {} wallets", count),
                Err(e) => log::warn!("Address metadata migration failed: {}", e),
            },
            Err(e) => log::warn!("Could not list stored wallets: {}", e),
        }

        log::info!("Wallet session ready on {}", settings.network_name());

        Self {
            settings_store,
            metadata,
            wallets,
            pending_storage: PendingTransactionsStorage::new(store),
            settings,
            active_wallet: None,
            pending: PendingTransactions::new(),
            confirmed: HashMap::new(),
        }
    }

    // ============================================================================
    // Settings
    // ============================================================================

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_network(&self) -> NetworkName {
        self.settings.network_name()
    }

    /// Apply a partial update; the in-memory settings only change when it
    /// was persisted
    pub fn update_settings(&mut self, patch: impl Into<SettingsPatch>) -> Option<&Settings> {
        let updated = self.settings_store.update(&patch.into())?;
        self.settings = updated;
        Some(&self.settings)
    }

    pub fn update_network_settings(&mut self, network: NetworkSettings) -> Option<&Settings> {
        let previous = self.current_network();
        self.update_settings(NetworkSettingsPatch::from(network))?;
        let current = self.current_network();
        if previous != current {
            log::info!("Switched network from {} to {}", previous, current);
        }
        Some(&self.settings)
    }

    // ============================================================================
    // Wallet Lifecycle
    // ============================================================================

    pub fn list_wallets(&self) -> Result<Vec<StoredWallet>, WalletError> {
        Ok(self.wallets.list()?)
    }

    pub fn create_wallet(&self, name: &str, password: &str, mnemonic: &str) -> Result<StoredWallet, WalletError> {
        self.wallets.store(name, password, mnemonic)
    }

    pub fn active_wallet(&self) -> Option<&ActiveWallet> {
        self.active_wallet.as_ref()
    }

    /// Unlock wallet `id`, replacing any other active wallet
    ///
    /// A non-empty passphrase marks the wallet as passphrase-derived: its
    /// pending transactions are then neither restored nor persisted.
    pub fn login(&mut self, id: &str, password: &str, passphrase: Option<&str>) -> Result<(), WalletError> {
        let wallet = self.wallets.load(id, password)?;

        let switching = self
            .active_wallet
            .as_ref()
            .map_or(false, |active| active.id() != id);
        if switching {
            self.reset_wallet_state(WalletEvent::Switched);
        }

        if let Err(e) = self.metadata.migrate_legacy_key(&wallet.name) {
            log::warn!("Address metadata migration of '{}' failed: {}", wallet.name, e);
        }

        let encryption = EncryptionProps {
            wallet_id: wallet.id,
            mnemonic: wallet.mnemonic,
            is_passphrase_used: passphrase.map_or(false, |p| !p.is_empty()),
        };

        if encryption.allows_persistence() {
            let stored = self.pending_storage.load(&encryption);
            let restored = self.pending.stored_loaded(stored);
            if restored > 0 {
                log::info!("Restored {} pending transactions", restored);
            }
        }

        log::info!("Unlocked wallet '{}'", wallet.name);
        self.active_wallet = Some(ActiveWallet {
            name: wallet.name,
            addresses: Vec::new(),
            encryption,
        });
        Ok(())
    }

    pub fn lock(&mut self) {
        if let Some(active) = self.active_wallet.take() {
            log::info!("Locked wallet '{}'", active.name);
        }
        self.reset_wallet_state(WalletEvent::Locked);
    }

    /// Remove the active wallet with its metadata and stored pending set
    pub fn delete_active_wallet(&mut self) -> Result<(), WalletError> {
        let active = self.active_wallet.take().ok_or(WalletError::NoActiveWallet)?;

        self.wallets.delete(active.id())?;
        self.metadata.delete(&active.name)?;
        self.pending_storage.delete(active.id())?;
        self.reset_wallet_state(WalletEvent::ActiveWalletDeleted);
        Ok(())
    }

    fn reset_wallet_state(&mut self, event: WalletEvent) {
        self.pending.handle_wallet_event(event);
        self.confirmed.clear();
    }

    // ============================================================================
    // Addresses
    // ============================================================================

    /// Install the derived addresses of the active wallet, applying stored
    /// metadata
    pub fn set_addresses(&mut self, mut addresses: Vec<Address>) -> Result<(), WalletError> {
        let active = self.active_wallet.as_mut().ok_or(WalletError::NoActiveWallet)?;
        let metadata = self.metadata.load(&active.name);

        for address in addresses.iter_mut() {
            address.apply_metadata(&metadata);
            address.last_used = self
                .confirmed
                .get(&address.hash)
                .and_then(|txs| txs.iter().map(|tx| tx.timestamp).max());
        }
        sort_address_list(&mut addresses);
        active.addresses = addresses;
        Ok(())
    }

    pub fn addresses(&self) -> &[Address] {
        self.active_wallet
            .as_ref()
            .map(|active| active.addresses.as_slice())
            .unwrap_or(&[])
    }

    /// Persist and apply new settings for the address at `index`
    ///
    /// Marking an address as main unmarks the previous main address.
    pub fn update_address_settings(&mut self, index: u32, settings: AddressSettings) -> Result<(), WalletError> {
        let active = self.active_wallet.as_mut().ok_or(WalletError::NoActiveWallet)?;

        if settings.is_main {
            for previous in active
                .addresses
                .iter_mut()
                .filter(|a| a.settings.is_main && a.index != index)
            {
                previous.settings.is_main = false;
                self.metadata
                    .store(&active.name, previous.index, &previous.settings)?;
            }
        }

        self.metadata.store(&active.name, index, &settings)?;
        if let Some(address) = active.addresses.iter_mut().find(|a| a.index == index) {
            address.settings = settings;
        }
        sort_address_list(&mut active.addresses);
        Ok(())
    }

    // ============================================================================
    // Transactions
    // ============================================================================

    /// Track a just-sent transaction until it shows up confirmed
    pub fn transaction_sent(&mut self, tx: PendingTx) -> bool {
        let added = self.pending.transaction_sent(tx);
        if added {
            self.persist_pending();
        }
        added
    }

    /// Record the confirmed transactions of one address and drop the pending
    /// entries they confirm
    ///
    /// Safe to apply the same response more than once.
    pub fn apply_sync_response(&mut self, response: &AddressTransactions) -> usize {
        let known = self.confirmed.entry(response.address.clone()).or_default();
        for tx in &response.transactions {
            if !known.iter().any(|existing| existing.hash == tx.hash) {
                known.push(tx.clone());
            }
        }
        sort_transactions(known);
        let last_used = known.first().map(|tx| tx.timestamp);

        if let Some(active) = self.active_wallet.as_mut() {
            if let Some(address) = active.addresses.iter_mut().find(|a| a.hash == response.address) {
                address.last_used = last_used;
            }
        }

        let removed = self.pending.apply_sync_response(&response.transactions);
        if removed > 0 {
            self.persist_pending();
        }
        removed
    }

    /// Pending entries of the active wallet on the current network
    pub fn displayable_pending(&self) -> Vec<PendingTx> {
        match &self.active_wallet {
            Some(active) => self
                .pending
                .for_addresses(&active.address_hashes(), self.current_network()),
            None => Vec::new(),
        }
    }

    pub fn pending(&self) -> &PendingTransactions {
        &self.pending
    }

    /// Transactions of `addresses` in the given status, merged newest first
    pub fn get_transactions_for_addresses(
        &self,
        status: TransactionStatus,
        addresses: &[Address],
    ) -> Vec<BelongingToAddress<TransactionVariant>> {
        let network = self.current_network();
        let per_address: Vec<(AddressHash, Vec<TransactionVariant>)> = addresses
            .iter()
            .map(|address| {
                let transactions: Vec<TransactionVariant> = match status {
                    TransactionStatus::Confirmed => self
                        .confirmed
                        .get(&address.hash)
                        .map(|txs| txs.iter().cloned().map(TransactionVariant::from).collect())
                        .unwrap_or_default(),
                    TransactionStatus::Pending => self
                        .pending
                        .for_addresses(std::slice::from_ref(&address.hash), network)
                        .into_iter()
                        .map(TransactionVariant::from)
                        .collect(),
                };
                (address.hash.clone(), transactions)
            })
            .collect();

        merge_address_transactions(
            per_address
                .iter()
                .map(|(address, transactions)| (address, transactions.as_slice())),
        )
    }

    /// Classify a transaction against the active wallet's address set
    pub fn classify(
        &self,
        tx: &TransactionVariant,
        address: &str,
        view: TransactionView,
    ) -> Result<TransactionInfo, WalletError> {
        Ok(classify_transaction(tx, address, self.addresses(), view)?)
    }

    fn persist_pending(&self) {
        let Some(active) = &self.active_wallet else {
            return;
        };
        if let Err(e) = self
            .pending_storage
            .persist_if_changed(&self.pending.snapshot(), &active.encryption)
        {
            log::warn!("Failed to persist pending transactions: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addresses::test_support::address;
    use crate::pending::test_support::pending_tx;
    use crate::settings::GeneralSettingsPatch;
    use crate::storage::MemoryStore;

    const MNEMONIC: &str = "vault alarm sad mass witness property virus style good flower rice alpha";

    fn confirmed(hash: &str, timestamp: i64) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            block_hash: "block".into(),
            timestamp,
            inputs: vec![],
            outputs: vec![],
            gas_amount: 20_000,
            gas_price: 100_000_000_000,
        }
    }

    fn unlocked_session() -> (Arc<MemoryStore>, WalletSession, String) {
        let backend = Arc::new(MemoryStore::new());
        let mut session = WalletSession::init(backend.clone());
        let wallet = session.create_wallet("main", "pw", MNEMONIC).unwrap();
        session.login(&wallet.id, "pw", None).unwrap();
        (backend, session, wallet.id)
    }

    #[test]
    fn test_init_persists_defaults() {
        let backend = Arc::new(MemoryStore::new());
        let mut session = WalletSession::init(backend.clone());
        assert!(backend.get("settings").unwrap().is_some());

        let updated = session
            .update_settings(GeneralSettingsPatch {
                discreet_mode: Some(true),
                ..Default::default()
            })
            .cloned()
            .unwrap();
        assert!(updated.general.discreet_mode);
        assert_eq!(session.settings(), &updated);
    }

    #[test]
    fn test_init_repairs_malformed_settings() {
        let backend = Arc::new(MemoryStore::new());
        backend.set("settings", "{not json").unwrap();

        let mut session = WalletSession::init(backend.clone());
        let updated = session
            .update_settings(GeneralSettingsPatch {
                discreet_mode: Some(true),
                ..Default::default()
            })
            .cloned()
            .unwrap();

        assert!(updated.general.discreet_mode);
        assert_eq!(SettingsStore::new(backend).load(), updated);
    }

    #[test]
    fn test_network_switch_hides_pending() {
        let (_, mut session, _) = unlocked_session();
        let a = address(1, 0);
        session.set_addresses(vec![a.clone()]).unwrap();
        session.transaction_sent(pending_tx("t1", &a.hash, 1, NetworkName::Mainnet));
        assert_eq!(session.displayable_pending().len(), 1);

        session.update_network_settings(NetworkSettings::preset(NetworkName::Testnet));
        assert_eq!(session.current_network(), NetworkName::Testnet);
        assert!(session.displayable_pending().is_empty());
    }

    #[test]
    fn test_lock_clears_pending_but_keeps_stored_copy() {
        let (_, mut session, id) = unlocked_session();
        session.transaction_sent(pending_tx("t1", "A", 1, NetworkName::Mainnet));

        session.lock();
        assert!(session.pending().is_empty());
        assert!(session.active_wallet().is_none());

        session.login(&id, "pw", None).unwrap();
        assert!(session.pending().contains("t1"));
    }

    #[test]
    fn test_passphrase_login_does_not_restore() {
        let (_, mut session, id) = unlocked_session();
        session.transaction_sent(pending_tx("t1", "A", 1, NetworkName::Mainnet));
        session.lock();

        session.login(&id, "pw", Some("extra words")).unwrap();
        assert!(session.pending().is_empty());
        assert!(session.active_wallet().unwrap().is_passphrase_used());
    }

    #[test]
    fn test_sync_response_confirms_pending() {
        let (_, mut session, _) = unlocked_session();
        let a = address(1, 0);
        session.set_addresses(vec![a.clone()]).unwrap();
        session.transaction_sent(pending_tx("t1", &a.hash, 1, NetworkName::Mainnet));

        let response = AddressTransactions {
            address: a.hash.clone(),
            transactions: vec![confirmed("t1", 50)],
        };
        assert_eq!(session.apply_sync_response(&response), 1);
        assert_eq!(session.apply_sync_response(&response), 0);
        assert!(session.pending().is_empty());

        assert_eq!(session.addresses()[0].last_used, Some(50));
        let confirmed = session.get_transactions_for_addresses(TransactionStatus::Confirmed, &[a]);
        assert_eq!(confirmed.len(), 1);
    }

    #[test]
    fn test_sync_without_confirmations_does_not_rewrite_pending() {
        let (backend, mut session, id) = unlocked_session();
        let a = address(1, 0);
        session.set_addresses(vec![a.clone()]).unwrap();
        session.transaction_sent(pending_tx("t1", &a.hash, 1, NetworkName::Mainnet));

        let key = crate::storage::pending_transactions_key(&id);
        backend.set(&key, "sentinel").unwrap();

        let response = AddressTransactions {
            address: a.hash.clone(),
            transactions: vec![confirmed("other", 50)],
        };
        assert_eq!(session.apply_sync_response(&response), 0);
        assert_eq!(backend.get(&key).unwrap().as_deref(), Some("sentinel"));
    }

    #[test]
    fn test_delete_active_wallet() {
        let (backend, mut session, id) = unlocked_session();
        session.transaction_sent(pending_tx("t1", "A", 1, NetworkName::Mainnet));
        session.delete_active_wallet().unwrap();

        assert!(session.pending().is_empty());
        assert!(session.list_wallets().unwrap().is_empty());
        assert_eq!(backend.get(&format!("pending-transactions-{}", id)).unwrap(), None);
        assert!(matches!(
            session.delete_active_wallet(),
            Err(WalletError::NoActiveWallet)
        ));
    }

    #[test]
    fn test_single_main_address() {
        let (_, mut session, _) = unlocked_session();
        session
            .set_addresses(vec![address(1, 0), address(2, 1)])
            .unwrap();

        let main = AddressSettings {
            is_main: true,
            ..Default::default()
        };
        session.update_address_settings(0, main.clone()).unwrap();
        session.update_address_settings(1, main).unwrap();

        let mains: Vec<u32> = session
            .addresses()
            .iter()
            .filter(|a| a.settings.is_main)
            .map(|a| a.index)
            .collect();
        assert_eq!(mains, vec![1]);
        assert_eq!(session.addresses()[0].index, 1);
    }
}
