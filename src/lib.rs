//! Alephium wallet core
//!
//! Storage, migration and classification logic behind a desktop wallet,
//! independent of any UI, node client or keystore.
//!
//! # Architecture
//!
//! - **Settings**: nested settings schema, network presets, migration of older schemas
//! - **Addresses**: group derivation, per-address metadata keyed by derivation index
//! - **Transactions**: amount derivation and direction/type classification
//! - **Pending**: locally sent transactions until the explorer confirms them
//! - **Session**: the single writer tying the stores together
//!
//! # Example
//!
//! ```ignore
//! use alph_wallet_core::{storage::MemoryStore, session::WalletSession};
//! use std::sync::Arc;
//!
//! let mut session = WalletSession::init(Arc::new(MemoryStore::new()));
//! println!("{}", session.current_network());
//! ```

pub mod addresses;
pub mod config;
pub mod crypto;
pub mod error;
pub mod pending;
pub mod session;
pub mod settings;
pub mod storage;
pub mod sync;
pub mod transactions;
pub mod wallet_storage;

pub use addresses::{Address, AddressHash, AddressMetadata, AddressMetadataStore, AddressSettings};
pub use config::StorageConfig;
pub use error::{ClassificationError, CounterpartySide, StorageError, WalletError};
pub use pending::{PendingTransactions, WalletEvent};
pub use session::WalletSession;
pub use settings::{NetworkName, Settings, SettingsStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use transactions::{
    classify_transaction, PendingTx, Transaction, TransactionInfo, TransactionVariant,
};
