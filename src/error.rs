//! Error types for wallet core operations
//!
//! Storage errors are absorbed at the storage boundary wherever a sensible
//! fallback exists (defaults, empty collections). Classification errors always
//! propagate: they mean an upstream data contract was violated.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Unknown wallet name: {0}")]
    UnknownWalletName(String),

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Unable to use wallet {0}, password not set")]
    PasswordNotSet(String),

    #[error("No active wallet")]
    NoActiveWallet,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),
}

impl WalletError {
    /// Errors the user can recover from by retrying (shown as a transient message)
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            WalletError::UnknownWalletName(_)
                | WalletError::InvalidPassword
                | WalletError::PasswordNotSet(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("Could not determine transaction type, all transactions should have a type")]
    UnknownTransactionShape,

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("{0} is not defined")]
    MissingCounterpartyAddress(CounterpartySide),

    #[error("Missing input amount in transaction {0}")]
    UnresolvedInputAmount(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Which side of a pending transaction could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterpartySide {
    From,
    To,
}

impl std::fmt::Display for CounterpartySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::From => write!(f, "fromAddress"),
            Self::To => write!(f, "toAddress"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(WalletError::InvalidPassword.is_user_recoverable());
        assert!(WalletError::UnknownWalletName("main".into()).is_user_recoverable());
        assert!(!WalletError::from(ClassificationError::UnknownTransactionShape).is_user_recoverable());
    }

    #[test]
    fn test_counterparty_message() {
        let err = ClassificationError::MissingCounterpartyAddress(CounterpartySide::To);
        assert_eq!(err.to_string(), "toAddress is not defined");
    }
}
