//! Storage key naming

pub const SETTINGS_KEY: &str = "settings";

/// Standalone theme key written by releases before settings were nested
pub const DEPRECATED_THEME_KEY: &str = "theme";

pub const WALLET_KEY_PREFIX: &str = "wallet-";

const ADDRESSES_METADATA_PREFIX: &str = "addresses-metadata";
const PENDING_TRANSACTIONS_PREFIX: &str = "pending-transactions";

/// `addresses-metadata-<walletName>`
pub fn address_metadata_key(wallet_name: &str) -> String {
    format!("{}-{}", ADDRESSES_METADATA_PREFIX, wallet_name)
}

/// `<walletName>-addresses-metadata`, migrated away from
pub fn legacy_address_metadata_key(wallet_name: &str) -> String {
    format!("{}-{}", wallet_name, ADDRESSES_METADATA_PREFIX)
}

pub fn wallet_key(wallet_id: &str) -> String {
    format!("{}{}", WALLET_KEY_PREFIX, wallet_id)
}

pub fn pending_transactions_key(wallet_id: &str) -> String {
    format!("{}-{}", PENDING_TRANSACTIONS_PREFIX, wallet_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_key_conventions() {
        assert_eq!(address_metadata_key("savings"), "addresses-metadata-savings");
        assert_eq!(legacy_address_metadata_key("savings"), "savings-addresses-metadata");
    }

    #[test]
    fn test_wallet_scoped_keys() {
        assert_eq!(wallet_key("abc"), "wallet-abc");
        assert_eq!(pending_transactions_key("abc"), "pending-transactions-abc");
    }
}
