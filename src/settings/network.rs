//! Network presets and network name derivation
//!
//! The network name is never stored: it is always derived by comparing the
//! configured endpoint triple against the compiled-in presets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::NetworkSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    Mainnet,
    Testnet,
    Localhost,
    Custom,
}

impl NetworkName {
    /// Networks with compiled-in endpoints, in lookup order
    pub const PRESETS: [NetworkName; 3] = [
        NetworkName::Mainnet,
        NetworkName::Testnet,
        NetworkName::Localhost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Localhost => "localhost",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "localhost" => Ok(Self::Localhost),
            "custom" => Ok(Self::Custom),
            other => Err(format!("Unknown network name '{}'", other)),
        }
    }
}

/// Endpoints of a preset network, `None` for `Custom`
pub fn network_endpoints(name: NetworkName) -> Option<NetworkSettings> {
    let (node_host, explorer_api_host, explorer_url) = match name {
        NetworkName::Mainnet => (
            "https://wallet-v18.mainnet.alephium.org",
            "https://backend-v18.mainnet.alephium.org",
            "https://explorer-v18.mainnet.alephium.org",
        ),
        NetworkName::Testnet => (
            "https://wallet-v18.testnet.alephium.org",
            "https://backend-v18.testnet.alephium.org",
            "https://explorer-v18.testnet.alephium.org",
        ),
        NetworkName::Localhost => (
            "http://localhost:12973",
            "http://localhost:9090",
            "http://localhost:3000",
        ),
        NetworkName::Custom => return None,
    };

    Some(NetworkSettings {
        node_host: node_host.to_string(),
        explorer_api_host: explorer_api_host.to_string(),
        explorer_url: explorer_url.to_string(),
    })
}

pub fn is_equal_network(a: &NetworkSettings, b: &NetworkSettings) -> bool {
    a.node_host == b.node_host
        && a.explorer_url == b.explorer_url
        && a.explorer_api_host == b.explorer_api_host
}

/// Resolve the preset matching all three endpoints exactly, otherwise `Custom`
pub fn get_network_name(settings: &NetworkSettings) -> NetworkName {
    NetworkName::PRESETS
        .into_iter()
        .find(|name| {
            network_endpoints(*name)
                .map(|preset| is_equal_network(&preset, settings))
                .unwrap_or(false)
        })
        .unwrap_or(NetworkName::Custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_resolve_to_their_name() {
        for name in NetworkName::PRESETS {
            let endpoints = network_endpoints(name).unwrap();
            assert_eq!(get_network_name(&endpoints), name);
        }
    }

    #[test]
    fn test_any_field_difference_is_custom() {
        let mainnet = network_endpoints(NetworkName::Mainnet).unwrap();

        let mut node = mainnet.clone();
        node.node_host = "https://my-node.example".into();
        assert_eq!(get_network_name(&node), NetworkName::Custom);

        let mut api = mainnet.clone();
        api.explorer_api_host = "https://backend-v18.testnet.alephium.org".into();
        assert_eq!(get_network_name(&api), NetworkName::Custom);

        let mut explorer = mainnet;
        explorer.explorer_url = "http://localhost:3000".into();
        assert_eq!(get_network_name(&explorer), NetworkName::Custom);
    }

    #[test]
    fn test_custom_has_no_endpoints() {
        assert!(network_endpoints(NetworkName::Custom).is_none());
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!("Testnet".parse::<NetworkName>().unwrap(), NetworkName::Testnet);
        assert!("devnet".parse::<NetworkName>().is_err());
        assert_eq!(NetworkName::Localhost.to_string(), "localhost");
    }
}
