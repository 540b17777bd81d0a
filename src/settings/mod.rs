//! User-facing wallet settings
//!
//! - Settings schema and compiled-in defaults
//! - Network presets and name derivation
//! - Persistence with migration of older schemas

mod network;
mod store;

pub use network::{get_network_name, is_equal_network, network_endpoints, NetworkName};
pub use store::SettingsStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub general: GeneralSettings,
    pub network: NetworkSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub theme: ThemeType,
    /// `None` disables the idle lock
    pub wallet_lock_time_in_minutes: Option<u32>,
    pub discreet_mode: bool,
    pub password_requirement: bool,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    pub node_host: String,
    pub explorer_api_host: String,
    pub explorer_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    Light,
    Dark,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings {
                theme: ThemeType::Light,
                wallet_lock_time_in_minutes: Some(3),
                discreet_mode: false,
                password_requirement: false,
                language: "en-US".to_string(),
            },
            network: NetworkSettings::preset(NetworkName::Mainnet),
        }
    }
}

impl Settings {
    /// Name of the configured network, derived from the endpoint triple
    pub fn network_name(&self) -> NetworkName {
        get_network_name(&self.network)
    }

    /// Idle time after which the wallet locks, in milliseconds (0 = never)
    pub fn wallet_lock_time_ms(&self) -> u64 {
        u64::from(self.general.wallet_lock_time_in_minutes.unwrap_or(0)) * 60 * 1000
    }
}

impl NetworkSettings {
    /// Endpoints of a preset network. `Custom` falls back to mainnet endpoints.
    pub fn preset(name: NetworkName) -> Self {
        network_endpoints(name)
            .or_else(|| network_endpoints(NetworkName::Mainnet))
            .unwrap_or_else(|| NetworkSettings {
                node_host: String::new(),
                explorer_api_host: String::new(),
                explorer_url: String::new(),
            })
    }
}

/// Top-level settings section targeted by an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSection {
    General,
    Network,
}

impl SettingsSection {
    pub fn key(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Network => "network",
        }
    }
}

/// Partial values for the `general` section; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeType>,
    /// `Some(None)` disables the idle lock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_lock_time_in_minutes: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discreet_mode: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_requirement: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Partial values for the `network` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_api_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl From<NetworkSettings> for NetworkSettingsPatch {
    fn from(settings: NetworkSettings) -> Self {
        Self {
            node_host: Some(settings.node_host),
            explorer_api_host: Some(settings.explorer_api_host),
            explorer_url: Some(settings.explorer_url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsPatch {
    General(GeneralSettingsPatch),
    Network(NetworkSettingsPatch),
}

impl SettingsPatch {
    pub fn section(&self) -> SettingsSection {
        match self {
            Self::General(_) => SettingsSection::General,
            Self::Network(_) => SettingsSection::Network,
        }
    }

    /// JSON object holding only the fields being changed
    pub(crate) fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::General(patch) => serde_json::to_value(patch),
            Self::Network(patch) => serde_json::to_value(patch),
        }
    }
}

impl From<GeneralSettingsPatch> for SettingsPatch {
    fn from(patch: GeneralSettingsPatch) -> Self {
        Self::General(patch)
    }
}

impl From<NetworkSettingsPatch> for SettingsPatch {
    fn from(patch: NetworkSettingsPatch) -> Self {
        Self::Network(patch)
    }
}
