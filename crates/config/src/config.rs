//! Configuration structures of the TokenD client

use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use tokend_types::UrlConfig;

use crate::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub network: NetworkConfig,

    /// Backing systems; the position in this list is the system index
    #[serde(default)]
    pub systems: Vec<SystemConfig>,

    /// Repository tuning
    #[serde(default)]
    pub repositories: RepositoriesConfig,

    /// Feature toggles
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Network environment configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, testnet, local)
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    Local,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "local" => Ok(Self::Local),
            other => Err(ConfigError::ParseError(format!(
                "unknown environment '{other}'"
            ))),
        }
    }
}

/// Endpoints of one TokenD system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Horizon API root
    pub api_url: String,

    /// Public storage root for blobs and logos
    pub storage_url: String,

    /// Web client root, used for verification links
    #[serde(default)]
    pub client_url: String,

    /// Key server root; defaults to `{api_url}/keys` when empty
    #[serde(default)]
    pub key_server_url: String,
}

impl From<&SystemConfig> for UrlConfig {
    fn from(system: &SystemConfig) -> Self {
        let key_server = if system.key_server_url.is_empty() {
            format!("{}/keys", system.api_url.trim_end_matches('/'))
        } else {
            system.key_server_url.clone()
        };
        UrlConfig {
            api: system.api_url.clone(),
            storage: system.storage_url.clone(),
            client: system.client_url.clone(),
            key_server,
        }
    }
}

impl AppConfig {
    /// URL configs of every system, in system index order
    pub fn url_configs(&self) -> Vec<UrlConfig> {
        self.systems.iter().map(UrlConfig::from).collect()
    }
}

/// Repository tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoriesConfig {
    /// Capacity of each keyed repository family
    #[serde(default = "default_max_same_repositories")]
    pub max_same_repositories: usize,

    #[serde(default = "default_sales_page_limit")]
    pub sales_page_limit: u32,

    #[serde(default = "default_swaps_page_limit")]
    pub swaps_page_limit: u32,

    #[serde(default = "default_assets_page_limit")]
    pub assets_page_limit: u32,

    /// List caches go stale after this many seconds; unset keeps them fresh
    /// until invalidated
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
}

impl RepositoriesConfig {
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

/// Feature toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturesConfig {
    /// Asset every balance is converted into, if any
    #[serde(default)]
    pub balances_conversion_asset: Option<String>,

    /// Keep the last submitted KYC state across sessions
    #[serde(default = "default_true")]
    pub kyc_persistence_enabled: bool,
}

// Default value functions

fn default_environment() -> Environment {
    Environment::Local
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_same_repositories() -> usize {
    10
}

fn default_sales_page_limit() -> u32 {
    10
}

fn default_swaps_page_limit() -> u32 {
    20
}

fn default_assets_page_limit() -> u32 {
    20
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

impl Default for RepositoriesConfig {
    fn default() -> Self {
        Self {
            max_same_repositories: default_max_same_repositories(),
            sales_page_limit: default_sales_page_limit(),
            swaps_page_limit: default_swaps_page_limit(),
            assets_page_limit: default_assets_page_limit(),
            cache_ttl_secs: None,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            balances_conversion_asset: None,
            kyc_persistence_enabled: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.network.environment, Environment::Local);
        assert_eq!(config.repositories.max_same_repositories, 10);
        assert_eq!(config.repositories.sales_page_limit, 10);
        assert_eq!(config.repositories.swaps_page_limit, 20);
        assert_eq!(config.repositories.cache_ttl(), None);
        assert!(config.features.kyc_persistence_enabled);
    }

    #[test]
    fn test_url_config_from_system() {
        let system = SystemConfig {
            api_url: "https://api.tokend.io/".to_string(),
            storage_url: "https://storage.tokend.io".to_string(),
            client_url: "https://tokend.io".to_string(),
            key_server_url: String::new(),
        };

        let urls = UrlConfig::from(&system);
        assert_eq!(urls.api, "https://api.tokend.io/");
        assert_eq!(urls.key_server, "https://api.tokend.io/keys");
        assert_eq!(urls.storage_url("logo.png"), "https://storage.tokend.io/logo.png");
    }

    #[test]
    fn test_environment_from_str() {
        assert_eq!("Mainnet".parse::<Environment>().unwrap(), Environment::Mainnet);
        assert!("staging".parse::<Environment>().is_err());
    }
}
