//! Configuration loading from files and the environment

use crate::{AppConfig, ConfigError, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Prefix of environment overrides, e.g. `TOKEND_NETWORK__LOG_LEVEL=debug`
pub const ENV_PREFIX: &str = "TOKEND";

/// Configuration loader for TOML, YAML and JSON files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, picking the format by extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading config file");

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {extension}"
            ))),
        }
    }

    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from `TOKEND_*` environment variables
    pub fn from_env() -> Result<AppConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load configuration from environment variables with a custom prefix
    ///
    /// Sections are separated by a double underscore:
    /// `PREFIX_REPOSITORIES__SALES_PAGE_LIMIT=5`. Unset keys keep their defaults.
    pub fn from_env_with_prefix(prefix: &str) -> Result<AppConfig> {
        Self::builder().add_env(prefix).build()
    }

    /// Merge two configurations, with overlay taking precedence
    ///
    /// An empty overlay system list keeps the base systems, and an unset
    /// overlay conversion asset keeps the base one.
    pub fn merge(base: AppConfig, overlay: AppConfig) -> AppConfig {
        AppConfig {
            network: overlay.network,
            systems: if overlay.systems.is_empty() {
                base.systems
            } else {
                overlay.systems
            },
            repositories: crate::RepositoriesConfig {
                cache_ttl_secs: overlay
                    .repositories
                    .cache_ttl_secs
                    .or(base.repositories.cache_ttl_secs),
                ..overlay.repositories
            },
            features: crate::FeaturesConfig {
                balances_conversion_asset: overlay
                    .features
                    .balances_conversion_asset
                    .or(base.features.balances_conversion_asset),
                ..overlay.features
            },
        }
    }

    /// Load a file and layer environment overrides with the given prefix on top
    ///
    /// Only the variables that are actually set override file values.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        if !path.exists() {
            return Err(ConfigError::LoadError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::builder().add_file(path, true).add_env(env_prefix).build()
    }

    /// Build configuration from several layered sources
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
            errors: Vec::new(),
        }
    }
}

/// Builder for layered configuration loading; later sources win
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
    errors: Vec<String>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    /// Set a default value for a key; a rejected key fails `build`
    pub fn set_default(mut self, key: &str, value: &str) -> Self {
        match self.builder.clone().set_default(key, value) {
            Ok(builder) => self.builder = builder,
            Err(e) => self.errors.push(format!("{key}: {e}")),
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        if !self.errors.is_empty() {
            return Err(ConfigError::LoadError(self.errors.join("; ")));
        }
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Environment as Env, NetworkConfig, SystemConfig};
    use std::io::Write;

    const TOML: &str = r#"
[network]
environment = "testnet"
log_level = "debug"

[[systems]]
api_url = "https://api.testnet.tokend.io"
storage_url = "https://storage.testnet.tokend.io"

[[systems]]
api_url = "https://api.partner.tokend.io"
storage_url = "https://storage.partner.tokend.io"
key_server_url = "https://keys.partner.tokend.io"

[repositories]
sales_page_limit = 5
cache_ttl_secs = 30

[features]
balances_conversion_asset = "USD"
"#;

    fn system(api_url: &str) -> SystemConfig {
        SystemConfig {
            api_url: api_url.to_string(),
            storage_url: "https://storage.tokend.io".to_string(),
            client_url: String::new(),
            key_server_url: String::new(),
        }
    }

    #[test]
    fn test_load_from_toml() {
        let config = ConfigLoader::from_toml(TOML).unwrap();
        assert_eq!(config.network.log_level, "debug");
        assert_eq!(config.systems.len(), 2);
        assert_eq!(config.repositories.sales_page_limit, 5);
        assert_eq!(config.repositories.swaps_page_limit, 20);
        assert_eq!(
            config.features.balances_conversion_asset.as_deref(),
            Some("USD")
        );
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
network:
  environment: mainnet
  log_level: warn
  json_logs: true

systems:
  - api_url: "https://api.tokend.io"
    storage_url: "https://storage.tokend.io"

features:
  kyc_persistence_enabled: false
"#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();
        assert_eq!(config.network.environment, Env::Mainnet);
        assert!(config.network.json_logs);
        assert!(!config.features.kyc_persistence_enabled);
        assert_eq!(config.repositories.max_same_repositories, 10);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"
{
  "network": { "environment": "local", "log_level": "trace" },
  "systems": [
    { "api_url": "http://localhost:8000", "storage_url": "http://localhost:9000" }
  ],
  "repositories": { "assets_page_limit": 50 }
}
"#;

        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.network.log_level, "trace");
        assert_eq!(config.repositories.assets_page_limit, 50);
        assert_eq!(config.url_configs()[0].key_server, "http://localhost:8000/keys");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(TOML.as_bytes()).unwrap();

        let config = ConfigLoader::from_file(file.path()).unwrap();
        assert_eq!(config.systems[1].key_server_url, "https://keys.partner.tokend.io");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            ConfigLoader::from_file(file.path()),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn test_merge_configs() {
        let base = AppConfig {
            systems: vec![system("https://api.tokend.io")],
            features: crate::FeaturesConfig {
                balances_conversion_asset: Some("USD".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let overlay = AppConfig {
            network: NetworkConfig {
                environment: Env::Testnet,
                log_level: "debug".to_string(),
                json_logs: false,
            },
            ..Default::default()
        };

        let merged = ConfigLoader::merge(base, overlay);
        assert_eq!(merged.network.log_level, "debug");
        assert_eq!(merged.network.environment, Env::Testnet);
        assert_eq!(merged.systems.len(), 1);
        assert_eq!(
            merged.features.balances_conversion_asset.as_deref(),
            Some("USD")
        );
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConfigLoader::builder()
            .set_default("network.log_level", "warn")
            .set_default("repositories.swaps_page_limit", "7")
            .build()
            .unwrap();
        assert_eq!(config.network.log_level, "warn");
        assert_eq!(config.repositories.swaps_page_limit, 7);
    }
}
