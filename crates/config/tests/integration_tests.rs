//! Integration tests for the config crate

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokend_config::{validate_config, AppConfig, ConfigLoader, Environment, SystemConfig};

fn sample(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

#[test]
fn test_load_mainnet_config() {
    let config =
        ConfigLoader::from_file(&sample("mainnet.toml")).expect("Failed to load mainnet config");

    assert_eq!(config.network.environment, Environment::Mainnet);
    assert!(config.network.json_logs);
    assert_eq!(config.systems.len(), 1);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_load_testnet_config() {
    let config =
        ConfigLoader::from_file(&sample("testnet.toml")).expect("Failed to load testnet config");

    assert_eq!(config.network.environment, Environment::Testnet);
    assert_eq!(config.network.log_level, "debug");
    // Second system is the counterparty system for swaps
    let urls = config.url_configs();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[1].key_server, "https://api.demo.tokend.io/keys");
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_load_local_config() {
    let config =
        ConfigLoader::from_file(&sample("local.toml")).expect("Failed to load local config");

    assert_eq!(config.network.environment, Environment::Local);
    assert_eq!(config.network.log_level, "trace");
    assert!(!config.features.kyc_persistence_enabled);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_config_validation_invalid_system_url() {
    let config = AppConfig {
        systems: vec![SystemConfig {
            api_url: "api.tokend.io".to_string(),
            storage_url: "https://storage.tokend.io".to_string(),
            client_url: String::new(),
            key_server_url: String::new(),
        }],
        ..Default::default()
    };

    let err = validate_config(&config).unwrap_err();
    assert!(err.to_string().contains("systems[0].api_url"));
}

#[test]
fn test_config_builder() {
    let toml = r#"
[network]
environment = "testnet"
log_level = "debug"

[[systems]]
api_url = "https://api.testnet.tokend.io"
storage_url = "https://storage.testnet.tokend.io"
    "#;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = ConfigLoader::builder()
        .add_file(file.path(), true)
        .build()
        .expect("Failed to build config");

    assert_eq!(config.network.log_level, "debug");
    assert_eq!(config.systems[0].api_url, "https://api.testnet.tokend.io");
}

#[test]
fn test_file_with_env_overrides() {
    std::env::set_var("TOKEND_FILEENV_NETWORK__LOG_LEVEL", "warn");
    std::env::set_var("TOKEND_FILEENV_REPOSITORIES__SALES_PAGE_LIMIT", "3");

    let config = ConfigLoader::from_file_with_env(&sample("mainnet.toml"), "TOKEND_FILEENV")
        .expect("Failed to load config with env");

    assert_eq!(config.network.log_level, "warn");
    assert_eq!(config.repositories.sales_page_limit, 3);
    // Untouched values come from the file
    assert_eq!(config.network.environment, Environment::Mainnet);
    assert_eq!(config.repositories.cache_ttl_secs, Some(300));
    assert_eq!(config.systems.len(), 1);
}

#[test]
fn test_env_only_keeps_defaults() {
    std::env::set_var("TOKEND_ENVONLY_FEATURES__KYC_PERSISTENCE_ENABLED", "false");

    let config = ConfigLoader::from_env_with_prefix("TOKEND_ENVONLY").unwrap();

    assert!(!config.features.kyc_persistence_enabled);
    assert_eq!(config.repositories.swaps_page_limit, 20);
    assert!(config.systems.is_empty());
}

#[test]
fn test_missing_file() {
    assert!(ConfigLoader::from_file_with_env(&sample("staging.toml"), "TOKEND_MISSING").is_err());
}

#[test]
fn test_yaml_format() {
    let yaml = r#"
network:
  environment: testnet
  log_level: info

systems:
  - api_url: "https://api.testnet.tokend.io"
    storage_url: "https://storage.testnet.tokend.io"
    client_url: "https://testnet.tokend.io"

repositories:
  max_same_repositories: 4
"#;

    let config = ConfigLoader::from_yaml(yaml).unwrap();
    assert_eq!(config.repositories.max_same_repositories, 4);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_default_values() {
    let toml = r#"
[[systems]]
api_url = "https://api.tokend.io"
storage_url = "https://storage.tokend.io"
"#;

    let config = ConfigLoader::from_toml(toml).unwrap();
    assert_eq!(config.network.environment, Environment::Local);
    assert_eq!(config.network.log_level, "info");
    assert_eq!(config.repositories.max_same_repositories, 10);
    assert_eq!(config.repositories.sales_page_limit, 10);
    assert_eq!(config.repositories.swaps_page_limit, 20);
    assert_eq!(config.repositories.assets_page_limit, 20);
    assert_eq!(config.repositories.cache_ttl(), None);
    assert_eq!(config.features.balances_conversion_asset, None);
    assert!(config.features.kyc_persistence_enabled);
}
