//! Configuration validation

use crate::{AppConfig, ConfigError, Result, SystemConfig};

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration, reporting every problem at once
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    if config.systems.is_empty() {
        errors.push(ValidationError::new(
            "systems",
            "at least one system must be configured",
        ));
    }
    for (idx, system) in config.systems.iter().enumerate() {
        errors.extend(validate_system_config(idx, system));
    }

    let repositories = &config.repositories;
    if repositories.max_same_repositories == 0 {
        errors.push(ValidationError::new(
            "repositories.max_same_repositories",
            "must be greater than 0",
        ));
    }
    for (field, limit) in [
        ("repositories.sales_page_limit", repositories.sales_page_limit),
        ("repositories.swaps_page_limit", repositories.swaps_page_limit),
        ("repositories.assets_page_limit", repositories.assets_page_limit),
    ] {
        if limit == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }
    if repositories.cache_ttl_secs == Some(0) {
        errors.push(ValidationError::new(
            "repositories.cache_ttl_secs",
            "must be greater than 0 when set",
        ));
    }

    if let Some(asset) = &config.features.balances_conversion_asset {
        if asset.trim().is_empty() {
            errors.push(ValidationError::new(
                "features.balances_conversion_asset",
                "asset code cannot be blank",
            ));
        }
    }

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate the endpoints of the system at `idx`
pub fn validate_system_config(idx: usize, system: &SystemConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let required = [
        ("api_url", &system.api_url),
        ("storage_url", &system.storage_url),
    ];
    let optional = [
        ("client_url", &system.client_url),
        ("key_server_url", &system.key_server_url),
    ];

    for (name, url) in required {
        if let Err(e) = validate_url(url) {
            errors.push(ValidationError::new(format!("systems[{idx}].{name}"), e));
        }
    }
    for (name, url) in optional {
        if url.is_empty() {
            continue;
        }
        if let Err(e) = validate_url(url) {
            errors.push(ValidationError::new(format!("systems[{idx}].{name}"), e));
        }
    }
    errors
}

/// Validate a URL
pub fn validate_url(url: &str) -> std::result::Result<(), String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err("URL must start with http:// or https://".to_string());
    }

    Ok(())
}

fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NetworkConfig, RepositoriesConfig};

    fn valid_config() -> AppConfig {
        AppConfig {
            systems: vec![SystemConfig {
                api_url: "https://api.tokend.io".to_string(),
                storage_url: "https://storage.tokend.io".to_string(),
                client_url: "https://tokend.io".to_string(),
                key_server_url: String::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = AppConfig {
            network: NetworkConfig {
                log_level: "verbose".to_string(),
                ..Default::default()
            },
            ..valid_config()
        };

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_no_systems() {
        let config = AppConfig::default();
        let Err(ConfigError::ValidationError(msg)) = validate_config(&config) else {
            panic!("expected validation error");
        };
        assert!(msg.contains("systems"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = valid_config();
        config.systems[0].storage_url = "ftp://storage".to_string();
        config.repositories = RepositoriesConfig {
            sales_page_limit: 0,
            cache_ttl_secs: Some(0),
            ..Default::default()
        };

        let Err(ConfigError::ValidationError(msg)) = validate_config(&config) else {
            panic!("expected validation error");
        };
        assert!(msg.contains("systems[0].storage_url"));
        assert!(msg.contains("repositories.sales_page_limit"));
        assert!(msg.contains("repositories.cache_ttl_secs"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://localhost:8000").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("wss://example.com").is_err());
    }
}
