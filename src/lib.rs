//! TokenD client data layer
//!
//! Re-exports the workspace crates and wires a session together from an
//! [`AppConfig`]: logging, URL configs per system, repository settings and the
//! shared collaborator holders.

use std::{
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;

pub use tokend_config as config;
pub use tokend_repository as repository;
pub use tokend_telemetry as telemetry;
pub use tokend_types as types;
pub use tokend_wallet as wallet;

use tokend_config::{validate_config, AppConfig, ConfigError, ConfigLoader, ENV_PREFIX};
use tokend_telemetry::{init_tracing, ErrorContext, TracingError};
use tokend_types::WalletInfo;
use tokend_wallet::{
    AccountHolder, ApiProvider, CompanyInfoHolder, CompanyInfoProvider,
    CreateRedemptionRequestUseCase, KeyStorage, KeyValueStore, RedemptionRequest,
    RepositoryContext, RepositoryProvider, RepositorySettings, SignInError, SignInManager,
    UrlConfigHolder, UseCaseError, WalletInfoHolder,
};

/// Load a config file with `TOKEND_` environment overrides and validate it
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let config = ConfigLoader::from_file_with_env(path, ENV_PREFIX)
        .with_context(|| format!("loading {}", path.display()))?;
    validate_config(&config).context("validating client config")?;
    Ok(config)
}

/// Install the global subscriber from the `network` section
pub fn init_logging(config: &AppConfig) -> Result<(), TracingError> {
    init_tracing(&config.network.log_level, config.network.json_logs)
}

pub fn repository_settings(config: &AppConfig) -> RepositorySettings {
    RepositorySettings {
        max_same_repositories: config.repositories.max_same_repositories,
        sales_page_limit: config.repositories.sales_page_limit,
        swaps_page_limit: config.repositories.swaps_page_limit,
        assets_page_limit: config.repositories.assets_page_limit,
        cache_ttl: config.repositories.cache_ttl(),
        conversion_asset_code: config.features.balances_conversion_asset.clone(),
        kyc_persistence_enabled: config.features.kyc_persistence_enabled,
    }
}

/// One signed-in (or signed-out) user session
pub struct TokenDClient {
    wallet_info: Arc<WalletInfoHolder>,
    accounts: Arc<AccountHolder>,
    company: Arc<CompanyInfoHolder>,
    sign_in: SignInManager,
    repositories: RwLock<Arc<RepositoryProvider>>,
}

impl TokenDClient {
    /// Fails when `config` does not validate
    pub fn new(
        config: &AppConfig,
        api_provider: Arc<dyn ApiProvider>,
        key_storage: Arc<dyn KeyStorage>,
        store: Option<Arc<dyn KeyValueStore>>,
    ) -> Result<Self, ConfigError> {
        validate_config(config)?;

        let wallet_info = Arc::new(WalletInfoHolder::default());
        let accounts = Arc::new(AccountHolder::default());
        let company = Arc::new(CompanyInfoHolder::default());
        let urls = Arc::new(UrlConfigHolder::new(config.url_configs()));

        let context = RepositoryContext::new(api_provider, wallet_info.clone(), urls);
        let repositories = RepositoryProvider::new(
            context,
            company.clone(),
            store,
            repository_settings(config),
        );
        let sign_in = SignInManager::new(key_storage, wallet_info.clone(), accounts.clone());

        info!(
            environment = ?config.network.environment,
            systems = config.systems.len(),
            "client session created"
        );
        Ok(Self {
            wallet_info,
            accounts,
            company,
            sign_in,
            repositories: RwLock::new(Arc::new(repositories)),
        })
    }

    /// Repositories of the current session; a sign-in or sign-out replaces them
    pub fn repositories(&self) -> Arc<RepositoryProvider> {
        self.repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn renew_repositories(&self) {
        let mut repositories = self
            .repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *repositories = Arc::new(repositories.for_new_session());
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<WalletInfo, SignInError> {
        let wallet = self
            .sign_in
            .sign_in(email, password)
            .await
            .with_operation("sign_in")?;
        self.renew_repositories();
        Ok(wallet)
    }

    /// Forget the wallet, the submitted KYC state and every cached repository
    pub fn sign_out(&self) {
        self.sign_in.sign_out();
        self.repositories().kyc_state().clear();
        self.renew_repositories();
    }

    pub fn is_signed_in(&self) -> bool {
        self.sign_in.is_signed_in()
    }

    /// Switch the session into (or out of) a company; company-keyed
    /// repositories follow on the next lookup
    pub fn set_company(&self, company_id: Option<String>) {
        self.company.set_company_id(company_id);
    }

    pub async fn create_redemption_request(
        &self,
        amount: Decimal,
        asset_code: &str,
    ) -> Result<RedemptionRequest, UseCaseError> {
        let repositories = self.repositories();
        CreateRedemptionRequestUseCase::new(
            amount,
            asset_code,
            repositories.system_info(),
            repositories.balances(),
            self.wallet_info.clone(),
            self.accounts.clone(),
        )
        .perform()
        .await
        .with_operation("create_redemption_request")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokend_config::SystemConfig;

    fn config() -> AppConfig {
        AppConfig {
            systems: vec![SystemConfig {
                api_url: "https://api.tokend.io".to_string(),
                storage_url: "https://storage.tokend.io".to_string(),
                client_url: String::new(),
                key_server_url: String::new(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_repository_settings_from_config() {
        let mut config = config();
        config.repositories.cache_ttl_secs = Some(30);
        config.features.balances_conversion_asset = Some("USD".to_string());

        let settings = repository_settings(&config);
        assert_eq!(settings.cache_ttl, Some(std::time::Duration::from_secs(30)));
        assert_eq!(settings.conversion_asset_code.as_deref(), Some("USD"));
        assert_eq!(settings.max_same_repositories, 10);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let api = Arc::new(tokend_wallet::mock::MockApiProvider::single(Arc::new(
            tokend_wallet::mock::MockApi::new(),
        )));
        let keys = Arc::new(tokend_wallet::mock::MockKeyStorage::new());

        assert!(TokenDClient::new(&AppConfig::default(), api.clone(), keys.clone(), None).is_err());
        assert!(TokenDClient::new(&config(), api, keys, None).is_ok());
    }
}
