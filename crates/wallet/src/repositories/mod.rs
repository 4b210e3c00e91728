//! Concrete repositories over the TokenD API

mod asset_pairs;
mod assets;
mod balances;
mod blobs;
mod companies;
mod kyc_state;
mod sales;
mod system_info;

pub use asset_pairs::{AssetPairsLoader, AssetPairsRepository};
pub use assets::{AssetsLoader, AssetsRepository};
pub use balances::{BalancesLoader, BalancesRepository};
pub use blobs::BlobsRepository;
pub use companies::{CompaniesLoader, CompaniesRepository};
pub use kyc_state::{KycStateLoader, KycStateRepository};
pub use sales::{SalesLoader, SalesRepository};
pub use system_info::{SystemInfoLoader, SystemInfoRepository};

use std::sync::Arc;

use tokend_repository::RepositoryError;
use tokend_types::UrlConfig;

use crate::{ApiProvider, TokenDApi, UrlConfigProvider, WalletInfoProvider};

/// Collaborators every repository fetches through
#[derive(Clone)]
pub struct RepositoryContext {
    pub api_provider: Arc<dyn ApiProvider>,
    pub wallet_info_provider: Arc<dyn WalletInfoProvider>,
    pub url_config_provider: Arc<dyn UrlConfigProvider>,
}

impl RepositoryContext {
    pub fn new(
        api_provider: Arc<dyn ApiProvider>,
        wallet_info_provider: Arc<dyn WalletInfoProvider>,
        url_config_provider: Arc<dyn UrlConfigProvider>,
    ) -> Self {
        Self {
            api_provider,
            wallet_info_provider,
            url_config_provider,
        }
    }

    pub fn api(&self) -> Result<Arc<dyn TokenDApi>, RepositoryError> {
        self.api_provider
            .api()
            .ok_or_else(|| RepositoryError::missing("no API instance found"))
    }

    pub fn signed_api(&self) -> Result<Arc<dyn TokenDApi>, RepositoryError> {
        self.api_provider
            .signed_api()
            .ok_or_else(|| RepositoryError::missing("no signed API instance found"))
    }

    pub fn signed_api_at(&self, index: usize) -> Result<Arc<dyn TokenDApi>, RepositoryError> {
        self.api_provider
            .signed_api_at(index)
            .ok_or_else(|| RepositoryError::missing(format!("no signed API found for system {index}")))
    }

    pub fn account_id(&self) -> Result<String, RepositoryError> {
        self.wallet_info_provider
            .account_id()
            .ok_or_else(|| RepositoryError::missing("no wallet info found"))
    }

    pub fn url_config(&self) -> Option<UrlConfig> {
        self.url_config_provider.config()
    }
}
