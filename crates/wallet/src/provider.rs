//! Lazily created repositories shared for the lifetime of a session

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use moka::{notification::RemovalCause, policy::EvictionPolicy, sync::Cache};
use tokend_repository::ItemsCache;
use tracing::info;

use crate::{
    AssetPairsRepository, AssetsRepository, BalancesRepository, BlobsRepository,
    CompaniesRepository, CompanyInfoProvider, KeyValueStore, KycStateRepository,
    RepositoryContext, SalesRepository, SubmittedKycStatePersistor, SwapSecretsPersistor,
    SwapsRepository, SystemInfoRepository,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySettings {
    /// Capacity of every keyed repository family
    pub max_same_repositories: usize,
    pub sales_page_limit: u32,
    pub swaps_page_limit: u32,
    pub assets_page_limit: u32,
    /// Freshness lifetime of list caches; `None` keeps them fresh until invalidated
    pub cache_ttl: Option<Duration>,
    pub conversion_asset_code: Option<String>,
    pub kyc_persistence_enabled: bool,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            max_same_repositories: 10,
            sales_page_limit: 10,
            swaps_page_limit: 20,
            assets_page_limit: 20,
            cache_ttl: None,
            conversion_asset_code: None,
            kyc_persistence_enabled: true,
        }
    }
}

const NO_COMPANY: &str = "none";

/// Bounded family of keyed repositories; the least recently used one is
/// dropped once `capacity` is exceeded
fn repository_family<V>(family: &'static str, capacity: usize) -> Cache<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(capacity as u64)
        .eviction_policy(EvictionPolicy::lru())
        .eviction_listener(move |key: Arc<String>, _, cause: RemovalCause| {
            if cause.was_evicted() {
                info!(family, key = %key, "evicted least recently used repository");
            }
        })
        .build()
}

/// Look up `key`, creating the repository on a miss, and apply any pending
/// eviction right away
fn get_or_create<V>(cache: &Cache<String, V>, key: String, create: impl FnOnce() -> V) -> V
where
    V: Clone + Send + Sync + 'static,
{
    let repository = cache.get_with(key, create);
    cache.run_pending_tasks();
    repository
}

pub struct RepositoryProvider {
    context: RepositoryContext,
    company_info: Arc<dyn CompanyInfoProvider>,
    store: Option<Arc<dyn KeyValueStore>>,
    settings: RepositorySettings,

    system_info: OnceLock<SystemInfoRepository>,
    blobs: OnceLock<BlobsRepository>,
    companies: OnceLock<CompaniesRepository>,
    asset_pairs: OnceLock<AssetPairsRepository>,
    kyc_state: OnceLock<KycStateRepository>,
    swaps: OnceLock<SwapsRepository>,
    sales: OnceLock<SalesRepository>,

    // Keyed by company id
    assets: Cache<String, AssetsRepository>,
    balances: Cache<String, BalancesRepository>,
    // Keyed by base asset
    filtered_sales: Cache<String, SalesRepository>,
}

impl RepositoryProvider {
    /// `store` backs swap secrets and the submitted KYC state; without it
    /// neither is persisted
    pub fn new(
        context: RepositoryContext,
        company_info: Arc<dyn CompanyInfoProvider>,
        store: Option<Arc<dyn KeyValueStore>>,
        settings: RepositorySettings,
    ) -> Self {
        let capacity = settings.max_same_repositories;
        Self {
            context,
            company_info,
            store,
            settings,
            system_info: OnceLock::new(),
            blobs: OnceLock::new(),
            companies: OnceLock::new(),
            asset_pairs: OnceLock::new(),
            kyc_state: OnceLock::new(),
            swaps: OnceLock::new(),
            sales: OnceLock::new(),
            assets: repository_family("assets", capacity),
            balances: repository_family("balances", capacity),
            filtered_sales: repository_family("filtered_sales", capacity),
        }
    }

    /// A provider over the same collaborators with every repository and
    /// cache created afresh, for the next signed-in user
    pub fn for_new_session(&self) -> Self {
        Self::new(
            self.context.clone(),
            self.company_info.clone(),
            self.store.clone(),
            self.settings.clone(),
        )
    }

    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    pub fn context(&self) -> &RepositoryContext {
        &self.context
    }

    fn items_cache<T: Clone>(&self) -> ItemsCache<T> {
        match self.settings.cache_ttl {
            Some(ttl) => ItemsCache::with_ttl(ttl),
            None => ItemsCache::new(),
        }
    }

    fn company_key(&self) -> String {
        self.company_info
            .company_id()
            .unwrap_or_else(|| NO_COMPANY.to_string())
    }

    pub fn system_info(&self) -> SystemInfoRepository {
        self.system_info
            .get_or_init(|| SystemInfoRepository::new(self.context.clone()))
            .clone()
    }

    pub fn blobs(&self) -> BlobsRepository {
        self.blobs
            .get_or_init(|| BlobsRepository::new(self.context.clone()))
            .clone()
    }

    pub fn companies(&self) -> CompaniesRepository {
        self.companies
            .get_or_init(|| CompaniesRepository::new(self.context.clone(), self.items_cache()))
            .clone()
    }

    pub fn asset_pairs(&self) -> AssetPairsRepository {
        self.asset_pairs
            .get_or_init(|| {
                AssetPairsRepository::new(
                    self.context.clone(),
                    self.settings.assets_page_limit,
                    self.items_cache(),
                )
            })
            .clone()
    }

    pub fn kyc_state(&self) -> KycStateRepository {
        self.kyc_state
            .get_or_init(|| {
                let persistor = self
                    .store
                    .clone()
                    .filter(|_| self.settings.kyc_persistence_enabled)
                    .map(SubmittedKycStatePersistor::new);
                KycStateRepository::new(self.context.clone(), self.blobs(), persistor)
            })
            .clone()
    }

    pub fn swaps(&self) -> SwapsRepository {
        self.swaps
            .get_or_init(|| {
                SwapsRepository::new(
                    self.context.clone(),
                    self.assets(),
                    self.store.clone().map(SwapSecretsPersistor::new),
                    self.settings.swaps_page_limit,
                    self.items_cache(),
                )
            })
            .clone()
    }

    /// Open sales of every base asset
    pub fn sales(&self) -> SalesRepository {
        self.sales
            .get_or_init(|| {
                SalesRepository::new(
                    self.context.clone(),
                    None,
                    self.settings.sales_page_limit,
                    self.items_cache(),
                )
            })
            .clone()
    }

    /// Open sales of one base asset
    pub fn filtered_sales(&self, base_asset: &str) -> SalesRepository {
        get_or_create(&self.filtered_sales, base_asset.to_string(), || {
            SalesRepository::new(
                self.context.clone(),
                Some(base_asset.to_string()),
                self.settings.sales_page_limit,
                self.items_cache(),
            )
        })
    }

    /// Assets of the current company, or every asset outside a company
    pub fn assets(&self) -> AssetsRepository {
        let company_id = self.company_info.company_id();
        get_or_create(&self.assets, self.company_key(), || {
            AssetsRepository::new(
                self.context.clone(),
                company_id,
                self.settings.assets_page_limit,
                self.items_cache(),
            )
        })
    }

    pub fn balances(&self) -> BalancesRepository {
        get_or_create(&self.balances, self.company_key(), || {
            BalancesRepository::new(
                self.context.clone(),
                self.settings.conversion_asset_code.clone(),
                self.companies(),
                self.items_cache(),
            )
        })
    }
}
