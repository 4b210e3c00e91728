use std::ops::Deref;

use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use tokend_repository::{
    load_all_pages, ItemsCache, MultipleItemsLoader, RepositoryError, SimpleMultipleItemsRepository,
};
use tokend_types::{Asset, PagingParams, SwapRecord};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::classify::{build_record, group_by_hash, SwapLeg};
use crate::{AssetsRepository, RepositoryContext, SwapSecretsPersistor, SwapsPageParams};

pub struct SwapsLoader {
    context: RepositoryContext,
    assets: AssetsRepository,
    secrets: Option<SwapSecretsPersistor>,
    page_limit: u32,
    home_system: OnceCell<usize>,
}

impl SwapsLoader {
    /// Index of the system holding the wallet's login, found once
    async fn home_system_index(&self) -> Result<usize, RepositoryError> {
        self.home_system
            .get_or_try_init(|| self.find_home_system())
            .await
            .copied()
    }

    /// Every key server is asked at once; the lowest answering index wins
    async fn find_home_system(&self) -> Result<usize, RepositoryError> {
        let email = self
            .context
            .wallet_info_provider
            .wallet_info()
            .map(|info| info.email)
            .ok_or_else(|| RepositoryError::missing("no wallet info found"))?;
        let provider = &self.context.api_provider;

        let lookups = (0..provider.systems_count()).map(|index| {
            let key_server = provider.key_server_at(index);
            let email = email.as_str();
            async move {
                let key_server = key_server?;
                match key_server.get_login_params(email).await {
                    Ok(_) => Some(index),
                    Err(e) => {
                        debug!(system = index, error = %e, "login not found on system");
                        None
                    }
                }
            }
        });

        let index = join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .min()
            .ok_or_else(|| RepositoryError::NotFound(format!("no system holds the login of {email}")))?;
        info!(system = index, "home system found");
        Ok(index)
    }

    /// Outgoing legs from the home system, incoming legs from every other one
    async fn load_legs(&self, account_id: &str) -> Result<Vec<SwapLeg>, RepositoryError> {
        let home = self.home_system_index().await?;

        let fetches = (0..self.context.api_provider.systems_count()).map(|index| {
            let (source, destination) = if index == home {
                (Some(account_id.to_string()), None)
            } else {
                (None, Some(account_id.to_string()))
            };
            async move {
                let api = self.context.signed_api_at(index)?;
                let resources = load_all_pages(|cursor| {
                    let api = api.clone();
                    let params = SwapsPageParams {
                        source: source.clone(),
                        destination: destination.clone(),
                        paging: PagingParams::new(cursor, self.page_limit),
                    };
                    async move { api.get_swaps(&params).await }
                })
                .await?;

                Ok::<_, RepositoryError>(
                    resources
                        .into_iter()
                        .map(|resource| SwapLeg::new(resource, index))
                        .collect::<Vec<_>>(),
                )
            }
        });

        Ok(try_join_all(fetches).await?.into_iter().flatten().collect())
    }

    /// Replace simple asset references with records from the assets repository
    async fn resolve_assets(&self, mut records: Vec<SwapRecord>) -> Result<Vec<SwapRecord>, RepositoryError> {
        let codes: Vec<String> = records
            .iter()
            .flat_map(|record| record.asset_codes().map(str::to_string))
            .collect();
        let assets = self.assets.ensure_assets(codes).await?;

        for record in &mut records {
            if let Some(asset) = assets.get(record.base_asset.code()) {
                record.base_asset = Asset::Full(asset.clone());
            }
            if let Some(asset) = assets.get(record.quote_asset.code()) {
                record.quote_asset = Asset::Full(asset.clone());
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl MultipleItemsLoader for SwapsLoader {
    type Item = SwapRecord;

    fn name(&self) -> &'static str {
        "swaps"
    }

    async fn load_items(&self) -> Result<Vec<SwapRecord>, RepositoryError> {
        let account_id = self.context.account_id()?;
        let legs = self.load_legs(&account_id).await?;
        debug!(legs = legs.len(), "swap legs loaded");

        let mut records: Vec<SwapRecord> = group_by_hash(legs)
            .into_iter()
            .filter_map(|group| {
                let stored = |hash: &str| self.secrets.as_ref().and_then(|s| s.load_secret(hash));
                match build_record(&account_id, &group, stored) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(error = %e, "dropping swap");
                        None
                    }
                }
            })
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        self.resolve_assets(records).await
    }
}

/// Atomic swaps of the signed-in account across every backing system,
/// newest first
#[derive(Clone)]
pub struct SwapsRepository {
    repository: SimpleMultipleItemsRepository<SwapsLoader>,
}

impl Deref for SwapsRepository {
    type Target = SimpleMultipleItemsRepository<SwapsLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl SwapsRepository {
    pub fn new(
        context: RepositoryContext,
        assets: AssetsRepository,
        secrets: Option<SwapSecretsPersistor>,
        page_limit: u32,
        cache: ItemsCache<SwapRecord>,
    ) -> Self {
        let loader = SwapsLoader {
            context,
            assets,
            secrets,
            page_limit,
            home_system: OnceCell::new(),
        };
        Self {
            repository: SimpleMultipleItemsRepository::with_cache(loader, cache),
        }
    }

    pub async fn home_system_index(&self) -> Result<usize, RepositoryError> {
        self.loader().home_system_index().await
    }

    pub fn by_hash(&self, secret_hash: &str) -> Option<SwapRecord> {
        self.items()
            .into_iter()
            .find(|record| record.secret_hash.eq_ignore_ascii_case(secret_hash))
    }

    /// Keep the secret of a swap created on this device, so the swap can be
    /// closed after a restart
    pub fn remember_secret(&self, secret_hash: &str, secret: &[u8]) -> Result<(), RepositoryError> {
        let secrets = self
            .loader()
            .secrets
            .as_ref()
            .ok_or_else(|| RepositoryError::Persistence("swap secrets storage is disabled".into()))?;
        secrets.save_secret(secret_hash, secret);
        Ok(())
    }
}
