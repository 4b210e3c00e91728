use std::{
    collections::{HashMap, HashSet},
    ops::Deref,
};

use async_trait::async_trait;
use futures::future::try_join_all;
use tokend_repository::{
    load_all_pages, ItemsCache, MultipleItemsLoader, RepositoryError, SimpleMultipleItemsRepository,
};
use tokend_types::{map_successful, AssetRecord, PagingParams};
use tracing::debug;

use super::RepositoryContext;
use crate::AssetsPageParams;

pub struct AssetsLoader {
    context: RepositoryContext,
    owner: Option<String>,
    page_limit: u32,
}

#[async_trait]
impl MultipleItemsLoader for AssetsLoader {
    type Item = AssetRecord;

    fn name(&self) -> &'static str {
        "assets"
    }

    async fn load_items(&self) -> Result<Vec<AssetRecord>, RepositoryError> {
        let api = self.context.api()?;
        let url_config = self.context.url_config();

        let resources = load_all_pages(|cursor| {
            let api = api.clone();
            let params = AssetsPageParams {
                owner: self.owner.clone(),
                paging: PagingParams::new(cursor, self.page_limit),
            };
            async move { api.get_assets(&params).await }
        })
        .await?;

        Ok(map_successful(resources, |resource| {
            AssetRecord::from_resource(&resource, url_config.as_ref())
        }))
    }
}

/// All assets of the system, optionally only those owned by one company
#[derive(Clone)]
pub struct AssetsRepository {
    repository: SimpleMultipleItemsRepository<AssetsLoader>,
}

impl Deref for AssetsRepository {
    type Target = SimpleMultipleItemsRepository<AssetsLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl AssetsRepository {
    pub fn new(
        context: RepositoryContext,
        owner: Option<String>,
        page_limit: u32,
        cache: ItemsCache<AssetRecord>,
    ) -> Self {
        let loader = AssetsLoader {
            context,
            owner,
            page_limit,
        };
        Self {
            repository: SimpleMultipleItemsRepository::with_cache(loader, cache),
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.loader().owner.as_deref()
    }

    /// Fetch one asset, bypassing the cache
    pub async fn get_single(&self, code: &str) -> Result<AssetRecord, RepositoryError> {
        let context = &self.loader().context;
        let resource = context.api()?.get_asset(code).await?;
        Ok(AssetRecord::from_resource(&resource, context.url_config().as_ref())?)
    }

    /// Resolve `codes` to records, fetching only the ones not cached yet.
    ///
    /// Fetched assets are added to the cache without marking it fresh.
    pub async fn ensure_assets<I, S>(
        &self,
        codes: I,
    ) -> Result<HashMap<String, AssetRecord>, RepositoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let wanted: Vec<String> = codes
            .into_iter()
            .map(|code| code.as_ref().to_string())
            .filter(|code| seen.insert(code.clone()))
            .collect();

        let mut resolved: HashMap<String, AssetRecord> = self
            .items()
            .into_iter()
            .filter(|asset| seen.contains(&asset.code))
            .map(|asset| (asset.code.clone(), asset))
            .collect();

        let missing: Vec<&String> = wanted
            .iter()
            .filter(|code| !resolved.contains_key(*code))
            .collect();
        if missing.is_empty() {
            return Ok(resolved);
        }

        debug!(count = missing.len(), "loading missing assets");
        let loaded = try_join_all(missing.into_iter().map(|code| self.get_single(code))).await?;

        let loaded_codes: HashSet<String> = loaded.iter().map(|asset| asset.code.clone()).collect();
        self.transform_cache(|cache| {
            cache.remove_where(|asset| loaded_codes.contains(&asset.code));
            cache.append(loaded.iter().cloned());
        });

        resolved.extend(loaded.into_iter().map(|asset| (asset.code.clone(), asset)));
        Ok(resolved)
    }
}
