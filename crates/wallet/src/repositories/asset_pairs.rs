use std::ops::Deref;

use async_trait::async_trait;
use tokend_repository::{
    load_all_pages, ItemsCache, MultipleItemsLoader, RepositoryError, SimpleMultipleItemsRepository,
};
use tokend_types::{map_successful, AssetPairRecord, PagingParams};

use super::RepositoryContext;

pub struct AssetPairsLoader {
    context: RepositoryContext,
    page_limit: u32,
}

#[async_trait]
impl MultipleItemsLoader for AssetPairsLoader {
    type Item = AssetPairRecord;

    fn name(&self) -> &'static str {
        "asset_pairs"
    }

    async fn load_items(&self) -> Result<Vec<AssetPairRecord>, RepositoryError> {
        let api = self.context.api()?;
        let url_config = self.context.url_config();

        let resources = load_all_pages(|cursor| {
            let api = api.clone();
            let paging = PagingParams::new(cursor, self.page_limit);
            async move { api.get_asset_pairs(&paging).await }
        })
        .await?;

        Ok(map_successful(resources, |resource| {
            AssetPairRecord::from_resource(&resource, url_config.as_ref())
        }))
    }
}

#[derive(Clone)]
pub struct AssetPairsRepository {
    repository: SimpleMultipleItemsRepository<AssetPairsLoader>,
}

impl Deref for AssetPairsRepository {
    type Target = SimpleMultipleItemsRepository<AssetPairsLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl AssetPairsRepository {
    pub fn new(
        context: RepositoryContext,
        page_limit: u32,
        cache: ItemsCache<AssetPairRecord>,
    ) -> Self {
        let loader = AssetPairsLoader {
            context,
            page_limit,
        };
        Self {
            repository: SimpleMultipleItemsRepository::with_cache(loader, cache),
        }
    }

    /// Fetch one pair, bypassing the cache
    pub async fn get_single(
        &self,
        base: &str,
        quote: &str,
    ) -> Result<AssetPairRecord, RepositoryError> {
        let context = &self.loader().context;
        let resource = context.api()?.get_asset_pair(base, quote).await?;
        Ok(AssetPairRecord::from_resource(&resource, context.url_config().as_ref())?)
    }

    pub fn find(&self, base: &str, quote: &str) -> Option<AssetPairRecord> {
        self.items()
            .into_iter()
            .find(|pair| pair.base.code() == base && pair.quote.code() == quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{asset_pair_resource, MockApi, MockApiProvider};
    use crate::{UrlConfigHolder, WalletInfoHolder};
    use std::sync::Arc;
    use tokend_types::MappingError;

    fn repository(api: Arc<MockApi>) -> AssetPairsRepository {
        let context = RepositoryContext::new(
            Arc::new(MockApiProvider::single(api)),
            Arc::new(WalletInfoHolder::default()),
            Arc::new(UrlConfigHolder::default()),
        );
        AssetPairsRepository::new(context, 20, ItemsCache::new())
    }

    #[tokio::test]
    async fn test_pairs_without_policy_are_dropped() {
        let mut broken = asset_pair_resource("ETH", "USD", "300");
        broken.policies = None;
        let api = Arc::new(
            MockApi::new().with_asset_pairs(vec![asset_pair_resource("BTC", "USD", "60000"), broken]),
        );
        let repo = repository(api);

        repo.update(true).await.unwrap();
        assert_eq!(repo.items().len(), 1);
        let pair = repo.find("BTC", "USD").unwrap();
        assert_eq!(pair.id(), "BTC:USD");
        assert!(pair.is_tradeable());
    }

    #[tokio::test]
    async fn test_get_single_reports_mapping_error() {
        let mut broken = asset_pair_resource("ETH", "USD", "300");
        broken.policies = None;
        let repo = repository(Arc::new(MockApi::new().with_asset_pairs(vec![broken])));

        assert_eq!(
            repo.get_single("ETH", "USD").await.unwrap_err(),
            RepositoryError::Mapping(MappingError::MissingField("policies".into()))
        );
    }
}
