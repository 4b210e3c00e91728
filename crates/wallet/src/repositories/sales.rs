use std::ops::Deref;

use async_trait::async_trait;
use tokend_repository::{ItemsCache, PageLoader, PagedDataRepository, RepositoryError};
use tokend_types::{map_successful, DataPage, PagingOrder, PagingParams, SaleRecord};

use super::RepositoryContext;
use crate::SalesPageParams;

pub struct SalesLoader {
    context: RepositoryContext,
    base_asset: Option<String>,
    page_limit: u32,
}

#[async_trait]
impl PageLoader for SalesLoader {
    type Item = SaleRecord;

    fn name(&self) -> &'static str {
        "sales"
    }

    async fn load_page(
        &self,
        cursor: Option<String>,
    ) -> Result<DataPage<SaleRecord>, RepositoryError> {
        let account_id = self.context.account_id()?;
        let api = self.context.signed_api()?;
        let url_config = self.context.url_config();

        let params = SalesPageParams {
            open_only: true,
            base_asset: self.base_asset.clone(),
            paging: PagingParams::new(cursor, self.page_limit).with_order(PagingOrder::Desc),
        };
        let page = api.get_sales(&account_id, &params).await?;

        Ok(page.map_items(|items| {
            map_successful(items, |resource| {
                SaleRecord::from_resource(&resource, url_config.as_ref())
            })
        }))
    }
}

/// Open sales, newest first
#[derive(Clone)]
pub struct SalesRepository {
    repository: PagedDataRepository<SalesLoader>,
}

impl Deref for SalesRepository {
    type Target = PagedDataRepository<SalesLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl SalesRepository {
    /// `base_asset` narrows the list for the lifetime of the repository
    pub fn new(
        context: RepositoryContext,
        base_asset: Option<String>,
        page_limit: u32,
        cache: ItemsCache<SaleRecord>,
    ) -> Self {
        let loader = SalesLoader {
            context,
            base_asset,
            page_limit,
        };
        Self {
            repository: PagedDataRepository::with_cache(loader, cache),
        }
    }

    pub fn base_asset(&self) -> Option<&str> {
        self.loader().base_asset.as_deref()
    }

    pub async fn get_single(&self, id: u64) -> Result<SaleRecord, RepositoryError> {
        let context = &self.loader().context;
        let account_id = context.account_id()?;
        let resource = context.signed_api()?.get_sale(&account_id, id).await?;
        Ok(SaleRecord::from_resource(&resource, context.url_config().as_ref())?)
    }
}
