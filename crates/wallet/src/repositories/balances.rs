use std::{collections::HashMap, ops::Deref};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokend_repository::{ItemsCache, MultipleItemsLoader, RepositoryError, SimpleMultipleItemsRepository};
use tokend_types::{map_successful, Asset, BalanceRecord, CompanyRecord};
use tracing::warn;

use super::{CompaniesRepository, RepositoryContext};

pub struct BalancesLoader {
    context: RepositoryContext,
    conversion_asset_code: Option<String>,
    companies: CompaniesRepository,
}

impl BalancesLoader {
    /// Companies are decoration; balances still load without them
    async fn companies_by_id(&self) -> HashMap<String, CompanyRecord> {
        if let Err(e) = self.companies.update_if_not_fresh().await {
            warn!(error = %e, "balances loaded without fresh companies");
        }
        self.companies.by_id()
    }
}

#[async_trait]
impl MultipleItemsLoader for BalancesLoader {
    type Item = BalanceRecord;

    fn name(&self) -> &'static str {
        "balances"
    }

    async fn load_items(&self) -> Result<Vec<BalanceRecord>, RepositoryError> {
        let account_id = self.context.account_id()?;
        let api = self.context.signed_api()?;
        let url_config = self.context.url_config();
        let companies = self.companies_by_id().await;

        match &self.conversion_asset_code {
            Some(conversion_asset_code) => {
                let collection = api
                    .get_converted_balances(&account_id, conversion_asset_code)
                    .await?;
                let conversion_asset = Asset::from_resource(&collection.asset, url_config.as_ref());

                Ok(map_successful(collection.states, |state| {
                    BalanceRecord::from_converted(
                        &state,
                        url_config.as_ref(),
                        Some(&conversion_asset),
                        &companies,
                    )
                }))
            }
            None => {
                let resources = api.get_balances(&account_id).await?;
                Ok(map_successful(resources, |resource| {
                    BalanceRecord::from_resource(&resource, url_config.as_ref(), &companies)
                }))
            }
        }
    }
}

/// Balances of the signed-in account
#[derive(Clone)]
pub struct BalancesRepository {
    repository: SimpleMultipleItemsRepository<BalancesLoader>,
}

impl Deref for BalancesRepository {
    type Target = SimpleMultipleItemsRepository<BalancesLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl BalancesRepository {
    pub fn new(
        context: RepositoryContext,
        conversion_asset_code: Option<String>,
        companies: CompaniesRepository,
        cache: ItemsCache<BalanceRecord>,
    ) -> Self {
        let loader = BalancesLoader {
            context,
            conversion_asset_code,
            companies,
        };
        Self {
            repository: SimpleMultipleItemsRepository::with_cache(loader, cache),
        }
    }

    pub fn conversion_asset_code(&self) -> Option<&str> {
        self.loader().conversion_asset_code.as_deref()
    }

    /// Cached balance of `asset_code`
    pub fn balance_for_asset(&self, asset_code: &str) -> Option<BalanceRecord> {
        self.items()
            .into_iter()
            .find(|balance| balance.asset_code() == asset_code)
    }

    /// Set the available amount of a cached balance, e.g. after a payment.
    ///
    /// Returns false when no balance with `balance_id` is cached.
    pub fn update_balance(&self, balance_id: &str, available: Decimal) -> bool {
        self.transform_cache(|cache| {
            cache.update_where(
                |balance| balance.id == balance_id,
                |balance| balance.available = available,
            ) > 0
        })
    }
}
