use std::{collections::HashMap, ops::Deref};

use async_trait::async_trait;
use tokend_repository::{ItemsCache, MultipleItemsLoader, RepositoryError, SimpleMultipleItemsRepository};
use tokend_types::{map_successful, CompanyRecord};

use super::RepositoryContext;

pub struct CompaniesLoader {
    context: RepositoryContext,
}

#[async_trait]
impl MultipleItemsLoader for CompaniesLoader {
    type Item = CompanyRecord;

    fn name(&self) -> &'static str {
        "companies"
    }

    async fn load_items(&self) -> Result<Vec<CompanyRecord>, RepositoryError> {
        let account_id = self.context.account_id()?;
        let api = self.context.signed_api()?;
        let url_config = self.context.url_config();

        let resources = api.get_companies(&account_id).await?;
        Ok(map_successful(resources, |resource| {
            CompanyRecord::from_resource(&resource, url_config.as_ref())
        }))
    }
}

/// Companies the account is a client of
#[derive(Clone)]
pub struct CompaniesRepository {
    repository: SimpleMultipleItemsRepository<CompaniesLoader>,
}

impl Deref for CompaniesRepository {
    type Target = SimpleMultipleItemsRepository<CompaniesLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl CompaniesRepository {
    pub fn new(context: RepositoryContext, cache: ItemsCache<CompanyRecord>) -> Self {
        Self {
            repository: SimpleMultipleItemsRepository::with_cache(CompaniesLoader { context }, cache),
        }
    }

    /// Cached companies keyed by company account id
    pub fn by_id(&self) -> HashMap<String, CompanyRecord> {
        self.items()
            .into_iter()
            .map(|company| (company.id.clone(), company))
            .collect()
    }
}
