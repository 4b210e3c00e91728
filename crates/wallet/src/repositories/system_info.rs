use std::ops::Deref;

use async_trait::async_trait;
use tokend_repository::{RepositoryError, SimpleSingleItemRepository, SingleItemLoader};
use tokend_types::{NetworkParams, SystemInfoResource};

use super::RepositoryContext;

pub struct SystemInfoLoader {
    context: RepositoryContext,
}

#[async_trait]
impl SingleItemLoader for SystemInfoLoader {
    type Item = SystemInfoResource;

    fn name(&self) -> &'static str {
        "system_info"
    }

    async fn load_item(&self) -> Result<SystemInfoResource, RepositoryError> {
        Ok(self.context.api()?.get_system_info().await?)
    }
}

#[derive(Clone)]
pub struct SystemInfoRepository {
    repository: SimpleSingleItemRepository<SystemInfoLoader>,
}

impl Deref for SystemInfoRepository {
    type Target = SimpleSingleItemRepository<SystemInfoLoader>;

    fn deref(&self) -> &Self::Target {
        &self.repository
    }
}

impl SystemInfoRepository {
    pub fn new(context: RepositoryContext) -> Self {
        Self {
            repository: SimpleSingleItemRepository::new(SystemInfoLoader { context }),
        }
    }

    /// Network params from the cached system info, loading it on first use
    pub async fn network_params(&self) -> Result<NetworkParams, RepositoryError> {
        if self.item().is_none() {
            self.update(false).await?;
        }
        let info = self
            .item()
            .ok_or_else(|| RepositoryError::missing("no system info loaded"))?;
        Ok(NetworkParams::from_resource(&info)?)
    }
}
