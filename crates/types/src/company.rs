use serde::{Deserialize, Serialize};

use crate::{CompanyResource, MappingError, UrlConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: String,
    pub name: String,
    pub industry: Option<String>,
    pub logo_url: Option<String>,
    pub conversion_asset_code: Option<String>,
}

impl CompanyRecord {
    pub fn from_resource(
        resource: &CompanyResource,
        url_config: Option<&UrlConfig>,
    ) -> Result<Self, MappingError> {
        if resource.name.trim().is_empty() {
            return Err(MappingError::missing(format!("name of company {}", resource.id)));
        }

        Ok(Self {
            id: resource.id.clone(),
            name: resource.name.clone(),
            industry: resource.industry.clone().filter(|s| !s.is_empty()),
            logo_url: match (&resource.logo_key, url_config) {
                (Some(key), Some(config)) if !key.is_empty() => Some(config.storage_url(key)),
                _ => None,
            },
            conversion_asset_code: resource.conversion_asset_code.clone(),
        })
    }
}
