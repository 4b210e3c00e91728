use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AssetResource, MappingError, UrlConfig};

/// Asset policy bits
pub mod asset_policy {
    pub const TRANSFERABLE: u32 = 1;
    pub const BASE_ASSET: u32 = 2;
    pub const STATS_QUOTE_ASSET: u32 = 8;
    pub const WITHDRAWABLE: u32 = 16;
    pub const ISSUANCE_MANUAL_REVIEW_REQUIRED: u32 = 32;
    pub const CAN_BE_BASE_IN_ATOMIC_SWAP: u32 = 64;
    pub const CAN_BE_QUOTE_IN_ATOMIC_SWAP: u32 = 128;
}

/// Records carrying a policy bit mask
pub trait RecordWithPolicy {
    fn policy(&self) -> u32;

    fn has_policy(&self, policy: u32) -> bool {
        self.policy() & policy == policy
    }
}

/// Asset known only by what a referencing resource carried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleAsset {
    pub code: String,
    pub name: Option<String>,
    pub trailing_digits: u32,
}

impl SimpleAsset {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            trailing_digits: 6,
        }
    }

    /// Never fails: falls back to the bare code when attributes are absent
    pub fn from_resource(resource: &AssetResource) -> Self {
        match &resource.attributes {
            Some(attributes) => Self {
                code: resource.id.clone(),
                name: detail_str(&attributes.details, "name"),
                trailing_digits: attributes.trailing_digits,
            },
            None => Self::new(resource.id.clone()),
        }
    }
}

/// Fully resolved asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub code: String,
    pub name: Option<String>,
    pub owner_account_id: String,
    pub policy: u32,
    pub trailing_digits: u32,
    pub logo_url: Option<String>,
    pub description: Option<String>,
    pub max_issuance_amount: Decimal,
    pub available_for_issuance: Decimal,
}

impl AssetRecord {
    pub fn from_resource(
        resource: &AssetResource,
        url_config: Option<&UrlConfig>,
    ) -> Result<Self, MappingError> {
        let attributes = resource
            .attributes
            .as_ref()
            .ok_or_else(|| MappingError::missing(format!("attributes of asset {}", resource.id)))?;

        Ok(Self {
            code: resource.id.clone(),
            name: detail_str(&attributes.details, "name"),
            owner_account_id: attributes.owner.clone(),
            policy: attributes.policies,
            trailing_digits: attributes.trailing_digits,
            logo_url: logo_url(&attributes.details, url_config),
            description: detail_str(&attributes.details, "description"),
            max_issuance_amount: attributes.max_issuance_amount,
            available_for_issuance: attributes.available_for_issuance,
        })
    }

    pub fn is_base(&self) -> bool {
        self.has_policy(asset_policy::BASE_ASSET)
    }

    pub fn is_transferable(&self) -> bool {
        self.has_policy(asset_policy::TRANSFERABLE)
    }

    pub fn is_withdrawable(&self) -> bool {
        self.has_policy(asset_policy::WITHDRAWABLE)
    }
}

impl RecordWithPolicy for AssetRecord {
    fn policy(&self) -> u32 {
        self.policy
    }
}

/// An asset reference that may or may not have been resolved yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Asset {
    Simple(SimpleAsset),
    Full(AssetRecord),
}

impl Asset {
    pub fn code(&self) -> &str {
        match self {
            Asset::Simple(asset) => &asset.code,
            Asset::Full(asset) => &asset.code,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Asset::Simple(asset) => asset.name.as_deref(),
            Asset::Full(asset) => asset.name.as_deref(),
        }
    }

    pub fn trailing_digits(&self) -> u32 {
        match self {
            Asset::Simple(asset) => asset.trailing_digits,
            Asset::Full(asset) => asset.trailing_digits,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Asset::Full(_))
    }

    /// Best available view of a wire reference
    pub fn from_resource(resource: &AssetResource, url_config: Option<&UrlConfig>) -> Self {
        AssetRecord::from_resource(resource, url_config)
            .map(Asset::Full)
            .unwrap_or_else(|_| Asset::Simple(SimpleAsset::from_resource(resource)))
    }
}

impl From<AssetRecord> for Asset {
    fn from(record: AssetRecord) -> Self {
        Asset::Full(record)
    }
}

impl From<SimpleAsset> for Asset {
    fn from(asset: SimpleAsset) -> Self {
        Asset::Simple(asset)
    }
}

pub(crate) fn detail_str(details: &serde_json::Value, key: &str) -> Option<String> {
    details
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `details.logo.key` resolved against the storage endpoint
pub(crate) fn logo_url(details: &serde_json::Value, url_config: Option<&UrlConfig>) -> Option<String> {
    let key = details.get("logo")?.get("key")?.as_str()?;
    if key.is_empty() {
        return None;
    }
    url_config.map(|config| config.storage_url(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetAttributes;
    use serde_json::json;

    fn url_config() -> UrlConfig {
        UrlConfig {
            api: "https://api.test".to_string(),
            storage: "https://storage.test".to_string(),
            client: "https://client.test".to_string(),
            key_server: "https://api.test/_/api".to_string(),
        }
    }

    fn filled_resource() -> AssetResource {
        AssetResource {
            id: "BTC".to_string(),
            attributes: Some(AssetAttributes {
                owner: "GOWNER".to_string(),
                policies: asset_policy::BASE_ASSET | asset_policy::TRANSFERABLE,
                trailing_digits: 8,
                max_issuance_amount: Decimal::from(21_000_000),
                available_for_issuance: Decimal::from(1_000),
                details: json!({"name": "Bitcoin", "logo": {"key": "btc-logo"}}),
            }),
        }
    }

    #[test]
    fn test_asset_record_from_filled_resource() {
        let record = AssetRecord::from_resource(&filled_resource(), Some(&url_config())).unwrap();

        assert_eq!(record.code, "BTC");
        assert_eq!(record.name.as_deref(), Some("Bitcoin"));
        assert_eq!(record.owner_account_id, "GOWNER");
        assert_eq!(record.logo_url.as_deref(), Some("https://storage.test/btc-logo"));
        assert!(record.is_base());
        assert!(record.is_transferable());
        assert!(!record.is_withdrawable());
    }

    #[test]
    fn test_asset_record_requires_attributes() {
        let result = AssetRecord::from_resource(&AssetResource::reference("BTC"), None);
        assert!(matches!(result, Err(MappingError::MissingField(_))));
    }

    #[test]
    fn test_asset_falls_back_to_simple() {
        let asset = Asset::from_resource(&AssetResource::reference("ETH"), None);
        assert_eq!(asset.code(), "ETH");
        assert!(!asset.is_resolved());

        let asset = Asset::from_resource(&filled_resource(), None);
        assert!(asset.is_resolved());
        assert_eq!(asset.trailing_digits(), 8);
    }
}
