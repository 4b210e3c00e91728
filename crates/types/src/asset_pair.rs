use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Asset, AssetPairResource, MappingError, RecordWithPolicy, SimpleAsset, UrlConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPairRecord {
    pub base: Asset,
    pub quote: Asset,
    pub price: Decimal,
    pub policy: u32,
    pub logo_url: Option<String>,
}

impl AssetPairRecord {
    pub fn from_resource(
        resource: &AssetPairResource,
        url_config: Option<&UrlConfig>,
    ) -> Result<Self, MappingError> {
        let policy = resource
            .policies
            .ok_or_else(|| MappingError::missing("policies"))?;

        let logo_url = resource
            .base_asset
            .attributes
            .as_ref()
            .and_then(|attributes| crate::asset::logo_url(&attributes.details, url_config));

        Ok(Self {
            base: Asset::Simple(SimpleAsset::from_resource(&resource.base_asset)),
            quote: Asset::Simple(SimpleAsset::from_resource(&resource.quote_asset)),
            price: resource.price,
            policy,
            logo_url,
        })
    }

    /// `BASE:QUOTE`
    pub fn id(&self) -> String {
        format!("{}:{}", self.base.code(), self.quote.code())
    }

    /// No pair is currently excluded from trading.
    pub fn is_tradeable(&self) -> bool {
        true
    }
}

impl RecordWithPolicy for AssetPairRecord {
    fn policy(&self) -> u32 {
        self.policy
    }
}

impl PartialEq for AssetPairRecord {
    fn eq(&self, other: &Self) -> bool {
        self.base.code() == other.base.code() && self.quote.code() == other.quote.code()
    }
}

impl Eq for AssetPairRecord {}

impl std::hash::Hash for AssetPairRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetResource;

    fn resource(policies: Option<u32>) -> AssetPairResource {
        AssetPairResource {
            base_asset: AssetResource::reference("BTC"),
            quote_asset: AssetResource::reference("USD"),
            price: Decimal::from(8000),
            policies,
        }
    }

    #[test]
    fn test_pair_requires_policy() {
        let result = AssetPairRecord::from_resource(&resource(None), None);
        assert_eq!(result.unwrap_err(), MappingError::missing("policies"));
    }

    #[test]
    fn test_pair_identity_is_codes() {
        let a = AssetPairRecord::from_resource(&resource(Some(1)), None).unwrap();
        let mut other = resource(Some(4));
        other.price = Decimal::from(9000);
        let b = AssetPairRecord::from_resource(&other, None).unwrap();

        assert_eq!(a.id(), "BTC:USD");
        assert_eq!(a, b);
        assert!(a.is_tradeable());
        assert!(b.has_policy(4));
    }
}
