use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::asset::{detail_str, logo_url};
use crate::{Asset, MappingError, SaleResource, SimpleAsset, UrlConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleState {
    Open,
    Closed,
    Canceled,
}

impl TryFrom<i32> for SaleState {
    type Error = MappingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Open),
            2 => Ok(Self::Closed),
            3 => Ok(Self::Canceled),
            other => Err(MappingError::invalid("sale state", format!("unknown value {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleQuoteAsset {
    pub asset: Asset,
    pub price: Decimal,
    pub current_cap: Decimal,
    pub total_current_cap: Decimal,
    pub hard_cap: Decimal,
}

/// Token sale (investment campaign)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: u64,
    pub name: String,
    pub short_description: Option<String>,
    pub description_blob_id: Option<String>,
    pub logo_url: Option<String>,
    pub youtube_video_id: Option<String>,
    pub owner_account_id: String,
    pub base_asset: Asset,
    pub default_quote_asset: Asset,
    pub quote_assets: Vec<SaleQuoteAsset>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub soft_cap: Decimal,
    pub hard_cap: Decimal,
    pub base_hard_cap: Decimal,
    pub state: SaleState,
}

impl SaleRecord {
    pub fn from_resource(
        resource: &SaleResource,
        url_config: Option<&UrlConfig>,
    ) -> Result<Self, MappingError> {
        let id = resource
            .id
            .parse::<u64>()
            .map_err(|e| MappingError::invalid("sale id", e))?;

        let name = detail_str(&resource.details, "name")
            .ok_or_else(|| MappingError::missing(format!("name of sale {id}")))?;

        let quote_assets = resource
            .quote_assets
            .iter()
            .map(|quote| SaleQuoteAsset {
                asset: Asset::Simple(SimpleAsset::from_resource(&quote.asset)),
                price: quote.price,
                current_cap: quote.current_cap,
                total_current_cap: quote.total_current_cap,
                hard_cap: quote.hard_cap,
            })
            .collect();

        Ok(Self {
            id,
            name,
            short_description: detail_str(&resource.details, "short_description"),
            description_blob_id: detail_str(&resource.details, "description"),
            logo_url: logo_url(&resource.details, url_config),
            youtube_video_id: detail_str(&resource.details, "youtube_video_id"),
            owner_account_id: resource.owner.clone(),
            base_asset: Asset::from_resource(&resource.base_asset, url_config),
            default_quote_asset: Asset::Simple(SimpleAsset::from_resource(
                &resource.default_quote_asset,
            )),
            quote_assets,
            start_date: resource.start_time,
            end_date: resource.end_time,
            soft_cap: resource.soft_cap,
            hard_cap: resource.hard_cap,
            base_hard_cap: resource.base_hard_cap,
            state: SaleState::try_from(resource.sale_state)?,
        })
    }

    /// Total collected so far, as reported by the quote assets
    pub fn current_cap(&self) -> Decimal {
        self.quote_assets
            .iter()
            .map(|quote| quote.total_current_cap)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.state == SaleState::Open && now >= self.start_date && now < self.end_date
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.state == SaleState::Open && now < self.start_date
    }

    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        self.state != SaleState::Open || now >= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetResource, SaleQuoteAssetResource};
    use chrono::TimeZone;
    use serde_json::json;

    fn resource() -> SaleResource {
        SaleResource {
            id: "17".to_string(),
            owner: "GOWNER".to_string(),
            base_asset: AssetResource::reference("CFE"),
            default_quote_asset: AssetResource::reference("USD"),
            quote_assets: vec![SaleQuoteAssetResource {
                asset: AssetResource::reference("USD"),
                price: Decimal::from(2),
                current_cap: Decimal::from(100),
                total_current_cap: Decimal::from(150),
                hard_cap: Decimal::from(1000),
            }],
            start_time: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap(),
            soft_cap: Decimal::from(500),
            hard_cap: Decimal::from(1000),
            base_hard_cap: Decimal::from(500),
            sale_state: 1,
            details: json!({"name": "Coffee expansion", "logo": {"key": "cfe"}}),
        }
    }

    #[test]
    fn test_sale_from_resource() {
        let sale = SaleRecord::from_resource(&resource(), None).unwrap();

        assert_eq!(sale.id, 17);
        assert_eq!(sale.name, "Coffee expansion");
        assert_eq!(sale.state, SaleState::Open);
        assert_eq!(sale.current_cap(), Decimal::from(150));
        assert!(sale.logo_url.is_none());
    }

    #[test]
    fn test_sale_requires_numeric_id_and_name() {
        let mut bad_id = resource();
        bad_id.id = "abc".to_string();
        assert!(matches!(
            SaleRecord::from_resource(&bad_id, None),
            Err(MappingError::InvalidValue { .. })
        ));

        let mut no_name = resource();
        no_name.details = json!({});
        assert!(matches!(
            SaleRecord::from_resource(&no_name, None),
            Err(MappingError::MissingField(_))
        ));
    }

    #[test]
    fn test_sale_timeline() {
        let sale = SaleRecord::from_resource(&resource(), None).unwrap();

        let before = Utc.with_ymd_and_hms(2018, 12, 1, 0, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2019, 3, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2019, 7, 1, 0, 0, 0).unwrap();

        assert!(sale.is_upcoming(before));
        assert!(sale.is_available(during));
        assert!(sale.is_ended(after));
    }
}
