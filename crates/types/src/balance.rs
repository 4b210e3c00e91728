use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    Asset, AssetRecord, BalanceResource, CompanyRecord, ConvertedBalanceStateResource,
    MappingError, UrlConfig,
};

/// An account's holding of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub id: String,
    pub asset: AssetRecord,
    pub available: Decimal,
    pub conversion_asset: Option<Asset>,
    pub converted_amount: Option<Decimal>,
    pub conversion_price: Option<Decimal>,
    pub company: Option<CompanyRecord>,
}

impl BalanceRecord {
    pub fn from_resource(
        source: &BalanceResource,
        url_config: Option<&UrlConfig>,
        companies: &HashMap<String, CompanyRecord>,
    ) -> Result<Self, MappingError> {
        let asset = AssetRecord::from_resource(&source.asset, url_config)?;
        let company = companies.get(&asset.owner_account_id).cloned();

        Ok(Self {
            id: source.id.clone(),
            available: source.state.available,
            asset,
            conversion_asset: None,
            converted_amount: None,
            conversion_price: None,
            company,
        })
    }

    /// Balance from the converted-balances endpoint.
    ///
    /// The converted state only references the balance asset; without the
    /// included attributes there is nothing to build the record from.
    pub fn from_converted(
        source: &ConvertedBalanceStateResource,
        url_config: Option<&UrlConfig>,
        conversion_asset: Option<&Asset>,
        companies: &HashMap<String, CompanyRecord>,
    ) -> Result<Self, MappingError> {
        if !source.balance.asset.is_filled() {
            return Err(MappingError::Unsupported(format!(
                "converted balance {} without asset details",
                source.balance.id
            )));
        }

        let asset = AssetRecord::from_resource(&source.balance.asset, url_config)?;
        let company = companies.get(&asset.owner_account_id).cloned();

        let (converted_amount, conversion_price) = if source.is_converted {
            (Some(source.converted_amounts.available), source.price)
        } else {
            (None, None)
        };

        Ok(Self {
            id: source.balance.id.clone(),
            available: source.initial_amounts.available,
            asset,
            conversion_asset: conversion_asset.cloned(),
            converted_amount,
            conversion_price,
            company,
        })
    }

    pub fn asset_code(&self) -> &str {
        &self.asset.code
    }

    pub fn has_available_amount(&self) -> bool {
        self.available > Decimal::ZERO
    }
}
