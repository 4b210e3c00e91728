use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Asset, MappingError, SimpleAsset, SwapResource};

/// Lifecycle of a logical swap from the account's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapState {
    Created,
    WaitingForCloseBySource,
    CanBeReceivedByDest,
    Completed,
    Canceled,
    CanceledByCounterparty,
}

impl SwapState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            SwapState::Completed | SwapState::Canceled | SwapState::CanceledByCounterparty
        )
    }
}

/// Swap terms stored in the details of the initiating leg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapDetails {
    pub quote_asset: String,
    pub quote_amount: Decimal,
    #[serde(default)]
    pub dest_email: Option<String>,
}

/// Logical swap assembled from one or two correlated legs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRecord {
    /// Id of the leg this record was built from
    pub id: String,
    pub secret_hash: String,
    pub secret: Option<Vec<u8>>,
    pub state: SwapState,
    /// The account is the destination party
    pub is_incoming: bool,
    /// System the leg was read from
    pub source_system_index: usize,
    pub counterparty_swap_id: Option<String>,
    pub source_account_id: String,
    pub destination_account_id: String,
    pub destination_email: Option<String>,
    pub base_asset: Asset,
    pub base_amount: Decimal,
    pub quote_asset: Asset,
    pub quote_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub lock_time: DateTime<Utc>,
}

impl SwapRecord {
    pub fn from_resource(
        resource: &SwapResource,
        secret: Option<Vec<u8>>,
        state: SwapState,
        is_incoming: bool,
        source_system_index: usize,
        counterparty_swap_id: Option<String>,
    ) -> Result<Self, MappingError> {
        if resource.details.is_null() {
            return Err(MappingError::missing(format!("details of swap {}", resource.id)));
        }
        let details: SwapDetails = serde_json::from_value(resource.details.clone())?;

        Ok(Self {
            id: resource.id.clone(),
            secret_hash: resource.secret_hash.clone(),
            secret,
            state,
            is_incoming,
            source_system_index,
            counterparty_swap_id,
            source_account_id: resource.source.id.clone(),
            destination_account_id: resource.destination.id.clone(),
            destination_email: details.dest_email,
            base_asset: Asset::Simple(SimpleAsset::from_resource(&resource.asset)),
            base_amount: resource.amount,
            quote_asset: Asset::Simple(SimpleAsset::new(details.quote_asset)),
            quote_amount: details.quote_amount,
            created_at: resource.created_at,
            lock_time: resource.lock_time,
        })
    }

    /// Codes of both sides, for batch asset resolution
    pub fn asset_codes(&self) -> [&str; 2] {
        [self.base_asset.code(), self.quote_asset.code()]
    }
}

/// Hex-encoded SHA-256 of a swap secret
pub fn swap_secret_hash(secret: &[u8]) -> String {
    hex::encode(Sha256::digest(secret))
}

/// Whether `secret` is the preimage of the hex-encoded `secret_hash`
pub fn secret_matches_hash(secret: &[u8], secret_hash: &str) -> bool {
    swap_secret_hash(secret).eq_ignore_ascii_case(secret_hash)
}
