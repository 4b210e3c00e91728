//! Wire-level resources as returned by the TokenD API.
//!
//! Related resources are "included" on demand: a reference that was not
//! included carries only its id, so every attribute block is optional.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::MappingError;

// ═══════════════════════════════════════════════════════════════════════════
// SHARED
// ═══════════════════════════════════════════════════════════════════════════

/// Bare reference to another resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub id: String,
}

impl ResourceKey {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ASSETS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetResource {
    /// Asset code
    pub id: String,

    #[serde(default)]
    pub attributes: Option<AssetAttributes>,
}

impl AssetResource {
    /// Reference without included attributes
    pub fn reference(code: impl Into<String>) -> Self {
        Self {
            id: code.into(),
            attributes: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.id
    }

    /// Whether the attributes were included in the response
    pub fn is_filled(&self) -> bool {
        self.attributes.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetAttributes {
    /// Owner account id
    pub owner: String,

    pub policies: u32,

    #[serde(default = "default_trailing_digits")]
    pub trailing_digits: u32,

    #[serde(default)]
    pub max_issuance_amount: Decimal,

    #[serde(default)]
    pub available_for_issuance: Decimal,

    /// Free-form JSON: `name`, `logo.key`, `description`, ...
    #[serde(default)]
    pub details: serde_json::Value,
}

fn default_trailing_digits() -> u32 {
    6
}

// ═══════════════════════════════════════════════════════════════════════════
// BALANCES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceAmounts {
    pub available: Decimal,
    #[serde(default)]
    pub locked: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResource {
    pub id: String,
    pub asset: AssetResource,
    pub state: BalanceAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRefResource {
    pub id: String,
    pub asset: AssetResource,
}

/// Balance state with amounts converted into a single conversion asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedBalanceStateResource {
    pub balance: BalanceRefResource,
    pub initial_amounts: BalanceAmounts,
    #[serde(default)]
    pub converted_amounts: BalanceAmounts,
    pub is_converted: bool,
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedBalancesCollection {
    /// The asset every state was converted into
    pub asset: AssetResource,
    pub states: Vec<ConvertedBalanceStateResource>,
}

// ═══════════════════════════════════════════════════════════════════════════
// ASSET PAIRS, SALES, COMPANIES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPairResource {
    pub base_asset: AssetResource,
    pub quote_asset: AssetResource,
    pub price: Decimal,
    #[serde(default)]
    pub policies: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleQuoteAssetResource {
    pub asset: AssetResource,
    pub price: Decimal,
    #[serde(default)]
    pub current_cap: Decimal,
    #[serde(default)]
    pub total_current_cap: Decimal,
    #[serde(default)]
    pub hard_cap: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleResource {
    pub id: String,
    pub owner: String,
    pub base_asset: AssetResource,
    pub default_quote_asset: AssetResource,
    #[serde(default)]
    pub quote_assets: Vec<SaleQuoteAssetResource>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub soft_cap: Decimal,
    pub hard_cap: Decimal,
    #[serde(default)]
    pub base_hard_cap: Decimal,
    /// 1 = open, 2 = closed, 3 = canceled
    pub sale_state: i32,
    /// `name`, `short_description`, `description` (blob id), `logo.key`, `youtube_video_id`
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyResource {
    /// Company account id
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub logo_key: Option<String>,
    #[serde(default)]
    pub conversion_asset_code: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// SWAPS
// ═══════════════════════════════════════════════════════════════════════════

/// Per-leg swap state as reported by a backing system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum RemoteSwapState {
    Open,
    Closed,
    Canceled,
}

impl TryFrom<i32> for RemoteSwapState {
    type Error = MappingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Open),
            2 => Ok(Self::Closed),
            3 => Ok(Self::Canceled),
            other => Err(MappingError::invalid("swap state", format!("unknown value {other}"))),
        }
    }
}

impl From<RemoteSwapState> for i32 {
    fn from(state: RemoteSwapState) -> Self {
        match state {
            RemoteSwapState::Open => 1,
            RemoteSwapState::Closed => 2,
            RemoteSwapState::Canceled => 3,
        }
    }
}

/// One leg of an atomic swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapResource {
    pub id: String,
    /// Hex-encoded SHA-256 of the secret, shared by both legs
    pub secret_hash: String,
    /// Hex-encoded secret, revealed once the leg is closed
    #[serde(default)]
    pub secret: Option<String>,
    pub state: RemoteSwapState,
    pub created_at: DateTime<Utc>,
    pub lock_time: DateTime<Utc>,
    pub amount: Decimal,
    pub source: ResourceKey,
    pub destination: ResourceKey,
    pub source_balance: ResourceKey,
    pub destination_balance: ResourceKey,
    pub asset: AssetResource,
    /// `quote_asset`, `quote_amount`, optional `dest_email`
    #[serde(default)]
    pub details: serde_json::Value,
}

// ═══════════════════════════════════════════════════════════════════════════
// REVIEWABLE REQUESTS & BLOBS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Canceled,
    Approved,
    Rejected,
    PermanentlyRejected,
}

impl TryFrom<i32> for RequestState {
    type Error = MappingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Canceled),
            3 => Ok(Self::Approved),
            4 => Ok(Self::Rejected),
            5 => Ok(Self::PermanentlyRejected),
            other => Err(MappingError::invalid(
                "request state",
                format!("unknown value {other}"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRoleRequestDetails {
    pub account_role_to_set: u64,
    /// Carries `blob_id` of the submitted KYC form
    #[serde(default)]
    pub creator_details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewableRequestResource {
    pub id: String,
    pub state_i: i32,
    #[serde(default)]
    pub reject_reason: Option<String>,
    pub requestor: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub request_details: Option<ChangeRoleRequestDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobResource {
    pub id: String,
    #[serde(rename = "type")]
    pub blob_type: String,
    /// Raw JSON string
    pub value: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// SYSTEM
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfoResource {
    pub network_passphrase: String,
    pub precision: u32,
    #[serde(default)]
    pub current_time: Option<DateTime<Utc>>,
}

/// Key derivation parameters stored by a key server for a login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginParams {
    pub kdf_salt: String,
    pub kdf_n: u64,
}
