use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{MappingError, SystemInfoResource};

/// Largest precision whose scale factor fits in a `u64`
pub const MAX_PRECISION: u32 = 19;

/// Network parameters required to build transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub passphrase: String,
    /// Number of decimal places in on-chain amounts
    pub precision: u32,
}

impl NetworkParams {
    pub fn new(passphrase: impl Into<String>, precision: u32) -> Self {
        Self {
            passphrase: passphrase.into(),
            precision,
        }
    }

    pub fn from_resource(resource: &SystemInfoResource) -> Result<Self, MappingError> {
        if resource.network_passphrase.is_empty() {
            return Err(MappingError::missing("network_passphrase"));
        }
        if resource.precision > MAX_PRECISION {
            return Err(MappingError::invalid(
                "precision",
                format!("{} exceeds {MAX_PRECISION}", resource.precision),
            ));
        }
        Ok(Self::new(resource.network_passphrase.clone(), resource.precision))
    }

    fn scale(&self) -> Result<Decimal, MappingError> {
        10u64
            .checked_pow(self.precision)
            .map(Decimal::from)
            .ok_or_else(|| MappingError::invalid("precision", "scale factor overflows u64"))
    }

    /// Convert a human amount to the integer on-chain representation,
    /// truncating digits beyond the precision
    pub fn amount_to_precised(&self, amount: Decimal) -> Result<u64, MappingError> {
        if amount.is_sign_negative() {
            return Err(MappingError::invalid("amount", "negative amount"));
        }

        let scale = self.scale()?;
        amount
            .checked_mul(scale)
            .map(|scaled| scaled.trunc())
            .and_then(|scaled| scaled.to_u64())
            .ok_or_else(|| MappingError::invalid("amount", "amount out of range"))
    }

    pub fn amount_from_precised(&self, amount: u64) -> Result<Decimal, MappingError> {
        Ok(Decimal::from(amount) / self.scale()?)
    }
}

/// Identity of the signed-in wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub account_id: String,
    pub email: String,
    pub wallet_id: String,
    /// Hex-encoded ed25519 seed
    pub secret_seed: String,
}
