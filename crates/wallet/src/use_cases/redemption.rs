use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    AccountProvider, BalancesRepository, Operation, PaymentFeeData, PaymentOp,
    SystemInfoRepository, Transaction, TxManager, UseCaseError, WalletInfoProvider,
};

/// Signed request to redeem an asset back to its issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub sender_account_id: String,
    pub sender_balance_id: String,
    pub asset_code: String,
    pub amount: Decimal,
    pub transaction: Transaction,
    /// Base64 envelope to hand over to the issuer
    pub envelope: String,
}

/// Builds a payment of `amount` to the owner of `asset_code`, signed by the
/// current account.
///
/// The sender balance is taken from the balances cache as is; update the
/// repository first when it may be stale.
pub struct CreateRedemptionRequestUseCase {
    amount: Decimal,
    asset_code: String,
    system_info: SystemInfoRepository,
    balances: BalancesRepository,
    wallet_info_provider: Arc<dyn WalletInfoProvider>,
    account_provider: Arc<dyn AccountProvider>,
}

impl CreateRedemptionRequestUseCase {
    pub fn new(
        amount: Decimal,
        asset_code: impl Into<String>,
        system_info: SystemInfoRepository,
        balances: BalancesRepository,
        wallet_info_provider: Arc<dyn WalletInfoProvider>,
        account_provider: Arc<dyn AccountProvider>,
    ) -> Self {
        Self {
            amount,
            asset_code: asset_code.into(),
            system_info,
            balances,
            wallet_info_provider,
            account_provider,
        }
    }

    pub async fn perform(&self) -> Result<RedemptionRequest, UseCaseError> {
        if self.amount <= Decimal::ZERO {
            return Err(UseCaseError::Amount(format!("{} is not positive", self.amount)));
        }

        let network_params = self.system_info.network_params().await?;
        let account = self
            .account_provider
            .account()
            .ok_or_else(|| UseCaseError::MissingPrecondition("no account found".into()))?;
        let sender_account_id = self
            .wallet_info_provider
            .account_id()
            .ok_or_else(|| UseCaseError::MissingPrecondition("no wallet info found".into()))?;
        let balance = self.balances.balance_for_asset(&self.asset_code).ok_or_else(|| {
            UseCaseError::MissingPrecondition(format!("no balance found for {}", self.asset_code))
        })?;

        let precised = network_params
            .amount_to_precised(self.amount)
            .map_err(|e| UseCaseError::Amount(e.to_string()))?;
        if precised == 0 {
            return Err(UseCaseError::Amount(format!(
                "{} is below the network precision",
                self.amount
            )));
        }

        let operation = Operation::Payment(PaymentOp {
            source_balance_id: balance.id.clone(),
            destination_account_id: balance.asset.owner_account_id.clone(),
            amount: precised,
            fee_data: PaymentFeeData::zero(),
            subject: String::new(),
            reference: String::new(),
        });
        let transaction = TxManager::create_signed_transaction(
            &network_params,
            &sender_account_id,
            account.as_ref(),
            operation,
        )?;
        let envelope = transaction.envelope()?;

        info!(asset = %self.asset_code, amount = %self.amount, "redemption request created");
        Ok(RedemptionRequest {
            sender_account_id,
            sender_balance_id: balance.id,
            asset_code: self.asset_code.clone(),
            amount: self.amount,
            transaction,
            envelope,
        })
    }
}
