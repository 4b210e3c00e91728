use std::sync::Arc;

use async_trait::async_trait;
use tokend_types::WalletInfo;
use tracing::info;

use crate::{Account, AccountProvider, ApiError, SignInError, WalletInfoProvider};

/// Encrypted wallet storage on the key server
#[async_trait]
pub trait KeyStorage: Send + Sync {
    async fn get_wallet_info(&self, email: &str, password: &str) -> Result<WalletInfo, ApiError>;
}

/// Fills the session providers with a wallet and its signing account
pub struct SignInManager {
    key_storage: Arc<dyn KeyStorage>,
    wallet_info_provider: Arc<dyn WalletInfoProvider>,
    account_provider: Arc<dyn AccountProvider>,
}

impl SignInManager {
    pub fn new(
        key_storage: Arc<dyn KeyStorage>,
        wallet_info_provider: Arc<dyn WalletInfoProvider>,
        account_provider: Arc<dyn AccountProvider>,
    ) -> Self {
        Self {
            key_storage,
            wallet_info_provider,
            account_provider,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<WalletInfo, SignInError> {
        let wallet_info = self.key_storage.get_wallet_info(email, password).await?;

        // Key derivation is CPU-bound
        let seed = wallet_info.secret_seed.clone();
        let account = tokio::task::spawn_blocking(move || Account::from_secret_seed(&seed))
            .await
            .map_err(|e| SignInError::Task(e.to_string()))??;

        self.wallet_info_provider.set_wallet_info(Some(wallet_info.clone()));
        self.account_provider.set_account(Some(account));

        info!(account_id = %wallet_info.account_id, "signed in");
        Ok(wallet_info)
    }

    pub fn sign_out(&self) {
        self.wallet_info_provider.set_wallet_info(None);
        self.account_provider.set_account(None);
        info!("signed out");
    }

    pub fn is_signed_in(&self) -> bool {
        self.wallet_info_provider.wallet_info().is_some() && self.account_provider.account().is_some()
    }
}
