//! Session-scoped holders for the signed-in wallet, its signing account and
//! the URL configuration of every backing system.

use std::sync::{Arc, PoisonError, RwLock};

use tokend_types::{UrlConfig, WalletInfo};

use crate::signing::Account;

pub trait WalletInfoProvider: Send + Sync {
    fn wallet_info(&self) -> Option<WalletInfo>;

    fn set_wallet_info(&self, wallet_info: Option<WalletInfo>);

    fn account_id(&self) -> Option<String> {
        self.wallet_info().map(|info| info.account_id)
    }
}

pub trait AccountProvider: Send + Sync {
    fn account(&self) -> Option<Arc<Account>>;

    fn set_account(&self, account: Option<Account>);
}

pub trait UrlConfigProvider: Send + Sync {
    fn configs_count(&self) -> usize;

    fn config_at(&self, index: usize) -> Option<UrlConfig>;

    fn config(&self) -> Option<UrlConfig> {
        self.config_at(0)
    }
}

/// Company the client app is currently scoped to, if any
pub trait CompanyInfoProvider: Send + Sync {
    fn company_id(&self) -> Option<String>;

    fn set_company_id(&self, company_id: Option<String>);
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY HOLDERS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct WalletInfoHolder {
    wallet_info: RwLock<Option<WalletInfo>>,
}

impl WalletInfoHolder {
    pub fn new(wallet_info: Option<WalletInfo>) -> Self {
        Self {
            wallet_info: RwLock::new(wallet_info),
        }
    }
}

impl WalletInfoProvider for WalletInfoHolder {
    fn wallet_info(&self) -> Option<WalletInfo> {
        self.wallet_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_wallet_info(&self, wallet_info: Option<WalletInfo>) {
        *self
            .wallet_info
            .write()
            .unwrap_or_else(PoisonError::into_inner) = wallet_info;
    }
}

#[derive(Default)]
pub struct AccountHolder {
    account: RwLock<Option<Arc<Account>>>,
}

impl AccountProvider for AccountHolder {
    fn account(&self) -> Option<Arc<Account>> {
        self.account
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_account(&self, account: Option<Account>) {
        *self.account.write().unwrap_or_else(PoisonError::into_inner) = account.map(Arc::new);
    }
}

#[derive(Debug, Clone, Default)]
pub struct UrlConfigHolder {
    configs: Vec<UrlConfig>,
}

impl UrlConfigHolder {
    /// One config per backing system, in system index order
    pub fn new(configs: Vec<UrlConfig>) -> Self {
        Self { configs }
    }
}

impl UrlConfigProvider for UrlConfigHolder {
    fn configs_count(&self) -> usize {
        self.configs.len()
    }

    fn config_at(&self, index: usize) -> Option<UrlConfig> {
        self.configs.get(index).cloned()
    }
}

#[derive(Debug, Default)]
pub struct CompanyInfoHolder {
    company_id: RwLock<Option<String>>,
}

impl CompanyInfoProvider for CompanyInfoHolder {
    fn company_id(&self) -> Option<String> {
        self.company_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_company_id(&self, company_id: Option<String>) {
        *self
            .company_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = company_id;
    }
}
