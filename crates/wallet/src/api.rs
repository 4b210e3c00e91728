//! Remote collaborators, expressed as traits so the data layer never depends
//! on a concrete HTTP client.

use std::sync::Arc;

use async_trait::async_trait;
use tokend_types::{
    AssetPairResource, AssetResource, BalanceResource, BlobResource, CompanyResource,
    ConvertedBalancesCollection, DataPage, LoginParams, PagingParams, ReviewableRequestResource,
    SaleResource, SwapResource, SystemInfoResource,
};

use crate::ApiError;

// ═══════════════════════════════════════════════════════════════════════════
// QUERY PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetsPageParams {
    /// Only assets owned by this account
    pub owner: Option<String>,
    pub paging: PagingParams,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesPageParams {
    /// Only open sales when set
    pub open_only: bool,
    pub base_asset: Option<String>,
    pub paging: PagingParams,
}

/// Swap legs filtered by party. Assets are always included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapsPageParams {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub paging: PagingParams,
}

/// Change-role requests of one requestor, with request details included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRoleRequestsParams {
    pub requestor: String,
    pub paging: PagingParams,
}

// ═══════════════════════════════════════════════════════════════════════════
// TRAITS
// ═══════════════════════════════════════════════════════════════════════════

/// Resource endpoints of one TokenD system
#[async_trait]
pub trait TokenDApi: Send + Sync {
    async fn get_assets(&self, params: &AssetsPageParams)
        -> Result<DataPage<AssetResource>, ApiError>;

    async fn get_asset(&self, code: &str) -> Result<AssetResource, ApiError>;

    async fn get_balances(&self, account_id: &str) -> Result<Vec<BalanceResource>, ApiError>;

    async fn get_converted_balances(
        &self,
        account_id: &str,
        asset_code: &str,
    ) -> Result<ConvertedBalancesCollection, ApiError>;

    async fn get_asset_pairs(
        &self,
        paging: &PagingParams,
    ) -> Result<DataPage<AssetPairResource>, ApiError>;

    async fn get_asset_pair(&self, base: &str, quote: &str)
        -> Result<AssetPairResource, ApiError>;

    async fn get_sales(
        &self,
        account_id: &str,
        params: &SalesPageParams,
    ) -> Result<DataPage<SaleResource>, ApiError>;

    async fn get_sale(&self, account_id: &str, id: u64) -> Result<SaleResource, ApiError>;

    async fn get_swaps(&self, params: &SwapsPageParams)
        -> Result<DataPage<SwapResource>, ApiError>;

    async fn get_change_role_requests(
        &self,
        params: &ChangeRoleRequestsParams,
    ) -> Result<DataPage<ReviewableRequestResource>, ApiError>;

    async fn get_blob(&self, id: &str) -> Result<BlobResource, ApiError>;

    /// Companies the account is a client of
    async fn get_companies(&self, account_id: &str) -> Result<Vec<CompanyResource>, ApiError>;

    async fn get_system_info(&self) -> Result<SystemInfoResource, ApiError>;
}

/// Key server of one TokenD system
#[async_trait]
pub trait KeyServer: Send + Sync {
    async fn get_login_params(&self, email: &str) -> Result<LoginParams, ApiError>;
}

/// API instances per backing system; index 0 is the default system
pub trait ApiProvider: Send + Sync {
    fn systems_count(&self) -> usize;

    fn api_at(&self, index: usize) -> Option<Arc<dyn TokenDApi>>;

    /// `None` until there is an account to sign requests with
    fn signed_api_at(&self, index: usize) -> Option<Arc<dyn TokenDApi>>;

    fn key_server_at(&self, index: usize) -> Option<Arc<dyn KeyServer>>;

    fn api(&self) -> Option<Arc<dyn TokenDApi>> {
        self.api_at(0)
    }

    fn signed_api(&self) -> Option<Arc<dyn TokenDApi>> {
        self.signed_api_at(0)
    }
}
