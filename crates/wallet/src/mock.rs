//! In-memory API, key server and provider for tests and demos.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use tokend_types::{
    AssetAttributes, AssetPairResource, AssetResource, BalanceAmounts, BalanceRefResource,
    BalanceResource, BlobResource, ChangeRoleRequestDetails, CompanyResource,
    ConvertedBalanceStateResource, ConvertedBalancesCollection, DataPage, LoginParams,
    PagingOrder, PagingParams, RemoteSwapState, ResourceKey, ReviewableRequestResource,
    SaleResource, SwapResource, SystemInfoResource, WalletInfo,
};
use tokio::sync::RwLock;

use crate::{
    ApiError, ApiProvider, AssetsPageParams, ChangeRoleRequestsParams, KeyServer, KeyStorage,
    SalesPageParams, SwapsPageParams, TokenDApi,
};

#[derive(Default)]
struct MockData {
    assets: Vec<AssetResource>,
    balances: Vec<BalanceResource>,
    converted_balances: Option<ConvertedBalancesCollection>,
    asset_pairs: Vec<AssetPairResource>,
    sales: Vec<SaleResource>,
    swaps: Vec<SwapResource>,
    requests: Vec<ReviewableRequestResource>,
    blobs: HashMap<String, BlobResource>,
    companies: Vec<CompanyResource>,
    system_info: Option<SystemInfoResource>,
}

/// TokenD API over in-memory resources.
///
/// Pages use the item offset as cursor. Every endpoint counts its calls and
/// can be switched to fail with a transport error.
#[derive(Default)]
pub struct MockApi {
    data: RwLock<MockData>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    delay: Option<Duration>,
}

impl MockApi {
    pub const GET_ASSETS: &'static str = "get_assets";
    pub const GET_ASSET: &'static str = "get_asset";
    pub const GET_BALANCES: &'static str = "get_balances";
    pub const GET_CONVERTED_BALANCES: &'static str = "get_converted_balances";
    pub const GET_ASSET_PAIRS: &'static str = "get_asset_pairs";
    pub const GET_ASSET_PAIR: &'static str = "get_asset_pair";
    pub const GET_SALES: &'static str = "get_sales";
    pub const GET_SALE: &'static str = "get_sale";
    pub const GET_SWAPS: &'static str = "get_swaps";
    pub const GET_CHANGE_ROLE_REQUESTS: &'static str = "get_change_role_requests";
    pub const GET_BLOB: &'static str = "get_blob";
    pub const GET_COMPANIES: &'static str = "get_companies";
    pub const GET_SYSTEM_INFO: &'static str = "get_system_info";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(mut self, assets: Vec<AssetResource>) -> Self {
        self.data.get_mut().assets = assets;
        self
    }

    pub fn with_balances(mut self, balances: Vec<BalanceResource>) -> Self {
        self.data.get_mut().balances = balances;
        self
    }

    pub fn with_converted_balances(mut self, collection: ConvertedBalancesCollection) -> Self {
        self.data.get_mut().converted_balances = Some(collection);
        self
    }

    pub fn with_asset_pairs(mut self, pairs: Vec<AssetPairResource>) -> Self {
        self.data.get_mut().asset_pairs = pairs;
        self
    }

    pub fn with_sales(mut self, sales: Vec<SaleResource>) -> Self {
        self.data.get_mut().sales = sales;
        self
    }

    pub fn with_swaps(mut self, swaps: Vec<SwapResource>) -> Self {
        self.data.get_mut().swaps = swaps;
        self
    }

    pub fn with_requests(mut self, requests: Vec<ReviewableRequestResource>) -> Self {
        self.data.get_mut().requests = requests;
        self
    }

    pub fn with_blob(mut self, blob: BlobResource) -> Self {
        self.data.get_mut().blobs.insert(blob.id.clone(), blob);
        self
    }

    pub fn with_companies(mut self, companies: Vec<CompanyResource>) -> Self {
        self.data.get_mut().companies = companies;
        self
    }

    pub fn with_system_info(mut self, info: SystemInfoResource) -> Self {
        self.data.get_mut().system_info = Some(info);
        self
    }

    /// Delay every response, to observe requests in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn set_swaps(&self, swaps: Vec<SwapResource>) {
        self.data.write().await.swaps = swaps;
    }

    pub async fn push_swap(&self, swap: SwapResource) {
        self.data.write().await.swaps.push(swap);
    }

    pub async fn set_balances(&self, balances: Vec<BalanceResource>) {
        self.data.write().await.balances = balances;
    }

    pub async fn set_assets(&self, assets: Vec<AssetResource>) {
        self.data.write().await.assets = assets;
    }

    pub fn calls(&self, endpoint: &'static str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn set_failing(&self, endpoint: &'static str, failing: bool) {
        let mut set = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing {
            set.insert(endpoint);
        } else {
            set.remove(endpoint);
        }
    }

    async fn enter(&self, endpoint: &'static str) -> Result<(), ApiError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(endpoint)
            .or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(endpoint);
        if failing {
            return Err(ApiError::Transport(format!("{endpoint} unavailable")));
        }
        Ok(())
    }
}

/// Offset-cursor page of `items`
fn page_of<T: Clone>(mut items: Vec<T>, paging: &PagingParams) -> DataPage<T> {
    if paging.order == PagingOrder::Desc {
        items.reverse();
    }
    let offset = paging
        .cursor
        .as_deref()
        .and_then(|cursor| cursor.parse::<usize>().ok())
        .unwrap_or(0)
        .min(items.len());
    let end = (offset + paging.limit.max(1) as usize).min(items.len());

    DataPage::new(Some(end.to_string()), items[offset..end].to_vec(), end >= items.len())
}

#[async_trait]
impl TokenDApi for MockApi {
    async fn get_assets(
        &self,
        params: &AssetsPageParams,
    ) -> Result<DataPage<AssetResource>, ApiError> {
        self.enter(Self::GET_ASSETS).await?;
        let data = self.data.read().await;
        let assets = data
            .assets
            .iter()
            .filter(|asset| match &params.owner {
                Some(owner) => asset.attributes.as_ref().is_some_and(|a| &a.owner == owner),
                None => true,
            })
            .cloned()
            .collect();
        Ok(page_of(assets, &params.paging))
    }

    async fn get_asset(&self, code: &str) -> Result<AssetResource, ApiError> {
        self.enter(Self::GET_ASSET).await?;
        self.data
            .read()
            .await
            .assets
            .iter()
            .find(|asset| asset.code() == code)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("asset {code}")))
    }

    async fn get_balances(&self, _account_id: &str) -> Result<Vec<BalanceResource>, ApiError> {
        self.enter(Self::GET_BALANCES).await?;
        Ok(self.data.read().await.balances.clone())
    }

    async fn get_converted_balances(
        &self,
        _account_id: &str,
        asset_code: &str,
    ) -> Result<ConvertedBalancesCollection, ApiError> {
        self.enter(Self::GET_CONVERTED_BALANCES).await?;
        self.data
            .read()
            .await
            .converted_balances
            .clone()
            .filter(|collection| collection.asset.code() == asset_code)
            .ok_or_else(|| ApiError::NotFound(format!("balances converted to {asset_code}")))
    }

    async fn get_asset_pairs(
        &self,
        paging: &PagingParams,
    ) -> Result<DataPage<AssetPairResource>, ApiError> {
        self.enter(Self::GET_ASSET_PAIRS).await?;
        Ok(page_of(self.data.read().await.asset_pairs.clone(), paging))
    }

    async fn get_asset_pair(
        &self,
        base: &str,
        quote: &str,
    ) -> Result<AssetPairResource, ApiError> {
        self.enter(Self::GET_ASSET_PAIR).await?;
        self.data
            .read()
            .await
            .asset_pairs
            .iter()
            .find(|pair| pair.base_asset.code() == base && pair.quote_asset.code() == quote)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("asset pair {base}:{quote}")))
    }

    async fn get_sales(
        &self,
        _account_id: &str,
        params: &SalesPageParams,
    ) -> Result<DataPage<SaleResource>, ApiError> {
        self.enter(Self::GET_SALES).await?;
        let data = self.data.read().await;
        let sales = data
            .sales
            .iter()
            .filter(|sale| !params.open_only || sale.sale_state == 1)
            .filter(|sale| match &params.base_asset {
                Some(code) => sale.base_asset.code() == code,
                None => true,
            })
            .cloned()
            .collect();
        Ok(page_of(sales, &params.paging))
    }

    async fn get_sale(&self, _account_id: &str, id: u64) -> Result<SaleResource, ApiError> {
        self.enter(Self::GET_SALE).await?;
        let id = id.to_string();
        self.data
            .read()
            .await
            .sales
            .iter()
            .find(|sale| sale.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("sale {id}")))
    }

    async fn get_swaps(
        &self,
        params: &SwapsPageParams,
    ) -> Result<DataPage<SwapResource>, ApiError> {
        self.enter(Self::GET_SWAPS).await?;
        let data = self.data.read().await;
        let swaps = data
            .swaps
            .iter()
            .filter(|swap| params.source.as_ref().map_or(true, |s| &swap.source.id == s))
            .filter(|swap| {
                params
                    .destination
                    .as_ref()
                    .map_or(true, |d| &swap.destination.id == d)
            })
            .cloned()
            .collect();
        Ok(page_of(swaps, &params.paging))
    }

    async fn get_change_role_requests(
        &self,
        params: &ChangeRoleRequestsParams,
    ) -> Result<DataPage<ReviewableRequestResource>, ApiError> {
        self.enter(Self::GET_CHANGE_ROLE_REQUESTS).await?;
        let data = self.data.read().await;
        let requests = data
            .requests
            .iter()
            .filter(|request| request.requestor == params.requestor)
            .cloned()
            .collect();
        Ok(page_of(requests, &params.paging))
    }

    async fn get_blob(&self, id: &str) -> Result<BlobResource, ApiError> {
        self.enter(Self::GET_BLOB).await?;
        self.data
            .read()
            .await
            .blobs
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("blob {id}")))
    }

    async fn get_companies(&self, _account_id: &str) -> Result<Vec<CompanyResource>, ApiError> {
        self.enter(Self::GET_COMPANIES).await?;
        Ok(self.data.read().await.companies.clone())
    }

    async fn get_system_info(&self) -> Result<SystemInfoResource, ApiError> {
        self.enter(Self::GET_SYSTEM_INFO).await?;
        self.data
            .read()
            .await
            .system_info
            .clone()
            .ok_or_else(|| ApiError::NotFound("system info".to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// KEY SERVER & PROVIDER
// ═══════════════════════════════════════════════════════════════════════════

/// Key server knowing a fixed set of emails
#[derive(Default)]
pub struct MockKeyServer {
    emails: HashSet<String>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockKeyServer {
    pub const KDF_SALT: &'static str = "mock-salt";

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_login(mut self, email: &str) -> Self {
        self.emails.insert(email.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyServer for MockKeyServer {
    async fn get_login_params(&self, email: &str) -> Result<LoginParams, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("key server unavailable".to_string()));
        }
        if !self.emails.contains(email) {
            return Err(ApiError::NotFound(format!("login params of {email}")));
        }
        Ok(LoginParams {
            kdf_salt: Self::KDF_SALT.to_string(),
            kdf_n: 4096,
        })
    }
}

/// Key storage holding wallets by email and password
#[derive(Default)]
pub struct MockKeyStorage {
    wallets: HashMap<String, (String, WalletInfo)>,
}

impl MockKeyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wallet(mut self, password: &str, wallet_info: WalletInfo) -> Self {
        self.wallets
            .insert(wallet_info.email.clone(), (password.to_string(), wallet_info));
        self
    }
}

#[async_trait]
impl KeyStorage for MockKeyStorage {
    async fn get_wallet_info(&self, email: &str, password: &str) -> Result<WalletInfo, ApiError> {
        match self.wallets.get(email) {
            Some((stored, wallet_info)) if stored == password => Ok(wallet_info.clone()),
            _ => Err(ApiError::NotFound(format!("wallet of {email}"))),
        }
    }
}

struct MockSystem {
    api: Arc<MockApi>,
    key_server: Arc<MockKeyServer>,
}

/// Provider over one or more mock systems; index 0 is the default system
pub struct MockApiProvider {
    systems: Vec<MockSystem>,
    signed: AtomicBool,
}

impl MockApiProvider {
    pub fn single(api: Arc<MockApi>) -> Self {
        Self::systems(vec![(api, Arc::new(MockKeyServer::empty()))])
    }

    pub fn systems(systems: Vec<(Arc<MockApi>, Arc<MockKeyServer>)>) -> Self {
        Self {
            systems: systems
                .into_iter()
                .map(|(api, key_server)| MockSystem { api, key_server })
                .collect(),
            signed: AtomicBool::new(true),
        }
    }

    /// Without signing, `signed_api_at` yields nothing
    pub fn set_signed(&self, signed: bool) {
        self.signed.store(signed, Ordering::SeqCst);
    }
}

impl ApiProvider for MockApiProvider {
    fn systems_count(&self) -> usize {
        self.systems.len()
    }

    fn api_at(&self, index: usize) -> Option<Arc<dyn TokenDApi>> {
        self.systems
            .get(index)
            .map(|system| system.api.clone() as Arc<dyn TokenDApi>)
    }

    fn signed_api_at(&self, index: usize) -> Option<Arc<dyn TokenDApi>> {
        if !self.signed.load(Ordering::SeqCst) {
            return None;
        }
        self.api_at(index)
    }

    fn key_server_at(&self, index: usize) -> Option<Arc<dyn KeyServer>> {
        self.systems
            .get(index)
            .map(|system| system.key_server.clone() as Arc<dyn KeyServer>)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RESOURCE BUILDERS
// ═══════════════════════════════════════════════════════════════════════════

fn base_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_556_668_800, 0).single().unwrap_or_default()
}

/// Asset with included attributes, transferable and usable in swaps
pub fn asset_resource(code: &str, owner: &str) -> AssetResource {
    use tokend_types::asset_policy::*;

    AssetResource {
        id: code.to_string(),
        attributes: Some(AssetAttributes {
            owner: owner.to_string(),
            policies: TRANSFERABLE | CAN_BE_BASE_IN_ATOMIC_SWAP | CAN_BE_QUOTE_IN_ATOMIC_SWAP,
            trailing_digits: 6,
            max_issuance_amount: Decimal::from(1_000_000),
            available_for_issuance: Decimal::from(1_000),
            details: json!({"name": format!("{code} token")}),
        }),
    }
}

pub fn balance_resource(id: &str, asset_code: &str, owner: &str, available: Decimal) -> BalanceResource {
    BalanceResource {
        id: id.to_string(),
        asset: asset_resource(asset_code, owner),
        state: BalanceAmounts {
            available,
            locked: Decimal::ZERO,
        },
    }
}

/// Balances converted into `conversion_code`.
///
/// Each state is `(balance id, asset code, asset included, initial, converted)`.
pub fn converted_balances(
    conversion_code: &str,
    states: Vec<(&str, &str, bool, Decimal, Decimal)>,
) -> ConvertedBalancesCollection {
    ConvertedBalancesCollection {
        asset: asset_resource(conversion_code, "issuer"),
        states: states
            .into_iter()
            .map(|(id, code, filled, initial, converted)| ConvertedBalanceStateResource {
                balance: BalanceRefResource {
                    id: id.to_string(),
                    asset: if filled {
                        asset_resource(code, "issuer")
                    } else {
                        AssetResource::reference(code)
                    },
                },
                initial_amounts: BalanceAmounts {
                    available: initial,
                    locked: Decimal::ZERO,
                },
                converted_amounts: BalanceAmounts {
                    available: converted,
                    locked: Decimal::ZERO,
                },
                is_converted: true,
                price: (!initial.is_zero()).then(|| converted / initial),
            })
            .collect(),
    }
}

pub fn asset_pair_resource(base: &str, quote: &str, price: &str) -> AssetPairResource {
    AssetPairResource {
        base_asset: AssetResource::reference(base),
        quote_asset: AssetResource::reference(quote),
        price: price.parse().unwrap_or_default(),
        policies: Some(0),
    }
}

/// Sale of `base_code` for USD; `sale_state` 1 is open
pub fn sale_resource(id: u64, base_code: &str, sale_state: i32) -> SaleResource {
    SaleResource {
        id: id.to_string(),
        owner: "SALE_OWNER".to_string(),
        base_asset: asset_resource(base_code, "SALE_OWNER"),
        default_quote_asset: AssetResource::reference("USD"),
        quote_assets: Vec::new(),
        start_time: base_time(),
        end_time: base_time() + chrono::Duration::days(30),
        soft_cap: Decimal::from(1_000),
        hard_cap: Decimal::from(10_000),
        base_hard_cap: Decimal::from(100),
        sale_state,
        details: json!({"name": format!("Sale {id}")}),
    }
}

/// Swap leg of 1 BTC for 10 ETH, created `minute` minutes after a fixed epoch
pub fn swap_resource(
    id: &str,
    secret_hash: &str,
    state: RemoteSwapState,
    source: &str,
    destination: &str,
    minute: i64,
) -> SwapResource {
    let created_at = base_time() + chrono::Duration::minutes(minute);
    SwapResource {
        id: id.to_string(),
        secret_hash: secret_hash.to_string(),
        secret: None,
        state,
        created_at,
        lock_time: created_at + chrono::Duration::hours(24),
        amount: Decimal::ONE,
        source: ResourceKey::new(source),
        destination: ResourceKey::new(destination),
        source_balance: ResourceKey::new(format!("{source}_BTC")),
        destination_balance: ResourceKey::new(format!("{destination}_BTC")),
        asset: AssetResource::reference("BTC"),
        details: json!({"quote_asset": "ETH", "quote_amount": "10"}),
    }
}

/// Change-role request whose details point at `blob_id`
pub fn change_role_request(
    id: u64,
    requestor: &str,
    state_i: i32,
    blob_id: Option<&str>,
) -> ReviewableRequestResource {
    let creator_details = match blob_id {
        Some(blob_id) => json!({"blob_id": blob_id}),
        None => json!({}),
    };
    ReviewableRequestResource {
        id: id.to_string(),
        state_i,
        reject_reason: None,
        requestor: requestor.to_string(),
        created_at: base_time(),
        request_details: Some(ChangeRoleRequestDetails {
            account_role_to_set: 2,
            creator_details,
        }),
    }
}
