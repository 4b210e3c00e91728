//! Secure key-value storage and the persistors built on it

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tokend_repository::ItemPersistence;
use tokend_types::KycState;
use tracing::warn;

/// Platform secure storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String);

    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Swap secrets generated on this device, keyed by secret hash
#[derive(Clone)]
pub struct SwapSecretsPersistor {
    store: Arc<dyn KeyValueStore>,
}

impl SwapSecretsPersistor {
    const KEY_PREFIX: &'static str = "swap_secret_";

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save_secret(&self, secret_hash: &str, secret: &[u8]) {
        self.store.set(&Self::key(secret_hash), hex::encode(secret));
    }

    pub fn load_secret(&self, secret_hash: &str) -> Option<Vec<u8>> {
        let stored = self.store.get(&Self::key(secret_hash))?;
        match hex::decode(&stored) {
            Ok(secret) => Some(secret),
            Err(e) => {
                warn!(secret_hash, error = %e, "stored swap secret is not valid hex");
                None
            }
        }
    }

    fn key(secret_hash: &str) -> String {
        format!("{}{}", Self::KEY_PREFIX, secret_hash.to_lowercase())
    }
}

/// Last submitted KYC state, kept so it can be shown before the network answers
#[derive(Clone)]
pub struct SubmittedKycStatePersistor {
    store: Arc<dyn KeyValueStore>,
}

impl SubmittedKycStatePersistor {
    const KEY: &'static str = "submitted_kyc_state";

    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl ItemPersistence<KycState> for SubmittedKycStatePersistor {
    fn load_item(&self) -> Option<KycState> {
        let stored = self.store.get(Self::KEY)?;
        match serde_json::from_str(&stored) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "dropping unreadable stored KYC state");
                self.store.remove(Self::KEY);
                None
            }
        }
    }

    /// Only submitted states are worth keeping
    fn save_item(&self, item: &KycState) {
        if !item.is_submitted() {
            return;
        }
        match serde_json::to_string(item) {
            Ok(serialized) => self.store.set(Self::KEY, serialized),
            Err(e) => warn!(error = %e, "failed to serialize KYC state"),
        }
    }

    fn clear(&self) {
        self.store.remove(Self::KEY);
    }
}
