use serde::{Deserialize, Serialize};

/// Endpoints of one backing TokenD system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlConfig {
    pub api: String,
    pub storage: String,
    pub client: String,
    pub key_server: String,
}

impl UrlConfig {
    /// Public URL of a stored object (logos, documents)
    pub fn storage_url(&self, key: &str) -> String {
        format!("{}/{}", self.storage.trim_end_matches('/'), key)
    }
}
