use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tokend_repository::RepositoryError;
use tokend_types::BlobResource;
use tracing::debug;

use super::RepositoryContext;

/// Blobs by id. Blobs are immutable, so a cached blob is never refetched.
#[derive(Clone)]
pub struct BlobsRepository {
    context: RepositoryContext,
    blobs: Arc<RwLock<HashMap<String, BlobResource>>>,
}

impl BlobsRepository {
    pub fn new(context: RepositoryContext) -> Self {
        Self {
            context,
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Cached blob, or fetch it. Private blobs need the signed API.
    pub async fn get_by_id(&self, id: &str, is_private: bool) -> Result<BlobResource, RepositoryError> {
        if let Some(blob) = self.cached(id) {
            return Ok(blob);
        }

        let api = if is_private {
            self.context.signed_api()?
        } else {
            self.context.api()?
        };
        let blob = api.get_blob(id).await?;
        debug!(blob_id = id, "blob loaded");

        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), blob.clone());
        Ok(blob)
    }

    pub fn cached(&self, id: &str) -> Option<BlobResource> {
        self.blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}
