use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use tokend_telemetry::{ErrorContext, FetchSpan};
use tokio::sync::{broadcast, watch};
use tracing::{debug, Instrument};

use crate::{
    in_flight::{read, write, InFlight},
    RepositoryError, RepositoryStreams, SingleItemCache,
};

#[async_trait]
pub trait SingleItemLoader: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    async fn load_item(&self) -> Result<Self::Item, RepositoryError>;
}

/// Local storage for a single repository item.
///
/// A stored item is shown before the first network fetch completes.
pub trait ItemPersistence<T>: Send + Sync {
    fn load_item(&self) -> Option<T>;

    fn save_item(&self, item: &T);

    fn clear(&self) {}
}

pub struct SimpleSingleItemRepository<L: SingleItemLoader> {
    inner: Arc<Inner<L>>,
}

struct Inner<L: SingleItemLoader> {
    loader: L,
    cache: RwLock<SingleItemCache<L::Item>>,
    persistence: Option<Arc<dyn ItemPersistence<L::Item>>>,
    streams: RepositoryStreams<Option<L::Item>>,
    in_flight: InFlight<()>,
}

impl<L: SingleItemLoader> Clone for SimpleSingleItemRepository<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: SingleItemLoader> SimpleSingleItemRepository<L> {
    pub fn new(loader: L) -> Self {
        Self::build(loader, SingleItemCache::new(), None)
    }

    pub fn with_persistence(loader: L, persistence: Arc<dyn ItemPersistence<L::Item>>) -> Self {
        Self::build(loader, SingleItemCache::new(), Some(persistence))
    }

    pub fn build(
        loader: L,
        cache: SingleItemCache<L::Item>,
        persistence: Option<Arc<dyn ItemPersistence<L::Item>>>,
    ) -> Self {
        let streams = RepositoryStreams::new(cache.item().cloned());
        Self {
            inner: Arc::new(Inner {
                loader,
                cache: RwLock::new(cache),
                persistence,
                streams,
                in_flight: InFlight::new(),
            }),
        }
    }

    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

    pub fn item(&self) -> Option<L::Item> {
        read(&self.inner.cache).item().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<L::Item>> {
        self.inner.streams.subscribe_items()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.streams.subscribe_loading()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<RepositoryError> {
        self.inner.streams.subscribe_errors()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.streams.is_loading()
    }

    pub fn is_fresh(&self) -> bool {
        read(&self.inner.cache).is_fresh()
    }

    pub fn is_never_updated(&self) -> bool {
        read(&self.inner.cache).is_never_updated()
    }

    pub fn invalidate(&self) {
        write(&self.inner.cache).invalidate();
    }

    pub async fn update(&self, force: bool) -> Result<(), RepositoryError> {
        if !force && self.is_fresh() {
            return Ok(());
        }

        let (_, fetch) = self.inner.in_flight.join_or_start((), |id| {
            let inner = Arc::clone(&self.inner);
            async move { inner.fetch(id).await }.boxed()
        });
        fetch.await
    }

    pub async fn update_if_not_fresh(&self) -> Result<(), RepositoryError> {
        self.update(false).await
    }

    /// Replace the item locally, e.g. right after submitting it to the server
    pub fn set(&self, item: L::Item) {
        self.inner.accept(item);
    }

    /// Drop the item from memory and from persistence
    pub fn clear(&self) {
        let mut cache = write(&self.inner.cache);
        cache.clear();
        if let Some(persistence) = &self.inner.persistence {
            persistence.clear();
        }
        self.inner.streams.publish(None);
    }
}

impl<L: SingleItemLoader> Inner<L> {
    async fn fetch(self: Arc<Self>, id: u64) -> Result<(), RepositoryError> {
        let span = FetchSpan::new(self.loader.name(), "update");
        self.restore_persisted();
        self.streams.set_loading(true);

        let result = self
            .loader
            .load_item()
            .instrument(span.span())
            .await
            .with_repository(self.loader.name());
        let outcome = match result {
            Ok(item) => {
                debug!(repository = self.loader.name(), "item updated");
                self.accept(item);
                Ok(())
            }
            Err(e) => {
                self.streams.publish_error(e.clone());
                Err(e)
            }
        };

        self.streams.set_loading(false);
        self.in_flight.finish(id);
        outcome
    }

    fn restore_persisted(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let mut cache = write(&self.cache);
        if !cache.is_never_updated() || cache.item().is_some() {
            return;
        }
        let Some(stored) = persistence.load_item() else {
            return;
        };
        cache.restore(stored.clone());
        debug!(repository = self.loader.name(), "restored persisted item");
        self.streams.publish(Some(stored));
    }

    fn accept(&self, item: L::Item) {
        let mut cache = write(&self.cache);
        cache.set(item.clone());
        if let Some(persistence) = &self.persistence {
            persistence.save_item(&item);
        }
        self.streams.publish(Some(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct NameLoader {
        result: Result<String, RepositoryError>,
    }

    #[async_trait]
    impl SingleItemLoader for NameLoader {
        type Item = String;

        fn name(&self) -> &'static str {
            "name"
        }

        async fn load_item(&self) -> Result<String, RepositoryError> {
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct MemoryPersistence {
        stored: Mutex<Option<String>>,
    }

    impl ItemPersistence<String> for MemoryPersistence {
        fn load_item(&self) -> Option<String> {
            self.stored.lock().unwrap().clone()
        }

        fn save_item(&self, item: &String) {
            *self.stored.lock().unwrap() = Some(item.clone());
        }

        fn clear(&self) {
            *self.stored.lock().unwrap() = None;
        }
    }

    #[tokio::test]
    async fn test_update_sets_item() {
        let repo = SimpleSingleItemRepository::new(NameLoader {
            result: Ok("alice".into()),
        });

        assert_eq!(repo.item(), None);
        repo.update(false).await.unwrap();
        assert_eq!(repo.item(), Some("alice".to_string()));
        assert!(repo.is_fresh());
    }

    #[tokio::test]
    async fn test_persisted_item_survives_failed_fetch() {
        let persistence = Arc::new(MemoryPersistence::default());
        persistence.save_item(&"stored".to_string());

        let repo = SimpleSingleItemRepository::with_persistence(
            NameLoader {
                result: Err(RepositoryError::Network("offline".into())),
            },
            persistence,
        );
        let rx = repo.subscribe();

        assert!(repo.update(false).await.is_err());
        assert_eq!(repo.item(), Some("stored".to_string()));
        assert_eq!(*rx.borrow(), Some("stored".to_string()));
        assert!(!repo.is_fresh());
    }

    #[tokio::test]
    async fn test_fetched_item_is_saved() {
        let persistence = Arc::new(MemoryPersistence::default());
        let repo = SimpleSingleItemRepository::with_persistence(
            NameLoader {
                result: Ok("remote".into()),
            },
            persistence.clone(),
        );

        repo.update(true).await.unwrap();
        assert_eq!(persistence.load_item(), Some("remote".to_string()));

        repo.clear();
        assert_eq!(persistence.load_item(), None);
        assert_eq!(repo.item(), None);
    }

    #[tokio::test]
    async fn test_set_publishes_without_fetch() {
        let repo = SimpleSingleItemRepository::new(NameLoader {
            result: Err(RepositoryError::Network("unused".into())),
        });
        let rx = repo.subscribe();

        repo.set("local".into());
        assert_eq!(*rx.borrow(), Some("local".to_string()));
        assert!(repo.update_if_not_fresh().await.is_ok());
    }
}
