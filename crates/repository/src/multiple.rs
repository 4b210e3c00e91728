use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use tokend_telemetry::{ErrorContext, FetchSpan};
use tokio::sync::{broadcast, watch};
use tracing::{debug, Instrument};

use crate::{
    in_flight::{read, write, InFlight},
    ItemsCache, RepositoryError, RepositoryStreams,
};

/// Source of a complete item list
#[async_trait]
pub trait MultipleItemsLoader: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    /// Repository name used in logs and fetch spans
    fn name(&self) -> &'static str;

    async fn load_items(&self) -> Result<Vec<Self::Item>, RepositoryError>;
}

/// Repository of a list that is always fetched whole.
///
/// Clones share the same cache and in-flight fetch.
pub struct SimpleMultipleItemsRepository<L: MultipleItemsLoader> {
    inner: Arc<Inner<L>>,
}

struct Inner<L: MultipleItemsLoader> {
    loader: L,
    cache: RwLock<ItemsCache<L::Item>>,
    streams: RepositoryStreams<Vec<L::Item>>,
    in_flight: InFlight<()>,
}

impl<L: MultipleItemsLoader> Clone for SimpleMultipleItemsRepository<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: MultipleItemsLoader> SimpleMultipleItemsRepository<L> {
    pub fn new(loader: L) -> Self {
        Self::with_cache(loader, ItemsCache::new())
    }

    pub fn with_cache(loader: L, cache: ItemsCache<L::Item>) -> Self {
        let streams = RepositoryStreams::new(cache.items().to_vec());
        Self {
            inner: Arc::new(Inner {
                loader,
                cache: RwLock::new(cache),
                streams,
                in_flight: InFlight::new(),
            }),
        }
    }

    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

    /// Current cached items
    pub fn items(&self) -> Vec<L::Item> {
        read(&self.inner.cache).items().to_vec()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<L::Item>> {
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

    /// Mark the cache stale so the next `update_if_not_fresh` fetches
    pub fn invalidate(&self) {
        write(&self.inner.cache).invalidate();
    }

    /// Fetch the list, or join the fetch already running.
    ///
    /// Without `force` nothing happens while the cache is fresh.
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

    /// Edit the cache in place and publish the result.
    ///
    /// Publishing happens under the cache lock so subscribers see states in
    /// the order the cache went through them.
    pub fn transform_cache<R>(&self, f: impl FnOnce(&mut ItemsCache<L::Item>) -> R) -> R {
        let mut cache = write(&self.inner.cache);
        let result = f(&mut cache);
        self.inner.streams.publish(cache.items().to_vec());
        result
    }
}

impl<L: MultipleItemsLoader> Inner<L> {
    async fn fetch(self: Arc<Self>, id: u64) -> Result<(), RepositoryError> {
        let span = FetchSpan::new(self.loader.name(), "update");
        self.streams.set_loading(true);

        let result = self
            .loader
            .load_items()
            .instrument(span.span())
            .await
            .with_repository(self.loader.name());
        let outcome = match result {
            Ok(items) => {
                debug!(repository = self.loader.name(), count = items.len(), "items updated");
                let mut cache = write(&self.cache);
                cache.replace(items.clone());
                self.streams.publish(items);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingLoader {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingLoader {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    fail: false,
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl MultipleItemsLoader for CountingLoader {
        type Item = u32;

        fn name(&self) -> &'static str {
            "counting"
        }

        async fn load_items(&self) -> Result<Vec<u32>, RepositoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u32;
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(RepositoryError::Network("offline".into()));
            }
            Ok(vec![call, call + 1])
        }
    }

    #[tokio::test]
    async fn test_concurrent_updates_share_one_fetch() {
        let (loader, calls) = CountingLoader::new();
        let repo = SimpleMultipleItemsRepository::new(loader);

        let (a, b) = tokio::join!(repo.update(true), repo.update(true));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.items(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_update_if_not_fresh_skips_fresh_cache() {
        let (loader, calls) = CountingLoader::new();
        let repo = SimpleMultipleItemsRepository::new(loader);

        repo.update_if_not_fresh().await.unwrap();
        repo.update_if_not_fresh().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        repo.update(true).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(repo.items(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_invalidate_forces_next_fetch() {
        let (loader, calls) = CountingLoader::new();
        let repo = SimpleMultipleItemsRepository::new(loader);

        repo.update_if_not_fresh().await.unwrap();
        repo.invalidate();
        assert!(!repo.is_fresh());

        repo.update_if_not_fresh().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_cache_and_emits_error() {
        let (mut loader, _) = CountingLoader::new();
        loader.fail = true;
        let repo = SimpleMultipleItemsRepository::with_cache(loader, {
            let mut cache = ItemsCache::new();
            cache.append(vec![7]);
            cache
        });
        let mut errors = repo.subscribe_errors();

        let result = repo.update(true).await;
        assert_eq!(result, Err(RepositoryError::Network("offline".into())));
        assert_eq!(
            errors.recv().await.unwrap(),
            RepositoryError::Network("offline".into())
        );
        assert_eq!(repo.items(), vec![7]);
        assert!(repo.is_never_updated());
        assert!(!repo.is_loading());
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let (loader, _) = CountingLoader::new();
        let repo = SimpleMultipleItemsRepository::new(loader);
        let mut rx = repo.subscribe();
        assert!(rx.borrow().is_empty());

        repo.update(true).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), vec![0, 1]);

        repo.transform_cache(|cache| cache.remove_where(|i| *i == 0));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), vec![1]);
    }

    #[test]
    fn test_last_published_matches_cache_under_concurrent_edits() {
        let (loader, _) = CountingLoader::new();
        let repo = SimpleMultipleItemsRepository::new(loader);
        let rx = repo.subscribe();

        std::thread::scope(|scope| {
            for thread in 0..8u32 {
                let repo = &repo;
                scope.spawn(move || {
                    for i in 0..200u32 {
                        repo.transform_cache(|cache| {
                            cache.remove_where(|item| item % 8 == thread);
                            cache.append([thread + i * 8]);
                        });
                    }
                });
            }
        });

        let mut published = rx.borrow().clone();
        let mut cached = repo.items();
        published.sort_unstable();
        cached.sort_unstable();
        assert_eq!(published, cached);
        assert_eq!(cached.len(), 8);
    }
}
