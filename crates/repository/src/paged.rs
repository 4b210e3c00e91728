use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use tokend_telemetry::{ErrorContext, FetchSpan};
use tokend_types::DataPage;
use tokio::sync::{broadcast, watch};
use tracing::{debug, Instrument};

use crate::{
    in_flight::{lock, read, write, InFlight},
    ItemsCache, RepositoryError, RepositoryStreams,
};

/// Source of cursor-paginated items
#[async_trait]
pub trait PageLoader: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    /// Load the page starting at `cursor`; `None` means the first page
    async fn load_page(
        &self,
        cursor: Option<String>,
    ) -> Result<DataPage<Self::Item>, RepositoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    FirstPage,
    NextPage,
}

#[derive(Debug, Default)]
struct PagingState {
    next_cursor: Option<String>,
    no_more_items: bool,
}

/// Repository of a paginated list.
///
/// `update` reloads from the first page and replaces the cache; `load_more`
/// appends the following page.
pub struct PagedDataRepository<L: PageLoader> {
    inner: Arc<Inner<L>>,
}

struct Inner<L: PageLoader> {
    loader: L,
    cache: RwLock<ItemsCache<L::Item>>,
    paging: Mutex<PagingState>,
    streams: RepositoryStreams<Vec<L::Item>>,
    in_flight: InFlight<FetchKind>,
}

impl<L: PageLoader> Clone for PagedDataRepository<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: PageLoader> PagedDataRepository<L> {
    pub fn new(loader: L) -> Self {
        Self::with_cache(loader, ItemsCache::new())
    }

    pub fn with_cache(loader: L, cache: ItemsCache<L::Item>) -> Self {
        let streams = RepositoryStreams::new(cache.items().to_vec());
        Self {
            inner: Arc::new(Inner {
                loader,
                cache: RwLock::new(cache),
                paging: Mutex::new(PagingState::default()),
                streams,
                in_flight: InFlight::new(),
            }),
        }
    }

    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

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

    /// True once the last loaded page said there is nothing after it
    pub fn no_more_items(&self) -> bool {
        lock(&self.inner.paging).no_more_items
    }

    pub fn invalidate(&self) {
        write(&self.inner.cache).invalidate();
    }

    /// Reload from the first page.
    ///
    /// A running `load_more` is awaited first so its page cannot land on top
    /// of the reloaded list.
    pub async fn update(&self, force: bool) -> Result<(), RepositoryError> {
        if !force && self.is_fresh() {
            return Ok(());
        }

        loop {
            let (kind, fetch) = self.start(FetchKind::FirstPage);
            let result = fetch.await;
            if kind == FetchKind::FirstPage {
                return result;
            }
        }
    }

    pub async fn update_if_not_fresh(&self) -> Result<(), RepositoryError> {
        self.update(false).await
    }

    /// Load the page after the last one loaded.
    ///
    /// Returns `Ok(false)` without fetching when everything is loaded. Before
    /// the first update this loads the first page.
    pub async fn load_more(&self) -> Result<bool, RepositoryError> {
        if self.is_never_updated() {
            self.update(true).await?;
            return Ok(true);
        }
        if self.no_more_items() {
            return Ok(false);
        }

        let (_, fetch) = self.start(FetchKind::NextPage);
        fetch.await?;
        Ok(true)
    }

    /// Edit the cache in place and publish the result under the cache lock
    pub fn transform_cache<R>(&self, f: impl FnOnce(&mut ItemsCache<L::Item>) -> R) -> R {
        let mut cache = write(&self.inner.cache);
        let result = f(&mut cache);
        self.inner.streams.publish(cache.items().to_vec());
        result
    }

    fn start(&self, kind: FetchKind) -> (FetchKind, crate::in_flight::SharedFetch) {
        self.inner.in_flight.join_or_start(kind, |id| {
            let inner = Arc::clone(&self.inner);
            async move { inner.fetch(kind, id).await }.boxed()
        })
    }
}

impl<L: PageLoader> Inner<L> {
    async fn fetch(self: Arc<Self>, kind: FetchKind, id: u64) -> Result<(), RepositoryError> {
        let operation = match kind {
            FetchKind::FirstPage => "update",
            FetchKind::NextPage => "load_more",
        };
        let span = FetchSpan::new(self.loader.name(), operation);
        self.streams.set_loading(true);

        let outcome = self
            .load(kind)
            .instrument(span.span())
            .await
            .with_repository(self.loader.name());
        if let Err(e) = &outcome {
            self.streams.publish_error(e.clone());
        }

        self.streams.set_loading(false);
        self.in_flight.finish(id);
        outcome
    }

    async fn load(&self, kind: FetchKind) -> Result<(), RepositoryError> {
        let cursor = match kind {
            FetchKind::FirstPage => None,
            FetchKind::NextPage => {
                let paging = lock(&self.paging);
                if paging.no_more_items {
                    return Ok(());
                }
                paging.next_cursor.clone()
            }
        };

        let page = self.loader.load_page(cursor).await?;
        let no_more_items = page.is_last || page.next_cursor.is_none();
        debug!(
            count = page.items.len(),
            no_more_items,
            "page loaded"
        );

        {
            let mut paging = lock(&self.paging);
            paging.next_cursor = page.next_cursor;
            paging.no_more_items = no_more_items;
        }
        let mut cache = write(&self.cache);
        match kind {
            FetchKind::FirstPage => cache.replace(page.items),
            FetchKind::NextPage => cache.append(page.items),
        }
        self.streams.publish(cache.items().to_vec());
        Ok(())
    }
}
