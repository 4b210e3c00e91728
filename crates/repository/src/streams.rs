use tokio::sync::{broadcast, watch};

use crate::RepositoryError;

const ERRORS_CHANNEL_CAPACITY: usize = 16;

/// Observable outputs of a repository.
///
/// Items and the loading flag are latest-value channels, so a late subscriber
/// sees the current value immediately. Errors are events: only subscribers
/// present when an error happens receive it.
#[derive(Debug)]
pub struct RepositoryStreams<T> {
    items: watch::Sender<T>,
    loading: watch::Sender<bool>,
    errors: broadcast::Sender<RepositoryError>,
}

impl<T: Clone + Send + Sync> RepositoryStreams<T> {
    pub fn new(initial: T) -> Self {
        let (items, _) = watch::channel(initial);
        let (loading, _) = watch::channel(false);
        let (errors, _) = broadcast::channel(ERRORS_CHANNEL_CAPACITY);
        Self {
            items,
            loading,
            errors,
        }
    }

    pub fn subscribe_items(&self) -> watch::Receiver<T> {
        self.items.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<RepositoryError> {
        self.errors.subscribe()
    }

    pub fn publish(&self, value: T) {
        self.items.send_replace(value);
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.send_if_modified(|current| {
            let changed = *current != loading;
            *current = loading;
            changed
        });
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn publish_error(&self, error: RepositoryError) {
        // No subscribers is fine, the error is still returned to the caller
        let _ = self.errors.send(error);
    }
}
