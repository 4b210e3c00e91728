use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::RepositoryError;

pub(crate) type FetchResult = Result<(), RepositoryError>;
pub(crate) type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Single slot holding the fetch a repository is currently running.
///
/// The fetch runs on its own task, so callers that stop waiting do not cancel
/// it. The task must call `finish` with its id once the cache is updated.
pub(crate) struct InFlight<K> {
    slot: Mutex<Option<Running<K>>>,
    next_id: AtomicU64,
}

struct Running<K> {
    id: u64,
    kind: K,
    fetch: SharedFetch,
}

impl<K: Copy + Send + 'static> InFlight<K> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    /// Join the running fetch, or spawn `start(id)` as a new one of `kind`.
    ///
    /// Returns the kind of the fetch actually joined.
    pub fn join_or_start<F>(&self, kind: K, start: F) -> (K, SharedFetch)
    where
        F: FnOnce(u64) -> BoxFuture<'static, FetchResult>,
    {
        let mut slot = lock(&self.slot);
        // A completed fetch still in the slot belongs to a task that never
        // reached `finish` (it panicked); start over instead of replaying it.
        if let Some(running) = slot.as_ref().filter(|r| r.fetch.peek().is_none()) {
            return (running.kind, running.fetch.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = tokio::spawn(start(id));
        let fetch = handle
            .map(|joined| {
                joined.unwrap_or_else(|e| Err(RepositoryError::FetchAborted(e.to_string())))
            })
            .boxed()
            .shared();

        *slot = Some(Running {
            id,
            kind,
            fetch: fetch.clone(),
        });
        (kind, fetch)
    }

    pub fn current(&self) -> Option<(K, SharedFetch)> {
        lock(&self.slot)
            .as_ref()
            .filter(|running| running.fetch.peek().is_none())
            .map(|running| (running.kind, running.fetch.clone()))
    }

    /// Empty the slot if it still holds fetch `id`
    pub fn finish(&self, id: u64) {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|running| running.id == id) {
            *slot = None;
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_second_caller_joins_running_fetch() {
        let in_flight: Arc<InFlight<()>> = Arc::new(InFlight::new());
        let release = Arc::new(Notify::new());

        let (_, first) = in_flight.join_or_start((), |id| {
            let in_flight = Arc::clone(&in_flight);
            let release = Arc::clone(&release);
            async move {
                release.notified().await;
                in_flight.finish(id);
                Ok(())
            }
            .boxed()
        });

        let (_, second) = in_flight.join_or_start((), |_| {
            async { Err(RepositoryError::Network("must not run".into())) }.boxed()
        });

        release.notify_one();
        assert!(first.await.is_ok());
        assert!(second.await.is_ok());
        assert!(in_flight.current().is_none());
    }

    #[tokio::test]
    async fn test_dropping_caller_does_not_cancel_fetch() {
        let in_flight: Arc<InFlight<()>> = Arc::new(InFlight::new());
        let done = Arc::new(AtomicU64::new(0));

        let (_, fetch) = in_flight.join_or_start((), |id| {
            let in_flight = Arc::clone(&in_flight);
            let done = Arc::clone(&done);
            async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
                in_flight.finish(id);
                Ok(())
            }
            .boxed()
        });
        drop(fetch);

        for _ in 0..100 {
            if in_flight.current().is_none() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_fetch_reports_aborted() {
        let in_flight: InFlight<()> = InFlight::new();
        let (_, fetch) = in_flight.join_or_start((), |_| {
            async {
                if true {
                    panic!("loader blew up");
                }
                Ok(())
            }
            .boxed()
        });

        assert!(matches!(
            fetch.await,
            Err(RepositoryError::FetchAborted(_))
        ));

        let (_, retry) = in_flight.join_or_start((), |_| async { Ok(()) }.boxed());
        assert!(retry.await.is_ok());
    }
}
