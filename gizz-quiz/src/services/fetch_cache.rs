//! Single-flight memoized fetch
//!
//! Each gateway source owns one [`SharedFetch`]. At most one fetch per
//! source is in flight: concurrent callers await the same pending result.
//! A success is kept for the lifetime of the cache; a failure clears the
//! in-flight marker so the next call fetches again.
//!
//! The fetch runs on its own task, so it completes (and populates the cache)
//! even if every caller stopped waiting for it.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::json_source::FetchError;

type PendingFetch<T> = Shared<BoxFuture<'static, Result<Arc<T>, FetchError>>>;

enum Slot<T> {
    Empty,
    InFlight(PendingFetch<T>),
    Ready(Arc<T>),
}

struct CacheState<T> {
    slot: Slot<T>,
    last_error: Option<FetchError>,
    fetch_count: u64,
}

/// Memoized, single-flight fetch of one value
pub struct SharedFetch<T> {
    name: &'static str,
    state: Arc<Mutex<CacheState<T>>>,
}

impl<T> SharedFetch<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Arc::new(Mutex::new(CacheState {
                slot: Slot::Empty,
                last_error: None,
                fetch_count: 0,
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached value, join an in-flight fetch, or start one
    ///
    /// `fetch` is only invoked when neither a cached value nor a pending
    /// fetch exists.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<T>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let pending = {
            let mut state = self.state.lock().await;
            let joined = match &state.slot {
                Slot::Ready(value) => return Ok(Arc::clone(value)),
                Slot::InFlight(pending) => Some(pending.clone()),
                Slot::Empty => None,
            };
            match joined {
                Some(pending) => {
                    debug!(source = self.name, "Joining in-flight fetch");
                    pending
                }
                None => {
                    state.fetch_count += 1;
                    let pending = self.spawn_fetch(fetch());
                    state.slot = Slot::InFlight(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Start the fetch on its own task; the caller holds the state lock, so
    /// the task cannot publish its result before the in-flight marker is set
    fn spawn_fetch<Fut>(&self, fut: Fut) -> PendingFetch<T>
    where
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let name = self.name;
        let state = Arc::clone(&self.state);
        let task_state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let result = fut.await.map(Arc::new);
            let mut guard = task_state.lock().await;
            match &result {
                Ok(value) => {
                    debug!(source = name, "Fetch succeeded, caching result");
                    guard.slot = Slot::Ready(Arc::clone(value));
                }
                Err(e) => {
                    warn!(source = name, error = %e, "Fetch failed, clearing in-flight marker");
                    guard.slot = Slot::Empty;
                    guard.last_error = Some(e.clone());
                }
            }
            result
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(join_error) => {
                    let error = FetchError::Network(format!("fetch task aborted: {}", join_error));
                    let mut guard = state.lock().await;
                    guard.slot = Slot::Empty;
                    guard.last_error = Some(error.clone());
                    Err(error)
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Cached value, if a fetch has succeeded
    pub async fn cached(&self) -> Option<Arc<T>> {
        match &self.state.lock().await.slot {
            Slot::Ready(value) => Some(Arc::clone(value)),
            _ => None,
        }
    }

    pub async fn is_in_flight(&self) -> bool {
        matches!(self.state.lock().await.slot, Slot::InFlight(_))
    }

    /// Most recent failure, kept for diagnostics even after a later success
    pub async fn last_error(&self) -> Option<FetchError> {
        self.state.lock().await.last_error.clone()
    }

    /// Number of fetches started so far
    pub async fn fetch_count(&self) -> u64 {
        self.state.lock().await.fetch_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_success_is_cached() {
        let cache: SharedFetch<Vec<u32>> = SharedFetch::new("numbers");
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let value = cache
                .get_or_fetch(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(*value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.fetch_count().await, 1);
        assert!(cache.cached().await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache: Arc<SharedFetch<String>> = Arc::new(SharedFetch::new("slow"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok("done".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(*handle.await.unwrap().unwrap(), "done");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_clears_marker_and_allows_retry() {
        let cache: SharedFetch<u32> = SharedFetch::new("flaky");

        let first = cache
            .get_or_fetch(|| async { Err(FetchError::Status(500)) })
            .await;
        assert_eq!(first.unwrap_err(), FetchError::Status(500));
        assert!(!cache.is_in_flight().await);
        assert!(cache.cached().await.is_none());

        let second = cache.get_or_fetch(|| async { Ok(7) }).await.unwrap();
        assert_eq!(*second, 7);
        assert_eq!(cache.fetch_count().await, 2);
        assert_eq!(cache.last_error().await, Some(FetchError::Status(500)));
    }

    #[tokio::test]
    async fn test_abandoned_fetch_still_populates_cache() {
        let cache: SharedFetch<u32> = SharedFetch::new("late");

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cache.get_or_fetch(|| async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(42)
            }),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.cached().await.as_deref(), Some(&42));
    }
}
