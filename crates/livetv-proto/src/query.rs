//! Parameter-keyed query cache and the view-side fetch state.
//!
//! [`QueryClient`] issues at most one network request per key while the
//! cached value is fresh, shares in-flight requests between callers, and
//! converts catalog errors into stable messages. [`QueryState`] is what a
//! view holds: the key it currently wants and the state of that key's
//! fetch. Results for any other key are dropped on arrival.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::catalog::{with_retry, CatalogError, CatalogSource, RetryPolicy};
use crate::channel::Channel;

/// A fetch failure as shown to the user. Cheap to clone and share.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&CatalogError> for FetchError {
    fn from(err: &CatalogError) -> Self {
        Self::new(err.user_message())
    }
}

pub type FetchResult<V> = Result<Arc<V>, FetchError>;

// ── Fetch state ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState<T> {
    /// No parameter, nothing requested.
    #[default]
    Idle,
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// The view's handle on one query: which key it wants and what it has.
#[derive(Debug, Clone)]
pub struct QueryState<K, T> {
    key: Option<K>,
    state: FetchState<T>,
}

impl<K, T> Default for QueryState<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            state: FetchState::Idle,
        }
    }
}

impl<K: PartialEq, T> QueryState<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    /// Point the query at `key`. Returns `true` when the caller should
    /// start a fetch for it.
    ///
    /// Re-selecting the active key while it is pending or loaded is a
    /// no-op. `None` clears the query back to idle.
    pub fn select(&mut self, key: Option<K>) -> bool {
        let Some(key) = key else {
            self.key = None;
            self.state = FetchState::Idle;
            return false;
        };

        if self.key.as_ref() == Some(&key)
            && matches!(self.state, FetchState::Pending | FetchState::Ready(_))
        {
            return false;
        }

        self.key = Some(key);
        self.state = FetchState::Pending;
        true
    }

    /// Mark the active key pending again. Returns it if there is one.
    pub fn reload(&mut self) -> Option<&K> {
        if self.key.is_some() {
            self.state = FetchState::Pending;
        }
        self.key.as_ref()
    }

    /// Apply a settled result. Returns `false` (and drops the result)
    /// when `key` is no longer the active key.
    pub fn accept(&mut self, key: &K, result: Result<T, FetchError>) -> bool {
        if self.key.as_ref() != Some(key) {
            return false;
        }
        self.state = match result {
            Ok(data) => FetchState::Ready(data),
            Err(err) => FetchState::Failed(err.message),
        };
        true
    }

    pub fn data(&self) -> Option<&T> {
        self.state.data()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn is_error(&self) -> bool {
        self.state.is_error()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.state.error_message()
    }
}

// ── Keyed cache ──────────────────────────────────────────────────────────────

struct Entry<V> {
    value: Arc<V>,
    fetched_at: Instant,
}

type InFlight<V> = Shared<BoxFuture<'static, FetchResult<V>>>;

struct CacheInner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Pending request per key, tagged with the generation that started it.
    in_flight: HashMap<K, (u64, InFlight<V>)>,
    next_generation: u64,
}

/// Fresh-for-a-while cache with one shared request per key.
pub struct KeyedCache<K, V> {
    inner: Arc<RwLock<CacheInner<K, V>>>,
    stale_after: Duration,
}

impl<K, V> Clone for KeyedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            stale_after: self.stale_after,
        }
    }
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(stale_after: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                next_generation: 0,
            })),
            stale_after,
        }
    }

    /// The cached value for `key`, if it is still fresh.
    pub async fn peek(&self, key: &K) -> Option<Arc<V>> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_after)
            .map(|entry| entry.value.clone())
    }

    /// Drop the cached value and detach any pending request for `key`.
    /// The detached request still finishes but no longer fills the cache.
    pub async fn invalidate(&self, key: &K) {
        let mut inner = self.inner.write().await;
        inner.entries.remove(key);
        inner.in_flight.remove(key);
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.in_flight.clear();
    }

    /// Serve `key` from cache, join a request already in flight, or
    /// start `fetch`.
    ///
    /// A started request runs as its own task: it completes and fills the
    /// cache even if every caller has gone away. Failures are not cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> FetchResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>> + Send + 'static,
    {
        let shared = {
            let mut inner = self.inner.write().await;

            if let Some(entry) = inner.entries.get(&key) {
                if entry.fetched_at.elapsed() < self.stale_after {
                    return Ok(entry.value.clone());
                }
            }

            match inner.in_flight.get(&key) {
                Some((_, pending)) => pending.clone(),
                None => {
                    let generation = inner.next_generation;
                    inner.next_generation += 1;

                    let cache = self.clone();
                    let task_key = key.clone();
                    let request = fetch();
                    let handle = tokio::spawn(async move {
                        let result = request.await.map(Arc::new);
                        cache.settle(task_key, generation, &result).await;
                        result
                    });

                    let cache = self.clone();
                    let task_key = key.clone();
                    let pending = async move {
                        match handle.await {
                            Ok(result) => result,
                            Err(e) => {
                                cache.forget(&task_key, generation).await;
                                Err(FetchError::new(format!("fetch task failed: {}", e)))
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    inner.in_flight.insert(key, (generation, pending.clone()));
                    pending
                }
            }
        };

        shared.await
    }

    /// Record a finished request. Last write wins per key; requests
    /// detached by `invalidate` are not recorded.
    async fn settle(&self, key: K, generation: u64, result: &FetchResult<V>) {
        let mut inner = self.inner.write().await;
        if !matches!(inner.in_flight.get(&key), Some((g, _)) if *g == generation) {
            debug!("dropping detached result for generation {}", generation);
            return;
        }
        inner.in_flight.remove(&key);
        if let Ok(value) = result {
            inner.entries.insert(
                key,
                Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
    }

    /// Remove a pending request that will never settle.
    async fn forget(&self, key: &K, generation: u64) {
        let mut inner = self.inner.write().await;
        if matches!(inner.in_flight.get(key), Some((g, _)) if *g == generation) {
            inner.in_flight.remove(key);
        }
    }
}

// ── Query client ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub stale_after: Duration,
    pub retry: RetryPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(5 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Cached access to the catalog. Clones share the same cache.
pub struct QueryClient<S> {
    source: Arc<S>,
    categories: KeyedCache<(), Vec<String>>,
    channels: KeyedCache<String, Vec<Channel>>,
    retry: RetryPolicy,
}

impl<S> Clone for QueryClient<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            categories: self.categories.clone(),
            channels: self.channels.clone(),
            retry: self.retry,
        }
    }
}

impl<S: CatalogSource> QueryClient<S> {
    pub fn new(source: S, options: QueryOptions) -> Self {
        Self {
            source: Arc::new(source),
            categories: KeyedCache::new(options.stale_after),
            channels: KeyedCache::new(options.stale_after),
            retry: options.retry,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn categories(&self) -> FetchResult<Vec<String>> {
        let source = self.source.clone();
        let retry = self.retry;
        self.categories
            .get_or_fetch((), move || async move {
                with_retry(retry, "categories", || source.categories())
                    .await
                    .map_err(|e| {
                        warn!("categories fetch failed: {}", e);
                        FetchError::from(&e)
                    })
            })
            .await
    }

    pub async fn channels(&self, category: &str) -> FetchResult<Vec<Channel>> {
        let source = self.source.clone();
        let retry = self.retry;
        let key = category.to_string();
        let category = key.clone();
        self.channels
            .get_or_fetch(key, move || async move {
                let what = format!("channels[{}]", category);
                with_retry(retry, &what, || source.channels(&category))
                    .await
                    .map(|list| {
                        debug!("{}: {} records", what, list.len());
                        list
                    })
                    .map_err(|e| {
                        warn!("{} fetch failed: {}", what, e);
                        FetchError::from(&e)
                    })
            })
            .await
    }

    /// Every category's channels, concatenated in category order.
    ///
    /// Each category goes through the cache. Categories that fail are
    /// skipped; the call only fails when the category list itself fails
    /// or every category does.
    pub async fn all_channels(&self) -> FetchResult<Vec<Channel>> {
        let categories = self.categories().await?;
        let mut all = Vec::new();
        let mut first_error = None;
        let mut loaded = 0usize;

        for category in categories.iter() {
            match self.channels(category).await {
                Ok(list) => {
                    loaded += 1;
                    all.extend(list.iter().cloned());
                }
                Err(e) => {
                    warn!("skipping category {:?}: {}", category, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(err) if loaded == 0 => Err(err),
            _ => Ok(Arc::new(all)),
        }
    }

    pub async fn cached_channels(&self, category: &str) -> Option<Arc<Vec<Channel>>> {
        self.channels.peek(&category.to_string()).await
    }

    pub async fn invalidate_categories(&self) {
        self.categories.invalidate(&()).await;
    }

    pub async fn invalidate_channels(&self, category: &str) {
        self.channels.invalidate(&category.to_string()).await;
    }

    pub async fn invalidate_all(&self) {
        self.categories.clear().await;
        self.channels.clear().await;
    }
}
