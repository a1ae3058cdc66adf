use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::api::ApiError;

/// Error surfaced by a query.
///
/// Coalesced callers all observe the same failure, so the underlying
/// [`ApiError`] is shared rather than cloned.
#[derive(Debug, Clone, Error)]
#[error(transparent)]
pub struct QueryError(Arc<ApiError>);

impl QueryError {
    pub fn api_error(&self) -> &ApiError {
        &self.0
    }
}

impl From<ApiError> for QueryError {
    fn from(err: ApiError) -> Self {
        Self(Arc::new(err))
    }
}

/// Staleness, retry and capacity settings shared by every cache.
#[derive(Debug, Clone, Copy)]
pub struct QueryPolicy {
    pub stale_time: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub capacity: NonZeroUsize,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5 * 60),
            retries: 1,
            retry_delay: Duration::from_secs(1),
            capacity: NonZeroUsize::new(100).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Result of a synchronous cache probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<V> {
    /// Fetched within the stale time. Use as-is.
    Fresh(V),
    /// Show it, but refresh in the background.
    Stale(V),
    Missing,
}

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, QueryError>>>;

struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

struct InFlight<V> {
    id: u64,
    fetch: SharedFetch<V>,
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, Entry<V>>,
    in_flight: HashMap<K, InFlight<V>>,
}

/// Keyed cache for one logical API operation.
///
/// Each cache stands for a single operation (`characters`, `character`), so
/// the cache name together with the key forms the full query identity.
/// At most one request per key is in flight; concurrent callers share it.
pub struct QueryCache<K: Hash + Eq, V> {
    name: &'static str,
    policy: QueryPolicy,
    inner: Arc<Mutex<Inner<K, V>>>,
    next_id: Arc<AtomicU64>,
}

impl<K: Hash + Eq, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            policy: self.policy,
            inner: Arc::clone(&self.inner),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

fn lock<K: Hash + Eq, V>(inner: &Mutex<Inner<K, V>>) -> MutexGuard<'_, Inner<K, V>> {
    // A panic while holding the lock cannot leave the maps half-updated,
    // so a poisoned lock is still usable.
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, V> QueryCache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, policy: QueryPolicy) -> Self {
        Self {
            name,
            policy,
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::new(policy.capacity),
                in_flight: HashMap::new(),
            })),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Probe the cache without fetching.
    pub fn lookup(&self, key: &K) -> Lookup<V> {
        let mut inner = lock(&self.inner);
        match inner.entries.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < self.policy.stale_time => {
                Lookup::Fresh(entry.value.clone())
            }
            Some(entry) => Lookup::Stale(entry.value.clone()),
            None => Lookup::Missing,
        }
    }

    /// Whether a request for `key` is currently running.
    pub fn is_fetching(&self, key: &K) -> bool {
        lock(&self.inner).in_flight.contains_key(key)
    }

    /// Drop the cached value for `key`. An in-flight request is unaffected.
    pub fn invalidate(&self, key: &K) {
        lock(&self.inner).entries.pop(key);
    }

    /// Return the cached value if fresh, otherwise [`fetch`](Self::fetch).
    pub async fn get<F, Fut>(&self, key: K, fetcher: F) -> Result<V, QueryError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        if let Lookup::Fresh(value) = self.lookup(&key) {
            tracing::trace!(query = self.name, key = ?key, "Cache hit");
            return Ok(value);
        }
        self.fetch(key, fetcher).await
    }

    /// Fetch `key` from the network and cache the result.
    ///
    /// Joins an in-flight request for the same key when there is one.
    /// A failure is retried `policy.retries` times before it is returned.
    pub async fn fetch<F, Fut>(&self, key: K, fetcher: F) -> Result<V, QueryError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let fetch = {
            let mut inner = lock(&self.inner);
            if let Some(existing) = inner.in_flight.get(&key) {
                tracing::trace!(query = self.name, key = ?key, "Joining in-flight request");
                existing.fetch.clone()
            } else {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let fetch = run_fetch(
                    Arc::clone(&self.inner),
                    self.name,
                    self.policy,
                    key.clone(),
                    id,
                    fetcher,
                )
                .boxed()
                .shared();
                inner.in_flight.insert(
                    key,
                    InFlight {
                        id,
                        fetch: fetch.clone(),
                    },
                );
                fetch
            }
        };
        fetch.await
    }
}

async fn run_fetch<K, V, F, Fut>(
    inner: Arc<Mutex<Inner<K, V>>>,
    name: &'static str,
    policy: QueryPolicy,
    key: K,
    id: u64,
    fetcher: F,
) -> Result<V, QueryError>
where
    K: Hash + Eq + Clone + Debug,
    V: Clone,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<V, ApiError>>,
{
    let mut attempt = 0;
    let result = loop {
        match fetcher().await {
            Ok(value) => break Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                attempt += 1;
                tracing::debug!(
                    query = name,
                    key = ?key,
                    error = %e,
                    attempt,
                    "Retrying query after failure"
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(e) => {
                tracing::warn!(query = name, key = ?key, error = %e, "Query failed");
                break Err(QueryError::from(e));
            }
        }
    };

    let mut guard = lock(&inner);
    if let Ok(value) = &result {
        guard.entries.put(
            key.clone(),
            Entry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
    }
    if guard.in_flight.get(&key).is_some_and(|f| f.id == id) {
        guard.in_flight.remove(&key);
    }
    result
}
