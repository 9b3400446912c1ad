//! TTL/LRU reference-data cache with per-key in-flight fetch sharing.

use crate::types::QuoteError;
use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type FetchFn<K, V> = Box<dyn Fn(K) -> BoxFuture<'static, Result<V, QuoteError>> + Send + Sync>;
type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, Arc<QuoteError>>>>;

struct Inflight<V> {
    fut: SharedFetch<V>,
    generation: u64,
}

struct StoreInner<K: Hash + Eq, V> {
    entries: LruCache<K, (V, Instant)>,
    inflight: HashMap<K, Inflight<V>>,
    next_generation: u64,
}

/// Snapshot of hit/miss/fetch counters.
pub struct RefStoreMetrics {
    pub hits: usize,
    pub misses: usize,
    pub fetches: usize,
}

/// Async reference-data cache: a live entry is returned without fetching, a
/// miss or expired entry triggers at most one concurrent fetch per key and
/// all simultaneous callers share its outcome. Failures are never cached.
pub struct RefStore<K, V>
where
    K: Clone + Hash + Eq + Send + 'static,
    V: Clone + Send + 'static,
{
    inner: Mutex<StoreInner<K, V>>,
    fetch: FetchFn<K, V>,
    ttl: Duration,
    hits: AtomicUsize,
    misses: AtomicUsize,
    fetches: AtomicUsize,
}

impl<K, V> RefStore<K, V>
where
    K: Clone + Hash + Eq + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new<F>(fetch: F, ttl: Duration, max_entries: usize) -> Self
    where
        F: Fn(K) -> BoxFuture<'static, Result<V, QuoteError>> + Send + Sync + 'static,
    {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(StoreInner {
                entries: LruCache::new(capacity),
                inflight: HashMap::new(),
                next_generation: 0,
            }),
            fetch: Box::new(fetch),
            ttl,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Return the cached value for `key`, or fetch it. Concurrent callers for
    /// the same key share one fetch; distinct keys proceed independently.
    pub async fn get_or_fetch(&self, key: K) -> Result<V, Arc<QuoteError>> {
        // The lock is scoped so it is never held across an await point.
        let (fut, generation) = {
            let mut inner = self.inner.lock().unwrap();

            let expired = match inner.entries.peek(&key) {
                Some((_, fetched_at)) => fetched_at.elapsed() >= self.ttl,
                None => false,
            };
            if expired {
                inner.entries.pop(&key);
            }
            if let Some((value, _)) = inner.entries.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value.clone());
            }
            self.misses.fetch_add(1, Ordering::Relaxed);

            if let Some(inflight) = inner.inflight.get(&key) {
                (inflight.fut.clone(), inflight.generation)
            } else {
                self.fetches.fetch_add(1, Ordering::Relaxed);
                let generation = inner.next_generation;
                inner.next_generation += 1;
                let fut: SharedFetch<V> =
                    (self.fetch)(key.clone()).map(|r| r.map_err(Arc::new)).boxed().shared();
                inner.inflight.insert(key.clone(), Inflight { fut: fut.clone(), generation });
                (fut, generation)
            }
        };

        let result = fut.await;

        let mut inner = self.inner.lock().unwrap();
        // Only the cycle that owns the in-flight slot tears it down and
        // installs the value. A stale waiter waking up late must neither
        // restamp the TTL nor clobber what a newer cycle already stored.
        if inner.inflight.get(&key).map(|i| i.generation) == Some(generation) {
            inner.inflight.remove(&key);
            if let Ok(value) = &result {
                inner.entries.put(key, (value.clone(), Instant::now()));
            }
        }
        result
    }

    /// Peek without fetching or promoting; expired entries read as absent.
    pub fn peek(&self, key: &K) -> Option<V> {
        let inner = self.inner.lock().unwrap();
        match inner.entries.peek(key) {
            Some((value, fetched_at)) if fetched_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    /// Drop a single entry, forcing the next access to fetch.
    pub fn invalidate(&self, key: &K) {
        self.inner.lock().unwrap().entries.pop(key);
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> RefStoreMetrics {
        RefStoreMetrics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
        }
    }
}
