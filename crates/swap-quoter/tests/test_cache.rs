//! Reference-store cache behavior: dedup, TTL, failure and eviction.

use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_quoter::cache::RefStore;
use swap_quoter::types::QuoteError;

fn counting_store(
    ttl: Duration,
    max_entries: usize,
    delay: Duration,
) -> (Arc<RefStore<u64, String>>, Arc<AtomicUsize>) {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = fetches.clone();
    let store = RefStore::new(
        move |key: u64| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(format!("value-{key}"))
            }
            .boxed()
        },
        ttl,
        max_entries,
    );
    (Arc::new(store), fetches)
}

#[tokio::test]
async fn concurrent_callers_share_one_fetch() {
    let (store, fetches) = counting_store(Duration::from_secs(60), 10, Duration::from_millis(50));

    let (a, b) = tokio::join!(store.get_or_fetch(1), store.get_or_fetch(1));
    assert_eq!(a.unwrap(), "value-1");
    assert_eq!(b.unwrap(), "value-1");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // A later call within the TTL is a pure cache hit.
    assert_eq!(store.get_or_fetch(1).await.unwrap(), "value-1");
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn distinct_keys_fetch_independently() {
    let (store, fetches) = counting_store(Duration::from_secs(60), 10, Duration::from_millis(10));

    let (a, b) = tokio::join!(store.get_or_fetch(1), store.get_or_fetch(2));
    assert_eq!(a.unwrap(), "value-1");
    assert_eq!(b.unwrap(), "value-2");
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn expired_entries_refetch_exactly_once() {
    let (store, fetches) = counting_store(Duration::from_millis(100), 10, Duration::ZERO);

    store.get_or_fetch(7).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // Still live just before the TTL boundary.
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.get_or_fetch(7).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // Past the boundary: one new fetch, not more.
    tokio::time::sleep(Duration::from_millis(100)).await;
    store.get_or_fetch(7).await.unwrap();
    store.get_or_fetch(7).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failures_are_not_cached_and_next_call_retries() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let store: RefStore<u64, String> = RefStore::new(
        move |key: u64| {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(QuoteError::Subgraph("boom".into()))
                } else {
                    Ok(format!("value-{key}"))
                }
            }
            .boxed()
        },
        Duration::from_secs(60),
        10,
    );

    assert!(store.get_or_fetch(1).await.is_err());
    assert!(store.is_empty());
    assert_eq!(store.get_or_fetch(1).await.unwrap(), "value-1");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn capacity_evicts_least_recently_used() {
    let (store, fetches) = counting_store(Duration::from_secs(60), 2, Duration::ZERO);

    store.get_or_fetch(1).await.unwrap();
    store.get_or_fetch(2).await.unwrap();
    store.get_or_fetch(3).await.unwrap(); // evicts key 1
    assert_eq!(fetches.load(Ordering::SeqCst), 3);
    assert_eq!(store.len(), 2);

    store.get_or_fetch(1).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 4);

    // Keys 3 and 1 should still be resident.
    assert!(store.peek(&1).is_some());
    assert!(store.peek(&2).is_none());
}

#[tokio::test]
async fn ttl_clock_is_anchored_at_value_install() {
    // Fetch takes 60ms, TTL 100ms. The entry's lifetime is measured from the
    // single install done by the owning fetch cycle, regardless of how many
    // waiters shared it.
    let (store, fetches) = counting_store(Duration::from_millis(100), 10, Duration::from_millis(60));

    let (a, b) = tokio::join!(store.get_or_fetch(1), store.get_or_fetch(1));
    a.unwrap();
    b.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // 60ms after install: still live.
    tokio::time::sleep(Duration::from_millis(60)).await;
    store.get_or_fetch(1).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // Past the TTL counted from install: exactly one refetch.
    tokio::time::sleep(Duration::from_millis(60)).await;
    store.get_or_fetch(1).await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shared_failure_propagates_to_all_waiters() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let store: Arc<RefStore<u64, String>> = Arc::new(RefStore::new(
        move |_key: u64| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(QuoteError::Subgraph("down".into()))
            }
            .boxed()
        },
        Duration::from_secs(60),
        10,
    ));

    let (a, b) = tokio::join!(store.get_or_fetch(9), store.get_or_fetch(9));
    assert!(a.is_err());
    assert!(b.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
