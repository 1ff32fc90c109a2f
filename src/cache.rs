use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

struct Entry<T> {
    value: Arc<T>,
    fetched_at: Instant,
}

/// Single-entry cache with a fixed time to live. Readers share the entry;
/// refreshes are serialized so an expired entry is fetched once.
pub struct TtlCache<T> {
    ttl: Duration,
    entry: RwLock<Option<Entry<T>>>,
    refresh: Mutex<()>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value when it was fetched less than `ttl` before `now`,
    /// otherwise runs `fetch` and stores its result. The entry is stamped when
    /// the fetch completes: `now` plus the time spent waiting and fetching.
    pub async fn get_or_refresh<F, Fut>(&self, now: Instant, fetch: F) -> Arc<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let started = Instant::now();
        if let Some(value) = self.fresh(now).await {
            debug!("contact cache hit");
            return value;
        }

        let _refreshing = self.refresh.lock().await;
        // Another request may have refreshed while we waited.
        if let Some(value) = self.fresh(now).await {
            return value;
        }

        debug!("contact cache refresh");
        let value = Arc::new(fetch().await);
        *self.entry.write().await = Some(Entry {
            value: Arc::clone(&value),
            fetched_at: now + started.elapsed(),
        });
        value
    }

    async fn fresh(&self, now: Instant) -> Option<Arc<T>> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|entry| now.saturating_duration_since(entry.fetched_at) < self.ttl)
            .map(|entry| Arc::clone(&entry.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn value_is_reused_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let start = Instant::now();

        let fetch = move || async move { counter.fetch_add(1, Ordering::SeqCst) };
        let first = cache.get_or_refresh(start, fetch).await;
        let second = cache
            .get_or_refresh(start + Duration::from_secs(59), fetch)
            .await;

        assert_eq!(*first, 0);
        assert_eq!(*second, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn value_is_refetched_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let start = Instant::now();

        let fetch = move || async move { counter.fetch_add(1, Ordering::SeqCst) };
        cache.get_or_refresh(start, fetch).await;
        let refreshed = cache
            .get_or_refresh(start + Duration::from_secs(61), fetch)
            .await;
        let reused = cache
            .get_or_refresh(start + Duration::from_secs(90), fetch)
            .await;

        assert_eq!(*refreshed, 1);
        assert_eq!(*reused, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn slow_fetch_is_stamped_when_it_completes() {
        let cache = TtlCache::new(Duration::from_secs(1));
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let start = Instant::now();

        cache
            .get_or_refresh(start, move || async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                counter.fetch_add(1, Ordering::SeqCst)
            })
            .await;
        let reused = cache
            .get_or_refresh(start + Duration::from_millis(1_100), move || async move {
                counter.fetch_add(1, Ordering::SeqCst)
            })
            .await;

        assert_eq!(*reused, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_fetch_once() {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));
        let now = Instant::now();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_refresh(now, || async move {
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            calls.fetch_add(1, Ordering::SeqCst)
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(*task.await.unwrap(), 0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
