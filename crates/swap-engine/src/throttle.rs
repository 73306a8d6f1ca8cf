use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

/// Guard in front of a rate-limited upstream resource: enforces a global
/// minimum spacing between calls and memoizes per-key results for a fixed
/// time to live.
///
/// Both pieces of shared state sit behind their own mutex; timestamps come
/// from `tokio::time`, so tests drive the clock with `start_paused`.
#[derive(Debug)]
pub struct RateLimitedCache<T> {
    min_interval: Duration,
    ttl: Duration,
    last_call: Mutex<Option<Instant>>,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T: Clone> RateLimitedCache<T> {
    pub fn new(min_interval: Duration, ttl: Duration) -> Self {
        RateLimitedCache {
            min_interval,
            ttl,
            last_call: Mutex::new(None),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until the inter-call interval has elapsed. The next free slot is
    /// reserved under the lock, so concurrent arrivals queue `min_interval`
    /// apart instead of computing overlapping wait windows.
    pub async fn wait_for_turn(&self) {
        let slot = {
            let mut last_call = self.last_call.lock().await;
            let now = Instant::now();
            let slot = match *last_call {
                Some(previous) if previous + self.min_interval > now => {
                    previous + self.min_interval
                }
                _ => now,
            };
            *last_call = Some(slot);
            slot
        };
        sleep_until(slot).await;
    }

    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                // Expired entries are evicted lazily, on the access that finds them stale
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, value: T) {
        self.entries
            .lock()
            .await
            .insert(key, CacheEntry { value, stored_at: Instant::now() });
    }

    /// Serves the memoized value while fresh; otherwise waits for a call
    /// slot, runs `fetch` and stores the result.
    pub async fn get_or_try_insert_with<E, F>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        self.wait_for_turn().await;
        let value = fetch.await?;
        self.insert(key.to_string(), value.clone()).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::{advance, Duration, Instant};

    use crate::throttle::RateLimitedCache;

    fn cache() -> RateLimitedCache<String> {
        RateLimitedCache::new(Duration::from_millis(1000), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced_one_second_apart() {
        let cache = cache();

        let start = Instant::now();
        cache.wait_for_turn().await;
        cache.wait_for_turn().await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_reserve_distinct_slots() {
        let cache = Arc::new(cache());

        let start = Instant::now();
        let first = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.wait_for_turn().await;
                Instant::now()
            })
        };
        let second = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.wait_for_turn().await;
                Instant::now()
            })
        };

        let (first, second) = (first.await.unwrap(), second.await.unwrap());
        let later = first.max(second);
        assert!(later.duration_since(start) >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_served_until_ttl_and_recomputed_after() {
        let cache = cache();
        cache.insert("0xabc".to_string(), "cached".to_string()).await;

        advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("0xabc").await.as_deref(), Some("cached"));

        advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("0xabc").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_or_try_insert_skips_fetch_while_fresh() {
        let cache = cache();

        let value: Result<String, ()> =
            cache.get_or_try_insert_with("key", async { Ok("first".to_string()) }).await;
        assert_eq!(value.unwrap(), "first");

        // Memoized: the second fetch must not run
        let value: Result<String, ()> = cache
            .get_or_try_insert_with("key", async { panic!("fetch ran for a fresh entry") })
            .await;
        assert_eq!(value.unwrap(), "first");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_propagated_and_not_cached() {
        let cache = cache();

        let result: Result<String, &str> =
            cache.get_or_try_insert_with("key", async { Err("upstream down") }).await;
        assert_eq!(result.unwrap_err(), "upstream down");
        assert_eq!(cache.get("key").await, None);
    }
}
