//! Cache-aside storage for fetched robots.txt bodies.
//!
//! [`OverrideCache`] owns the policy: it derives keys from the domain,
//! applies the configured TTL on write, bounds every provider call with a
//! timeout and turns every provider failure into a miss. Providers only
//! implement [`CacheStore`]:
//!
//! - [`SqliteCacheStore`]: SQLite file with write-time expiry
//! - [`MemoryCacheStore`]: in-process map, lost on restart

pub mod hash;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::Error;

pub use hash::cache_key;
pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

/// Key-value provider behind the robots cache.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch an unexpired value. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, Error>;

    /// Store `value` so that it expires `ttl` after this call.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), Error>;
}

/// Domain-keyed robots.txt cache.
///
/// Purely an optimization: callers never see a provider error.
#[derive(Clone)]
pub struct OverrideCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    timeout: Duration,
}

impl OverrideCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, timeout: Duration) -> Self {
        Self { store, ttl, timeout }
    }

    /// Look up the cached body for `domain`.
    pub async fn get(&self, domain: &str) -> Option<Bytes> {
        let key = cache_key(domain);
        match tokio::time::timeout(self.timeout, self.store.get(&key)).await {
            Ok(Ok(Some(body))) => {
                tracing::debug!(%key, domain, "robots.txt cache hit");
                Some(body)
            }
            Ok(Ok(None)) => {
                tracing::debug!(%key, domain, "robots.txt cache miss");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(%key, domain, error = %e, "cache lookup failed, treating as miss");
                None
            }
            Err(_) => {
                tracing::warn!(%key, domain, timeout_ms = self.timeout.as_millis() as u64, "cache lookup timed out");
                None
            }
        }
    }

    /// Store `body` for `domain` with the configured TTL. Failures are logged only.
    pub async fn put(&self, domain: &str, body: Bytes) {
        let key = cache_key(domain);
        match tokio::time::timeout(self.timeout, self.store.set(&key, body, self.ttl)).await {
            Ok(Ok(())) => tracing::debug!(%key, domain, "robots.txt saved to cache"),
            Ok(Err(e)) => tracing::error!(%key, domain, error = %e, "failed to save robots.txt to cache"),
            Err(_) => tracing::error!(%key, domain, "saving robots.txt to cache timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>, Error> {
            Err(Error::Store("connection reset".into()))
        }

        async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), Error> {
            Err(Error::Store("connection reset".into()))
        }
    }

    struct SlowStore;

    #[async_trait]
    impl CacheStore for SlowStore {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>, Error> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some(Bytes::from_static(b"late")))
        }

        async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), Error> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    fn cache_with(store: Arc<dyn CacheStore>) -> OverrideCache {
        OverrideCache::new(store, Duration::from_secs(60), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_put_then_get_by_domain() {
        let store = MemoryCacheStore::new();
        let cache = cache_with(Arc::new(store.clone()));

        cache.put("example.com", Bytes::from_static(b"User-agent: *")).await;

        assert_eq!(cache.get("example.com").await.unwrap().as_ref(), b"User-agent: *");
        assert!(store.get(&cache_key("example.com")).await.unwrap().is_some());
        assert!(cache.get("example.org").await.is_none());
    }

    #[tokio::test]
    async fn test_provider_error_is_a_miss() {
        let cache = cache_with(Arc::new(FailingStore));
        assert!(cache.get("example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_put_failure_is_swallowed() {
        let cache = cache_with(Arc::new(FailingStore));
        cache.put("example.com", Bytes::from_static(b"x")).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_is_a_miss() {
        let cache = cache_with(Arc::new(SlowStore));
        assert!(cache.get("example.com").await.is_none());
        cache.put("example.com", Bytes::from_static(b"x")).await;
    }
}
