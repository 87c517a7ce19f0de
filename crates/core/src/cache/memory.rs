//! In-process cache provider.
//!
//! Uses a HashMap behind a tokio RwLock with per-entry expiry. Handy for
//! tests and single-instance deployments that can afford to lose the cache
//! on restart.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::CacheStore;
use crate::Error;

/// Cached body with its deadline.
struct CachedBody {
    body: Bytes,
    expires_at: Instant,
}

impl CachedBody {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory cache for robots.txt bodies.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, CachedBody>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear expired entries from the cache.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, cached| !cached.is_expired());
        before - entries.len()
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).filter(|cached| !cached.is_expired()).map(|cached| cached.body.clone()))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CachedBody { body: value, expires_at: Instant::now() + ttl });
        Ok(())
    }
}
