//! Shared handles built once at startup.

use std::sync::Arc;

use anyhow::{Context, Result};

use crawlgate_client::{FetchClient, Resolver, RobotstxtEvaluator};
use crawlgate_core::config::CacheBackend;
use crawlgate_core::{
    AppConfig, ApiKeyStore, CacheStore, MemoryCacheStore, OverrideCache, RuleDb, RuleService, SqliteCacheStore,
    SqliteRuleStore,
};

/// State handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
    pub rules: RuleService,
    pub keys: ApiKeyStore,
}

/// Concrete cache provider, kept for purging and shutdown.
#[derive(Clone)]
pub enum CacheHandle {
    Sqlite(SqliteCacheStore),
    Memory(MemoryCacheStore),
}

impl CacheHandle {
    fn store(&self) -> Arc<dyn CacheStore> {
        match self {
            CacheHandle::Sqlite(store) => Arc::new(store.clone()),
            CacheHandle::Memory(store) => Arc::new(store.clone()),
        }
    }

    /// Drop expired entries, returning how many went.
    pub async fn purge_expired(&self) -> Result<u64> {
        match self {
            CacheHandle::Sqlite(store) => Ok(store.purge_expired().await?),
            CacheHandle::Memory(store) => Ok(store.cleanup_expired().await as u64),
        }
    }

    pub async fn close(self) -> Result<()> {
        if let CacheHandle::Sqlite(store) = self {
            store.close().await?;
        }
        Ok(())
    }
}

/// Everything opened at startup that must be closed on shutdown.
pub struct Handles {
    pub state: AppState,
    pub db: RuleDb,
    pub cache: CacheHandle,
}

impl Handles {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        let db = RuleDb::open(&config.database)
            .await
            .with_context(|| format!("failed to open rule database at {}", config.database.path.display()))?;

        let cache = match config.cache.backend {
            CacheBackend::Sqlite => CacheHandle::Sqlite(
                SqliteCacheStore::open(&config.cache.path)
                    .await
                    .with_context(|| format!("failed to open cache at {}", config.cache.path.display()))?,
            ),
            CacheBackend::Memory => CacheHandle::Memory(MemoryCacheStore::new()),
        };

        let fetcher = FetchClient::new(&config.http_client)?;
        let state = build_state(db.clone(), cache.store(), fetcher, config);

        Ok(Self { state, db, cache })
    }

    pub async fn close(self) -> Result<()> {
        self.db.close();
        self.cache.close().await
    }
}

pub fn build_state(db: RuleDb, cache: Arc<dyn CacheStore>, fetcher: FetchClient, config: &AppConfig) -> AppState {
    let store = Arc::new(SqliteRuleStore::new(db.clone()));
    let cache = OverrideCache::new(cache, config.cache.ttl(), config.cache.timeout());
    let resolver = Resolver::new(store.clone(), cache, Arc::new(fetcher), Arc::new(RobotstxtEvaluator));

    AppState { resolver, rules: RuleService::new(store), keys: ApiKeyStore::new(db) }
}
