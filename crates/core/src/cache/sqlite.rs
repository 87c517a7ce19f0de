//! SQLite cache provider with write-time expiry.
//!
//! This module handles opening the cache database, applying pragmas for
//! concurrent access (WAL mode), running migrations, and serving
//! key-addressed robots.txt bodies that disappear once their TTL elapses.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio_rusqlite::{Connection, params, rusqlite};

use super::CacheStore;
use crate::Error;
use crate::migrations::{self, CACHE_MIGRATIONS};

/// Cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct SqliteCacheStore {
    pub(crate) conn: Connection,
}

impl SqliteCacheStore {
    /// Open a cache database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory cache database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, Error> {
        migrations::apply_pragmas(&conn).await?;
        migrations::run(&conn, CACHE_MIGRATIONS).await?;
        Ok(Self { conn })
    }

    /// Delete expired entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM robots_cache WHERE expires_at_ms <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Close the background connection.
    pub async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::Database)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, Error> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<Option<Bytes>, Error> {
                let mut stmt = conn.prepare("SELECT body FROM robots_cache WHERE key = ?1 AND expires_at_ms > ?2")?;

                let result = stmt.query_row(params![key, now], |row| row.get::<_, Vec<u8>>(0));

                match result {
                    Ok(body) => Ok(Some(Bytes::from(body))),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace an entry.
    ///
    /// Uses UPSERT semantics; the expiry is recomputed from `ttl` on every write.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), Error> {
        let key = key.to_string();
        let fetched_at = Utc::now();
        let expires_at_ms = fetched_at.timestamp_millis() + ttl.as_millis() as i64;
        let fetched_at = fetched_at.to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO robots_cache (key, body, fetched_at, expires_at_ms)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        body = excluded.body,
                        fetched_at = excluded.fetched_at,
                        expires_at_ms = excluded.expires_at_ms",
                    params![key, value.as_ref(), fetched_at, expires_at_ms],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = SqliteCacheStore::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let db = SqliteCacheStore::open_in_memory().await.unwrap();
        db.set("k-robots-txt", Bytes::from_static(b"User-agent: *\nDisallow: /"), Duration::from_secs(60))
            .await
            .unwrap();

        let body = db.get("k-robots-txt").await.unwrap().unwrap();
        assert_eq!(body.as_ref(), b"User-agent: *\nDisallow: /");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = SqliteCacheStore::open_in_memory().await.unwrap();
        assert!(db.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let db = SqliteCacheStore::open_in_memory().await.unwrap();
        db.set("k", Bytes::from_static(b"body"), Duration::ZERO).await.unwrap();
        assert!(db.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_body() {
        let db = SqliteCacheStore::open_in_memory().await.unwrap();
        db.set("k", Bytes::from_static(b"old"), Duration::from_secs(60)).await.unwrap();
        db.set("k", Bytes::from_static(b"new"), Duration::from_secs(60)).await.unwrap();
        assert_eq!(db.get("k").await.unwrap().unwrap().as_ref(), b"new");
    }

    #[tokio::test]
    async fn test_read_does_not_extend_expiry() {
        let db = SqliteCacheStore::open_in_memory().await.unwrap();
        db.set("k", Bytes::from_static(b"body"), Duration::from_secs(60)).await.unwrap();

        let expiry = |db: SqliteCacheStore| async move {
            db.conn
                .call(|conn| {
                    conn.query_row("SELECT expires_at_ms FROM robots_cache WHERE key = 'k'", [], |row| {
                        row.get::<_, i64>(0)
                    })
                })
                .await
                .unwrap()
        };

        let before = expiry(db.clone()).await;
        db.get("k").await.unwrap();
        let after = expiry(db.clone()).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let db = SqliteCacheStore::open_in_memory().await.unwrap();
        db.set("stale", Bytes::from_static(b"a"), Duration::ZERO).await.unwrap();
        db.set("fresh", Bytes::from_static(b"b"), Duration::from_secs(60)).await.unwrap();

        let deleted = db.purge_expired().await.unwrap();
        assert_eq!(deleted, 1);
        assert!(db.get("fresh").await.unwrap().is_some());
    }
}
