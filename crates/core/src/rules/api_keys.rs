//! API keys guarding rule management.
//!
//! Only the SHA-256 of a key is stored.

use chrono::Utc;
use tokio_rusqlite::{OptionalExtension, params};

use super::pool::RuleDb;
use crate::Error;
use crate::cache::hash::sha256_hex;

/// Lookup result for a presented key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Inactive,
    Unknown,
}

#[derive(Clone)]
pub struct ApiKeyStore {
    db: RuleDb,
}

impl ApiKeyStore {
    pub fn new(db: RuleDb) -> Self {
        Self { db }
    }

    pub async fn check(&self, raw_key: &str) -> Result<KeyStatus, Error> {
        let key_hash = sha256_hex(raw_key);
        let active = self
            .db
            .call(move |conn| {
                let active = conn
                    .query_row("SELECT is_active FROM api_keys WHERE key_hash = ?1", params![key_hash], |row| {
                        row.get::<_, bool>(0)
                    })
                    .optional()?;
                Ok(active)
            })
            .await?;

        Ok(match active {
            Some(true) => KeyStatus::Active,
            Some(false) => KeyStatus::Inactive,
            None => KeyStatus::Unknown,
        })
    }

    /// Insert a key or change its active flag.
    pub async fn upsert(&self, raw_key: &str, active: bool) -> Result<(), Error> {
        let key_hash = sha256_hex(raw_key);
        let now = Utc::now().to_rfc3339();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO api_keys (key_hash, is_active, created_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key_hash) DO UPDATE SET is_active = excluded.is_active",
                    params![key_hash, active, now],
                )?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn keys() -> ApiKeyStore {
        ApiKeyStore::new(RuleDb::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let keys = keys().await;
        assert_eq!(keys.check("nope").await.unwrap(), KeyStatus::Unknown);
    }

    #[tokio::test]
    async fn test_upsert_and_deactivate() {
        let keys = keys().await;
        keys.upsert("secret", true).await.unwrap();
        assert_eq!(keys.check("secret").await.unwrap(), KeyStatus::Active);

        keys.upsert("secret", false).await.unwrap();
        assert_eq!(keys.check("secret").await.unwrap(), KeyStatus::Inactive);
        assert_eq!(keys.check("Secret").await.unwrap(), KeyStatus::Unknown);
    }

    #[tokio::test]
    async fn test_raw_key_is_not_stored() {
        let keys = keys().await;
        keys.upsert("secret", true).await.unwrap();
        let stored: String = keys
            .db
            .call(|conn| Ok(conn.query_row("SELECT key_hash FROM api_keys", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(stored, sha256_hex("secret"));
    }
}
