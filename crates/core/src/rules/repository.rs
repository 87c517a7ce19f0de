//! SQLite-backed override rule repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio_rusqlite::{
    ErrorCode, OptionalExtension, Row, params,
    rusqlite::{self, types::Type},
};

use super::{NewRule, Rule, RuleStore, pool::RuleDb};
use crate::Error;

const SELECT_RULE: &str =
    "SELECT id, domain, blocked, robots_txt, version, created_at, updated_at FROM custom_rules";

/// Rule repository over the pooled rule database.
///
/// Inserts are serialized through one process-wide lock; the UNIQUE domain
/// column catches writers outside this process.
#[derive(Clone)]
pub struct SqliteRuleStore {
    db: RuleDb,
    create_lock: Arc<Mutex<()>>,
}

impl SqliteRuleStore {
    pub fn new(db: RuleDb) -> Self {
        Self { db, create_lock: Arc::new(Mutex::new(())) }
    }
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_rule(row: &Row<'_>) -> rusqlite::Result<Rule> {
    Ok(Rule {
        id: row.get(0)?,
        domain: row.get(1)?,
        blocked: row.get(2)?,
        robots_txt: row.get(3)?,
        version: row.get(4)?,
        created_at: parse_timestamp(5, row.get(5)?)?,
        updated_at: parse_timestamp(6, row.get(6)?)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> Result<Option<Rule>, Error> {
    let rule = conn
        .query_row(&format!("{SELECT_RULE} WHERE id = ?1"), params![id], row_to_rule)
        .optional()?;
    Ok(rule)
}

#[async_trait]
impl RuleStore for SqliteRuleStore {
    async fn get_by_domain(&self, domain: &str) -> Result<Rule, Error> {
        let domain = domain.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(&format!("{SELECT_RULE} WHERE domain = ?1"), params![domain], row_to_rule)
                    .optional()?
                    .ok_or_else(|| Error::NotFound(format!("rule for domain '{domain}' not found")))
            })
            .await
    }

    async fn get_by_id(&self, id: i64) -> Result<Rule, Error> {
        self.db
            .call(move |conn| {
                select_by_id(conn, id)?.ok_or_else(|| Error::NotFound(format!("rule with id '{id}' not found")))
            })
            .await
    }

    async fn create(&self, rule: NewRule) -> Result<i64, Error> {
        let _guard = self.create_lock.lock().await;

        let now = Utc::now().to_rfc3339();
        let id = self
            .db
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO custom_rules (domain, robots_txt, blocked, version, created_at, updated_at)
                    VALUES (?1, ?2, ?3, 1, ?4, ?4)",
                    params![rule.domain, rule.robots_txt, rule.blocked, now],
                );
                match inserted {
                    Ok(_) => Ok(conn.last_insert_rowid()),
                    Err(e) if is_unique_violation(&e) => {
                        Err(Error::Conflict(format!("rule for domain '{}' already exists", rule.domain)))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        tracing::debug!(id, "created override rule");
        Ok(id)
    }

    async fn update(&self, rule: &Rule) -> Result<Rule, Error> {
        let rule = rule.clone();
        let now = Utc::now().to_rfc3339();
        self.db
            .call(move |conn| {
                let changed = conn
                    .execute(
                        "UPDATE custom_rules
                        SET domain = ?1, robots_txt = ?2, blocked = ?3, version = version + 1, updated_at = ?4
                        WHERE id = ?5 AND version = ?6",
                        params![rule.domain, rule.robots_txt, rule.blocked, now, rule.id, rule.version],
                    )
                    .map_err(|e| {
                        if is_unique_violation(&e) {
                            Error::Conflict(format!("rule for domain '{}' already exists", rule.domain))
                        } else {
                            e.into()
                        }
                    })?;

                match select_by_id(conn, rule.id)? {
                    Some(stored) if changed > 0 => {
                        tracing::debug!(id = stored.id, version = stored.version, "updated override rule");
                        Ok(stored)
                    }
                    Some(stored) => Err(Error::Conflict(format!(
                        "rule with id '{}' was modified concurrently (expected version {}, found {})",
                        rule.id, rule.version, stored.version
                    ))),
                    None => Err(Error::NotFound(format!("rule with id '{}' not found", rule.id))),
                }
            })
            .await
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        let deleted = self
            .db
            .call(move |conn| Ok(conn.execute("DELETE FROM custom_rules WHERE id = ?1", params![id])?))
            .await?;
        tracing::debug!(id, deleted, "deleted override rule");
        Ok(())
    }
}
