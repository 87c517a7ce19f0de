//! Database schema migrations.
//!
//! Uses a simple version table approach to track applied migrations.
//! Each migration is a SQL batch that transforms the schema. The robots
//! cache and the rule database live in separate SQLite files and carry
//! their own migration lists.

use std::num::ParseIntError;

use crate::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// A migration list: (version, SQL).
pub type Migrations = &'static [(&'static str, &'static str)];

/// Schema of the robots.txt cache database.
///
/// Migrations must be applied in order. The version number is an
/// incrementing integer used to track which migrations have been applied.
/// All migrations are idempotent using CREATE IF NOT EXISTS.
pub const CACHE_MIGRATIONS: Migrations = &[("1", include_str!("../migrations/cache/001_robots_cache.sql"))];

/// Schema of the override rule database.
pub const RULE_MIGRATIONS: Migrations = &[
    ("1", include_str!("../migrations/rules/001_custom_rules.sql")),
    ("2", include_str!("../migrations/rules/002_api_keys.sql")),
];

/// Pragmas applied to every connection we open.
pub(crate) const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA busy_timeout=5000;
     PRAGMA foreign_keys=ON;";

/// Apply connection pragmas.
pub(crate) async fn apply_pragmas(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch(PRAGMAS) })
    .await
    .map_err(Error::Database)
}

/// Run any pending migrations from `migrations`.
///
/// This creates the _migrations table if it doesn't exist, checks the
/// current version, and applies any migrations that haven't been run yet.
///
/// # Errors
///
/// Returns an error if a migration SQL fails to execute.
pub async fn run(conn: &Connection, migrations: Migrations) -> Result<(), Error> {
    conn.call(move |conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(Error::from)?;

        let current: i64 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| {
                row.get(0)
            })
            .map_err(Error::from)?;

        for (version, sql) in migrations {
            let version_num: i64 = version
                .parse()
                .map_err(|e: ParseIntError| Error::MigrationFailed(e.to_string()))?;
            if version_num > current {
                conn.execute_batch(sql)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version_num, chrono::Utc::now().to_rfc3339()],
                )
                .map_err(Error::from)?;
                tracing::debug!(version = version_num, "applied migration");
            }
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
