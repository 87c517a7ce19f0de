//! Pooled connections to the rule database.
//!
//! Each pooled object is a tokio-rusqlite [`Connection`] with its own
//! background thread. Pragmas are applied when a connection is created,
//! connections past their configured lifetime are discarded on recycle, and
//! migrations run once when the pool is opened.

use std::path::PathBuf;
use std::time::Duration;

use deadpool::Runtime;
use deadpool::managed::{self, Metrics, Pool, RecycleError, RecycleResult};
use tokio_rusqlite::{Connection, rusqlite};

use crate::Error;
use crate::config::DatabaseConfig;
use crate::migrations::{self, PRAGMAS, RULE_MIGRATIONS};

enum Target {
    File(PathBuf),
    Memory,
}

/// deadpool manager producing SQLite connections.
pub struct ConnectionManager {
    target: Target,
    max_lifetime: Duration,
}

impl managed::Manager for ConnectionManager {
    type Type = Connection;
    type Error = tokio_rusqlite::Error;

    async fn create(&self) -> Result<Connection, tokio_rusqlite::Error> {
        let conn = match &self.target {
            Target::File(path) => Connection::open(path).await?,
            Target::Memory => Connection::open_in_memory().await?,
        };
        conn.call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch(PRAGMAS) })
            .await?;
        tracing::debug!("opened rule database connection");
        Ok(conn)
    }

    async fn recycle(&self, conn: &mut Connection, metrics: &Metrics) -> RecycleResult<tokio_rusqlite::Error> {
        if metrics.age() > self.max_lifetime {
            tracing::debug!(age_secs = metrics.age().as_secs(), "retiring rule database connection");
            return Err(RecycleError::message("connection exceeded its max lifetime"));
        }
        conn.call(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await?;
        Ok(())
    }
}

/// Handle to the rule database.
///
/// Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct RuleDb {
    pool: Pool<ConnectionManager>,
    query_timeout: Duration,
}

impl RuleDb {
    /// Open (creating if needed) the rule database described by `config`.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, Error> {
        let manager = ConnectionManager { target: Target::File(config.path.clone()), max_lifetime: config.conn_max_lifetime() };
        Self::build(manager, config.max_connections, config).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool
    /// holds a single connection.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let config = DatabaseConfig::default();
        let manager = ConnectionManager { target: Target::Memory, max_lifetime: Duration::MAX };
        Self::build(manager, 1, &config).await
    }

    async fn build(manager: ConnectionManager, max_size: usize, config: &DatabaseConfig) -> Result<Self, Error> {
        let pool = Pool::builder(manager)
            .max_size(max_size)
            .wait_timeout(Some(config.acquire_timeout()))
            .create_timeout(Some(config.acquire_timeout()))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| Error::Store(format!("failed to build connection pool: {e}")))?;

        let db = Self { pool, query_timeout: config.query_timeout() };

        let conn = db.pool.get().await?;
        migrations::run(&conn, RULE_MIGRATIONS).await?;

        Ok(db)
    }

    /// Run `function` on a pooled connection, bounded by the query timeout.
    pub(crate) async fn call<F, R>(&self, function: F) -> Result<R, Error>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, Error> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.pool.get().await?;
        match tokio::time::timeout(self.query_timeout, conn.call(function)).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Store(format!("query timed out after {}ms", self.query_timeout.as_millis()))),
        }
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), Error> {
        self.call(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    /// Current pool size and idle count.
    pub fn status(&self) -> managed::Status {
        self.pool.status()
    }

    /// Stop handing out connections and drop the idle ones.
    pub fn close(&self) {
        self.pool.close();
    }
}
