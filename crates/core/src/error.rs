//! Unified error types for crawlgate.
//!
//! Every variant renders as a stable category phrase followed by the
//! underlying cause, so callers can surface the text verbatim.

use deadpool::managed::PoolError;
use tokio_rusqlite::rusqlite;

/// Unified error types for the crawlgate services.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed required input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Override rule lookup miss.
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate domain or a concurrent modification of the same rule.
    #[error("conflict: {0}")]
    Conflict(String),

    /// robots.txt could not be retrieved at the transport level.
    #[error("upstream unavailable: {0}")]
    Upstream(String),

    /// Storage backend failure outside of SQLite itself (pool, timeouts).
    #[error("store error: {0}")]
    Store(String),

    /// Database operation failed.
    #[error("store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("store error: migration failed: {0}")]
    MigrationFailed(String),
}

impl Error {
    /// True when the error is a lookup miss rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<PoolError<tokio_rusqlite::Error>> for Error {
    fn from(err: PoolError<tokio_rusqlite::Error>) -> Self {
        Error::Store(format!("connection pool: {err}"))
    }
}
