//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod lineage;
pub mod pool;
pub mod space;
pub mod template;
pub mod workflow;

use chrono::{DateTime, Utc};

use botmaas_types::error::RepositoryError;

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Errors worth retrying: pool exhaustion, I/O, and a busy writer lock.
fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db_err) => db_err.message().contains("database is locked"),
        _ => false,
    }
}

/// Map a sqlx error from a write, turning UNIQUE violations into `Conflict`.
pub(crate) fn map_write_error(e: sqlx::Error, conflict: impl FnOnce() -> String) -> RepositoryError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict(conflict())
        }
        ref other if is_transient(other) => RepositoryError::Connection,
        other => RepositoryError::Query(other.to_string()),
    }
}

pub(crate) fn map_read_error(e: sqlx::Error) -> RepositoryError {
    if is_transient(&e) {
        return RepositoryError::Connection;
    }
    RepositoryError::Query(e.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::pool::DatabasePool;

    pub async fn test_pool() -> DatabasePool {
        test_pool_with_url().await.0
    }

    /// A fresh pool plus its URL, for tests that open a second connection.
    pub async fn test_pool_with_url() -> (DatabasePool, String) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        (DatabasePool::new(&url).await.unwrap(), url)
    }
}
