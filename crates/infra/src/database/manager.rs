//! Pooled SQLite connection management

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use timeguard_domain::{Result, TimeGuardError};
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS issues (
    id TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL,
    date TEXT NOT NULL,
    kind TEXT NOT NULL,
    severity TEXT NOT NULL,
    status TEXT NOT NULL,
    payload TEXT NOT NULL,
    detected_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_issues_employee_date ON issues (employee_id, date);
CREATE INDEX IF NOT EXISTS idx_issues_status ON issues (status);
";

/// Shared connection pool with schema bootstrap.
pub struct DbManager {
    pool: Pool<SqliteConnectionManager>,
}

impl DbManager {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref());
        Self::build(manager, 8)
    }

    /// Fresh in-memory database, one connection so every query sees the
    /// same data. Intended for tests and demos.
    pub fn in_memory() -> Result<Self> {
        Self::build(SqliteConnectionManager::memory(), 1)
    }

    fn build(manager: SqliteConnectionManager, max_size: u32) -> Result<Self> {
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e| TimeGuardError::Storage(format!("failed to build pool: {e}")))?;

        let conn = pool
            .get()
            .map_err(|e| TimeGuardError::Storage(format!("failed to get connection: {e}")))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| TimeGuardError::Storage(format!("failed to apply schema: {e}")))?;

        info!("issue store schema ready");
        Ok(Self { pool })
    }

    /// Borrow a pooled connection.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| TimeGuardError::Storage(format!("failed to get connection: {e}")))
    }
}
