//! Statement execution.
//!
//! Every statement runs under a fixed execution timeout so a caller can never
//! hold a pooled connection indefinitely. Statements are sent without bind
//! parameters, which keeps them on MySQL's text protocol and lets `SHOW`,
//! `DESCRIBE` and DDL through unchanged.

use crate::config::QUERY_TIMEOUT_SECS;
use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use serde_json::Value as JsonValue;
use sqlx::Executor;
use sqlx::mysql::MySqlRow;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// A decoded result row, keyed by column name in column order.
pub type JsonRow = serde_json::Map<String, JsonValue>;

/// Metadata returned by a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub execution_time_ms: u64,
}

/// Runs statements against a pool.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    statement_timeout: Duration,
}

impl QueryExecutor {
    /// Create an executor with the fixed 30 second statement budget.
    pub fn new() -> Self {
        Self {
            statement_timeout: Duration::from_secs(QUERY_TIMEOUT_SECS),
        }
    }

    /// Create an executor with a custom statement budget.
    pub fn with_timeout(statement_timeout: Duration) -> Self {
        Self { statement_timeout }
    }

    pub fn statement_timeout(&self) -> Duration {
        self.statement_timeout
    }

    /// Run a statement and decode every row it returns.
    pub async fn fetch_rows(&self, pool: &DbPool, sql: &str) -> DbResult<Vec<JsonRow>> {
        let rows = self.fetch_raw(pool, sql).await?;
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    /// Run a statement and return the driver rows undecoded.
    pub async fn fetch_raw(&self, pool: &DbPool, sql: &str) -> DbResult<Vec<MySqlRow>> {
        let start = Instant::now();
        debug!(
            sql = %sql,
            timeout_secs = self.statement_timeout.as_secs(),
            "Executing query"
        );

        let result = timeout(self.statement_timeout, pool.inner().fetch_all(sql)).await;
        let rows = match result {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => return Err(diagnose(pool, DbError::from(e)).await),
            Err(_) => {
                warn!(
                    timeout_secs = self.statement_timeout.as_secs(),
                    "Query exceeded execution timeout"
                );
                return Err(DbError::statement_timeout());
            }
        };

        debug!(
            row_count = rows.len(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query returned"
        );
        Ok(rows)
    }

    /// Execute a write statement and report its metadata.
    pub async fn execute_write(&self, pool: &DbPool, sql: &str) -> DbResult<WriteSummary> {
        let start = Instant::now();
        debug!(
            sql = %sql,
            timeout_secs = self.statement_timeout.as_secs(),
            "Executing write operation"
        );

        let result = timeout(self.statement_timeout, pool.inner().execute(sql)).await;
        match result {
            Ok(Ok(r)) => Ok(WriteSummary {
                affected_rows: r.rows_affected(),
                last_insert_id: r.last_insert_id(),
                execution_time_ms: start.elapsed().as_millis() as u64,
            }),
            Ok(Err(e)) => Err(diagnose(pool, DbError::from(e)).await),
            Err(_) => {
                warn!(
                    timeout_secs = self.statement_timeout.as_secs(),
                    "Write operation exceeded execution timeout"
                );
                Err(DbError::statement_timeout())
            }
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace an ambiguous pool timeout with the underlying connect failure.
///
/// The pool keeps retrying refused connections until its deadline, so a
/// dead server and a saturated pool look the same from the outside.
async fn diagnose(pool: &DbPool, err: DbError) -> DbError {
    if !err.is_pool_timeout() {
        return err;
    }

    let connect_timeout = pool.inner().options().get_acquire_timeout();
    let cause = pool.diagnose_timeout(connect_timeout).await;
    if !cause.is_pool_timeout() {
        debug!(error = %cause, "Pool timeout traced to connect failure");
    }
    cause
}
