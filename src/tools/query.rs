//! Read-only query tool.
//!
//! This module implements the `mysql_query` MCP tool. Only statements that
//! start with SELECT, SHOW, DESCRIBE, DESC or EXPLAIN get through; everything
//! else is rejected before a pool is touched.

use crate::config::{ConnectionResolver, MAX_DISPLAY_ROWS};
use crate::db::{JsonRow, PoolRegistry, QueryExecutor};
use crate::models::ConnectionOverrides;
use crate::tools::sql_validator;
use crate::tools::translate::{ErrorOutput, TimeoutPolicy, translate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL query (SELECT, SHOW, DESCRIBE, EXPLAIN only)
    pub sql: String,
    #[serde(flatten)]
    pub connection: ConnectionOverrides,
}

/// Output from the query tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryOutput {
    /// Resolved target, `user@host:port/database`
    pub connection: String,
    /// Rows the statement produced, before truncation
    pub total_rows: usize,
    pub rows: Vec<JsonRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Cap a result set for display.
///
/// Returns the true row count, at most `cap` rows, and a warning when rows
/// were dropped.
pub fn shape_rows(mut rows: Vec<JsonRow>, cap: usize) -> (usize, Vec<JsonRow>, Option<String>) {
    let total_rows = rows.len();
    if total_rows <= cap {
        return (total_rows, rows, None);
    }

    rows.truncate(cap);
    let warning = format!(
        "Results truncated to {} rows (total: {}). Add LIMIT to your query for specific ranges.",
        cap, total_rows
    );
    (total_rows, rows, Some(warning))
}

/// Handler for query execution.
pub struct QueryToolHandler {
    registry: Arc<PoolRegistry>,
    resolver: Arc<ConnectionResolver>,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    pub fn new(registry: Arc<PoolRegistry>, resolver: Arc<ConnectionResolver>) -> Self {
        Self::with_executor(registry, resolver, QueryExecutor::new())
    }

    /// Create a handler with custom executor settings.
    pub fn with_executor(
        registry: Arc<PoolRegistry>,
        resolver: Arc<ConnectionResolver>,
        executor: QueryExecutor,
    ) -> Self {
        Self {
            registry,
            resolver,
            executor,
        }
    }

    /// Handle the query tool call.
    ///
    /// Validation runs before pool lookup, so a rejected statement never
    /// creates a pool or opens a connection.
    pub async fn query(&self, input: QueryInput) -> Result<QueryOutput, ErrorOutput> {
        let descriptor = self.resolver.resolve(&input.connection);
        let connection = descriptor.describe();
        let fail = |e| translate(e, &connection, TimeoutPolicy::Classify);

        sql_validator::validate_readonly(&input.sql).map_err(fail)?;

        let pool = self.registry.get_pool(&descriptor).await;
        let rows = match self.executor.fetch_rows(&pool, &input.sql).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(connection = %connection, error = %e, "Query failed");
                return Err(fail(e));
            }
        };

        let (total_rows, rows, warning) = shape_rows(rows, MAX_DISPLAY_ROWS);
        if warning.is_some() {
            warn!(
                connection = %connection,
                total_rows = total_rows,
                shown = rows.len(),
                "Query result truncated"
            );
        }

        info!(
            connection = %connection,
            total_rows = total_rows,
            truncated = warning.is_some(),
            "Query executed"
        );

        Ok(QueryOutput {
            connection,
            total_rows,
            rows,
            warning,
        })
    }
}
