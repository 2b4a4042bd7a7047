//! Write operation tool.
//!
//! This module implements the `mysql_execute` MCP tool. Any single statement
//! is accepted: INSERT, UPDATE, DELETE, DDL, even reads.

use crate::config::ConnectionResolver;
use crate::db::{PoolRegistry, QueryExecutor, WriteSummary};
use crate::models::ConnectionOverrides;
use crate::tools::sql_validator;
use crate::tools::translate::{ErrorOutput, TimeoutPolicy, translate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for the execute tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteInput {
    /// SQL statement (INSERT, UPDATE, DELETE, CREATE, ALTER, DROP, etc.)
    pub sql: String,
    #[serde(flatten)]
    pub connection: ConnectionOverrides,
}

/// Output from the execute tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ExecuteOutput {
    pub connection: String,
    /// Number of rows affected by the operation
    pub affected_rows: u64,
    /// Same as `affected_rows`: rows matched by the statement, including
    /// rows an UPDATE left unchanged
    pub changed_rows: u64,
    /// Auto-increment id generated by the statement, 0 if none
    pub insert_id: u64,
    pub info: String,
}

impl ExecuteOutput {
    /// The driver reports one count, matched rows, and no info line, so
    /// `changed_rows` repeats it and `info` stays empty.
    pub fn from_summary(connection: String, summary: WriteSummary) -> Self {
        Self {
            connection,
            affected_rows: summary.affected_rows,
            changed_rows: summary.affected_rows,
            insert_id: summary.last_insert_id,
            info: String::new(),
        }
    }
}

pub struct WriteToolHandler {
    registry: Arc<PoolRegistry>,
    resolver: Arc<ConnectionResolver>,
    executor: QueryExecutor,
}

impl WriteToolHandler {
    pub fn new(registry: Arc<PoolRegistry>, resolver: Arc<ConnectionResolver>) -> Self {
        Self {
            registry,
            resolver,
            executor: QueryExecutor::new(),
        }
    }

    pub async fn execute(&self, input: ExecuteInput) -> Result<ExecuteOutput, ErrorOutput> {
        let descriptor = self.resolver.resolve(&input.connection);
        let connection = descriptor.describe();
        let fail = |e| translate(e, &connection, TimeoutPolicy::Generic);

        sql_validator::validate_write(&input.sql).map_err(fail)?;

        let pool = self.registry.get_pool(&descriptor).await;
        let summary = match self.executor.execute_write(&pool, &input.sql).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(connection = %connection, error = %e, "Write operation failed");
                return Err(fail(e));
            }
        };

        info!(
            connection = %connection,
            affected_rows = summary.affected_rows,
            insert_id = summary.last_insert_id,
            execution_time_ms = summary.execution_time_ms,
            "Write operation executed"
        );

        Ok(ExecuteOutput::from_summary(connection, summary))
    }
}
