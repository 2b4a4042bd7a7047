//! MCP service implementation using rmcp.
//!
//! This module defines the MySqlService struct with the three MySQL tools
//! exposed via the MCP protocol using the rmcp framework's macros.
//!
//! Every call produces one pretty-printed JSON text block. Failures are
//! returned as error envelopes with the tool result's `isError` flag set;
//! they never become protocol errors.

use crate::config::ConnectionResolver;
use crate::db::PoolRegistry;
use crate::tools::query::{QueryInput, QueryToolHandler};
use crate::tools::schema::{SchemaInput, SchemaToolHandler};
use crate::tools::translate::ErrorOutput;
use crate::tools::write::{ExecuteInput, WriteToolHandler};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct MySqlService {
    /// Pools shared by every session of this process
    registry: Arc<PoolRegistry>,
    resolver: Arc<ConnectionResolver>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl MySqlService {
    pub fn new(registry: Arc<PoolRegistry>, resolver: Arc<ConnectionResolver>) -> Self {
        Self {
            registry,
            resolver,
            tool_router: Self::tool_router(),
        }
    }
}

/// Render a handler outcome as a single JSON text block.
fn render<T: Serialize>(outcome: Result<T, ErrorOutput>) -> Result<CallToolResult, McpError> {
    let (text, is_error) = match outcome {
        Ok(output) => (serde_json::to_string_pretty(&output), false),
        Err(envelope) => (serde_json::to_string_pretty(&envelope), true),
    };
    let text = text.map_err(|e| {
        McpError::internal_error(format!("Failed to serialize tool result: {}", e), None)
    })?;

    let content = vec![Content::text(text)];
    Ok(if is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    })
}

#[tool_router]
impl MySqlService {
    #[tool(
        description = "Execute a read-only SQL query against MySQL.\nOnly SELECT, SHOW, DESCRIBE, and EXPLAIN statements are allowed; one statement per call.\nResults are capped at 1000 rows; total_rows reports the full count.\nConnection parameters default to the MYSQL_* environment variables and can be overridden per call."
    )]
    async fn mysql_query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = QueryToolHandler::new(self.registry.clone(), self.resolver.clone());
        render(handler.query(input).await)
    }

    #[tool(
        description = "Execute a write SQL statement against MySQL (INSERT, UPDATE, DELETE, CREATE, ALTER, DROP, etc.).\nOne statement per call.\nReturns affected_rows, changed_rows, insert_id and info.\naffected_rows counts matched rows, including rows an UPDATE left unchanged; changed_rows repeats it."
    )]
    async fn mysql_execute(
        &self,
        Parameters(input): Parameters<ExecuteInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = WriteToolHandler::new(self.registry.clone(), self.resolver.clone());
        render(handler.execute(input).await)
    }

    #[tool(
        description = "Inspect MySQL schema.\nActions: list_databases, list_tables (needs a database), describe_table (needs a table; returns columns, indexes and the CREATE statement).\nThe database parameter falls back to MYSQL_DATABASE."
    )]
    async fn mysql_schema(
        &self,
        Parameters(input): Parameters<SchemaInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.registry.clone(), self.resolver.clone());
        render(handler.schema(input).await)
    }
}

#[tool_handler]
impl ServerHandler for MySqlService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mysql-mcp-server".to_owned(),
                title: Some("MySQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "MySQL tools for querying and modifying databases.\n\
                \n\
                ## Tools\n\
                - `mysql_query`: read-only statements (SELECT, SHOW, DESCRIBE, EXPLAIN)\n\
                - `mysql_execute`: any other single statement\n\
                - `mysql_schema`: list_databases, list_tables, describe_table\n\
                \n\
                ## Connections\n\
                Every tool accepts optional host, port, user, password and database.\n\
                Missing values come from MYSQL_HOST, MYSQL_PORT, MYSQL_USER, MYSQL_PASSWORD\n\
                and MYSQL_DATABASE. Every response names the connection it ran against.\n\
                \n\
                ## Limits\n\
                - One statement per call; a trailing `;` is fine\n\
                - Statements time out after 30 seconds\n\
                - Query results are capped at 1000 rows; add LIMIT for specific ranges"
                    .to_string(),
            ),
        }
    }
}
