//! Schema introspection tool.
//!
//! This module implements the `mysql_schema` MCP tool with three actions:
//! `list_databases`, `list_tables` and `describe_table`. The introspection
//! statements are fixed templates and skip the statement gates.

use crate::config::ConnectionResolver;
use crate::db::{JsonRow, PoolRegistry, SchemaInspector};
use crate::error::DbError;
use crate::models::{ConnectionDescriptor, ConnectionOverrides};
use crate::tools::translate::{ErrorOutput, TimeoutPolicy, translate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

mod error_messages {
    pub const NO_DATABASE: &str = "No database specified. Provide the \"database\" parameter or set MYSQL_DATABASE env var.";
    pub const NO_TABLE: &str = "The \"table\" parameter is required for describe_table action.";
}

/// Input for the schema tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SchemaInput {
    /// Action: list_databases, list_tables, or describe_table
    #[schemars(extend("enum" = ["list_databases", "list_tables", "describe_table"]))]
    pub action: String,
    /// Target database (for list_tables / describe_table). Also selects the connection's default database.
    #[serde(default)]
    pub database: Option<String>,
    /// Target table (required for describe_table)
    #[serde(default)]
    pub table: Option<String>,
    /// Override default MySQL host
    #[serde(default)]
    pub host: Option<String>,
    /// Override default MySQL port
    #[serde(default)]
    pub port: Option<u16>,
    /// Override default MySQL user
    #[serde(default)]
    pub user: Option<String>,
    /// Override default MySQL password
    #[serde(default)]
    pub password: Option<String>,
}

impl SchemaInput {
    /// Connection overrides carried by this request; `database` is one of them.
    pub fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            database: self.database.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaAction {
    ListDatabases,
    ListTables,
    DescribeTable,
}

impl FromStr for SchemaAction {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list_databases" => Ok(Self::ListDatabases),
            "list_tables" => Ok(Self::ListTables),
            "describe_table" => Ok(Self::DescribeTable),
            other => Err(DbError::validation(format!("Unknown action: {}", other))),
        }
    }
}

impl std::fmt::Display for SchemaAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListDatabases => write!(f, "list_databases"),
            Self::ListTables => write!(f, "list_tables"),
            Self::DescribeTable => write!(f, "describe_table"),
        }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListDatabasesOutput {
    pub connection: String,
    pub databases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    pub connection: String,
    pub database: String,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub connection: String,
    /// `database.table` when a database is known, otherwise the bare table name
    pub table: String,
    /// Rows of `DESCRIBE`
    pub columns: Vec<JsonRow>,
    /// Rows of `SHOW INDEX`
    pub indexes: Vec<JsonRow>,
    pub create_statement: String,
}

/// Output from the schema tool, shaped by action.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum SchemaOutput {
    Databases(ListDatabasesOutput),
    Tables(ListTablesOutput),
    Table(DescribeTableOutput),
}

/// A schema request whose parameters have been checked.
enum Plan {
    ListDatabases,
    ListTables { database: String },
    DescribeTable { database: Option<String>, table: String },
}

/// Check action and parameters without touching the database.
fn plan(input: &SchemaInput, descriptor: &ConnectionDescriptor) -> Result<Plan, DbError> {
    let action: SchemaAction = input.action.parse()?;
    let database = descriptor.database().map(str::to_string);

    match action {
        SchemaAction::ListDatabases => Ok(Plan::ListDatabases),
        SchemaAction::ListTables => database
            .map(|database| Plan::ListTables { database })
            .ok_or_else(|| DbError::validation(error_messages::NO_DATABASE)),
        SchemaAction::DescribeTable => {
            let table = input
                .table
                .as_deref()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| DbError::validation(error_messages::NO_TABLE))?;
            Ok(Plan::DescribeTable {
                database,
                table: table.to_string(),
            })
        }
    }
}

/// Handler for schema introspection.
pub struct SchemaToolHandler {
    registry: Arc<PoolRegistry>,
    resolver: Arc<ConnectionResolver>,
    inspector: SchemaInspector,
}

impl SchemaToolHandler {
    pub fn new(registry: Arc<PoolRegistry>, resolver: Arc<ConnectionResolver>) -> Self {
        Self {
            registry,
            resolver,
            inspector: SchemaInspector::default(),
        }
    }

    /// Handle the schema tool call.
    ///
    /// Unknown actions and missing parameters come back as error envelopes
    /// before any pool is created.
    pub async fn schema(&self, input: SchemaInput) -> Result<SchemaOutput, ErrorOutput> {
        let descriptor = self.resolver.resolve(&input.overrides());
        let connection = descriptor.describe();
        let fail = |e| translate(e, &connection, TimeoutPolicy::Generic);

        let plan = plan(&input, &descriptor).map_err(fail)?;
        let pool = self.registry.get_pool(&descriptor).await;

        let result = match plan {
            Plan::ListDatabases => self
                .inspector
                .list_databases(&pool)
                .await
                .map(|databases| {
                    SchemaOutput::Databases(ListDatabasesOutput {
                        connection: connection.clone(),
                        databases,
                    })
                }),
            Plan::ListTables { database } => self
                .inspector
                .list_tables(&pool, &database)
                .await
                .map(|tables| {
                    SchemaOutput::Tables(ListTablesOutput {
                        connection: connection.clone(),
                        database,
                        tables,
                    })
                }),
            Plan::DescribeTable { database, table } => self
                .inspector
                .describe_table(&pool, database.as_deref(), &table)
                .await
                .map(|description| {
                    let table = match &database {
                        Some(db) => format!("{}.{}", db, table),
                        None => table,
                    };
                    SchemaOutput::Table(DescribeTableOutput {
                        connection: connection.clone(),
                        table,
                        columns: description.columns,
                        indexes: description.indexes,
                        create_statement: description.create_statement,
                    })
                }),
        };

        match result {
            Ok(output) => {
                info!(connection = %connection, action = %input.action, "Schema action completed");
                Ok(output)
            }
            Err(e) => {
                warn!(connection = %connection, action = %input.action, error = %e, "Schema action failed");
                Err(fail(e))
            }
        }
    }
}
