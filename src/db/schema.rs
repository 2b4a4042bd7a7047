//! Schema introspection statements.
//!
//! The statements here are fixed templates and bypass the statement gates.
//! `describe_table` and `list_tables` are the only places where caller-supplied
//! identifiers are interpolated into SQL text, and they go through
//! [`quote_identifier`] without exception.

use crate::db::executor::{JsonRow, QueryExecutor};
use crate::db::pool::DbPool;
use crate::db::types::get_string_by_index;
use crate::error::{DbError, DbResult};
use tracing::debug;

mod queries {
    pub const LIST_DATABASES: &str = "SHOW DATABASES";
}

/// Quote a MySQL identifier with backticks.
///
/// Embedded backticks are doubled, which is the only escape MySQL honors
/// inside a quoted identifier. Empty names and NUL characters can never name
/// a real object and are rejected.
pub fn quote_identifier(name: &str) -> DbResult<String> {
    if name.is_empty() {
        return Err(DbError::validation("Identifier cannot be empty."));
    }
    if name.contains('\0') {
        return Err(DbError::validation(
            "Identifier cannot contain NUL characters.",
        ));
    }
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Build a table reference, qualified by database when one is given.
pub fn qualified_table(database: Option<&str>, table: &str) -> DbResult<String> {
    let table = quote_identifier(table)?;
    match database {
        Some(db) => Ok(format!("{}.{}", quote_identifier(db)?, table)),
        None => Ok(table),
    }
}

/// Everything `describe_table` reports.
#[derive(Debug, Clone)]
pub struct TableDescription {
    pub columns: Vec<JsonRow>,
    pub indexes: Vec<JsonRow>,
    pub create_statement: String,
}

/// Schema inspector running the fixed introspection statements.
#[derive(Debug, Clone, Default)]
pub struct SchemaInspector {
    executor: QueryExecutor,
}

impl SchemaInspector {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// List all databases visible to the connected user.
    pub async fn list_databases(&self, pool: &DbPool) -> DbResult<Vec<String>> {
        let rows = self
            .executor
            .fetch_raw(pool, queries::LIST_DATABASES)
            .await?;
        // SHOW DATABASES returns a single column "Database"
        let databases: Vec<String> = rows
            .iter()
            .filter_map(|row| get_string_by_index(row, 0))
            .collect();

        debug!(count = databases.len(), "Listed databases");
        Ok(databases)
    }

    /// List the tables of one database.
    pub async fn list_tables(&self, pool: &DbPool, database: &str) -> DbResult<Vec<String>> {
        let sql = format!("SHOW TABLES FROM {}", quote_identifier(database)?);
        let rows = self.executor.fetch_raw(pool, &sql).await?;
        // Single column named "Tables_in_<database>"
        let tables: Vec<String> = rows
            .iter()
            .filter_map(|row| get_string_by_index(row, 0))
            .collect();

        debug!(database = %database, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Describe a table: columns, indexes and its CREATE statement.
    pub async fn describe_table(
        &self,
        pool: &DbPool,
        database: Option<&str>,
        table: &str,
    ) -> DbResult<TableDescription> {
        let qualified = qualified_table(database, table)?;

        let columns = self
            .executor
            .fetch_rows(pool, &format!("DESCRIBE {}", qualified))
            .await?;
        let indexes = self
            .executor
            .fetch_rows(pool, &format!("SHOW INDEX FROM {}", qualified))
            .await?;
        let create_rows = self
            .executor
            .fetch_raw(pool, &format!("SHOW CREATE TABLE {}", qualified))
            .await?;
        // Columns are "Table" and "Create Table" (or "View"/"Create View")
        let create_statement = create_rows
            .first()
            .and_then(|row| get_string_by_index(row, 1))
            .unwrap_or_default();

        debug!(
            table = %qualified,
            columns = columns.len(),
            indexes = indexes.len(),
            "Described table"
        );

        Ok(TableDescription {
            columns,
            indexes,
            create_statement,
        })
    }
}
