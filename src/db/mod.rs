//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection pool registry
//! - Statement execution under a fixed timeout
//! - Schema introspection and identifier quoting
//! - Row to JSON conversion

pub mod executor;
pub mod pool;
pub mod schema;
pub mod types;

pub use executor::{JsonRow, QueryExecutor, WriteSummary};
pub use pool::{DbPool, PoolRegistry};
pub use schema::{SchemaInspector, TableDescription, qualified_table, quote_identifier};
