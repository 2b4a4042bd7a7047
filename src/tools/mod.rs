//! MCP tool implementations.
//!
//! This module contains the MySQL tool handlers:
//! - `query`: Execute read-only statements (`mysql_query`)
//! - `write`: Execute any single statement (`mysql_execute`)
//! - `schema`: List databases and tables, describe a table (`mysql_schema`)
//! - `sql_validator`: Statement gating shared by the query and write tools
//! - `translate`: Failure classification into error envelopes

pub mod query;
pub mod schema;
pub mod sql_validator;
pub mod translate;
pub mod write;

pub use query::{QueryInput, QueryOutput, QueryToolHandler};
pub use schema::{SchemaAction, SchemaInput, SchemaOutput, SchemaToolHandler};
pub use translate::{ErrorOutput, FailureClass, TimeoutPolicy};
pub use write::{ExecuteInput, ExecuteOutput, WriteToolHandler};
