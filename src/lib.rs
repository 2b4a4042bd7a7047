//! MySQL MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to query, modify and inspect MySQL databases. Connection pools are shared
//! per (host, port, user, database) identity for the lifetime of the process.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::{Config, ConnectionResolver};
pub use db::PoolRegistry;
pub use error::DbError;
pub use mcp::MySqlService;
