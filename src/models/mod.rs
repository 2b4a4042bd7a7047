//! Data models for the MySQL MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod connection;

pub use connection::{ConnectionDescriptor, ConnectionOverrides, NO_DATABASE, PoolKey};
