//! Connection-related data models.
//!
//! This module defines the per-call connection overrides, the fully resolved
//! connection descriptor, and the identity key pools are shared under.

use schemars::JsonSchema;
use serde::Deserialize;

/// Placeholder rendered when a descriptor has no default database.
pub const NO_DATABASE: &str = "(no database)";

/// Optional per-call connection parameters.
///
/// Empty strings and a zero port count as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct ConnectionOverrides {
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
    /// Override default MySQL database
    #[serde(default)]
    pub database: Option<String>,
}

/// A complete, concrete set of connection parameters.
///
/// `database` may be empty, meaning "no default schema".
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Sensitive - never logged or rendered
    pub password: String,
    pub database: String,
}

impl ConnectionDescriptor {
    /// Identity used for pool sharing. The password is not part of it.
    pub fn pool_key(&self) -> PoolKey {
        PoolKey {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            database: self.database.clone(),
        }
    }

    /// Diagnostic description: `user@host:port/database`.
    pub fn describe(&self) -> String {
        let database = if self.database.is_empty() {
            NO_DATABASE
        } else {
            &self.database
        };
        format!("{}@{}:{}/{}", self.user, self.host, self.port, database)
    }

    /// Default database, if any.
    pub fn database(&self) -> Option<&str> {
        Some(self.database.as_str()).filter(|d| !d.is_empty())
    }
}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Pool identity tuple: (host, port, user, database).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub database: String,
}

impl std::fmt::Display for PoolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}:{}", self.host, self.port, self.user, self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(password: &str, database: &str) -> ConnectionDescriptor {
        ConnectionDescriptor {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: password.to_string(),
            database: database.to_string(),
        }
    }

    #[test]
    fn test_describe_with_database() {
        assert_eq!(descriptor("pw", "shop").describe(), "root@localhost:3306/shop");
    }

    #[test]
    fn test_describe_without_database() {
        assert_eq!(
            descriptor("pw", "").describe(),
            "root@localhost:3306/(no database)"
        );
    }

    #[test]
    fn test_password_never_rendered() {
        let d = descriptor("hunter2", "shop");
        assert!(!d.to_string().contains("hunter2"));
        assert!(!format!("{:?}", d).contains("hunter2"));
    }

    #[test]
    fn test_pool_key_ignores_password() {
        assert_eq!(
            descriptor("old", "shop").pool_key(),
            descriptor("rotated", "shop").pool_key()
        );
        assert_ne!(
            descriptor("pw", "shop").pool_key(),
            descriptor("pw", "crm").pool_key()
        );
    }

    #[test]
    fn test_pool_key_display() {
        assert_eq!(
            descriptor("pw", "shop").pool_key().to_string(),
            "localhost:3306:root:shop"
        );
    }

    #[test]
    fn test_overrides_deserialize_partial() {
        let o: ConnectionOverrides =
            serde_json::from_str(r#"{"host": "replica", "port": 3307}"#).unwrap();
        assert_eq!(o.host.as_deref(), Some("replica"));
        assert_eq!(o.port, Some(3307));
        assert!(o.user.is_none());
    }
}
