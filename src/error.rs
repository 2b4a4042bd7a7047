//! Error types for the MySQL MCP Server.
//!
//! Failures fall into two families: validation errors, raised before any
//! network interaction, and driver errors, raised by a database round-trip.
//! Driver errors carry the three inputs the error translator classifies on
//! (symbolic code, message, timeout flag) so that no driver-specific type
//! leaks past this module.

use thiserror::Error;

/// Code reported when a statement exceeds its execution budget.
pub const TIMEOUT_CODE: &str = "PROTOCOL_SEQUENCE_TIMEOUT";

/// Code reported when no pooled connection became available in time.
pub const POOL_TIMEOUT_CODE: &str = "POOL_TIMEOUT";

#[derive(Error, Debug, Clone)]
pub enum DbError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Driver {
        /// Symbolic error code, e.g. "ER_ACCESS_DENIED_ERROR" or "ECONNREFUSED"
        code: Option<String>,
        message: String,
        timed_out: bool,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a driver error.
    pub fn driver(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            code,
            message: message.into(),
            timed_out: false,
        }
    }

    /// Create the error reported when a statement runs past its timeout.
    pub fn statement_timeout() -> Self {
        Self::Driver {
            code: Some(TIMEOUT_CODE.to_string()),
            message: "Query inactivity timeout".to_string(),
            timed_out: true,
        }
    }

    /// Create the error reported when the pool stayed saturated.
    pub fn pool_timeout(waited_secs: u64) -> Self {
        Self::Driver {
            code: Some(POOL_TIMEOUT_CODE.to_string()),
            message: format!(
                "Timed out after {}s waiting for a free connection (pool timeout)",
                waited_secs
            ),
            timed_out: true,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Symbolic error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Driver { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True if this error was raised before contacting the database.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// True if the pool gave up acquiring a connection.
    pub fn is_pool_timeout(&self) -> bool {
        self.code() == Some(POOL_TIMEOUT_CODE)
    }
}

/// Symbolic names for the MySQL server error numbers callers run into most.
fn mysql_error_name(number: u16) -> Option<&'static str> {
    let name = match number {
        1044 => "ER_DBACCESS_DENIED_ERROR",
        1045 => "ER_ACCESS_DENIED_ERROR",
        1049 => "ER_BAD_DB_ERROR",
        1054 => "ER_BAD_FIELD_ERROR",
        1062 => "ER_DUP_ENTRY",
        1064 => "ER_PARSE_ERROR",
        1142 => "ER_TABLEACCESS_DENIED_ERROR",
        1146 => "ER_NO_SUCH_TABLE",
        1205 => "ER_LOCK_WAIT_TIMEOUT",
        1213 => "ER_LOCK_DEADLOCK",
        1317 => "ER_QUERY_INTERRUPTED",
        1698 => "ER_ACCESS_DENIED_NO_PASSWORD_ERROR",
        3024 => "ER_QUERY_TIMEOUT",
        _ => return None,
    };
    Some(name)
}

/// Render a MySQL error number as a code string.
pub fn mysql_error_code(number: u16) -> String {
    mysql_error_name(number)
        .map(str::to_string)
        .unwrap_or_else(|| number.to_string())
}

/// Map an I/O failure to the socket-level code it represents.
fn io_error_code(err: &std::io::Error) -> Option<&'static str> {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => Some("ECONNRESET"),
        ErrorKind::TimedOut => Some("ETIMEDOUT"),
        ErrorKind::NotFound => Some("ENOTFOUND"),
        _ => {
            // Resolver failures come back as uncategorized errors
            let msg = err.to_string().to_lowercase();
            if msg.contains("lookup address")
                || msg.contains("name or service not known")
                || msg.contains("no such host")
                || msg.contains("nodename nor servname")
            {
                Some("ENOTFOUND")
            } else {
                None
            }
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err
                    .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                    .map(|e| mysql_error_code(e.number()))
                    .or_else(|| db_err.code().map(|c| c.to_string()));
                let timed_out = code.as_deref() == Some("ER_QUERY_TIMEOUT");
                DbError::Driver {
                    code,
                    message: db_err.message().to_string(),
                    timed_out,
                }
            }
            sqlx::Error::Io(io_err) => DbError::driver(
                io_error_code(&io_err).map(str::to_string),
                format!("I/O error: {}", io_err),
            ),
            sqlx::Error::Tls(tls_err) => {
                DbError::driver(Some("ETLS".to_string()), format!("TLS error: {}", tls_err))
            }
            sqlx::Error::Protocol(msg) => DbError::driver(
                Some("PROTOCOL_ERROR".to_string()),
                format!("Protocol error: {}", msg),
            ),
            sqlx::Error::Configuration(msg) => DbError::driver(
                Some("ER_CONFIGURATION".to_string()),
                format!("Configuration error: {}", msg),
            ),
            sqlx::Error::PoolTimedOut => DbError::Driver {
                code: Some(POOL_TIMEOUT_CODE.to_string()),
                message: "Timed out waiting for a connection (pool timeout)".to_string(),
                timed_out: true,
            },
            sqlx::Error::PoolClosed => DbError::driver(
                Some("POOL_CLOSED".to_string()),
                "Connection pool is closed",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::driver(None, err.to_string()),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
