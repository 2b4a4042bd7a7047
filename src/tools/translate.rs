//! Error translation.
//!
//! Every failure a tool can hit is turned into one envelope shape:
//! `{error, hint?, code?, connection}`. Classification looks only at the
//! symbolic code, the message and the timeout flag carried by [`DbError`],
//! so the brittle knowledge about driver codes lives in [`classify`] alone.

use crate::config::QUERY_TIMEOUT_SECS;
use crate::error::{DbError, TIMEOUT_CODE};
use schemars::JsonSchema;
use serde::Serialize;

mod codes {
    pub const CONNECTION_REFUSED: &[&str] = &["ECONNREFUSED", "ENOTFOUND"];
    pub const ACCESS_DENIED: &[&str] = &[
        "ER_ACCESS_DENIED_ERROR",
        "ER_ACCESS_DENIED_NO_PASSWORD_ERROR",
    ];
}

mod hints {
    pub const CONNECTION_REFUSED: &str =
        "Check that MySQL is running and the host/port are correct.";
    pub const ACCESS_DENIED: &str = "Check username and password.";
}

/// Failure buckets, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    ConnectionRefused,
    AccessDenied,
    Timeout,
    Other,
}

/// Whether timeouts get their own bucket.
///
/// Only the read tool reports timeouts specially; the write and schema tools
/// let them fall through to the generic envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    Classify,
    Generic,
}

/// Structured error payload returned by every tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ErrorOutput {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Resolved target, `user@host:port/database`
    pub connection: String,
}

impl ErrorOutput {
    /// Envelope with only a message and the connection description.
    pub fn message(error: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            hint: None,
            code: None,
            connection: connection.into(),
        }
    }
}

impl std::fmt::Display for ErrorOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.error, self.connection)
    }
}

/// Bucket a failure by its code, message and timeout flag.
pub fn classify(
    code: Option<&str>,
    message: &str,
    timed_out: bool,
    policy: TimeoutPolicy,
) -> FailureClass {
    if let Some(code) = code {
        if codes::CONNECTION_REFUSED.contains(&code) {
            return FailureClass::ConnectionRefused;
        }
        if codes::ACCESS_DENIED.contains(&code) {
            return FailureClass::AccessDenied;
        }
    }

    if policy == TimeoutPolicy::Classify
        && (timed_out
            || code == Some(TIMEOUT_CODE)
            || message.to_ascii_lowercase().contains("timeout"))
    {
        return FailureClass::Timeout;
    }

    FailureClass::Other
}

/// Translate an error into the envelope returned to the caller.
///
/// `connection` is the description of the resolved target. The access-denied
/// envelope deliberately omits the driver message, which can echo the user.
pub fn translate(err: DbError, connection: &str, policy: TimeoutPolicy) -> ErrorOutput {
    let (code, message, timed_out) = match err {
        DbError::Validation { message } => return ErrorOutput::message(message, connection),
        DbError::Internal { .. } => return ErrorOutput::message(err.to_string(), connection),
        DbError::Driver {
            code,
            message,
            timed_out,
        } => (code, message, timed_out),
    };

    match classify(code.as_deref(), &message, timed_out, policy) {
        FailureClass::ConnectionRefused => ErrorOutput {
            error: format!("Connection failed to {}: {}", connection, message),
            hint: Some(hints::CONNECTION_REFUSED.to_string()),
            code,
            connection: connection.to_string(),
        },
        FailureClass::AccessDenied => ErrorOutput {
            error: format!("Access denied for {}", connection),
            hint: Some(hints::ACCESS_DENIED.to_string()),
            code,
            connection: connection.to_string(),
        },
        FailureClass::Timeout => ErrorOutput {
            error: format!("Query timed out on {}", connection),
            hint: Some(format!(
                "The query exceeded {}s. Consider adding indexes or simplifying the query.",
                QUERY_TIMEOUT_SECS
            )),
            code,
            connection: connection.to_string(),
        },
        FailureClass::Other => ErrorOutput {
            error: message,
            hint: None,
            code,
            connection: connection.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONN: &str = "app@db.internal:3306/shop";

    fn driver(code: &str, message: &str) -> DbError {
        DbError::driver(Some(code.to_string()), message)
    }

    #[test]
    fn test_classify_connection_refused() {
        for code in ["ECONNREFUSED", "ENOTFOUND"] {
            assert_eq!(
                classify(Some(code), "x", false, TimeoutPolicy::Generic),
                FailureClass::ConnectionRefused
            );
        }
    }

    #[test]
    fn test_classify_access_denied() {
        assert_eq!(
            classify(
                Some("ER_ACCESS_DENIED_ERROR"),
                "Access denied for user 'app'@'10.0.0.1' (using password: YES)",
                false,
                TimeoutPolicy::Classify
            ),
            FailureClass::AccessDenied
        );
    }

    #[test]
    fn test_classify_timeout_only_when_policy_allows() {
        let cases = [
            (Some(TIMEOUT_CODE), "Query inactivity timeout", true),
            (None, "read timeout on socket", false),
            (None, "Lock wait Timeout exceeded", false),
            (Some("ER_QUERY_TIMEOUT"), "interrupted", true),
        ];
        for (code, message, flag) in cases {
            assert_eq!(
                classify(code, message, flag, TimeoutPolicy::Classify),
                FailureClass::Timeout,
                "{message}"
            );
            assert_eq!(
                classify(code, message, flag, TimeoutPolicy::Generic),
                FailureClass::Other,
                "{message}"
            );
        }
    }

    #[test]
    fn test_classify_precedence() {
        // Refused beats timeout even when the message mentions one
        assert_eq!(
            classify(Some("ECONNREFUSED"), "connect timeout", true, TimeoutPolicy::Classify),
            FailureClass::ConnectionRefused
        );
        assert_eq!(
            classify(
                Some("ER_ACCESS_DENIED_ERROR"),
                "timeout",
                true,
                TimeoutPolicy::Classify
            ),
            FailureClass::AccessDenied
        );
    }

    #[test]
    fn test_classify_generic() {
        assert_eq!(
            classify(
                Some("ER_NO_SUCH_TABLE"),
                "Table 'shop.nope' doesn't exist",
                false,
                TimeoutPolicy::Classify
            ),
            FailureClass::Other
        );
        assert_eq!(
            classify(None, "boom", false, TimeoutPolicy::Classify),
            FailureClass::Other
        );
    }

    #[test]
    fn test_translate_connection_refused() {
        let out = translate(
            driver("ECONNREFUSED", "I/O error: Connection refused (os error 111)"),
            CONN,
            TimeoutPolicy::Generic,
        );
        assert_eq!(
            out.error,
            format!("Connection failed to {CONN}: I/O error: Connection refused (os error 111)")
        );
        assert_eq!(out.hint.as_deref(), Some(hints::CONNECTION_REFUSED));
        assert_eq!(out.connection, CONN);
    }

    #[test]
    fn test_translate_access_denied_drops_driver_message() {
        let out = translate(
            driver(
                "ER_ACCESS_DENIED_ERROR",
                "Access denied for user 'app'@'host' (using password: YES)",
            ),
            CONN,
            TimeoutPolicy::Classify,
        );
        assert_eq!(out.error, format!("Access denied for {CONN}"));
        assert_eq!(out.hint.as_deref(), Some("Check username and password."));
        assert!(!out.error.contains("using password"));
    }

    #[test]
    fn test_translate_timeout_on_read_path() {
        let out = translate(DbError::statement_timeout(), CONN, TimeoutPolicy::Classify);
        assert_eq!(out.error, format!("Query timed out on {CONN}"));
        assert_eq!(
            out.hint.as_deref(),
            Some("The query exceeded 30s. Consider adding indexes or simplifying the query.")
        );
    }

    #[test]
    fn test_translate_timeout_on_write_path_is_generic() {
        let out = translate(DbError::statement_timeout(), CONN, TimeoutPolicy::Generic);
        assert_eq!(out.error, "Query inactivity timeout");
        assert_eq!(out.code.as_deref(), Some(TIMEOUT_CODE));
        assert!(out.hint.is_none());
    }

    #[test]
    fn test_translate_generic_keeps_code() {
        let out = translate(
            driver("ER_NO_SUCH_TABLE", "Table 'shop.nope' doesn't exist"),
            CONN,
            TimeoutPolicy::Classify,
        );
        assert_eq!(out.error, "Table 'shop.nope' doesn't exist");
        assert_eq!(out.code.as_deref(), Some("ER_NO_SUCH_TABLE"));
        assert_eq!(out.connection, CONN);
    }

    #[test]
    fn test_translate_validation() {
        let out = translate(
            DbError::validation("Multi-statement SQL is not allowed."),
            CONN,
            TimeoutPolicy::Classify,
        );
        assert_eq!(out, ErrorOutput::message("Multi-statement SQL is not allowed.", CONN));
    }

    #[test]
    fn test_envelope_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ErrorOutput::message("boom", CONN)).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom", "connection": CONN}));
    }
}
