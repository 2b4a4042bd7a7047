//! Statement gating for the read and write tools.
//!
//! Classification is pattern-based, not a parse: the read tool accepts
//! statements that start with a read-only keyword, the write tool accepts
//! anything, and both refuse a statement terminator anywhere but the very end.
//! All checks run before any network call.

use crate::error::{DbError, DbResult};

/// Leading keywords accepted by the read-only tool.
pub const READONLY_KEYWORDS: &[&str] = &["SELECT", "SHOW", "DESCRIBE", "DESC", "EXPLAIN"];

mod error_messages {
    pub const READ_ONLY: &str = "Only SELECT, SHOW, DESCRIBE, and EXPLAIN statements are allowed. Use mysql_execute for write operations.";
    pub const MULTI_STATEMENT: &str =
        "Multi-statement SQL is not allowed. Please send one statement at a time.";
    pub const EMPTY: &str = "SQL statement is empty.";
}

/// Validate SQL for the read-only tool.
///
/// # Examples
///
/// ```
/// use mysql_mcp_server::tools::sql_validator::validate_readonly;
///
/// assert!(validate_readonly("  select * from users").is_ok());
/// assert!(validate_readonly("DELETE FROM users").is_err());
/// assert!(validate_readonly("SELECT 1; SELECT 2").is_err());
/// ```
pub fn validate_readonly(sql: &str) -> DbResult<()> {
    if leading_keyword(sql).is_none() {
        return Err(DbError::validation(error_messages::READ_ONLY));
    }
    check_single_statement(sql)
}

/// Validate SQL for the write tool. Any single statement is accepted.
pub fn validate_write(sql: &str) -> DbResult<()> {
    if sql.trim().is_empty() {
        return Err(DbError::validation(error_messages::EMPTY));
    }
    check_single_statement(sql)
}

/// Reject a statement terminator anywhere but the end.
///
/// One trailing `;` is allowed. Terminators inside string literals are
/// rejected too; the check does not understand quoting.
pub fn check_single_statement(sql: &str) -> DbResult<()> {
    let trimmed = sql.trim();
    let body = trimmed.strip_suffix(';').unwrap_or(trimmed);
    if body.contains(';') {
        return Err(DbError::validation(error_messages::MULTI_STATEMENT));
    }
    Ok(())
}

/// Return the read-only keyword the statement starts with, if any.
///
/// Matching ignores leading whitespace and case, and the keyword must end at
/// a word boundary (`SELECTED` does not match `SELECT`).
pub fn leading_keyword(sql: &str) -> Option<&'static str> {
    let text = sql.trim_start();
    READONLY_KEYWORDS.iter().copied().find(|keyword| {
        let Some(head) = text.get(..keyword.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(keyword) {
            return false;
        }
        match text[keyword.len()..].chars().next() {
            Some(c) => !(c.is_ascii_alphanumeric() || c == '_'),
            None => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_each_readonly_keyword() {
        for sql in [
            "SELECT 1",
            "SHOW TABLES",
            "DESCRIBE users",
            "DESC users",
            "EXPLAIN SELECT * FROM users",
        ] {
            assert!(validate_readonly(sql).is_ok(), "{sql}");
        }
    }

    #[test]
    fn test_keyword_is_case_insensitive_after_whitespace() {
        assert!(validate_readonly("\n\t  sElEcT 1").is_ok());
        assert_eq!(leading_keyword("  desc t"), Some("DESC"));
        assert_eq!(leading_keyword("describe t"), Some("DESCRIBE"));
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        assert_eq!(leading_keyword("SELECTED"), None);
        assert_eq!(leading_keyword("SHOWX"), None);
        assert_eq!(leading_keyword("SELECT_1"), None);
        assert_eq!(leading_keyword("SELECT*FROM t"), Some("SELECT"));
        assert_eq!(leading_keyword("SELECT"), Some("SELECT"));
    }

    #[test]
    fn test_rejects_write_statements_on_read_path() {
        for sql in [
            "INSERT INTO t VALUES (1)",
            "UPDATE t SET a = 1",
            "DELETE FROM t",
            "DROP TABLE t",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "(SELECT 1)",
            "",
        ] {
            let err = validate_readonly(sql).unwrap_err();
            assert!(err.to_string().contains("mysql_execute"), "{sql}");
        }
    }

    #[test]
    fn test_trailing_terminator_allowed() {
        assert!(validate_readonly("SELECT 1;").is_ok());
        assert!(validate_readonly("SELECT 1;   \n").is_ok());
        assert!(validate_write("DELETE FROM t;").is_ok());
    }

    #[test]
    fn test_rejects_multiple_statements() {
        let err = validate_readonly("SELECT 1; SELECT 2").unwrap_err();
        assert!(err.to_string().contains("Multi-statement"));
        let err = validate_write("DELETE FROM t; DROP TABLE t").unwrap_err();
        assert!(err.to_string().contains("Multi-statement"));
        assert!(validate_write("SELECT 1;;").is_err());
    }

    #[test]
    fn test_write_path_accepts_anything_single() {
        assert!(validate_write("DELETE FROM t").is_ok());
        assert!(validate_write("CREATE TABLE t (id INT)").is_ok());
        assert!(validate_write("SELECT 1").is_ok());
    }

    #[test]
    fn test_write_path_rejects_empty() {
        assert!(validate_write("   ").unwrap_err().is_validation());
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        assert_eq!(leading_keyword("éé"), None);
        assert_eq!(leading_keyword("SELEC\u{00e9}"), None);
        assert!(validate_readonly("🚀🚀🚀").is_err());
    }
}
