//! Black-box tests for the statement gates.
//!
//! Mixes fixed edge cases with randomized inputs to check that the read gate
//! accepts exactly the read-only keyword forms and that no gate lets a second
//! statement through.

use mysql_mcp_server::tools::sql_validator::{
    READONLY_KEYWORDS, check_single_statement, leading_keyword, validate_readonly, validate_write,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Randomly flip the case of each character.
fn random_case(s: &str) -> String {
    let mut rng = rand::thread_rng();
    s.chars()
        .map(|c| {
            if rng.gen_bool(0.5) {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

fn random_whitespace() -> String {
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(0..6);
    (0..len)
        .map(|_| *[' ', '\t', '\n', '\r'].choose(&mut rng).unwrap())
        .collect()
}

fn edge_case_strings() -> Vec<String> {
    vec![
        String::new(),
        " ".to_string(),
        "\n\r\t".to_string(),
        "\0".to_string(),
        "🚀".repeat(100),
        "'OR 1=1--".to_string(),
        "'; DROP TABLE users--".to_string(),
        "a".repeat(100_000),
        "\u{0000}\u{FFFF}".to_string(),
        "1' UNION SELECT NULL, NULL--".to_string(),
        "{{7*7}}".to_string(),
        "\x00\x01\x02".to_string(),
    ]
}

#[test]
fn read_gate_accepts_keywords_in_any_case_and_spacing() {
    for _ in 0..500 {
        let keyword = READONLY_KEYWORDS.choose(&mut rand::thread_rng()).unwrap();
        let sql = format!(
            "{}{} {}",
            random_whitespace(),
            random_case(keyword),
            random_string(20)
        );
        assert!(validate_readonly(&sql).is_ok(), "should accept {sql:?}");
    }
}

#[test]
fn read_gate_rejects_keyword_prefixes_of_longer_words() {
    for _ in 0..200 {
        let keyword = READONLY_KEYWORDS.choose(&mut rand::thread_rng()).unwrap();
        let sql = format!("{}{} FROM t", keyword, random_string(3));
        assert_eq!(leading_keyword(&sql), None, "should reject {sql:?}");
    }
}

#[test]
fn read_gate_rejects_write_statements() {
    for verb in [
        "INSERT", "UPDATE", "DELETE", "REPLACE", "CREATE", "ALTER", "DROP", "TRUNCATE", "GRANT",
        "SET", "CALL", "LOAD", "USE", "LOCK",
    ] {
        let sql = format!("{}{} x", random_whitespace(), random_case(verb));
        let err = validate_readonly(&sql).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Only SELECT, SHOW, DESCRIBE, and EXPLAIN statements are allowed. Use mysql_execute for write operations."
        );
    }
}

#[test]
fn no_gate_accepts_an_embedded_terminator() {
    for _ in 0..500 {
        let first = random_string(rand::thread_rng().gen_range(0..30));
        let second = random_string(rand::thread_rng().gen_range(1..30));
        let read = format!("SELECT {first}; {second}");
        let write = format!("UPDATE t SET a = '{first}'; {second}");

        let err = validate_readonly(&read).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multi-statement SQL is not allowed. Please send one statement at a time."
        );
        assert!(validate_write(&write).is_err(), "should reject {write:?}");
    }
}

#[test]
fn one_trailing_terminator_is_allowed() {
    for _ in 0..200 {
        let body = random_string(rand::thread_rng().gen_range(1..40));
        let sql = format!("SELECT {body};{}", random_whitespace());
        assert!(validate_readonly(&sql).is_ok(), "should accept {sql:?}");
        assert!(check_single_statement(&format!("{sql};")).is_err());
    }
}

#[test]
fn terminator_inside_string_literal_is_still_rejected() {
    assert!(validate_readonly("SELECT 'a;b'").is_err());
    assert!(validate_write("INSERT INTO t VALUES ('a;b')").is_err());
}

#[test]
fn edge_case_inputs_never_panic() {
    for input in edge_case_strings() {
        let _ = validate_readonly(&input);
        let _ = validate_write(&input);
        let _ = leading_keyword(&input);
    }
}

#[test]
fn write_gate_accepts_reads_and_ddl() {
    for sql in [
        "SELECT 1",
        "CREATE TABLE t (id INT PRIMARY KEY)",
        "ALTER TABLE t ADD COLUMN name VARCHAR(10)",
        "DROP TABLE t;",
    ] {
        assert!(validate_write(sql).is_ok(), "should accept {sql:?}");
    }
}
