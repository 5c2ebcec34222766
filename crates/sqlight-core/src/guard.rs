//! Injection and statement-chaining guard.
//!
//! [`validate`] runs against a fully rendered statement. It rejects a `;`
//! outside quoted literals, then a fixed set of injection signatures.
//! Destructive keywords on their own are accepted: a single `DROP TABLE` or
//! `DELETE` is a legitimate statement.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::{Error, Rejection, Result};

struct Signature {
    name: &'static str,
    pattern: &'static str,
    regex: Regex,
}

const SIGNATURES: [(&str, &str); 5] = [
    ("inline comment", r"(--|#|/\*)"),
    ("union", r"(?i)\bunion\b"),
    ("tautology", r"(?i)\bor\b\s+(1|true)\s*=\s*(1|true)"),
    ("dynamic execution", r"(?i)\bexec\b"),
    ("dynamic execution", r"(?i)\bsp_executesql\b"),
];

static COMPILED: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    SIGNATURES
        .iter()
        .map(|&(name, pattern)| Signature {
            name,
            pattern,
            regex: Regex::new(pattern).expect("valid signature pattern"),
        })
        .collect()
});

/// Byte offset of the first `;` outside a quoted literal.
fn chaining_offset(sql: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    for (index, ch) in sql.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ';' if !in_single && !in_double => return Some(index),
            _ => {}
        }
    }
    None
}

fn inspect(sql: &str) -> Option<Rejection> {
    if let Some(position) = chaining_offset(sql) {
        return Some(Rejection::StatementChaining { position });
    }
    COMPILED
        .iter()
        .find(|signature| signature.regex.is_match(sql))
        .map(|signature| Rejection::Signature {
            name: signature.name,
            pattern: signature.pattern,
        })
}

/// Checks a rendered statement before it reaches the engine.
///
/// # Errors
///
/// Returns [`Error::MaliciousQuery`] naming the first problem found.
pub fn validate(sql: &str) -> Result<()> {
    match inspect(sql) {
        None => Ok(()),
        Some(reason) => {
            warn!(sql = %sql, reason = %reason, "Rejected statement");
            Err(Error::MaliciousQuery {
                reason,
                sql: sql.to_string(),
            })
        }
    }
}

/// Whether `sql` passes [`validate`].
#[must_use]
pub fn is_safe(sql: &str) -> bool {
    inspect(sql).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_statements_pass() {
        assert!(validate("SELECT * FROM users WHERE id = 1").is_ok());
        assert!(validate("DROP TABLE users").is_ok());
        assert!(validate("DELETE FROM users WHERE id = 3").is_ok());
    }

    #[test]
    fn test_semicolon_outside_literal_rejected() {
        let err = validate("SELECT * FROM users; DROP TABLE users").unwrap_err();
        assert!(matches!(
            err,
            Error::MaliciousQuery {
                reason: Rejection::StatementChaining { position: 19 },
                ..
            }
        ));
    }

    #[test]
    fn test_semicolon_inside_literals_allowed() {
        assert!(is_safe("INSERT INTO notes (body) VALUES (\"a;b\")"));
        assert!(is_safe("INSERT INTO notes (body) VALUES ('a;b')"));
        assert!(is_safe("INSERT INTO notes (body) VALUES (\"it's;fine\")"));
    }

    #[test]
    fn test_signatures() {
        assert!(!is_safe("SELECT * FROM users WHERE name = \"x\" -- comment"));
        assert!(!is_safe("SELECT * FROM users /* hidden */"));
        assert!(!is_safe("SELECT id FROM a UNION SELECT id FROM b"));
        assert!(!is_safe("SELECT * FROM users WHERE id = 1 OR 1=1"));
        assert!(!is_safe("SELECT * FROM users WHERE id = 1 or true = true"));
        assert!(!is_safe("EXEC xp_cmdshell"));
        assert!(!is_safe("sp_executesql N'SELECT 1'"));
    }

    #[test]
    fn test_whole_words_only() {
        assert!(is_safe("SELECT reunion, executive FROM staff"));
        assert!(is_safe("SELECT * FROM orders WHERE color = \"red\""));
    }

    #[test]
    fn test_rejection_names_pattern() {
        let err = validate("SELECT a FROM t UNION SELECT b FROM u").unwrap_err();
        assert!(err.to_string().contains("union pattern"));
    }
}
