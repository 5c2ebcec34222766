//! Error types for statement composition.

use std::fmt;

use thiserror::Error;

/// Why the guard refused a rendered statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// A `;` outside any quoted literal, at the given byte offset.
    StatementChaining {
        /// Byte offset of the semicolon.
        position: usize,
    },
    /// One of the injection signatures matched.
    Signature {
        /// Human-readable name of the signature.
        name: &'static str,
        /// The pattern that matched.
        pattern: &'static str,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatementChaining { position } => {
                write!(f, "semicolon found at offset {position}")
            }
            Self::Signature { name, pattern } => write!(f, "{name} pattern '{pattern}' found"),
        }
    }
}

/// Errors raised while composing or validating a statement.
#[derive(Debug, Error)]
pub enum Error {
    /// The guard rejected the rendered statement.
    #[error("malicious query detected: {reason} in query \"{sql}\"")]
    MaliciousQuery {
        /// What the guard found.
        reason: Rejection,
        /// The rejected statement.
        sql: String,
    },

    /// A foreign key points at a table or column that is not registered.
    #[error("cannot reference `{reference}`: {reason}")]
    Reference {
        /// The `table.column` reference as given.
        reference: String,
        /// What is missing.
        reason: String,
    },

    /// A join could not locate the `FROM` fragment it has to alias.
    #[error("cannot resolve join for `{reference}`: {reason}")]
    AliasResolution {
        /// The join reference being resolved.
        reference: String,
        /// What is missing.
        reason: String,
    },
}

/// Result type alias for composition operations.
pub type Result<T> = std::result::Result<T, Error>;
