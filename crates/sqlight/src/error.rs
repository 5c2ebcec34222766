//! Error types for statement execution.

/// Errors raised while preparing or executing a statement.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The statement could not be composed or was rejected by the guard.
    #[error(transparent)]
    Core(#[from] sqlight_core::Error),

    /// The engine failed to connect or execute.
    #[error("Database error: {0}")]
    Engine(#[from] sqlx::Error),
}

impl DbError {
    /// Whether the guard refused the statement before it reached the engine.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Core(sqlight_core::Error::MaliciousQuery { .. }))
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DbError>;
