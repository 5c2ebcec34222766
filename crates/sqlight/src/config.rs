//! Connection settings.

use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;
use tracing::warn;

/// Environment variable holding the database URL.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Environment variable holding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "SQLIGHT_MAX_CONNECTIONS";

/// How to reach the SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite:app.db` or `sqlite::memory:`.
    pub url: String,
    /// Upper bound of the connection pool.
    pub max_connections: u32,
    /// Create the database file when it does not exist.
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite::memory:"),
            max_connections: 1,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    /// In-memory database with a single connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `DATABASE_URL` and `SQLIGHT_MAX_CONNECTIONS`, falling back to
    /// the defaults for unset or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup(DATABASE_URL_VAR) {
            config.url = url;
        }
        if let Some(raw) = lookup(MAX_CONNECTIONS_VAR) {
            match raw.parse() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => warn!(value = %raw, "Ignoring invalid SQLIGHT_MAX_CONNECTIONS"),
            }
        }
        config
    }

    /// Sets the database URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the pool size.
    #[must_use]
    pub const fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    /// Sets whether a missing database file is created.
    #[must_use]
    pub const fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub(crate) fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        Ok(SqliteConnectOptions::from_str(&self.url)?.create_if_missing(self.create_if_missing))
    }
}
