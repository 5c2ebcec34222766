//! The database handle.
//!
//! [`Database`] owns a composer, the registry it shares with every schema
//! defined through it, and a SQLite pool. Statements are composed with the
//! [`QueryOps`] methods, then `render_sql`, `run` or `execute` fire the matching
//! hooks, render, guard and hand the result to the engine.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::{debug, info};

use sqlight_core::builder::{QueryBuilder, QueryOps};
use sqlight_core::schema::Schema;
use sqlight_core::{guard, hooks, Registry};

use crate::config::DatabaseConfig;
use crate::error::Result;

/// A logical database: one composer, one registry, one pool.
#[derive(Debug)]
pub struct Database {
    builder: QueryBuilder,
    pool: SqlitePool,
}

impl Database {
    /// Opens a pool according to `config`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Engine` when the URL is invalid or the database
    /// cannot be opened.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options()?)
            .await?;
        info!(url = %config.url, "Connected to database");
        Ok(Self::from_pool(pool))
    }

    /// Wraps an existing pool with a fresh registry.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            builder: QueryBuilder::new(),
            pool,
        }
    }

    /// The registry shared by every statement of this database.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        self.builder.registry()
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn ddl(&self) -> QueryBuilder {
        QueryBuilder::with_registry(self.registry().clone())
    }

    async fn execute_ddl(
        &self,
        statement: QueryBuilder,
        table: &str,
        applied: &'static str,
    ) -> Result<u64> {
        let sql = statement.build();
        guard::validate(&sql)?;
        debug!(sql = %sql, "Executing SQL");
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        info!(table = %table, "{applied}");
        Ok(result.rows_affected())
    }

    /// Creates `table` from `(column, declaration)` pairs.
    ///
    /// Runs immediately and leaves the pending statement untouched.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Core` when the guard rejects the statement and
    /// `DbError::Engine` when SQLite refuses it.
    pub async fn create_table(&self, table: &str, columns: &[(&str, &str)]) -> Result<u64> {
        let mut statement = self.ddl();
        statement.create_table(table, columns);
        self.execute_ddl(statement, table, "Applied table definition")
            .await
    }

    /// Creates `table` through a [`Schema`] callback.
    ///
    /// Runs immediately and leaves the pending statement untouched. Nothing
    /// is executed when the callback fails.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Core` when the callback fails or the guard rejects
    /// the statement, and `DbError::Engine` when SQLite refuses it.
    pub async fn create_table_with<F>(&self, table: &str, define: F) -> Result<u64>
    where
        F: FnOnce(&mut Schema) -> sqlight_core::Result<()>,
    {
        let mut statement = self.ddl();
        statement.create_table_with(table, define)?;
        self.execute_ddl(statement, table, "Applied table definition")
            .await
    }

    /// Drops `table`.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Engine` when the table does not exist.
    pub async fn drop_table(&self, table: &str) -> Result<u64> {
        let mut statement = self.ddl();
        statement.drop_table(table);
        self.execute_ddl(statement, table, "Dropped table").await
    }

    /// Detaches the pending statement, fires its hooks, renders and guards
    /// it.
    ///
    /// The composer is empty afterwards, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Core` when the guard rejects the statement.
    pub fn render_sql(&mut self) -> Result<String> {
        let mut statement = self.builder.take();
        if let Some(phase) = hooks::run_before_hooks(&mut statement) {
            debug!(phase = phase.name(), "Fired statement hooks");
        }
        let sql = statement.build();
        guard::validate(&sql)?;
        Ok(sql)
    }

    /// Executes the pending statement and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Core` when the guard rejects the statement and
    /// `DbError::Engine` when the query fails.
    pub async fn run(&mut self) -> Result<Vec<SqliteRow>> {
        let sql = self.render_sql()?;
        debug!(sql = %sql, "Fetching rows");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Executes the pending statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Core` when the guard rejects the statement and
    /// `DbError::Engine` when the statement fails.
    pub async fn execute(&mut self) -> Result<u64> {
        let sql = self.render_sql()?;
        debug!(sql = %sql, "Executing SQL");
        let result = sqlx::query(&sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

impl QueryOps for Database {
    fn builder_mut(&mut self) -> &mut QueryBuilder {
        &mut self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    async fn create_test_db() -> Database {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        Database::from_pool(pool)
    }

    #[tokio::test]
    async fn test_render_sql_resets_composer() {
        let mut db = create_test_db().await;
        db.filter("id", 1).from("users").select(&["name"]);
        assert_eq!(db.render_sql().unwrap(), "SELECT name FROM users WHERE id = 1");
        assert_eq!(db.render_sql().unwrap(), "");
    }

    #[tokio::test]
    async fn test_rejected_statement_clears_composer() {
        let mut db = create_test_db().await;
        db.select(&["*"]).from("users").filter("name", "x' OR 1=1");
        let err = db.render_sql().unwrap_err();
        assert!(err.is_rejected());
        assert_eq!(db.render_sql().unwrap(), "");
    }

    #[tokio::test]
    async fn test_ddl_logs_name_the_applied_change() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let db = create_test_db().await;
        db.create_table("tags", &[("slug", "TEXT")]).await.unwrap();
        let created = log.contents();
        assert!(created.contains("Applied table definition"));
        assert!(!created.contains("Dropped table"));

        db.drop_table("tags").await.unwrap();
        let dropped = log.contents();
        assert!(dropped.contains("Dropped table"));
        assert_eq!(dropped.matches("Applied table definition").count(), 1);
    }

    #[tokio::test]
    async fn test_ddl_keeps_pending_statement() {
        let mut db = create_test_db().await;
        db.select(&["*"]).from("notes");
        db.create_table("notes", &[("body", "TEXT")]).await.unwrap();
        assert_eq!(db.render_sql().unwrap(), "SELECT * FROM notes");
        assert!(db.registry().has_table("notes"));
    }
}
