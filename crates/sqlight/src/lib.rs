//! # sqlight
//!
//! Runs statements composed with `sqlight-core` against SQLite.
//!
//! A [`Database`] owns a composer and a connection pool. Every statement
//! goes through the same pipeline: the `Before*` hooks registered by the
//! schema fire, the composer renders, the guard validates, and only then
//! does sqlx execute the string.
//!
//! ```rust,no_run
//! use sqlight::{Database, DatabaseConfig, QueryOps};
//! use sqlight::schema::ColumnOptions;
//!
//! # async fn demo() -> sqlight::Result<()> {
//! let mut db = Database::connect(&DatabaseConfig::from_env()).await?;
//! db.create_table_with("users", |t| {
//!     t.id();
//!     t.text_column("name", ColumnOptions::new());
//!     Ok(())
//! })
//! .await?;
//!
//! db.insert("users", [("name", "Ann")]).execute().await?;
//! let rows = db.select(&["id", "name"]).from("users").run().await?;
//! assert_eq!(rows.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;

pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{DbError, Result};

pub use sqlight_core::{
    builder, guard, hooks, metadata, registry, schema, value, ColumnMetadata, JoinOptions,
    QueryBuilder, QueryOps, Registry, SchemaObserver, SqlValue, TableColumns, ToSqlValue,
};
