//! # sqlight-core
//!
//! A rank-ordered SQL statement composer with a schema DSL, rewrite hooks
//! and an injection guard.
//!
//! This crate provides:
//! - A composer whose clause order depends only on clause rank, never on
//!   call order
//! - A table definition DSL that records column metadata for later foreign
//!   keys and value normalization
//! - Per-table hooks that rewrite statements before they render
//! - A join resolver that anchors joins on the `FROM` table and applies
//!   aliases
//! - A guard that rejects statement chaining and common injection patterns
//!
//! ## Composing statements
//!
//! ```rust
//! use sqlight_core::builder::{Direction, QueryBuilder};
//!
//! let mut qb = QueryBuilder::new();
//! let sql = qb
//!     .order_by("name", Direction::Asc)
//!     .filter("active", true)
//!     .from("users")
//!     .select(&["id", "name"])
//!     .limit(10)
//!     .render();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT id, name FROM users WHERE active = true ORDER BY name ASC LIMIT 10"
//! );
//! ```
//!
//! ## Guarding rendered statements
//!
//! ```rust
//! use sqlight_core::guard;
//!
//! assert!(guard::validate("DELETE FROM users WHERE id = 3").is_ok());
//! assert!(guard::validate("SELECT * FROM users; DROP TABLE users").is_err());
//! ```

pub mod builder;
pub mod error;
pub mod guard;
pub mod hooks;
pub mod metadata;
pub mod registry;
pub mod schema;
pub mod value;

pub use builder::{JoinOptions, QueryBuilder, QueryOps};
pub use error::{Error, Rejection, Result};
pub use hooks::{Hook, HookPhase};
pub use metadata::{ColumnMetadata, InferredType, SqlType, TableColumns};
pub use registry::{Registry, SchemaObserver};
pub use schema::{ColumnOptions, ForeignKeyAction, ForeignKeyOptions, Schema};
pub use value::{SqlValue, ToSqlValue};
