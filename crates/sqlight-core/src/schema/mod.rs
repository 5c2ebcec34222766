//! Table definition DSL.
//!
//! A table is defined either from a flat list of `(column, declaration)`
//! pairs or through a callback that receives a [`Schema`]. The schema holds
//! its own composer: column definitions are pushed there as rank-tagged
//! parts, then sorted and wrapped into a single `CREATE TABLE` statement
//! which is installed as the outer composer's literal override.
//!
//! Columns and hooks declared through a [`Schema`] are staged on it and only
//! reach the shared [`Registry`] once the callback has succeeded.
//!
//! # Example
//!
//! ```rust
//! use sqlight_core::builder::QueryBuilder;
//! use sqlight_core::schema::ColumnOptions;
//!
//! let mut qb = QueryBuilder::new();
//! qb.create_table_with("users", |table| {
//!     table.text_column("name", ColumnOptions::new());
//!     table.id();
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(
//!     qb.render(),
//!     "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)"
//! );
//! ```

mod column;

use std::fmt;

use tracing::debug;

use crate::builder::{ClauseRank, QueryBuilder, QueryPart};
use crate::error::{Error, Result};
use crate::hooks::{self, Hook, HookPhase};
use crate::metadata::{ColumnMetadata, SqlType, TableColumns};
use crate::registry::Registry;

pub use column::{ColumnOptions, ForeignKeyAction, ForeignKeyOptions};

/// Scoped builder for the columns of one table.
pub struct Schema {
    table: String,
    builder: QueryBuilder,
    columns: TableColumns,
    hooks: Vec<(HookPhase, Hook)>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("table", &self.table)
            .field("columns", &self.columns.names())
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl Schema {
    fn new(table: &str, registry: Registry) -> Self {
        Self {
            table: table.to_string(),
            builder: QueryBuilder::with_registry(registry),
            columns: TableColumns::new(),
            hooks: Vec::new(),
        }
    }

    /// The table being defined.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    fn register(&mut self, column: &str, meta: ColumnMetadata) {
        self.columns.insert(column, meta);
    }

    fn register_hook(&mut self, phase: HookPhase, hook: Hook) {
        self.hooks.push((phase, hook));
    }

    /// Columns of `table`: the staged ones for this table, the registry's
    /// for any other.
    fn columns_of(&self, table: &str) -> Option<TableColumns> {
        if table == self.table {
            Some(self.columns.clone())
        } else {
            self.builder.registry().table(table)
        }
    }

    /// Publishes the staged table, columns and hooks to `registry`.
    fn commit(&mut self, registry: &Registry) {
        registry.define_table(&self.table);
        for (name, meta) in self.columns.iter() {
            registry.register_column(&self.table, name, meta.clone());
        }
        for (phase, hook) in self.hooks.drain(..) {
            registry.register_hook(phase, &self.table, hook);
        }
    }

    /// Adds `<name> INTEGER PRIMARY KEY AUTOINCREMENT` before every other
    /// column.
    pub fn primary_key_column(&mut self, name: &str) -> &mut Self {
        self.register(
            name,
            ColumnMetadata::new(SqlType::Integer).has_default(true).primary(),
        );
        self.builder.push_front(QueryPart::raw(
            format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT"),
            ClauseRank::Target,
        ));
        self
    }

    /// Shorthand for `primary_key_column("id")`.
    pub fn id(&mut self) -> &mut Self {
        self.primary_key_column("id")
    }

    fn typed_column(&mut self, name: &str, sql_type: SqlType, options: ColumnOptions) -> &mut Self {
        let mut definition = format!("{name} {}", sql_type.as_sql());
        if let Some(default) = &options.default {
            definition.push_str(" DEFAULT ");
            definition.push_str(&default.to_sql_default(sql_type.quotes_default()));
        }
        if options.unique {
            definition.push_str(" UNIQUE");
        }
        definition.push_str(if options.nullable { " NULL" } else { " NOT NULL" });

        self.register(
            name,
            ColumnMetadata::new(sql_type)
                .nullable(options.nullable)
                .has_default(options.default.is_some()),
        );
        self.builder
            .push(QueryPart::raw(definition, ClauseRank::Target));
        self
    }

    /// Adds a `TEXT` column.
    pub fn text_column(&mut self, name: &str, options: ColumnOptions) -> &mut Self {
        self.typed_column(name, SqlType::Text, options)
    }

    /// Adds an `INTEGER` column.
    pub fn integer_column(&mut self, name: &str, options: ColumnOptions) -> &mut Self {
        self.typed_column(name, SqlType::Integer, options)
    }

    /// Adds a `BOOLEAN` column.
    pub fn boolean_column(&mut self, name: &str, options: ColumnOptions) -> &mut Self {
        self.typed_column(name, SqlType::Boolean, options)
    }

    /// Adds a `REAL` column.
    pub fn float_column(&mut self, name: &str, options: ColumnOptions) -> &mut Self {
        self.typed_column(name, SqlType::Real, options)
    }

    /// Adds a `DATE` column.
    pub fn date_column(&mut self, name: &str, options: ColumnOptions) -> &mut Self {
        self.typed_column(name, SqlType::Date, options)
    }

    /// Adds a `DATETIME` column.
    pub fn datetime_column(&mut self, name: &str, options: ColumnOptions) -> &mut Self {
        self.typed_column(name, SqlType::Datetime, options)
    }

    /// Adds `<name> UUID PRIMARY KEY` before every other column and fills it
    /// with a fresh identifier on every insert into this table.
    pub fn uuid_column(&mut self, name: &str) -> &mut Self {
        self.register(
            name,
            ColumnMetadata::new(SqlType::Uuid).has_default(true).primary(),
        );
        self.builder.push_front(QueryPart::raw(
            format!("{name} UUID PRIMARY KEY"),
            ClauseRank::Target,
        ));
        self.register_hook(HookPhase::BeforeInsert, hooks::generated_identifier(name));
        self
    }

    /// Adds `created_at` and `updated_at`, and refreshes `updated_at` on
    /// every filtered update of this table.
    pub fn timestamp_columns(&mut self) -> &mut Self {
        for name in ["created_at", "updated_at"] {
            self.register(
                name,
                ColumnMetadata::new(SqlType::Timestamp).has_default(true),
            );
            self.builder.push(QueryPart::raw(
                format!("{name} TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL"),
                ClauseRank::Target,
            ));
        }
        self.register_hook(HookPhase::BeforeUpdate, hooks::touch_updated_at());
        self
    }

    /// Adds a column referencing `reference`, given as `table.column`.
    ///
    /// The column takes the type of the referenced column. The definition
    /// and its `FOREIGN KEY` constraint render after the plain columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reference`] when the reference is malformed or the
    /// referenced table or column has not been defined yet.
    pub fn foreign_key_column(
        &mut self,
        name: &str,
        reference: &str,
        options: ForeignKeyOptions,
    ) -> Result<&mut Self> {
        let reference_error = |reason: String| Error::Reference {
            reference: reference.to_string(),
            reason,
        };
        let (ref_table, ref_column) = reference
            .split_once('.')
            .ok_or_else(|| reference_error(String::from("expected `table.column`")))?;
        let columns = self
            .columns_of(ref_table)
            .ok_or_else(|| reference_error(format!("table `{ref_table}` is not defined")))?;
        let target = columns.get(ref_column).ok_or_else(|| {
            reference_error(format!("table `{ref_table}` has no column `{ref_column}`"))
        })?;

        let ref_type = target.sql_type.clone();
        let definition = format!(
            "{name} {}, FOREIGN KEY ({name}) REFERENCES {ref_table}({ref_column}){}",
            ref_type.as_sql(),
            options.actions_sql()
        );
        self.register(name, ColumnMetadata::new(ref_type).nullable(options.nullable));
        self.builder
            .push(QueryPart::raw(definition, ClauseRank::Filter));
        Ok(self)
    }

    fn into_statement(self) -> String {
        let mut parts = self.builder.parts().to_vec();
        parts.sort_by_key(|part| part.rank);
        let definitions: Vec<String> = parts
            .iter()
            .map(QueryPart::text)
            .filter(|text| !text.is_empty())
            .collect();
        let sql = format!("CREATE TABLE {} ({})", self.table, definitions.join(", "));
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl QueryBuilder {
    /// Defines `table` from `(column, declaration)` pairs, in order.
    ///
    /// The statement is installed as the literal override. Column metadata
    /// is derived from each declaration, so later foreign keys can refer
    /// to these columns.
    pub fn create_table(&mut self, table: &str, columns: &[(&str, &str)]) -> &mut Self {
        let registry = self.registry().clone();
        registry.define_table(table);
        let definitions: Vec<String> = columns
            .iter()
            .map(|(name, declaration)| {
                registry.register_column(table, name, ColumnMetadata::from_declaration(declaration));
                format!("{name} {declaration}")
            })
            .collect();
        let sql = format!("CREATE TABLE {table} ({})", definitions.join(", "));
        debug!(table = %table, columns = columns.len(), "Defined table");
        registry.notify_table_defined(table);
        self.set_literal(sql)
    }

    /// Defines `table` through a [`Schema`] callback.
    ///
    /// # Errors
    ///
    /// Propagates the callback's error. No statement is installed and the
    /// registry is left untouched in that case.
    pub fn create_table_with<F>(&mut self, table: &str, define: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Schema) -> Result<()>,
    {
        let registry = self.registry().clone();
        let mut schema = Schema::new(table, registry.clone());
        define(&mut schema)?;
        schema.commit(&registry);
        let sql = schema.into_statement();
        debug!(table = %table, sql = %sql, "Defined table");
        registry.notify_table_defined(table);
        Ok(self.set_literal(sql))
    }
}
