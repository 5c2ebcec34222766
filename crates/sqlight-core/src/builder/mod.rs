//! Rank-ordered statement composer.
//!
//! Operations can be issued in any order. Each one pushes a [`QueryPart`]
//! tagged with a [`ClauseRank`], and rendering sorts the parts by rank, so
//! the final clause order never depends on call order.
//!
//! # Example
//!
//! ```rust
//! use sqlight_core::builder::QueryBuilder;
//!
//! let mut qb = QueryBuilder::new();
//! let sql = qb.filter("id", 1).from("users").select(&["*"]).render();
//! assert_eq!(sql, "SELECT * FROM users WHERE id = 1");
//!
//! // Rendering consumes the buffer.
//! assert_eq!(qb.render(), "");
//! ```

mod join;
mod ops;
mod part;

use tracing::debug;

use crate::registry::Registry;
use crate::value::ToSqlValue;

pub use join::JoinOptions;
pub use ops::QueryOps;
pub use part::{
    ClauseRank, CompareOp, Direction, Filter, Fragment, InsertClause, JoinClause, JoinKind,
    QueryPart, UnknownOperator, UpdateClause,
};

/// Accumulates the parts of one statement.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    parts: Vec<QueryPart>,
    literal: Option<String>,
    registry: Registry,
}

impl QueryBuilder {
    /// Creates a composer with a private registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a composer sharing `registry` with other composers.
    #[must_use]
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            parts: Vec::new(),
            literal: None,
            registry,
        }
    }

    /// The registry this composer reads metadata and hooks from.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The parts accumulated so far, in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[QueryPart] {
        &self.parts
    }

    /// Mutable access to the parts, for hooks.
    pub fn parts_mut(&mut self) -> &mut Vec<QueryPart> {
        &mut self.parts
    }

    /// Appends a part.
    pub fn push(&mut self, part: QueryPart) -> &mut Self {
        self.parts.push(part);
        self
    }

    /// Inserts a part before every other part.
    pub fn push_front(&mut self, part: QueryPart) -> &mut Self {
        self.parts.insert(0, part);
        self
    }

    /// Whether a literal override is pending.
    #[must_use]
    pub const fn has_literal(&self) -> bool {
        self.literal.is_some()
    }

    /// Installs a pre-assembled statement that the next render returns
    /// verbatim instead of the buffered parts.
    pub fn set_literal(&mut self, sql: impl Into<String>) -> &mut Self {
        self.literal = Some(sql.into());
        self
    }

    /// Adds `SELECT fields`. An empty list selects `*`.
    pub fn select(&mut self, fields: &[&str]) -> &mut Self {
        let fields = if fields.is_empty() {
            vec![String::from("*")]
        } else {
            fields.iter().map(|f| (*f).to_string()).collect()
        };
        self.push(QueryPart::new(Fragment::Projection(fields)))
    }

    /// Adds `FROM table`.
    pub fn from(&mut self, table: &str) -> &mut Self {
        self.push(QueryPart::new(Fragment::From {
            table: table.to_string(),
            alias: None,
        }))
    }

    fn push_filter(
        &mut self,
        field: &str,
        op: CompareOp,
        value: impl ToSqlValue,
        alternate: bool,
    ) -> &mut Self {
        self.push(QueryPart::new(Fragment::Filter(Filter {
            field: field.to_string(),
            op,
            value: value.to_sql_value().to_sql_inline(),
            alternate,
        })))
    }

    /// Adds `field = value`, joined to earlier conditions with `AND`.
    pub fn filter(&mut self, field: &str, value: impl ToSqlValue) -> &mut Self {
        self.push_filter(field, CompareOp::Eq, value, false)
    }

    /// Adds `field op value`, joined to earlier conditions with `AND`.
    pub fn filter_with(
        &mut self,
        field: &str,
        op: CompareOp,
        value: impl ToSqlValue,
    ) -> &mut Self {
        self.push_filter(field, op, value, false)
    }

    /// Adds `field = value`, joined to earlier conditions with `OR`.
    pub fn or_filter(&mut self, field: &str, value: impl ToSqlValue) -> &mut Self {
        self.push_filter(field, CompareOp::Eq, value, true)
    }

    /// Adds `field op value`, joined to earlier conditions with `OR`.
    pub fn or_filter_with(
        &mut self,
        field: &str,
        op: CompareOp,
        value: impl ToSqlValue,
    ) -> &mut Self {
        self.push_filter(field, op, value, true)
    }

    /// Adds an `ORDER BY` term. Repeated calls extend the same clause.
    pub fn order_by(&mut self, field: &str, direction: Direction) -> &mut Self {
        self.push(QueryPart::new(Fragment::Ordering {
            field: field.to_string(),
            direction,
        }))
    }

    /// Adds `LIMIT n`.
    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.push(QueryPart::new(Fragment::Limit(n)))
    }

    /// Adds `OFFSET n`.
    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.push(QueryPart::new(Fragment::Offset(n)))
    }

    /// Adds `DROP TABLE table`.
    pub fn drop_table(&mut self, table: &str) -> &mut Self {
        self.push(QueryPart::new(Fragment::DropTable {
            table: table.to_string(),
        }))
    }

    /// Adds `INSERT INTO table (...) VALUES (...)`.
    ///
    /// Values are normalized against the registered column types.
    pub fn insert<K, V>(&mut self, table: &str, data: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: ToSqlValue,
    {
        let columns_meta = self.registry.table(table);
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (column, value) in data {
            let column: String = column.into();
            let column_type = columns_meta
                .as_ref()
                .and_then(|cols| cols.get(&column))
                .map(|meta| &meta.sql_type);
            values.push(value.to_sql_value().to_sql_normalized(column_type));
            columns.push(column);
        }
        self.push(QueryPart::new(Fragment::Insert(InsertClause {
            table: table.to_string(),
            columns,
            values,
        })))
    }

    /// Adds `UPDATE table SET ...`.
    ///
    /// Values are normalized against the registered column types.
    pub fn update<K, V>(&mut self, table: &str, data: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: ToSqlValue,
    {
        let columns_meta = self.registry.table(table);
        let assignments = data
            .into_iter()
            .map(|(column, value)| {
                let column: String = column.into();
                let column_type = columns_meta
                    .as_ref()
                    .and_then(|cols| cols.get(&column))
                    .map(|meta| &meta.sql_type);
                let value = value.to_sql_value().to_sql_normalized(column_type);
                (column, value)
            })
            .collect();
        self.push(QueryPart::new(Fragment::Update(UpdateClause {
            table: table.to_string(),
            assignments,
        })))
    }

    /// Adds `DELETE FROM table`.
    pub fn delete(&mut self, table: &str) -> &mut Self {
        self.push(QueryPart::new(Fragment::Delete {
            table: table.to_string(),
        }))
    }

    /// Detaches the statement built so far, leaving an empty composer that
    /// shares the same registry.
    #[must_use = "the detached statement is dropped otherwise"]
    pub fn take(&mut self) -> Self {
        let fresh = Self::with_registry(self.registry.clone());
        std::mem::replace(self, fresh)
    }

    /// Renders the pending statement and resets the composer.
    pub fn render(&mut self) -> String {
        self.take().build()
    }

    /// Consumes the composer and renders its statement.
    ///
    /// A literal override wins over the buffered parts. Otherwise parts are
    /// stably sorted by rank, the first condition is introduced by `WHERE`
    /// and later ones by `AND` or `OR`, consecutive `ORDER BY` terms are
    /// comma-separated, and everything is joined with single spaces.
    #[must_use]
    pub fn build(self) -> String {
        if let Some(sql) = self.literal {
            debug!(sql = %sql, "Rendered literal statement");
            return sql;
        }

        let mut parts = self.parts;
        parts.sort_by_key(|part| part.rank);

        let mut segments: Vec<String> = Vec::with_capacity(parts.len());
        let mut filter_seen = false;
        let mut ordering_segment: Option<usize> = None;

        for part in &parts {
            let text = part.text();
            if text.is_empty() {
                continue;
            }
            match &part.fragment {
                Fragment::Filter(filter) => {
                    let connector = if !filter_seen {
                        "WHERE"
                    } else if filter.alternate {
                        "OR"
                    } else {
                        "AND"
                    };
                    filter_seen = true;
                    segments.push(format!("{connector} {text}"));
                }
                Fragment::Ordering { field, direction } => {
                    if let Some(index) = ordering_segment {
                        segments[index].push_str(&format!(", {field} {}", direction.as_sql()));
                    } else {
                        ordering_segment = Some(segments.len());
                        segments.push(text);
                    }
                }
                _ => segments.push(text),
            }
        }

        let sql = segments.join(" ");
        debug!(sql = %sql, "Rendered statement");
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnMetadata, SqlType};

    #[test]
    fn test_select_defaults_to_star() {
        let mut qb = QueryBuilder::new();
        assert_eq!(qb.select(&[]).from("users").render(), "SELECT * FROM users");
    }

    #[test]
    fn test_literal_override_wins_and_clears() {
        let mut qb = QueryBuilder::new();
        qb.select(&["id"]).from("users");
        qb.set_literal("CREATE TABLE t (id INT)");
        assert_eq!(qb.render(), "CREATE TABLE t (id INT)");
        assert_eq!(qb.render(), "");
        assert!(!qb.has_literal());
        assert!(qb.parts().is_empty());
    }

    #[test]
    fn test_take_shares_registry() {
        let mut qb = QueryBuilder::new();
        qb.select(&["*"]).from("users");
        let statement = qb.take();
        assert!(qb.parts().is_empty());
        assert_eq!(statement.parts().len(), 2);

        qb.registry()
            .register_column("users", "id", ColumnMetadata::new(SqlType::Integer));
        assert!(statement.registry().has_table("users"));
    }

    #[test]
    fn test_alternate_filter_first_uses_where() {
        let mut qb = QueryBuilder::new();
        let sql = qb.select(&["*"]).from("t").or_filter("a", 1).render();
        assert_eq!(sql, "SELECT * FROM t WHERE a = 1");
    }

    #[test]
    fn test_empty_raw_fragment_is_skipped() {
        let mut qb = QueryBuilder::new();
        qb.select(&["*"])
            .from("t")
            .push(QueryPart::raw("", ClauseRank::Filter));
        assert_eq!(qb.render(), "SELECT * FROM t");
    }

    #[test]
    fn test_filter_operators() {
        let mut qb = QueryBuilder::new();
        let sql = qb
            .select(&["*"])
            .from("users")
            .filter_with("age", CompareOp::Gte, 18)
            .filter_with("name", CompareOp::Ne, "Bob")
            .render();
        assert_eq!(sql, "SELECT * FROM users WHERE age >= 18 AND name != \"Bob\"");
    }

    #[test]
    fn test_insert_normalizes_against_metadata() {
        let mut qb = QueryBuilder::new();
        qb.registry()
            .register_column("flags", "active", ColumnMetadata::new(SqlType::Boolean));
        let sql = qb.insert("flags", [("active", true)]).render();
        assert_eq!(sql, "INSERT INTO flags (active) VALUES (1)");
    }

    #[test]
    fn test_delete_with_filter() {
        let mut qb = QueryBuilder::new();
        let sql = qb.filter("id", 3).delete("users").render();
        assert_eq!(sql, "DELETE FROM users WHERE id = 3");
    }
}
