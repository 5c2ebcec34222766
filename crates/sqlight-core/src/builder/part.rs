//! Rank-tagged statement fragments.
//!
//! A statement is accumulated as a list of [`QueryPart`]s. Each part holds a
//! structured [`Fragment`] so hooks and the join resolver can rewrite column
//! lists and aliases without re-parsing rendered text.

use std::fmt;
use std::str::FromStr;

/// Position of a fragment in the final statement.
///
/// Rendering sorts parts by rank with a stable sort, so parts of equal rank
/// keep their insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseRank {
    /// `SELECT`, `INSERT`, `UPDATE`, `DELETE`.
    Projection = 1,
    /// `FROM`, joins, `DROP TABLE`, column definitions.
    Target = 2,
    /// `WHERE` conditions, table constraints.
    Filter = 3,
    /// `ORDER BY`, `LIMIT`, `OFFSET`.
    Ordering = 4,
}

/// Comparison operators accepted by filters and joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareOp {
    /// Equal (=)
    #[default]
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Lt => write!(f, "<"),
            Self::Gte => write!(f, ">="),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// Returned when a string is not one of `= != > < >= <=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown comparison operator `{}`", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for CompareOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Gte),
            "<=" => Ok(Self::Lte),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Join flavours supported by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// `INNER JOIN`
    #[default]
    Inner,
    /// `LEFT JOIN`
    Left,
    /// `RIGHT JOIN`
    Right,
    /// `FULL JOIN`
    Full,
}

impl JoinKind {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
        }
    }
}

/// A single `WHERE` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Left-hand column.
    pub field: String,
    /// Comparison operator.
    pub op: CompareOp,
    /// Rendered right-hand value.
    pub value: String,
    /// Joined with `OR` rather than `AND`.
    pub alternate: bool,
}

/// `INSERT INTO t (columns) VALUES (values)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertClause {
    /// Target table.
    pub table: String,
    /// Column names.
    pub columns: Vec<String>,
    /// Rendered values, parallel to `columns`.
    pub values: Vec<String>,
}

/// `UPDATE t SET column = value, ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateClause {
    /// Target table.
    pub table: String,
    /// `(column, rendered value)` pairs.
    pub assignments: Vec<(String, String)>,
}

/// `<KIND> JOIN table [alias] ON left cmp right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// Join flavour.
    pub kind: JoinKind,
    /// Joined table.
    pub table: String,
    /// Alias of the joined table.
    pub alias: Option<String>,
    /// Qualified left operand.
    pub left: String,
    /// Comparison operator.
    pub comparison: CompareOp,
    /// Qualified right operand.
    pub right: String,
}

/// The structured content of a [`QueryPart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// `SELECT a, b`
    Projection(Vec<String>),
    /// `FROM table [alias]`
    From {
        /// Table name.
        table: String,
        /// Alias attached by a join.
        alias: Option<String>,
    },
    /// A join attached to the `FROM` table.
    Join(JoinClause),
    /// A `WHERE` condition. The connector is decided at render time.
    Filter(Filter),
    /// `ORDER BY field DIR`
    Ordering {
        /// Sort column.
        field: String,
        /// Sort direction.
        direction: Direction,
    },
    /// `LIMIT n`
    Limit(u64),
    /// `OFFSET n`
    Offset(u64),
    /// `INSERT INTO ...`
    Insert(InsertClause),
    /// `UPDATE ... SET ...`
    Update(UpdateClause),
    /// `DELETE FROM table`
    Delete {
        /// Table name.
        table: String,
    },
    /// `DROP TABLE table`
    DropTable {
        /// Table name.
        table: String,
    },
    /// Pre-rendered text, used for DDL column definitions.
    Raw(String),
}

impl Fragment {
    /// The rank this fragment sorts at unless placed explicitly.
    #[must_use]
    pub const fn default_rank(&self) -> ClauseRank {
        match self {
            Self::Projection(_) | Self::Insert(_) | Self::Update(_) | Self::Delete { .. } => {
                ClauseRank::Projection
            }
            Self::From { .. } | Self::Join(_) | Self::DropTable { .. } | Self::Raw(_) => {
                ClauseRank::Target
            }
            Self::Filter(_) => ClauseRank::Filter,
            Self::Ordering { .. } | Self::Limit(_) | Self::Offset(_) => ClauseRank::Ordering,
        }
    }

    /// Renders the fragment without any connector.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Projection(fields) => format!("SELECT {}", fields.join(", ")),
            Self::From { table, alias } => match alias {
                Some(alias) => format!("FROM {table} {alias}"),
                None => format!("FROM {table}"),
            },
            Self::Join(join) => {
                let target = match &join.alias {
                    Some(alias) => format!("{} {alias}", join.table),
                    None => join.table.clone(),
                };
                format!(
                    "{} JOIN {target} ON {} {} {}",
                    join.kind.as_sql(),
                    join.left,
                    join.comparison,
                    join.right
                )
            }
            Self::Filter(filter) => format!("{} {} {}", filter.field, filter.op, filter.value),
            Self::Ordering { field, direction } => {
                format!("ORDER BY {field} {}", direction.as_sql())
            }
            Self::Limit(n) => format!("LIMIT {n}"),
            Self::Offset(n) => format!("OFFSET {n}"),
            Self::Insert(insert) => format!(
                "INSERT INTO {} ({}) VALUES ({})",
                insert.table,
                insert.columns.join(", "),
                insert.values.join(", ")
            ),
            Self::Update(update) => {
                let set: Vec<String> = update
                    .assignments
                    .iter()
                    .map(|(column, value)| format!("{column} = {value}"))
                    .collect();
                format!("UPDATE {} SET {}", update.table, set.join(", "))
            }
            Self::Delete { table } => format!("DELETE FROM {table}"),
            Self::DropTable { table } => format!("DROP TABLE {table}"),
            Self::Raw(text) => text.clone(),
        }
    }
}

/// A fragment tagged with the clause rank it renders at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPart {
    /// Structured content.
    pub fragment: Fragment,
    /// Sort key.
    pub rank: ClauseRank,
}

impl QueryPart {
    /// Creates a part at the fragment's default rank.
    #[must_use]
    pub fn new(fragment: Fragment) -> Self {
        let rank = fragment.default_rank();
        Self { fragment, rank }
    }

    /// Creates a part at an explicit rank.
    #[must_use]
    pub const fn with_rank(fragment: Fragment, rank: ClauseRank) -> Self {
        Self { fragment, rank }
    }

    /// Creates a pre-rendered part.
    #[must_use]
    pub fn raw(text: impl Into<String>, rank: ClauseRank) -> Self {
        Self::with_rank(Fragment::Raw(text.into()), rank)
    }

    /// Renders the part without connector.
    #[must_use]
    pub fn text(&self) -> String {
        self.fragment.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(ClauseRank::Projection < ClauseRank::Target);
        assert!(ClauseRank::Target < ClauseRank::Filter);
        assert!(ClauseRank::Filter < ClauseRank::Ordering);
    }

    #[test]
    fn test_compare_op_round_trip() {
        for op in ["=", "!=", ">", "<", ">=", "<="] {
            let parsed: CompareOp = op.parse().unwrap();
            assert_eq!(parsed.to_string(), op);
        }
        assert!("<>".parse::<CompareOp>().is_err());
    }

    #[test]
    fn test_fragment_text() {
        let insert = Fragment::Insert(InsertClause {
            table: String::from("users"),
            columns: vec![String::from("name"), String::from("age")],
            values: vec![String::from("\"John\""), String::from("25")],
        });
        assert_eq!(insert.text(), "INSERT INTO users (name, age) VALUES (\"John\", 25)");

        let join = Fragment::Join(JoinClause {
            kind: JoinKind::Left,
            table: String::from("orders"),
            alias: Some(String::from("o")),
            left: String::from("o.user_id"),
            comparison: CompareOp::Eq,
            right: String::from("users.id"),
        });
        assert_eq!(join.text(), "LEFT JOIN orders o ON o.user_id = users.id");
    }

    #[test]
    fn test_default_ranks() {
        assert_eq!(QueryPart::new(Fragment::Limit(1)).rank, ClauseRank::Ordering);
        assert_eq!(
            QueryPart::new(Fragment::Delete {
                table: String::from("t")
            })
            .rank,
            ClauseRank::Projection
        );
        assert_eq!(
            QueryPart::raw("x INTEGER", ClauseRank::Filter).rank,
            ClauseRank::Filter
        );
    }
}
