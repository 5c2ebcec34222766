//! Join and alias resolution.
//!
//! A join is expressed between two `table.column` references. The resolver
//! decides which side is already the `FROM` anchor, attaches the other side
//! as a join fragment and gives the `FROM` fragment its alias.

use crate::error::{Error, Result};

use super::part::{CompareOp, Fragment, JoinClause, JoinKind, QueryPart};
use super::QueryBuilder;

/// Options for [`QueryBuilder::join`].
#[derive(Debug, Clone, Default)]
pub struct JoinOptions {
    kind: JoinKind,
    comparison: CompareOp,
    aliases: Vec<(String, String)>,
}

impl JoinOptions {
    /// Creates options for an `INNER JOIN` on equality, without aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the join flavour.
    #[must_use]
    pub const fn kind(mut self, kind: JoinKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the comparison used in the `ON` condition.
    #[must_use]
    pub const fn comparison(mut self, comparison: CompareOp) -> Self {
        self.comparison = comparison;
        self
    }

    /// Aliases `table` as `alias`.
    #[must_use]
    pub fn alias(mut self, table: &str, alias: &str) -> Self {
        self.aliases.push((table.to_string(), alias.to_string()));
        self
    }

    fn alias_of(&self, table: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, a)| a.as_str())
    }

    fn table_of(&self, alias: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(_, a)| a == alias)
            .map(|(t, _)| t.as_str())
    }
}

#[derive(Debug)]
struct JoinSide {
    table: String,
    alias: Option<String>,
    column: String,
}

impl JoinSide {
    fn resolve(reference: &str, options: &JoinOptions) -> Result<Self> {
        let (head, column) = reference
            .split_once('.')
            .ok_or_else(|| Error::AliasResolution {
                reference: reference.to_string(),
                reason: String::from("expected a `table.column` reference"),
            })?;
        let table = options.table_of(head).unwrap_or(head).to_string();
        let alias = options.alias_of(&table).map(str::to_string);
        Ok(Self {
            table,
            alias,
            column: column.to_string(),
        })
    }

    fn operand(&self) -> String {
        let qualifier = self.alias.as_deref().unwrap_or(&self.table);
        format!("{qualifier}.{}", self.column)
    }
}

fn from_index(parts: &[QueryPart], table: &str) -> Option<usize> {
    parts.iter().position(|part| {
        matches!(&part.fragment, Fragment::From { table: t, .. } if t == table)
    })
}

fn joined(parts: &[QueryPart], table: &str) -> bool {
    parts
        .iter()
        .any(|part| matches!(&part.fragment, Fragment::Join(join) if join.table == table))
}

fn set_from_alias(parts: &mut [QueryPart], index: usize, side: &JoinSide) {
    if let Fragment::From { alias, .. } = &mut parts[index].fragment {
        if alias.is_none() {
            alias.clone_from(&side.alias);
        }
    }
}

impl QueryBuilder {
    /// Joins the tables of `target` and `source`, both `table.column`
    /// references that may use aliases from `options`.
    ///
    /// When the target table is already the `FROM` table, the source table
    /// is joined to it. Otherwise the target table is joined to the source
    /// table, which must be the `FROM` table or an already joined table.
    /// The `FROM` fragment receives its alias from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AliasResolution`] when a reference is malformed or no
    /// `FROM` fragment mentions either side.
    pub fn join(&mut self, target: &str, source: &str, options: &JoinOptions) -> Result<&mut Self> {
        let target = JoinSide::resolve(target, options)?;
        let source = JoinSide::resolve(source, options)?;

        let (attached, from) = if let Some(index) = from_index(&self.parts, &target.table) {
            (&source, Some((index, &target)))
        } else if let Some(index) = from_index(&self.parts, &source.table) {
            (&target, Some((index, &source)))
        } else if joined(&self.parts, &source.table) {
            (&target, None)
        } else {
            return Err(Error::AliasResolution {
                reference: format!("{}.{}", target.table, target.column),
                reason: format!(
                    "no FROM fragment mentions `{}` or `{}`",
                    target.table, source.table
                ),
            });
        };

        let clause = JoinClause {
            kind: options.kind,
            table: attached.table.clone(),
            alias: attached.alias.clone(),
            left: target.operand(),
            comparison: options.comparison,
            right: source.operand(),
        };
        self.parts.push(QueryPart::new(Fragment::Join(clause)));
        if let Some((index, anchor)) = from {
            set_from_alias(&mut self.parts, index, anchor);
        }
        Ok(self)
    }
}
