//! Composition surface shared by every type that owns a composer.

use crate::error::Result;
use crate::value::ToSqlValue;

use super::join::JoinOptions;
use super::part::{CompareOp, Direction};
use super::QueryBuilder;

/// Chainable statement composition.
///
/// Implementors only expose their composer. Every operation delegates to it
/// and hands back the implementor, so a database handle chains exactly like
/// a bare [`QueryBuilder`].
pub trait QueryOps {
    /// The composer operations are forwarded to.
    fn builder_mut(&mut self) -> &mut QueryBuilder;

    /// See [`QueryBuilder::select`].
    fn select(&mut self, fields: &[&str]) -> &mut Self {
        self.builder_mut().select(fields);
        self
    }

    /// See [`QueryBuilder::from`].
    fn from(&mut self, table: &str) -> &mut Self {
        self.builder_mut().from(table);
        self
    }

    /// See [`QueryBuilder::filter`].
    fn filter(&mut self, field: &str, value: impl ToSqlValue) -> &mut Self {
        self.builder_mut().filter(field, value);
        self
    }

    /// See [`QueryBuilder::filter_with`].
    fn filter_with(&mut self, field: &str, op: CompareOp, value: impl ToSqlValue) -> &mut Self {
        self.builder_mut().filter_with(field, op, value);
        self
    }

    /// See [`QueryBuilder::or_filter`].
    fn or_filter(&mut self, field: &str, value: impl ToSqlValue) -> &mut Self {
        self.builder_mut().or_filter(field, value);
        self
    }

    /// See [`QueryBuilder::or_filter_with`].
    fn or_filter_with(&mut self, field: &str, op: CompareOp, value: impl ToSqlValue) -> &mut Self {
        self.builder_mut().or_filter_with(field, op, value);
        self
    }

    /// See [`QueryBuilder::order_by`].
    fn order_by(&mut self, field: &str, direction: Direction) -> &mut Self {
        self.builder_mut().order_by(field, direction);
        self
    }

    /// See [`QueryBuilder::limit`].
    fn limit(&mut self, n: u64) -> &mut Self {
        self.builder_mut().limit(n);
        self
    }

    /// See [`QueryBuilder::offset`].
    fn offset(&mut self, n: u64) -> &mut Self {
        self.builder_mut().offset(n);
        self
    }

    /// See [`QueryBuilder::insert`].
    fn insert<K, V>(&mut self, table: &str, data: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: ToSqlValue,
    {
        self.builder_mut().insert(table, data);
        self
    }

    /// See [`QueryBuilder::update`].
    fn update<K, V>(&mut self, table: &str, data: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: ToSqlValue,
    {
        self.builder_mut().update(table, data);
        self
    }

    /// See [`QueryBuilder::delete`].
    fn delete(&mut self, table: &str) -> &mut Self {
        self.builder_mut().delete(table);
        self
    }

    /// See [`QueryBuilder::join`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AliasResolution`] when neither side of the
    /// join can be anchored.
    fn join(&mut self, target: &str, source: &str, options: &JoinOptions) -> Result<&mut Self> {
        self.builder_mut().join(target, source, options)?;
        Ok(self)
    }
}

impl QueryOps for QueryBuilder {
    fn builder_mut(&mut self) -> &mut QueryBuilder {
        self
    }
}
