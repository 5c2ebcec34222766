//! Column and foreign key options for the schema DSL.

use crate::value::{SqlValue, ToSqlValue};

/// Options accepted by the typed column methods of [`super::Schema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnOptions {
    /// `DEFAULT` value.
    pub default: Option<SqlValue>,
    /// Adds `UNIQUE`.
    pub unique: bool,
    /// Renders `NULL` instead of `NOT NULL`.
    pub nullable: bool,
}

impl ColumnOptions {
    /// No default, not unique, `NOT NULL`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl ToSqlValue) -> Self {
        self.default = Some(value.to_sql_value());
        self
    }

    /// Marks the column as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Options for [`super::Schema::foreign_key_column`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForeignKeyOptions {
    /// `ON DELETE` action.
    pub on_delete: Option<ForeignKeyAction>,
    /// `ON UPDATE` action.
    pub on_update: Option<ForeignKeyAction>,
    /// Recorded in the column metadata.
    pub nullable: bool,
}

impl ForeignKeyOptions {
    /// No referential actions, not nullable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `ON DELETE` action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the `ON UPDATE` action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Marks the referencing column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub(crate) fn actions_sql(self) -> String {
        let mut sql = String::new();
        if let Some(action) = self.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = self.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }
}
