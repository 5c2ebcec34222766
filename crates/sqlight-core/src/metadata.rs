//! Column metadata recorded while tables are defined.
//!
//! Metadata feeds DDL rendering, foreign-key resolution and the value
//! normalization applied to inserts and updates.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// SQLite column types understood by the schema DSL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum SqlType {
    /// `INTEGER`
    Integer,
    /// `BIGINT`
    Bigint,
    /// `TEXT`
    Text,
    /// `CHAR`
    Char,
    /// `VARCHAR(n)`
    Varchar(u32),
    /// `REAL`
    Real,
    /// `FLOAT`
    Float,
    /// `DOUBLE`
    Double,
    /// `NUMERIC`
    Numeric,
    /// `DECIMAL`
    Decimal,
    /// `BOOLEAN`, stored as 0/1.
    Boolean,
    /// `DATE`
    Date,
    /// `DATETIME`
    Datetime,
    /// `TIMESTAMP`
    Timestamp,
    /// `TIME`
    Time,
    /// `UUID`, stored as text.
    Uuid,
    /// `BLOB`
    Blob,
    /// Anything else, kept verbatim.
    Custom(String),
}

impl SqlType {
    /// Parses the leading type word of a column declaration such as
    /// `"VARCHAR(255) NOT NULL"`.
    #[must_use]
    pub fn parse(declaration: &str) -> Self {
        let word = declaration
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        if let Some(size) = word
            .strip_prefix("VARCHAR(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|n| n.parse().ok())
        {
            return Self::Varchar(size);
        }

        match word.as_str() {
            "INT" | "INTEGER" => Self::Integer,
            "BIGINT" => Self::Bigint,
            "TEXT" => Self::Text,
            "CHAR" => Self::Char,
            "REAL" => Self::Real,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "NUMERIC" => Self::Numeric,
            "DECIMAL" => Self::Decimal,
            "BOOL" | "BOOLEAN" => Self::Boolean,
            "DATE" => Self::Date,
            "DATETIME" => Self::Datetime,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "UUID" => Self::Uuid,
            "BLOB" => Self::Blob,
            _ => Self::Custom(word),
        }
    }

    /// Returns the SQL spelling of the type.
    #[must_use]
    pub fn as_sql(&self) -> String {
        match self {
            Self::Integer => String::from("INTEGER"),
            Self::Bigint => String::from("BIGINT"),
            Self::Text => String::from("TEXT"),
            Self::Char => String::from("CHAR"),
            Self::Varchar(n) => format!("VARCHAR({n})"),
            Self::Real => String::from("REAL"),
            Self::Float => String::from("FLOAT"),
            Self::Double => String::from("DOUBLE"),
            Self::Numeric => String::from("NUMERIC"),
            Self::Decimal => String::from("DECIMAL"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Date => String::from("DATE"),
            Self::Datetime => String::from("DATETIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Time => String::from("TIME"),
            Self::Uuid => String::from("UUID"),
            Self::Blob => String::from("BLOB"),
            Self::Custom(name) => name.clone(),
        }
    }

    /// Returns the host-side type a code generator would use for this column.
    #[must_use]
    pub const fn inferred(&self) -> InferredType {
        match self {
            Self::Integer
            | Self::Bigint
            | Self::Real
            | Self::Float
            | Self::Double
            | Self::Numeric
            | Self::Decimal => InferredType::Number,
            Self::Text
            | Self::Char
            | Self::Varchar(_)
            | Self::Date
            | Self::Datetime
            | Self::Timestamp
            | Self::Time
            | Self::Uuid => InferredType::String,
            Self::Boolean => InferredType::Boolean,
            Self::Blob | Self::Custom(_) => InferredType::Any,
        }
    }

    /// Whether DDL defaults of this type are written as quoted literals.
    #[must_use]
    pub const fn quotes_default(&self) -> bool {
        matches!(self, Self::Text | Self::Date | Self::Datetime)
    }
}

/// Host-side type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    /// Integers and floating point values.
    Number,
    /// Text, dates and identifiers.
    String,
    /// 0/1 flags.
    Boolean,
    /// No useful mapping.
    Any,
}

/// Type and constraint facts about a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMetadata {
    /// Declared SQL type.
    pub sql_type: SqlType,
    /// Host-side type derived from `sql_type`.
    pub inferred_type: InferredType,
    /// Whether NULL is accepted.
    pub nullable: bool,
    /// Whether the engine fills the column when it is omitted.
    pub has_default: bool,
    /// Whether the column is the primary key.
    pub is_primary: bool,
}

impl ColumnMetadata {
    /// Creates metadata for a NOT NULL column without default.
    #[must_use]
    pub fn new(sql_type: SqlType) -> Self {
        let inferred_type = sql_type.inferred();
        Self {
            sql_type,
            inferred_type,
            nullable: false,
            has_default: false,
            is_primary: false,
        }
    }

    /// Marks the column as nullable or not.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Marks whether the column has a default.
    #[must_use]
    pub const fn has_default(mut self, has_default: bool) -> Self {
        self.has_default = has_default;
        self
    }

    /// Marks the column as primary key. Primary keys are never nullable.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.is_primary = true;
        self.nullable = false;
        self
    }

    /// Derives metadata from a free-form declaration such as
    /// `"INTEGER PRIMARY KEY AUTOINCREMENT"`.
    #[must_use]
    pub fn from_declaration(declaration: &str) -> Self {
        let upper = declaration.to_ascii_uppercase();
        let is_primary = upper.contains("PRIMARY KEY");
        let meta = Self::new(SqlType::parse(declaration))
            .nullable(!upper.contains("NOT NULL") && !is_primary)
            .has_default(upper.contains("DEFAULT") || upper.contains("AUTOINCREMENT"));
        if is_primary {
            meta.primary()
        } else {
            meta
        }
    }
}

/// The columns of one table, in definition order.
///
/// Serializes as a map from column name to metadata, keeping that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableColumns {
    columns: Vec<(String, ColumnMetadata)>,
}

impl TableColumns {
    /// Creates an empty column set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Records a column. Redefining a column replaces its metadata in place.
    pub fn insert(&mut self, name: impl Into<String>, meta: ColumnMetadata) {
        let name = name.into();
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = meta;
        } else {
            self.columns.push((name, meta));
        }
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, meta)| meta)
    }

    /// Iterates over `(name, metadata)` pairs in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnMetadata)> {
        self.columns.iter().map(|(n, meta)| (n.as_str(), meta))
    }

    /// Column names in definition order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for TableColumns {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, meta) in &self.columns {
            map.serialize_entry(name, meta)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sql_type() {
        assert_eq!(SqlType::parse("INT"), SqlType::Integer);
        assert_eq!(SqlType::parse("varchar(255) NOT NULL"), SqlType::Varchar(255));
        assert_eq!(SqlType::parse("INTEGER PRIMARY KEY"), SqlType::Integer);
        assert_eq!(SqlType::parse("JSONB"), SqlType::Custom(String::from("JSONB")));
    }

    #[test]
    fn test_inferred_types() {
        assert_eq!(SqlType::Integer.inferred(), InferredType::Number);
        assert_eq!(SqlType::Uuid.inferred(), InferredType::String);
        assert_eq!(SqlType::Varchar(10).inferred(), InferredType::String);
        assert_eq!(SqlType::Boolean.inferred(), InferredType::Boolean);
        assert_eq!(SqlType::Blob.inferred(), InferredType::Any);
    }

    #[test]
    fn test_quotes_default() {
        assert!(SqlType::Text.quotes_default());
        assert!(SqlType::Date.quotes_default());
        assert!(!SqlType::Timestamp.quotes_default());
        assert!(!SqlType::Integer.quotes_default());
    }

    #[test]
    fn test_metadata_from_declaration() {
        let pk = ColumnMetadata::from_declaration("INTEGER PRIMARY KEY AUTOINCREMENT");
        assert!(pk.is_primary);
        assert!(pk.has_default);
        assert!(!pk.nullable);

        let plain = ColumnMetadata::from_declaration("VARCHAR(255)");
        assert!(plain.nullable);
        assert!(!plain.has_default);

        let required = ColumnMetadata::from_declaration("TEXT NOT NULL DEFAULT 'x'");
        assert!(!required.nullable);
        assert!(required.has_default);
    }

    #[test]
    fn test_table_columns_keep_order() {
        let mut cols = TableColumns::new();
        cols.insert("name", ColumnMetadata::new(SqlType::Text));
        cols.insert("id", ColumnMetadata::new(SqlType::Integer).primary());
        cols.insert("name", ColumnMetadata::new(SqlType::Text).nullable(true));

        assert_eq!(cols.names(), vec!["name", "id"]);
        assert!(cols.get("name").is_some_and(|m| m.nullable));
        assert_eq!(cols.len(), 2);
    }

    #[test]
    fn test_metadata_serializes() {
        let meta = ColumnMetadata::new(SqlType::Text).nullable(true);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["sql_type"], "Text");
        assert_eq!(json["inferred_type"], "string");
        assert_eq!(json["nullable"], true);
    }

    #[test]
    fn test_table_columns_serialize_as_ordered_map() {
        let mut cols = TableColumns::new();
        cols.insert("title", ColumnMetadata::new(SqlType::Text));
        cols.insert("id", ColumnMetadata::new(SqlType::Integer).primary());
        let json = serde_json::to_string(&cols).unwrap();
        assert!(json.starts_with("{\"title\":{\"sql_type\":\"Text\""));
        assert!(json.find("\"title\"") < json.find("\"id\""));
    }
}
