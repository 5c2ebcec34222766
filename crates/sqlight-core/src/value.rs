//! SQL values and their inline rendering.
//!
//! Statements are rendered to a single string, so values are written inline.
//! Text is wrapped in double quotes with embedded quotes doubled.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::metadata::SqlType;

/// A value that can appear in a filter, an insert, an update or a default.
///
/// Non-finite floats have no SQL literal and render as `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Point in time, formatted according to the target column.
    Timestamp(DateTime<Utc>),
}

pub(crate) fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

impl SqlValue {
    /// Renders the value as written in a `WHERE` condition.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) if !f.is_finite() => String::from("NULL"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => quote(s),
            Self::Timestamp(ts) => quote(&ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// Renders the value for storage in a column of the given type.
    ///
    /// Booleans become `1`/`0`. Timestamps follow the column type: `DATE`
    /// keeps the day, `DATETIME`/`TIMESTAMP` use `YYYY-MM-DD HH:MM:SS.mmm`,
    /// anything else gets RFC 3339.
    #[must_use]
    pub fn to_sql_normalized(&self, column_type: Option<&SqlType>) -> String {
        match self {
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Timestamp(ts) => {
                let formatted = match column_type {
                    Some(SqlType::Date) => ts.format("%Y-%m-%d").to_string(),
                    Some(SqlType::Datetime | SqlType::Timestamp) => {
                        ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
                    }
                    _ => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
                };
                quote(&formatted)
            }
            other => other.to_sql_inline(),
        }
    }

    /// Renders the value as a DDL `DEFAULT` operand.
    ///
    /// With `quoted` set, the value is written as a single-quoted literal.
    /// Otherwise it is written bare, so expressions like `CURRENT_TIMESTAMP`
    /// pass through untouched.
    #[must_use]
    pub fn to_sql_default(&self, quoted: bool) -> String {
        let bare = match self {
            Self::Null => return String::from("NULL"),
            Self::Float(f) if !f.is_finite() => return String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => s.clone(),
            Self::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        if quoted {
            format!("'{}'", bare.replace('\'', "''"))
        } else {
            bare
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}
