//! Field descriptors, declared field types and typed field values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════════
// Field Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The declared type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Uuid,
    DateTime,
    Date,
}

/// Raised when a raw criterion value cannot be converted to a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub expected: FieldType,
    pub value: String,
}

impl FieldType {
    /// Whether free-text search applies to fields of this type.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Convert a raw string into a value of this type.
    ///
    /// Text is taken verbatim. Every other type is trimmed first.
    pub fn parse_value(self, raw: &str) -> Result<FieldValue, ConversionError> {
        let fail = || ConversionError {
            expected: self,
            value: raw.to_string(),
        };
        let trimmed = raw.trim();

        match self {
            Self::Text => Ok(FieldValue::Text(raw.to_string())),
            Self::Integer => trimmed.parse().map(FieldValue::Integer).map_err(|_| fail()),
            Self::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Float)
                .ok_or_else(fail),
            Self::Boolean => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(FieldValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(FieldValue::Boolean(false))
                } else {
                    Err(fail())
                }
            }
            Self::Uuid => Uuid::parse_str(trimmed).map(FieldValue::Uuid).map_err(|_| fail()),
            Self::DateTime => parse_datetime(trimmed).map(FieldValue::DateTime).ok_or_else(fail),
            Self::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| fail()),
        }
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Uuid => "uuid",
            Self::DateTime => "datetime",
            Self::Date => "date",
        };
        f.write_str(name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Field Value
// ═══════════════════════════════════════════════════════════════════════════════

/// A typed scalar read from a record or parsed from a criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Compare two values of the same type. Mixed types and nulls are unordered,
    /// except integers and floats which compare numerically.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Text(s) => write!(f, "'{}'", s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Uuid(u) => write!(f, "'{}'", u),
            Self::DateTime(dt) => write!(f, "'{}'", dt.to_rfc3339()),
            Self::Date(d) => write!(f, "'{}'", d),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Uuid> for FieldValue {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Field Descriptor
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads one field from a record.
pub type Accessor<E> = fn(&E) -> FieldValue;

/// Static metadata plus an accessor for one field of entity `E`.
pub struct FieldDescriptor<E> {
    name: &'static str,
    field_type: FieldType,
    accessor: Accessor<E>,
}

impl<E> FieldDescriptor<E> {
    pub const fn new(name: &'static str, field_type: FieldType, accessor: Accessor<E>) -> Self {
        Self {
            name,
            field_type,
            accessor,
        }
    }

    pub fn text(name: &'static str, accessor: Accessor<E>) -> Self {
        Self::new(name, FieldType::Text, accessor)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn is_text(&self) -> bool {
        self.field_type.is_text()
    }

    /// Read this field's value from a record.
    pub fn read(&self, record: &E) -> FieldValue {
        (self.accessor)(record)
    }
}

impl<E> Clone for FieldDescriptor<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            field_type: self.field_type,
            accessor: self.accessor,
        }
    }
}

impl<E> fmt::Debug for FieldDescriptor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .finish()
    }
}
