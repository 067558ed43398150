use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A single SQL value: a bind argument on the way in, a column on the way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A point in time, normalised to UTC. Naive column types are read as UTC.
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short type name used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::Bytes(_) => "bytes",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Timestamp(v.and_time(NaiveTime::MIN).and_utc())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

macro_rules! impl_value_from_int {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )+
    };
}

impl_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

/// Trait for converting a column [`Value`] into a concrete type.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be decoded from a column value",
    label = "not a valid column type",
    note = "built-in types: String, i64, f64, bool, Vec<u8>, chrono dates and times, Option<T>. Implement `FromValue` for custom types."
)]
pub trait FromValue: Sized {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError>;
}

fn mismatch(value: &Value, column: &str, expected: &str) -> DataError {
    DataError::decode(column, format!("expected {expected}, found {}", value.kind()))
}

impl FromValue for Value {
    fn from_value(value: &Value, _column: &str) -> Result<Self, DataError> {
        Ok(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Timestamp(t) => Ok(t.to_rfc3339()),
            other => Err(mismatch(other, column, "String")),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Text(s) => s.parse().map_err(|_| mismatch(value, column, "i64")),
            other => Err(mismatch(other, column, "i64")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Text(s) => s.parse().map_err(|_| mismatch(value, column, "f64")),
            other => Err(mismatch(other, column, "f64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        let f = f64::from_value(value, column)?;
        Ok(f as f32)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        match value {
            Value::Bool(b) => Ok(*b),
            // SQLite has no boolean storage class.
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            other => Err(mismatch(other, column, "bool")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            other => Err(mismatch(other, column, "bytes")),
        }
    }
}

/// Text layouts accepted for timestamps stored as strings, after RFC 3339.
const TEXT_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    TEXT_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .map(|t| t.and_utc())
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        match value {
            Value::Timestamp(t) => Ok(*t),
            Value::Text(s) => parse_timestamp(s).ok_or_else(|| mismatch(value, column, "timestamp")),
            other => Err(mismatch(other, column, "timestamp")),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        DateTime::<Utc>::from_value(value, column).map(|t| t.naive_utc())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        DateTime::<Utc>::from_value(value, column).map(|t| t.date_naive())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
        match value {
            Value::Null => Ok(None),
            v => T::from_value(v, column).map(Some),
        }
    }
}

// ── Integer types via i64 with range check ──────────────────────────────

macro_rules! impl_from_value_int {
    ($($ty:ty),+) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value, column: &str) -> Result<Self, DataError> {
                    let i = i64::from_value(value, column)?;
                    <$ty>::try_from(i).map_err(|_| {
                        DataError::decode(column, format!("{i} is out of range for {}", stringify!($ty)))
                    })
                }
            }
        )+
    };
}

impl_from_value_int!(u8, u16, u32, u64, i8, i16, i32, usize);

/// One decoded row: ordered column names with their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Get a typed value for the named column.
    ///
    /// # Errors
    ///
    /// Returns `DataError::Decode` if the column is missing or the value
    /// cannot be converted.
    pub fn get<V: FromValue>(&self, column: &str) -> Result<V, DataError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DataError::decode(column, "no such column in row"))?;
        V::from_value(&self.values[idx], column)
    }

    /// Get a typed value by position.
    pub fn get_at<V: FromValue>(&self, index: usize) -> Result<V, DataError> {
        match (self.values.get(index), self.columns.get(index)) {
            (Some(value), Some(column)) => V::from_value(value, column),
            _ => Err(DataError::decode(
                format!("#{index}"),
                format!("row has only {} columns", self.values.len()),
            )),
        }
    }
}

/// Decoding a whole row into a type.
///
/// Entities implement this by reading their mapped columns. Scalars and
/// tuples read the leading columns by position, which is what `COUNT(...)`
/// and ad-hoc aggregate queries return.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, DataError>;
}

macro_rules! impl_from_record_scalar {
    ($($ty:ty),+) => {
        $(
            impl FromRecord for $ty {
                fn from_record(record: &Record) -> Result<Self, DataError> {
                    record.get_at(0)
                }
            }
        )+
    };
}

impl_from_record_scalar!(bool, i32, i64, u32, u64, f64, String, DateTime<Utc>, Value);

macro_rules! impl_from_record_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRecord for ($($name,)+) {
            fn from_record(record: &Record) -> Result<Self, DataError> {
                Ok(($(record.get_at::<$name>($idx)?,)+))
            }
        }
    };
}

impl_from_record_tuple!(A: 0, B: 1);
impl_from_record_tuple!(A: 0, B: 1, C: 2);
impl_from_record_tuple!(A: 0, B: 1, C: 2, D: 3);
