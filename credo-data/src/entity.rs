use crate::value::{FromRecord, Value};

/// Column mapping for a record type.
///
/// `columns` and `values` must list the same columns in the same order;
/// that order is the column order of generated `INSERT` and `UPDATE`
/// statements. Decoding goes through [`FromRecord`].
///
/// # Example
///
/// ```
/// use credo_data::{DataError, Entity, FromRecord, Record, Value};
///
/// struct User {
///     id: String,
///     first_name: String,
///     last_name: Option<String>,
/// }
///
/// impl FromRecord for User {
///     fn from_record(record: &Record) -> Result<Self, DataError> {
///         Ok(Self {
///             id: record.get("id")?,
///             first_name: record.get("first_name")?,
///             last_name: record.get("last_name")?,
///         })
///     }
/// }
///
/// impl Entity for User {
///     fn columns() -> &'static [&'static str] {
///         &["id", "first_name", "last_name"]
///     }
///
///     fn values(&self) -> Vec<Value> {
///         vec![
///             self.id.clone().into(),
///             self.first_name.clone().into(),
///             self.last_name.clone().into(),
///         ]
///     }
/// }
/// ```
pub trait Entity: FromRecord + Send + Sync + Unpin + 'static {
    fn columns() -> &'static [&'static str];
    fn values(&self) -> Vec<Value>;
}

/// Values usable as a row identity.
pub trait Identity: Clone + Into<Value> + Send + Sync + 'static {}

impl<T: Clone + Into<Value> + Send + Sync + 'static> Identity for T {}
