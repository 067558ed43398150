//! Per-database glue between credo values and typed `sqlx` connections.
//!
//! Each enabled backend implements [`SqlxDriver`] with its own argument
//! binding and row decoding, so column types are read through the native
//! driver (dates and times included) instead of a lowest-common-denominator
//! runtime driver.

use std::future::Future;

use credo_data::{DataError, ExecResult, Record, Value};
use sqlx::Database;

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

/// A `sqlx` database that credo can drive.
///
/// Statements run on a bare connection, so the same code serves pooled
/// calls and transactions.
pub trait SqlxDriver: Database {
    /// Driver name used to pick the SQL dialect.
    const DRIVER: &'static str;

    /// # Errors
    ///
    /// Returns `DataError::NotFound` when the query yields no rows.
    fn fetch_one(
        conn: &mut Self::Connection,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Record, DataError>> + Send;

    fn fetch_all(
        conn: &mut Self::Connection,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send;

    fn execute(
        conn: &mut Self::Connection,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<ExecResult, DataError>> + Send;
}

/// Decode failures keep the column name.
pub(crate) fn column_error(column: &str, err: sqlx::Error) -> DataError {
    DataError::decode(column, err.to_string())
}
