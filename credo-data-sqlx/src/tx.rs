//! Transaction wrapper.
//!
//! A [`Tx`] is what [`SqlxExecutor::begin`](crate::SqlxExecutor) hands out.
//! It commits only when asked; dropping it rolls back.

use std::ops::{Deref, DerefMut};

use credo_data::{DataError, ExecResult, FromRecord, Record, Value};
use sqlx::{Database, Transaction};

use crate::driver::SqlxDriver;
use crate::error::SqlxErrorExt;

/// A pooled transaction on a typed `sqlx` connection.
///
/// Derefs to the inner [`Transaction`], so raw `sqlx` queries can run on it
/// too:
///
/// ```ignore
/// let mut tx = executor.begin(TxOptions::default()).await?;
/// tx.exec("UPDATE users SET first_name = ? WHERE id = ?", &["Jo".into(), "u0".into()]).await?;
/// sqlx::query("DELETE FROM sessions").execute(tx.as_mut()).await?;
/// tx.commit().await?;
/// ```
pub struct Tx<DB: Database>(Transaction<'static, DB>);

impl<DB: Database> Deref for Tx<DB> {
    type Target = Transaction<'static, DB>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<DB: Database> DerefMut for Tx<DB> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<DB: Database> Tx<DB> {
    pub fn new(tx: Transaction<'static, DB>) -> Self {
        Self(tx)
    }

    /// Unwraps the `Tx` into the inner `Transaction`.
    pub fn into_inner(self) -> Transaction<'static, DB> {
        self.0
    }

    /// Returns a mutable reference to the underlying connection.
    pub fn as_mut(&mut self) -> &mut <DB as Database>::Connection {
        &mut *self.0
    }

    pub async fn commit(self) -> Result<(), DataError> {
        self.0.commit().await.map_err(SqlxErrorExt::into_data_error)
    }

    pub async fn rollback(self) -> Result<(), DataError> {
        self.0.rollback().await.map_err(SqlxErrorExt::into_data_error)
    }
}

impl<DB: SqlxDriver> Tx<DB> {
    pub async fn exec(&mut self, sql: &str, args: &[Value]) -> Result<ExecResult, DataError> {
        tracing::debug!(sql, args = args.len(), "tx exec");
        DB::execute(self.as_mut(), sql, args).await
    }

    pub async fn fetch_all(&mut self, sql: &str, args: &[Value]) -> Result<Vec<Record>, DataError> {
        tracing::debug!(sql, args = args.len(), "tx fetch_all");
        DB::fetch_all(self.as_mut(), sql, args).await
    }

    pub async fn select_many<T: FromRecord>(&mut self, sql: &str, args: &[Value]) -> Result<Vec<T>, DataError> {
        let records = self.fetch_all(sql, args).await?;
        records.iter().map(T::from_record).collect()
    }
}
