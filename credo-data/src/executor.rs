use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::DataError;
use crate::value::{FromRecord, Record, Value};

/// The collaborator that actually talks to the database.
///
/// Implementations own connection handling and transactions; the data layer
/// only hands them finished SQL with its arguments. Dropping a returned
/// future cancels the call.
///
/// Uses RPITIT (return-position `impl Trait` in traits), so no `async-trait` is needed.
pub trait Executor: Send + Sync {
    type Transaction: Send;

    /// Run a query expected to return a row.
    ///
    /// # Errors
    ///
    /// Returns `DataError::NotFound` when the query yields no rows.
    fn fetch_one(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Record, DataError>> + Send;

    fn fetch_all(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send;

    /// Run a statement that returns no rows.
    fn exec(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<ExecResult, DataError>> + Send;

    fn begin(
        &self,
        options: TxOptions,
    ) -> impl Future<Output = Result<Self::Transaction, DataError>> + Send;

    /// `fetch_one` decoded into `T`.
    fn select_one<T: FromRecord + Send>(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<T, DataError>> + Send {
        async move {
            let record = self.fetch_one(sql, args).await?;
            T::from_record(&record)
        }
    }

    /// `fetch_all` decoded into `T`, preserving row order.
    fn select_many<T: FromRecord + Send>(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Vec<T>, DataError>> + Send {
        async move {
            let records = self.fetch_all(sql, args).await?;
            records.iter().map(T::from_record).collect()
        }
    }
}

impl<E: Executor> Executor for Arc<E> {
    type Transaction = E::Transaction;

    fn fetch_one(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Record, DataError>> + Send {
        (**self).fetch_one(sql, args)
    }

    fn fetch_all(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send {
        (**self).fetch_all(sql, args)
    }

    fn exec(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = Result<ExecResult, DataError>> + Send {
        (**self).exec(sql, args)
    }

    fn begin(
        &self,
        options: TxOptions,
    ) -> impl Future<Output = Result<Self::Transaction, DataError>> + Send {
        (**self).begin(options)
    }
}

/// Summary of a statement that returned no rows.
///
/// Backends report what they can; each accessor fails on its own when its
/// figure is unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    rows_affected: Option<u64>,
    last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: Option<u64>, last_insert_id: Option<i64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
        }
    }

    pub fn rows_affected(&self) -> Result<u64, DataError> {
        self.rows_affected
            .ok_or_else(|| DataError::Unsupported("rows affected is not reported by this backend".into()))
    }

    pub fn last_insert_id(&self) -> Result<i64, DataError> {
        self.last_insert_id
            .ok_or_else(|| DataError::Unsupported("last insert id is not reported by this backend".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub isolation: Option<IsolationLevel>,
    pub read_only: bool,
}

impl TxOptions {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// `SET TRANSACTION ...` for non-default options.
    pub fn to_sql(&self) -> Option<String> {
        let mut modes = Vec::new();
        if let Some(level) = self.isolation {
            modes.push(format!("ISOLATION LEVEL {}", level.as_sql()));
        }
        if self.read_only {
            modes.push("READ ONLY".to_string());
        }
        if modes.is_empty() {
            None
        } else {
            Some(format!("SET TRANSACTION {}", modes.join(", ")))
        }
    }
}

/// Callback receiving every statement right before it runs.
pub type DebugFn = Arc<dyn Fn(&str, &[Value]) + Send + Sync>;

pub fn noop_debug_fn() -> DebugFn {
    Arc::new(|_: &str, _: &[Value]| {})
}

/// A debug function that logs statements through `tracing` at debug level.
pub fn tracing_debug_fn() -> DebugFn {
    Arc::new(|sql: &str, args: &[Value]| {
        tracing::debug!(sql, args = ?args, "sql");
    })
}

/// Executor wrapper that calls a replaceable debug function before each
/// delegated call.
pub struct DebugExecutor<E> {
    inner: E,
    debug_fn: RwLock<DebugFn>,
}

impl<E> DebugExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            debug_fn: RwLock::new(noop_debug_fn()),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn debug_fn(&self) -> DebugFn {
        self.debug_fn
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the debug function; calls already in flight keep the old one.
    pub fn set_debug_fn(&self, debug_fn: DebugFn) {
        *self
            .debug_fn
            .write()
            .unwrap_or_else(PoisonError::into_inner) = debug_fn;
    }

    fn trace(&self, sql: &str, args: &[Value]) {
        let debug_fn = self.debug_fn();
        debug_fn(sql, args);
    }
}

impl<E: fmt::Debug> fmt::Debug for DebugExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugExecutor")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<E: Executor> Executor for DebugExecutor<E> {
    type Transaction = E::Transaction;

    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Record, DataError> {
        self.trace(sql, args);
        self.inner.fetch_one(sql, args).await
    }

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Record>, DataError> {
        self.trace(sql, args);
        self.inner.fetch_all(sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DataError> {
        self.trace(sql, args);
        self.inner.exec(sql, args).await
    }

    /// The hook sees the `SET TRANSACTION` statement the backend will issue
    /// for non-default options.
    async fn begin(&self, options: TxOptions) -> Result<Self::Transaction, DataError> {
        if let Some(sql) = options.to_sql() {
            self.trace(&sql, &[]);
        }
        self.inner.begin(options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExecutor;
    use std::sync::Mutex;

    #[test]
    fn test_exec_result_accessors() {
        let res = ExecResult::new(Some(1), None);
        assert_eq!(res.rows_affected().unwrap(), 1);
        assert!(matches!(res.last_insert_id(), Err(DataError::Unsupported(_))));
    }

    #[test]
    fn test_tx_options_sql() {
        assert_eq!(TxOptions::default().to_sql(), None);
        let opts = TxOptions {
            isolation: Some(IsolationLevel::Serializable),
            read_only: true,
        };
        assert_eq!(
            opts.to_sql().unwrap(),
            "SET TRANSACTION ISOLATION LEVEL SERIALIZABLE, READ ONLY"
        );
    }

    #[tokio::test]
    async fn test_debug_fn_sees_every_call() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let executor = DebugExecutor::new(MockExecutor::new());
        let sink = seen.clone();
        executor.set_debug_fn(Arc::new(move |sql: &str, args: &[Value]| {
            sink.lock().unwrap().push((sql.to_string(), args.to_vec()));
        }));

        executor.exec("DELETE FROM t", &[]).await.unwrap();
        executor
            .fetch_all("SELECT * FROM t WHERE id = ?", &[Value::Int(1)])
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], ("SELECT * FROM t WHERE id = ?".to_string(), vec![Value::Int(1)]));
    }

    #[tokio::test]
    async fn test_debug_fn_sees_transaction_options() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let executor = DebugExecutor::new(MockExecutor::new());
        let sink = seen.clone();
        executor.set_debug_fn(Arc::new(move |sql: &str, _: &[Value]| {
            sink.lock().unwrap().push(sql.to_string());
        }));

        executor.begin(TxOptions::default()).await.unwrap();
        executor
            .begin(TxOptions {
                isolation: Some(IsolationLevel::ReadCommitted),
                read_only: false,
            })
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            ["SET TRANSACTION ISOLATION LEVEL READ COMMITTED"]
        );
    }

    #[tokio::test]
    async fn test_select_one_decodes() {
        let mock = MockExecutor::new();
        mock.push_rows(vec![Record::new().with("cnt", 4i64)]);
        let n: u64 = mock.select_one("SELECT COUNT(*) AS cnt FROM t", &[]).await.unwrap();
        assert_eq!(n, 4);
    }
}
