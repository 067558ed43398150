use std::fmt;
use std::time::Duration;

use credo_data::{DataError, Entity, ExecResult, Executor, Identity, Record, Repository, TxOptions, Value};
use sqlx::pool::{PoolConnection, PoolOptions};
use sqlx::Pool;

use crate::config::DatabaseConfig;
use crate::driver::SqlxDriver;
use crate::error::SqlxErrorExt;
use crate::tx::Tx;

/// Pooled [`Executor`] on a typed `sqlx` pool.
///
/// The driver name kept alongside the pool selects the SQL dialect for
/// repositories built from this executor.
///
/// ```ignore
/// let executor = SqlxExecutor::<Sqlite>::connect(&DatabaseConfig::new("sqlite::memory:")).await?;
/// ```
pub struct SqlxExecutor<DB: SqlxDriver> {
    pool: Pool<DB>,
    driver: String,
}

impl<DB: SqlxDriver> SqlxExecutor<DB> {
    /// Open a pool from `config`. The URL must name the `DB` backend.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataError> {
        config.validate()?;
        let driver = config.driver.clone().unwrap_or_else(|| DB::DRIVER.to_string());
        let mut options = PoolOptions::<DB>::new().max_connections(config.max_connections);
        // Every connection to an in-memory SQLite URL opens its own database,
        // so keep exactly one and never recycle it.
        if config.url.contains(":memory:") {
            options = options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }
        let max_connections = options.get_max_connections();
        let pool = options
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        tracing::info!(
            driver = %driver,
            max_connections,
            "database pool connected"
        );
        Ok(Self { pool, driver })
    }

    /// Wrap an existing pool, using the backend's own driver name.
    pub fn from_pool(pool: Pool<DB>) -> Self {
        Self {
            pool,
            driver: DB::DRIVER.to_string(),
        }
    }

    /// Override the driver name used for dialect selection.
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Bind a table to this executor, using its driver for the dialect.
    pub fn repository<T, I>(self, table: &str, id_column: &str) -> Result<Repository<T, I, Self>, DataError>
    where
        T: Entity,
        I: Identity,
    {
        let driver = self.driver.clone();
        Repository::new(self, &driver, table, id_column)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn acquire(&self) -> Result<PoolConnection<DB>, DataError> {
        self.pool.acquire().await.map_err(SqlxErrorExt::into_data_error)
    }
}

impl<DB: SqlxDriver> Clone for SqlxExecutor<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            driver: self.driver.clone(),
        }
    }
}

impl<DB: SqlxDriver> fmt::Debug for SqlxExecutor<DB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlxExecutor")
            .field("driver", &self.driver)
            .field("pool", &self.pool)
            .finish()
    }
}

impl<DB: SqlxDriver> Executor for SqlxExecutor<DB> {
    type Transaction = Tx<DB>;

    async fn fetch_one(&self, sql: &str, args: &[Value]) -> Result<Record, DataError> {
        tracing::debug!(sql, args = args.len(), "fetch_one");
        let mut conn = self.acquire().await?;
        DB::fetch_one(&mut *conn, sql, args)
            .await
            .map_err(|e| e.context("unable to get data from db"))
    }

    async fn fetch_all(&self, sql: &str, args: &[Value]) -> Result<Vec<Record>, DataError> {
        tracing::debug!(sql, args = args.len(), "fetch_all");
        let mut conn = self.acquire().await?;
        DB::fetch_all(&mut *conn, sql, args).await
    }

    async fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult, DataError> {
        tracing::debug!(sql, args = args.len(), "exec");
        let mut conn = self.acquire().await?;
        DB::execute(&mut *conn, sql, args).await
    }

    async fn begin(&self, options: TxOptions) -> Result<Tx<DB>, DataError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        let mut tx = Tx::new(tx);
        if let Some(sql) = options.to_sql() {
            tx.exec(&sql, &[]).await?;
        }
        tracing::debug!(?options, "transaction started");
        Ok(tx)
    }
}
