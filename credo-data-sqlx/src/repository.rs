use credo_data::{DataError, Entity, Identity, Repository};

use crate::config::DatabaseConfig;
use crate::driver::SqlxDriver;
use crate::executor::SqlxExecutor;

/// A [`Repository`] backed by a typed `sqlx` pool.
///
/// # Example
///
/// ```ignore
/// let users: SqlxRepository<User, String, Sqlite> = SqlxRepository::connect(&config, "users", "id").await?;
/// ```
pub type SqlxRepository<T, I, DB> = Repository<T, I, SqlxExecutor<DB>>;

/// Shorthand constructors for [`SqlxRepository`].
pub trait SqlxRepositoryExt: Sized {
    /// Open a pool from `config` and bind `table` to it.
    fn connect(
        config: &DatabaseConfig,
        table: &str,
        id_column: &str,
    ) -> impl std::future::Future<Output = Result<Self, DataError>> + Send;
}

impl<T: Entity, I: Identity, DB: SqlxDriver> SqlxRepositoryExt for SqlxRepository<T, I, DB> {
    async fn connect(config: &DatabaseConfig, table: &str, id_column: &str) -> Result<Self, DataError> {
        SqlxExecutor::<DB>::connect(config).await?.repository(table, id_column)
    }
}
