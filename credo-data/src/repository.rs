use std::future::Future;
use std::sync::Arc;

use crate::crud::CrudEngine;
use crate::dialect::Dialect;
use crate::entity::{Entity, Identity};
use crate::error::{DataError, ResultExt};
use crate::executor::{DebugExecutor, DebugFn, ExecResult, Executor, TxOptions};
use crate::page::{Page, PageRequest};
use crate::query::Statements;
use crate::resolver::PageResolver;
use crate::table::TableDescriptor;
use crate::value::{Record, Value};

/// Typed CRUD over one table.
pub trait Crud<T, I>: Send + Sync
where
    T: Entity,
    I: Identity,
{
    fn get_all(&self) -> impl Future<Output = Result<Vec<T>, DataError>> + Send;

    /// # Errors
    ///
    /// Fails with a `NotFound` root cause when no row has this identity.
    fn get_by_id(&self, id: &I) -> impl Future<Output = Result<T, DataError>> + Send;

    /// Rows whose identity is in `ids`, in ascending identity order.
    /// Unknown ids are skipped; an empty slice issues no query.
    fn get_by_ids(&self, ids: &[I]) -> impl Future<Output = Result<Vec<T>, DataError>> + Send;

    fn create(&self, entity: &T) -> impl Future<Output = Result<ExecResult, DataError>> + Send;

    fn delete_all(&self) -> impl Future<Output = Result<ExecResult, DataError>> + Send;

    fn delete(&self, id: &I) -> impl Future<Output = Result<ExecResult, DataError>> + Send;

    /// Overwrite every mapped column of the row with this identity.
    /// Touching no row is not an error; check `rows_affected`.
    fn update(&self, id: &I, entity: &T) -> impl Future<Output = Result<ExecResult, DataError>> + Send;
}

/// Paged reads over one table.
pub trait Paginate<T>: Send + Sync
where
    T: Entity,
{
    fn get_page(&self, request: PageRequest) -> impl Future<Output = Result<Page<T>, DataError>> + Send;

    /// Number of rows in the table.
    fn count(&self) -> impl Future<Output = Result<u64, DataError>> + Send;
}

/// Everything needed to work with one table: typed CRUD, paging and raw SQL
/// against the same executor.
///
/// Every statement passes through the installed debug function before it
/// reaches the executor.
///
/// ```no_run
/// # use credo_data::prelude::*;
/// # async fn demo<T: Entity, E: Executor>(executor: E) -> Result<(), DataError> {
/// let repo: Repository<T, String, E> = Repository::new(executor, "sqlite3", "users", "id")?
///     .with_debug_fn(|sql, args| println!("{sql} {args:?}"));
/// let page = repo.get_page(PageRequest::new().page_size(2)).await?;
/// # Ok(())
/// # }
/// ```
pub struct Repository<T, I, E> {
    executor: Arc<DebugExecutor<E>>,
    crud: CrudEngine<T, I, DebugExecutor<E>>,
    pages: PageResolver<T, DebugExecutor<E>>,
}

impl<T, I, E> Repository<T, I, E> {
    /// Bind a table to an executor. The driver name picks the SQL dialect;
    /// unknown names fall back to a generic ANSI dialect.
    ///
    /// # Errors
    ///
    /// Fails when the table or identity column name is not a valid
    /// identifier.
    pub fn new(executor: E, driver: &str, table: &str, id_column: &str) -> Result<Self, DataError> {
        let table = TableDescriptor::new(table, id_column)?;
        let dialect = Dialect::resolve(driver);
        tracing::debug!(
            table = table.name(),
            id_column = table.id_column(),
            dialect = dialect.name(),
            "repository created"
        );
        let statements = Arc::new(Statements::new(dialect, table));
        let executor = Arc::new(DebugExecutor::new(executor));
        Ok(Self {
            crud: CrudEngine::new(statements.clone(), executor.clone()),
            pages: PageResolver::new(statements, executor.clone()),
            executor,
        })
    }

    /// Install a debug function, builder style.
    pub fn with_debug_fn(self, debug_fn: impl Fn(&str, &[Value]) + Send + Sync + 'static) -> Self {
        self.executor.set_debug_fn(Arc::new(debug_fn));
        self
    }

    /// Replace the debug function. Safe to call while other calls run.
    pub fn set_debug_fn(&self, debug_fn: DebugFn) {
        self.executor.set_debug_fn(debug_fn);
    }

    pub fn debug_fn(&self) -> DebugFn {
        self.executor.debug_fn()
    }

    pub fn table(&self) -> &TableDescriptor {
        self.crud.statements().table()
    }

    pub fn dialect(&self) -> &Dialect {
        self.crud.statements().dialect()
    }

    /// The wrapped executor, bypassing the debug function.
    pub fn executor(&self) -> &E {
        self.executor.inner()
    }
}

impl<T, I, E: Executor> Repository<T, I, E> {
    /// Run schema-preparation SQL (usually a `CREATE TABLE`) as-is.
    pub async fn init_schema(&self, sql: &str) -> Result<ExecResult, DataError> {
        let res = self
            .executor
            .exec(sql, &[])
            .await
            .context("unable to execute query")?;
        tracing::info!(table = self.table().name(), "schema initialized");
        Ok(res)
    }
}

impl<T, I, E> Clone for Repository<T, I, E> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            crud: self.crud.clone(),
            pages: self.pages.clone(),
        }
    }
}

impl<T, I, E> Crud<T, I> for Repository<T, I, E>
where
    T: Entity,
    I: Identity,
    E: Executor,
{
    fn get_all(&self) -> impl Future<Output = Result<Vec<T>, DataError>> + Send {
        self.crud.get_all()
    }

    fn get_by_id(&self, id: &I) -> impl Future<Output = Result<T, DataError>> + Send {
        self.crud.get_by_id(id)
    }

    fn get_by_ids(&self, ids: &[I]) -> impl Future<Output = Result<Vec<T>, DataError>> + Send {
        self.crud.get_by_ids(ids)
    }

    fn create(&self, entity: &T) -> impl Future<Output = Result<ExecResult, DataError>> + Send {
        self.crud.create(entity)
    }

    fn delete_all(&self) -> impl Future<Output = Result<ExecResult, DataError>> + Send {
        self.crud.delete_all()
    }

    fn delete(&self, id: &I) -> impl Future<Output = Result<ExecResult, DataError>> + Send {
        self.crud.delete(id)
    }

    fn update(&self, id: &I, entity: &T) -> impl Future<Output = Result<ExecResult, DataError>> + Send {
        self.crud.update(id, entity)
    }
}

impl<T, I, E> Paginate<T> for Repository<T, I, E>
where
    T: Entity,
    I: Identity,
    E: Executor,
{
    fn get_page(&self, request: PageRequest) -> impl Future<Output = Result<Page<T>, DataError>> + Send {
        self.pages.get_page(request)
    }

    fn count(&self) -> impl Future<Output = Result<u64, DataError>> + Send {
        self.pages.count()
    }
}

/// Raw SQL on the repository's executor, for queries the typed API does not
/// cover. Statements still go through the debug function.
impl<T, I, E: Executor> Executor for Repository<T, I, E> {
    type Transaction = E::Transaction;

    fn fetch_one(&self, sql: &str, args: &[Value]) -> impl Future<Output = Result<Record, DataError>> + Send {
        self.executor.fetch_one(sql, args)
    }

    fn fetch_all(&self, sql: &str, args: &[Value]) -> impl Future<Output = Result<Vec<Record>, DataError>> + Send {
        self.executor.fetch_all(sql, args)
    }

    fn exec(&self, sql: &str, args: &[Value]) -> impl Future<Output = Result<ExecResult, DataError>> + Send {
        self.executor.exec(sql, args)
    }

    fn begin(&self, options: TxOptions) -> impl Future<Output = Result<Self::Transaction, DataError>> + Send {
        self.executor.begin(options)
    }
}
