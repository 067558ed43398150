use std::marker::PhantomData;
use std::sync::Arc;

use crate::entity::{Entity, Identity};
use crate::error::{DataError, ResultExt};
use crate::executor::{ExecResult, Executor};
use crate::query::Statements;
use crate::repository::Crud;
use crate::value::Value;

/// Typed create/read/update/delete for one entity and identity type.
///
/// Each call builds its statement through [`Statements`] and hands it to the
/// executor. Failures are labelled with the stage they happened in; row
/// counts are returned untouched and never checked here.
pub struct CrudEngine<T, I, E> {
    statements: Arc<Statements>,
    executor: Arc<E>,
    _marker: PhantomData<fn() -> (T, I)>,
}

impl<T, I, E> CrudEngine<T, I, E> {
    pub fn new(statements: Arc<Statements>, executor: Arc<E>) -> Self {
        Self {
            statements,
            executor,
            _marker: PhantomData,
        }
    }

    pub fn statements(&self) -> &Statements {
        &self.statements
    }
}

impl<T, I, E> Clone for CrudEngine<T, I, E> {
    fn clone(&self) -> Self {
        Self {
            statements: self.statements.clone(),
            executor: self.executor.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity, I: Identity, E: Executor> CrudEngine<T, I, E> {
    async fn select_many(&self, sql: &str, args: &[Value]) -> Result<Vec<T>, DataError> {
        self.executor
            .select_many(sql, args)
            .await
            .context("unable to load records")
    }

    async fn exec(&self, sql: &str, args: &[Value], stage: &'static str) -> Result<ExecResult, DataError> {
        self.executor.exec(sql, args).await.context(stage)
    }
}

impl<T: Entity, I: Identity, E: Executor> Crud<T, I> for CrudEngine<T, I, E> {
    async fn get_all(&self) -> Result<Vec<T>, DataError> {
        let (sql, args) = self
            .statements
            .select_all()
            .context("unable to create 'select all' query")?;
        self.select_many(&sql, &args).await
    }

    async fn get_by_id(&self, id: &I) -> Result<T, DataError> {
        let (sql, args) = self
            .statements
            .select_by_id(id.clone().into())
            .context("unable to create 'select by id' query")?;
        self.executor
            .select_one(&sql, &args)
            .await
            .context("unable to select record")
    }

    async fn get_by_ids(&self, ids: &[I]) -> Result<Vec<T>, DataError> {
        if ids.is_empty() {
            tracing::trace!(table = self.statements.table().name(), "empty id list, no query issued");
            return Ok(Vec::new());
        }
        let ids = ids.iter().cloned().map(Into::into).collect();
        let (sql, args) = self
            .statements
            .select_by_ids(ids)
            .context("unable to create 'select by ids' query")?;
        self.select_many(&sql, &args)
            .await
            .context("unable to select records")
    }

    async fn create(&self, entity: &T) -> Result<ExecResult, DataError> {
        let (sql, args) = self
            .statements
            .insert(entity)
            .context("unable to create 'insert' query")?;
        self.exec(&sql, &args, "unable to insert record").await
    }

    async fn delete_all(&self) -> Result<ExecResult, DataError> {
        let (sql, args) = self.statements.delete_all();
        self.exec(&sql, &args, "unable to delete all records").await
    }

    async fn delete(&self, id: &I) -> Result<ExecResult, DataError> {
        let (sql, args) = self
            .statements
            .delete(id.clone().into())
            .context("unable to create 'delete' query")?;
        self.exec(&sql, &args, "unable to delete record").await
    }

    async fn update(&self, id: &I, entity: &T) -> Result<ExecResult, DataError> {
        let (sql, args) = self
            .statements
            .update(id.clone().into(), entity)
            .context("unable to create 'update' query")?;
        self.exec(&sql, &args, "unable to update record").await
    }
}
