pub mod crud;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod executor;
pub mod page;
pub mod query;
pub mod repository;
pub mod resolver;
pub mod table;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crud::CrudEngine;
pub use dialect::Dialect;
pub use entity::{Entity, Identity};
pub use error::{DataError, DataResult, ResultExt};
pub use executor::{
    tracing_debug_fn, DebugExecutor, DebugFn, ExecResult, Executor, IsolationLevel, TxOptions,
};
pub use page::{Page, PageParams, PageRequest};
pub use query::{QueryBuilder, QueryError, Statements};
pub use repository::{Crud, Paginate, Repository};
pub use resolver::PageResolver;
pub use table::TableDescriptor;
pub use value::{FromRecord, FromValue, Record, Value};

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        Crud, DataError, Entity, ExecResult, Executor, FromRecord, Page, PageRequest, Paginate,
        Record, Repository, Value,
    };
}
