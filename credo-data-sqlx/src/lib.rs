//! # credo-data-sqlx: SQLx backend for Credo
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-backed
//! executor for Credo's data access layer. It depends on [`credo-data`] for
//! the abstract traits and types, and adds the pooled executor, row decoding,
//! transactions and connection configuration needed to talk to a real
//! database.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxExecutor`] | `Executor` over a typed `sqlx::Pool<DB>` |
//! | [`SqlxDriver`] | Binding and row decoding for one backend (`Sqlite`, `Postgres`, `MySql`) |
//! | [`SqlxRepository`] | `Repository` bound to a `SqlxExecutor` |
//! | [`Tx`] | Transaction handed out by `SqlxExecutor::begin` |
//! | [`DatabaseConfig`] | Connection settings from YAML, `.env` and `CREDO_DATABASE_*` |
//! | [`SqlxErrorExt`] | `.into_data_error()` for `sqlx::Error` |
//!
//! # Feature flags
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` (default) |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//! | `mysql`    | MySQL via `sqlx/mysql` |
//!
//! # Quick start
//!
//! ```ignore
//! use credo_data::prelude::*;
//! use credo_data_sqlx::{DatabaseConfig, SqlxExecutor};
//! use sqlx::Sqlite;
//!
//! let executor = SqlxExecutor::<Sqlite>::connect(&DatabaseConfig::load("config.yaml")?).await?;
//! let users = executor.repository::<User, String>("users", "id")?;
//! let page = users.get_page(PageRequest::new().page_size(20)).await?;
//! ```
//!
//! [`credo-data`]: credo_data

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod repository;
pub mod tx;

pub use config::{ConfigError, DatabaseConfig};
pub use driver::SqlxDriver;
pub use error::{SqlxErrorExt, SqlxResult};
pub use executor::SqlxExecutor;
pub use repository::{SqlxRepository, SqlxRepositoryExt};
pub use tx::Tx;

pub use sqlx;
#[cfg(feature = "mysql")]
pub use sqlx::MySql;
#[cfg(feature = "postgres")]
pub use sqlx::Postgres;
#[cfg(feature = "sqlite")]
pub use sqlx::Sqlite;

/// Re-exports of the most commonly used types from both `credo-data` and this crate.
pub mod prelude {
    pub use crate::{DatabaseConfig, SqlxDriver, SqlxErrorExt, SqlxExecutor, SqlxRepository, SqlxRepositoryExt, Tx};
    pub use credo_data::prelude::*;

    #[cfg(feature = "mysql")]
    pub use crate::MySql;
    #[cfg(feature = "postgres")]
    pub use crate::Postgres;
    #[cfg(feature = "sqlite")]
    pub use crate::Sqlite;
}
