//! Credo: a typed repository layer over SQL databases.
//!
//! This facade crate re-exports the Credo sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use credo::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature    | Default | Crate                        |
//! |------------|---------|------------------------------|
//! | `sqlx`     | **yes** | `credo-data-sqlx`            |
//! | `sqlite`   | **yes** | `credo-data-sqlx/sqlite`     |
//! | `postgres` | no      | `credo-data-sqlx/postgres`   |
//! | `mysql`    | no      | `credo-data-sqlx/mysql`      |
//! | `testing`  | no      | `credo-data/testing`         |

pub use credo_data;
pub use credo_data::*;

#[cfg(feature = "sqlx")]
pub use credo_data_sqlx;

#[cfg(feature = "sqlx")]
pub use credo_data_sqlx::{DatabaseConfig, SqlxDriver, SqlxExecutor, SqlxRepository, SqlxRepositoryExt, Tx};

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Panics if a global subscriber is already set.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use credo_data::prelude::*;
    pub use credo_data::{PageRequest, TxOptions};

    #[cfg(feature = "sqlx")]
    pub use credo_data_sqlx::prelude::*;
}
