use credo_data::DataError;

use crate::config::ConfigError;

/// Maps `sqlx` failures onto the credo error taxonomy.
///
/// A missing row becomes `DataError::NotFound`; anything else is kept as the
/// boxed source of `DataError::Database`.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match self {
            sqlx::Error::RowNotFound => DataError::NotFound,
            other => DataError::database(other),
        }
    }
}

impl From<ConfigError> for DataError {
    fn from(err: ConfigError) -> Self {
        DataError::database(err)
    }
}

/// Result of a call on a `sqlx`-backed executor.
pub type SqlxResult<T> = Result<T, DataError>;
