use std::borrow::Cow;

use crate::query::QueryError;

/// Errors that can occur in the data layer.
///
/// Failures are wrapped with a stage label as they travel up
/// ([`DataError::Context`]), but the underlying cause stays reachable through
/// [`DataError::root_cause`], so callers can still ask "was this a missing
/// row?" after any number of wrappers.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The requested page size was zero.
    #[error("invalid page size: page size must be greater than 0, but received {0}")]
    InvalidPageSize(u64),

    /// The statement could not be assembled.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A single-row query matched nothing.
    #[error("row not found")]
    NotFound,

    /// A column could not be converted into the requested Rust type.
    #[error("unable to decode column `{column}`: {message}")]
    Decode { column: String, message: String },

    /// The backend does not provide the requested capability.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Opaque driver failure (connectivity, constraint violation, ...).
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A failure labelled with the stage it happened in.
    #[error("{context}: {source}")]
    Context {
        context: Cow<'static, str>,
        #[source]
        source: Box<DataError>,
    },
}

impl DataError {
    /// Construct a `Database` variant from any error type.
    ///
    /// Used by backend crates (e.g. `credo-data-sqlx`) to wrap
    /// driver-specific errors.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }

    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        DataError::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Wrap this error with a stage label.
    pub fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        DataError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through every `Context` wrapper.
    pub fn root_cause(&self) -> &DataError {
        let mut current = self;
        while let DataError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), DataError::NotFound)
    }

    pub fn is_invalid_page_size(&self) -> bool {
        matches!(self.root_cause(), DataError::InvalidPageSize(_))
    }
}

/// Attach a stage label to the error of a `Result`.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DataError>;
}

impl<T, E: Into<DataError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, DataError> {
        self.map_err(|e| e.into().context(context))
    }
}

/// Convenience alias for data-layer results.
pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_root_cause() {
        let err = DataError::NotFound
            .context("unable to get data from db")
            .context("unable to select record");
        assert!(err.is_not_found());
        assert!(!err.is_invalid_page_size());
        assert_eq!(
            err.to_string(),
            "unable to select record: unable to get data from db: row not found"
        );
    }

    #[test]
    fn test_result_ext_converts_query_errors() {
        let res: Result<(), QueryError> = Err(QueryError::NoColumns);
        let err = res.context("unable to create 'insert' query").unwrap_err();
        assert!(matches!(err.root_cause(), DataError::Query(QueryError::NoColumns)));
        assert!(err.to_string().starts_with("unable to create 'insert' query: "));
    }

    #[test]
    fn test_database_error_exposes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "connection reset");
        let err = DataError::database(io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "database error: connection reset");
    }
}
