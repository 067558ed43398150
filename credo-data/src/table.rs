use crate::query::{validate_identifier, QueryError};

/// The table a repository works on and the column that identifies its rows.
///
/// Built once when the repository is constructed and shared by the CRUD
/// engine and the page resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    name: String,
    id_column: String,
}

impl TableDescriptor {
    /// # Errors
    ///
    /// Returns `QueryError::InvalidIdentifier` if either name is empty or is
    /// not a plain (optionally dotted) SQL identifier.
    pub fn new(name: impl Into<String>, id_column: impl Into<String>) -> Result<Self, QueryError> {
        let name = name.into();
        let id_column = id_column.into();
        validate_identifier(&name, "table")?;
        validate_identifier(&id_column, "column")?;
        Ok(Self { name, id_column })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }
}
