use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, Utc};
use credo::prelude::*;

pub const TABLE_NAME: &str = "users";
pub const ID_COLUMN: &str = "id";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT,
    birth_date DATETIME NOT NULL
)";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

impl From<UserId> for Value {
    fn from(id: UserId) -> Self {
        Value::Text(id.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub birth_date: DateTime<Utc>,
}

impl FromRecord for User {
    fn from_record(record: &Record) -> Result<Self, DataError> {
        Ok(Self {
            id: UserId(record.get("id")?),
            first_name: record.get("first_name")?,
            last_name: record.get("last_name")?,
            birth_date: record.get("birth_date")?,
        })
    }
}

impl Entity for User {
    fn columns() -> &'static [&'static str] {
        &["id", "first_name", "last_name", "birth_date"]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.clone().into(),
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.birth_date.into(),
        ]
    }
}

const COUNT_BY_LAST_NAME_EXISTS: &str = "
SELECT 'with last_name' AS category, COUNT(*) AS cnt FROM users WHERE last_name IS NOT NULL
UNION
SELECT 'without last_name' AS category, COUNT(*) AS cnt FROM users WHERE last_name IS NULL";

/// The users table plus its hand-written queries.
pub struct UserRepo {
    inner: SqlxRepository<User, UserId, Sqlite>,
}

impl UserRepo {
    pub fn new(executor: SqlxExecutor<Sqlite>) -> Result<Self, DataError> {
        let inner = executor
            .repository(TABLE_NAME, ID_COLUMN)?
            .with_debug_fn(|sql, args| tracing::debug!(target: "users::sql", sql, ?args));
        Ok(Self { inner })
    }

    /// Row counts keyed by whether `last_name` is set.
    pub async fn count_by_last_name_exists(&self) -> Result<HashMap<String, i64>, DataError> {
        let rows: Vec<(String, i64)> = self
            .inner
            .select_many(COUNT_BY_LAST_NAME_EXISTS, &[])
            .await
            .map_err(|e| e.context("unable to select records"))?;
        Ok(rows.into_iter().collect())
    }
}

impl Deref for UserRepo {
    type Target = SqlxRepository<User, UserId, Sqlite>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
