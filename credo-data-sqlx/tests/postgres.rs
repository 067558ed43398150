//! Runs against the server named by `CREDO_DATABASE_URL`; every test is a
//! no-op when it is unset or not a Postgres URL.
#![cfg(feature = "postgres")]

use chrono::{DateTime, NaiveDate, Utc};
use credo_data::prelude::*;
use credo_data_sqlx::config::ENV_URL;
use credo_data_sqlx::{DatabaseConfig, Postgres, SqlxExecutor, SqlxRepository};

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: String,
    first_name: String,
    last_name: Option<String>,
    birth_date: DateTime<Utc>,
    age: Option<i32>,
}

impl FromRecord for User {
    fn from_record(record: &Record) -> Result<Self, DataError> {
        Ok(Self {
            id: record.get("id")?,
            first_name: record.get("first_name")?,
            last_name: record.get("last_name")?,
            birth_date: record.get("birth_date")?,
            age: record.get("age")?,
        })
    }
}

impl Entity for User {
    fn columns() -> &'static [&'static str] {
        &["id", "first_name", "last_name", "birth_date", "age"]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.clone().into(),
            self.first_name.clone().into(),
            self.last_name.clone().into(),
            self.birth_date.into(),
            self.age.into(),
        ]
    }
}

fn user(n: usize) -> User {
    User {
        id: format!("u{n}"),
        first_name: format!("First{n}"),
        last_name: (n % 2 == 0).then(|| "Smith".to_string()),
        birth_date: NaiveDate::from_ymd_opt(1980 + n as i32, 6, 15)
            .unwrap()
            .and_hms_opt(9, 45, 30)
            .unwrap()
            .and_utc(),
        age: Some(40 - n as i32),
    }
}

fn database_url() -> Option<String> {
    std::env::var(ENV_URL)
        .ok()
        .filter(|url| url.starts_with("postgres"))
}

/// A fresh table per test, so tests can share one database.
async fn seeded(table: &str) -> Option<SqlxRepository<User, String, Postgres>> {
    let url = database_url()?;
    let executor = SqlxExecutor::<Postgres>::connect(&DatabaseConfig::new(url).with_max_connections(2))
        .await
        .unwrap();
    executor
        .exec(&format!("DROP TABLE IF EXISTS {table}"), &[])
        .await
        .unwrap();
    let repo: SqlxRepository<User, String, Postgres> = executor.repository(table, "id").unwrap();
    repo.init_schema(&format!(
        "CREATE TABLE {table} (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT,
            birth_date TIMESTAMP NOT NULL,
            age INTEGER
        )"
    ))
    .await
    .unwrap();
    for n in 0..5 {
        repo.create(&user(n)).await.unwrap();
    }
    Some(repo)
}

#[tokio::test]
async fn test_crud_round_trip() {
    let Some(repo) = seeded("credo_pg_crud").await else {
        return;
    };
    assert_eq!(repo.dialect().name(), "postgres");

    assert_eq!(repo.get_by_id(&"u1".to_string()).await.unwrap(), user(1));
    assert!(repo
        .get_by_id(&"nobody".to_string())
        .await
        .unwrap_err()
        .is_not_found());

    let ids = vec!["u3".to_string(), "zz".to_string(), "u1".to_string()];
    let found: Vec<_> = repo
        .get_by_ids(&ids)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(found, ["u1", "u3"]);

    let all = repo.get_all().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), all.len() as u64);

    let res = repo.delete(&"u4".to_string()).await.unwrap();
    assert_eq!(res.rows_affected().unwrap(), 1);
    assert_eq!(repo.count().await.unwrap(), 4);

    repo.delete_all().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_sets_null_on_typed_columns() {
    let Some(repo) = seeded("credo_pg_update").await else {
        return;
    };
    let mut changed = user(2);
    changed.first_name = "Renamed".into();
    changed.last_name = None;
    changed.age = None;

    let res = repo.update(&"u2".to_string(), &changed).await.unwrap();
    assert_eq!(res.rows_affected().unwrap(), 1);
    assert_eq!(repo.get_by_id(&"u2".to_string()).await.unwrap(), changed);

    let res = repo.update(&"ghost".to_string(), &user(9)).await.unwrap();
    assert_eq!(res.rows_affected().unwrap(), 0);
}

#[tokio::test]
async fn test_pages_and_aggregates() {
    let Some(repo) = seeded("credo_pg_pages").await else {
        return;
    };

    let page = repo
        .get_page(PageRequest::new().page_number(1).page_size(2))
        .await
        .unwrap();
    let ids: Vec<_> = page.content.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, ["u2", "u3"]);
    assert_eq!((page.total, page.total_pages), (5, 3));

    let page = repo
        .get_page(PageRequest::new().page_size(2).sort_by("id").sort_desc())
        .await
        .unwrap();
    let ids: Vec<_> = page.content.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, ["u4", "u3"]);

    let rows: Vec<(String, i64)> = repo
        .select_many(
            "SELECT CASE WHEN last_name IS NULL THEN 'without' ELSE 'with' END AS category, \
             COUNT(*) AS cnt FROM credo_pg_pages GROUP BY category ORDER BY category",
            &[],
        )
        .await
        .unwrap();
    assert_eq!(rows, [("with".to_string(), 3), ("without".to_string(), 2)]);
}
