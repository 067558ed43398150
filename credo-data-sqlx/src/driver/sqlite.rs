use chrono::{NaiveDate, NaiveTime};
use credo_data::{DataError, ExecResult, Record, Value};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

use super::{column_error, SqlxDriver};
use crate::error::SqlxErrorExt;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

impl SqlxDriver for Sqlite {
    const DRIVER: &'static str = "sqlite3";

    async fn fetch_one(conn: &mut SqliteConnection, sql: &str, args: &[Value]) -> Result<Record, DataError> {
        let row = prepare(sql, args)
            .fetch_one(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        decode_row(&row)
    }

    async fn fetch_all(conn: &mut SqliteConnection, sql: &str, args: &[Value]) -> Result<Vec<Record>, DataError> {
        let rows = prepare(sql, args)
            .fetch_all(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(conn: &mut SqliteConnection, sql: &str, args: &[Value]) -> Result<ExecResult, DataError> {
        let res = prepare(sql, args)
            .execute(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(ExecResult::new(Some(res.rows_affected()), Some(res.last_insert_rowid())))
    }
}

fn prepare<'q>(sql: &'q str, args: &[Value]) -> SqliteQuery<'q> {
    args.iter().fold(sqlx::query::<Sqlite>(sql), |query, arg| match arg {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Timestamp(t) => query.bind(*t),
        Value::Bytes(b) => query.bind(b.clone()),
    })
}

fn decode_row(row: &SqliteRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal(), column.type_info().name())
            .map_err(|e| column_error(column.name(), e))?;
        record.push(column.name(), value);
    }
    Ok(record)
}

/// SQLite values carry a storage class; the declared column type only
/// decides how text and integers holding dates or flags are read.
fn decode_column(row: &SqliteRow, index: usize, declared: &str) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let stored = raw.type_info().name().to_string();
    let value = match (declared, stored.as_str()) {
        ("DATETIME", _) => Value::Timestamp(row.try_get(index)?),
        ("DATE", "TEXT") => {
            let day: NaiveDate = row.try_get(index)?;
            Value::Timestamp(day.and_time(NaiveTime::MIN).and_utc())
        }
        ("BOOLEAN", "INTEGER" | "BIGINT") => Value::Bool(row.try_get::<i64, _>(index)? != 0),
        (_, "INTEGER" | "BIGINT") => Value::Int(row.try_get(index)?),
        (_, "REAL") => Value::Float(row.try_get(index)?),
        (_, "BLOB") => Value::Bytes(row.try_get(index)?),
        _ => Value::Text(row.try_get(index)?),
    };
    Ok(value)
}
