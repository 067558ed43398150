use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use credo_data::{DataError, ExecResult, Record, Value};
use sqlx::mysql::{MySqlArguments, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row, TypeInfo, ValueRef};

use super::{column_error, SqlxDriver};
use crate::error::SqlxErrorExt;

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

impl SqlxDriver for MySql {
    const DRIVER: &'static str = "mysql";

    async fn fetch_one(conn: &mut MySqlConnection, sql: &str, args: &[Value]) -> Result<Record, DataError> {
        let row = prepare(sql, args)
            .fetch_one(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        decode_row(&row)
    }

    async fn fetch_all(conn: &mut MySqlConnection, sql: &str, args: &[Value]) -> Result<Vec<Record>, DataError> {
        let rows = prepare(sql, args)
            .fetch_all(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(conn: &mut MySqlConnection, sql: &str, args: &[Value]) -> Result<ExecResult, DataError> {
        let res = prepare(sql, args)
            .execute(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        let last_insert_id = i64::try_from(res.last_insert_id()).ok();
        Ok(ExecResult::new(Some(res.rows_affected()), last_insert_id))
    }
}

fn prepare<'q>(sql: &'q str, args: &[Value]) -> MySqlQuery<'q> {
    args.iter().fold(sqlx::query::<MySql>(sql), |query, arg| match arg {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Timestamp(t) => query.bind(*t),
        Value::Bytes(b) => query.bind(b.clone()),
    })
}

fn decode_row(row: &MySqlRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal()).map_err(|e| column_error(column.name(), e))?;
        record.push(column.name(), value);
    }
    Ok(record)
}

fn decode_column(row: &MySqlRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Value::Int(row.try_get(index)?),
        unsigned if unsigned.ends_with("UNSIGNED") => {
            let n: u64 = row.try_get(index)?;
            Value::Int(i64::try_from(n).map_err(|e| sqlx::Error::Decode(Box::new(e)))?)
        }
        "FLOAT" => Value::Float(row.try_get::<f32, _>(index)?.into()),
        "DOUBLE" => Value::Float(row.try_get(index)?),
        "DATETIME" => Value::Timestamp(row.try_get::<NaiveDateTime, _>(index)?.and_utc()),
        "TIMESTAMP" => Value::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?),
        "DATE" => {
            let day: NaiveDate = row.try_get(index)?;
            Value::Timestamp(day.and_time(NaiveTime::MIN).and_utc())
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            Value::Bytes(row.try_get(index)?)
        }
        _ => Value::Text(row.try_get(index)?),
    };
    Ok(value)
}
