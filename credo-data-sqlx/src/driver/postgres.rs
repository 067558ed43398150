use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use credo_data::{DataError, ExecResult, Record, Value};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgConnection, PgRow, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Column, Encode, Postgres, Row, Type, TypeInfo, ValueRef};

use super::{column_error, SqlxDriver};
use crate::error::SqlxErrorExt;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

impl SqlxDriver for Postgres {
    const DRIVER: &'static str = "postgres";

    async fn fetch_one(conn: &mut PgConnection, sql: &str, args: &[Value]) -> Result<Record, DataError> {
        let row = prepare(sql, args)
            .fetch_one(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        decode_row(&row)
    }

    async fn fetch_all(conn: &mut PgConnection, sql: &str, args: &[Value]) -> Result<Vec<Record>, DataError> {
        let rows = prepare(sql, args)
            .fetch_all(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(conn: &mut PgConnection, sql: &str, args: &[Value]) -> Result<ExecResult, DataError> {
        let res = prepare(sql, args)
            .execute(conn)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(ExecResult::new(Some(res.rows_affected()), None))
    }
}

/// `NULL` sent with OID 0, so the server infers its type from the statement.
/// A typed `NULL` (say, text) is rejected when assigned to an integer or
/// timestamp column.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

fn prepare<'q>(sql: &'q str, args: &[Value]) -> PgQuery<'q> {
    args.iter().fold(sqlx::query::<Postgres>(sql), |query, arg| match arg {
        Value::Null => query.bind(UntypedNull),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        // Sent as `timestamp`: a UTC wall clock round-trips through
        // `TIMESTAMP` columns whatever the session time zone.
        Value::Timestamp(t) => query.bind(t.naive_utc()),
        Value::Bytes(b) => query.bind(b.clone()),
    })
}

fn decode_row(row: &PgRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal()).map_err(|e| column_error(column.name(), e))?;
        record.push(column.name(), value);
    }
    Ok(record)
}

fn decode_column(row: &PgRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOL" => Value::Bool(row.try_get(index)?),
        "INT2" => Value::Int(row.try_get::<i16, _>(index)?.into()),
        "INT4" => Value::Int(row.try_get::<i32, _>(index)?.into()),
        "INT8" => Value::Int(row.try_get(index)?),
        "FLOAT4" => Value::Float(row.try_get::<f32, _>(index)?.into()),
        "FLOAT8" => Value::Float(row.try_get(index)?),
        "BYTEA" => Value::Bytes(row.try_get(index)?),
        "TIMESTAMP" => Value::Timestamp(row.try_get::<NaiveDateTime, _>(index)?.and_utc()),
        "TIMESTAMPTZ" => Value::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?),
        "DATE" => {
            let day: NaiveDate = row.try_get(index)?;
            Value::Timestamp(day.and_time(NaiveTime::MIN).and_utc())
        }
        _ => Value::Text(row.try_get(index)?),
    };
    Ok(value)
}
