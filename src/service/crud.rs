//! Executes built queries against PostgreSQL on a request-scoped connection.

use crate::codec;
use crate::error::AppError;
use crate::sql::{PgBindValue, QueryBuf};
use chrono::TimeDelta;
use serde_json::Value;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::query::Query;
use sqlx::{Connection, Postgres, Row};

pub struct CrudService;

impl CrudService {
    /// All rows of a data query, as JSON objects with tagged temporals.
    pub async fn fetch_all(conn: &mut PgConnection, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_params(sqlx::query(&q.sql), &q.params)?
            .fetch_all(conn)
            .await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    /// At most one row, or None.
    pub async fn fetch_optional(
        conn: &mut PgConnection,
        q: &QueryBuf,
    ) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_params(sqlx::query(&q.sql), &q.params)?
            .fetch_optional(conn)
            .await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    /// Scalar count from a count query.
    pub async fn fetch_count(conn: &mut PgConnection, q: &QueryBuf) -> Result<i64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "count query");
        let row = bind_params(sqlx::query(&q.sql), &q.params)?
            .fetch_one(conn)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// Execute a statement, returning rows affected.
    pub async fn execute(conn: &mut PgConnection, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let done = bind_params(sqlx::query(&q.sql), &q.params)?
            .execute(conn)
            .await?;
        Ok(done.rows_affected())
    }

    /// Run an INSERT built with RETURNING id and yield the generated key.
    pub async fn insert_returning_id(
        conn: &mut PgConnection,
        q: &QueryBuf,
    ) -> Result<i64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "insert");
        let row = bind_params(sqlx::query(&q.sql), &q.params)?
            .fetch_one(conn)
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// Run several statements inside one transaction: all commit together or
    /// none apply.
    pub async fn execute_batch(
        conn: &mut PgConnection,
        queries: &[QueryBuf],
    ) -> Result<(), AppError> {
        let mut tx = conn.begin().await?;
        for q in queries {
            tracing::debug!(sql = %q.sql, params = ?q.params, "execute (tx)");
            bind_params(sqlx::query(&q.sql), &q.params)?
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Result<Query<'q, Postgres, PgArguments>, AppError> {
    for p in params {
        query = query.bind(PgBindValue::from_json(p)?);
    }
    Ok(query)
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::Column;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(f64::from(n)) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return codec::encode_datetime(&d.naive_utc());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return codec::encode_datetime(&d);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(iv)) = row.try_get::<Option<PgInterval>, _>(name) {
        return codec::encode_timedelta(&timedelta_from_interval(&iv));
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(items)) = row.try_get::<Option<Vec<String>>, _>(name) {
        return Value::Array(items.into_iter().map(Value::String).collect());
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}

/// Months have no fixed length; Postgres itself reckons 30 days per month
/// when justifying intervals, so the same convention applies here.
fn timedelta_from_interval(iv: &PgInterval) -> TimeDelta {
    TimeDelta::days(i64::from(iv.months) * 30 + i64::from(iv.days))
        + TimeDelta::microseconds(iv.microseconds)
}
