//! Database toolkit.
//!
//! The callable operations exposed to the agent: table listing, table
//! description with sample rows, and guarded read-only query execution.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row, TypeInfo};

use common::errors::{AppError, AppResult};
use common::models::{ColumnInfo, QueryResult, TableDescription};
use common::utils::SqlValidator;

/// Callable database operations exposed to the agent.
#[async_trait]
pub trait DbToolkit: Send + Sync {
    /// Lists table names in the public schema.
    async fn list_tables(&self) -> AppResult<Vec<String>>;

    /// Describes a table's columns and returns a few sample rows.
    async fn describe_table(&self, table: &str) -> AppResult<TableDescription>;

    /// Executes a read-only query, capping the rows returned.
    async fn run_query(&self, sql: &str, limit: usize) -> AppResult<QueryResult>;
}

/// Toolkit over a Postgres connection pool.
pub struct PgToolkit {
    pool: PgPool,
    sample_rows: usize,
}

impl PgToolkit {
    pub fn new(pool: PgPool, sample_rows: u32) -> Self {
        Self {
            pool,
            sample_rows: sample_rows as usize,
        }
    }
}

#[async_trait]
impl DbToolkit for PgToolkit {
    async fn list_tables(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("table_name"))
            .collect())
    }

    async fn describe_table(&self, table: &str) -> AppResult<TableDescription> {
        if !SqlValidator::is_safe_identifier(table) {
            return Err(AppError::Validation(format!(
                "invalid table name: {}",
                table
            )));
        }

        let rows = sqlx::query(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppError::Validation(format!("unknown table: {}", table)));
        }

        let columns: Vec<ColumnInfo> = rows
            .iter()
            .map(|row| ColumnInfo {
                name: row.get("column_name"),
                data_type: row.get("data_type"),
            })
            .collect();

        // Identifier was checked above; quoting keeps case-sensitive names working.
        let sample_sql = format!("SELECT * FROM \"{}\" LIMIT {}", table, self.sample_rows);
        let sample = sqlx::query(&sample_sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;

        Ok(TableDescription {
            table: table.to_string(),
            columns,
            sample_rows: sample.iter().map(row_to_values).collect(),
        })
    }

    async fn run_query(&self, sql: &str, limit: usize) -> AppResult<QueryResult> {
        SqlValidator::ensure_read_only(sql)?;

        let start = Instant::now();
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseQuery(e.to_string()))?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| ColumnInfo {
                        name: c.name().to_string(),
                        data_type: c.type_info().name().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let truncated = rows.len() > limit;
        let kept: Vec<Vec<serde_json::Value>> =
            rows.iter().take(limit).map(row_to_values).collect();
        let row_count = kept.len();

        Ok(QueryResult {
            columns,
            rows: kept,
            row_count,
            truncated,
            execution_time_ms,
        })
    }
}

/// Decodes every column of a row into a JSON value, by reported type.
fn row_to_values(row: &PgRow) -> Vec<serde_json::Value> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| decode_column(row, idx, column.type_info().name()))
        .collect()
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> serde_json::Value {
    match type_name {
        "BOOL" => opt(row.try_get::<Option<bool>, _>(idx)),
        "INT2" => opt(row.try_get::<Option<i16>, _>(idx)),
        "INT4" => opt(row.try_get::<Option<i32>, _>(idx)),
        "INT8" => opt(row.try_get::<Option<i64>, _>(idx)),
        "FLOAT4" => opt(row.try_get::<Option<f32>, _>(idx)),
        "FLOAT8" => opt(row.try_get::<Option<f64>, _>(idx)),
        "NUMERIC" => opt_str(row.try_get::<Option<rust_decimal::Decimal>, _>(idx)),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            opt(row.try_get::<Option<String>, _>(idx))
        }
        "UUID" => opt_str(row.try_get::<Option<uuid::Uuid>, _>(idx)),
        "DATE" => opt_str(row.try_get::<Option<chrono::NaiveDate>, _>(idx)),
        "TIME" => opt_str(row.try_get::<Option<chrono::NaiveTime>, _>(idx)),
        "TIMESTAMP" => opt_str(row.try_get::<Option<chrono::NaiveDateTime>, _>(idx)),
        "TIMESTAMPTZ" => {
            opt_str(row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(idx))
        }
        "JSON" | "JSONB" => opt(row.try_get::<Option<serde_json::Value>, _>(idx)),
        // Unknown types fall back to a string decode, then to null.
        _ => opt(row.try_get::<Option<String>, _>(idx)),
    }
}

fn opt<T: Into<serde_json::Value>>(value: Result<Option<T>, sqlx::Error>) -> serde_json::Value {
    match value {
        Ok(Some(v)) => v.into(),
        _ => serde_json::Value::Null,
    }
}

fn opt_str<T: ToString>(value: Result<Option<T>, sqlx::Error>) -> serde_json::Value {
    match value {
        Ok(Some(v)) => serde_json::Value::String(v.to_string()),
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_toolkit() -> PgToolkit {
        // connect_lazy never touches the network; the guarded paths below
        // fail before any query is issued.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://postgres:x@localhost:5432/postgres")
            .unwrap();
        PgToolkit::new(pool, 3)
    }

    #[tokio::test]
    async fn test_describe_rejects_bad_identifier() {
        let toolkit = lazy_toolkit();
        let err = toolkit
            .describe_table("orders\"; drop table x --")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_run_query_rejects_mutations_before_touching_the_pool() {
        let toolkit = lazy_toolkit();
        let err = toolkit.run_query("DROP TABLE orders", 100).await.unwrap_err();
        assert!(matches!(err, AppError::UnsafeSql(_)));
    }
}
