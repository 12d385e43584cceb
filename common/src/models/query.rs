//! SQL query result models.
//!
//! Results of read-only queries executed on behalf of the agent.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of a read-only SQL query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Column information, in select order.
    pub columns: Vec<ColumnInfo>,

    /// Row data (each row is a vector of JSON values).
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows returned after the cap was applied.
    pub row_count: usize,

    /// Whether rows were dropped by the result cap.
    pub truncated: bool,

    /// Query execution time in milliseconds.
    pub execution_time_ms: u64,
}

/// Column information in a query result.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the database.
    pub data_type: String,
}

impl QueryResult {
    /// Creates an empty query result.
    pub fn empty() -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
            truncated: false,
            execution_time_ms: 0,
        }
    }
}
