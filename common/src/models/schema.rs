//! Schema introspection models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::query::ColumnInfo;

/// Description of one table: columns plus a few sample rows the agent can
/// use for context before writing a query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableDescription {
    /// Table name.
    pub table: String,

    /// Columns in ordinal order.
    pub columns: Vec<ColumnInfo>,

    /// Up to a handful of sample rows (same column order).
    pub sample_rows: Vec<Vec<serde_json::Value>>,
}
