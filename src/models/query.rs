//! Query-related data models.
//!
//! This module defines the tool input and the two result shapes returned to
//! the client: a row set for reads and an effect summary for writes.

use serde::{Deserialize, Serialize};

/// Arguments accepted by both SQL tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlArguments {
    pub sql: String,
}

impl SqlArguments {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

/// A single decoded cell.
///
/// Serializes to the bare JSON value: `null`, a boolean, a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    /// Byte strings and every type without a native mapping
    Text(String),
}

impl CellValue {
    /// Lossy UTF-8 rendering of raw column bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::Text(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Result of a read statement.
///
/// Every row has exactly `columns.len()` cells, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Result of a write statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSummary {
    pub rows_affected: i64,
    /// 0 when the statement generated no id
    pub last_insert_id: i64,
}
