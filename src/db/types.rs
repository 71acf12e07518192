//! Row decoding into [`CellValue`]s.
//!
//! # Architecture
//!
//! Decoding is two-phase:
//! 1. `TypeCategory` classifies the value's reported type name
//! 2. Database-specific decoders extract the value for that category
//!
//! MySQL rows arrive in the binary protocol, so dates and times are decoded
//! and rendered in MySQL's own text format. Anything else without a native
//! JSON mapping (text, decimals, binary) is read as raw bytes and rendered as
//! lossy UTF-8. Decode failures abort the whole result set.

use crate::error::{DbError, DbResult};
use crate::models::CellValue;
use sqlx::mysql::MySqlRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for a column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Null,
    Integer,
    UnsignedInteger,
    Float,
    Boolean,
    Date,
    DateTime,
    Time,
    /// Everything decoded through the raw bytes
    Text,
}

/// Classify a type name (e.g. `BIGINT UNSIGNED`, `REAL`) into a category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.trim().to_ascii_uppercase();
    let mut words = upper.split_whitespace();
    let base = words.next().unwrap_or("");
    let unsigned = words.any(|w| w == "UNSIGNED");

    match base {
        "NULL" => TypeCategory::Null,
        "BOOL" | "BOOLEAN" => TypeCategory::Boolean,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => {
            if unsigned {
                TypeCategory::UnsignedInteger
            } else {
                TypeCategory::Integer
            }
        }
        "YEAR" => TypeCategory::Integer,
        "FLOAT" | "DOUBLE" | "REAL" => TypeCategory::Float,
        "DATE" => TypeCategory::Date,
        "DATETIME" | "TIMESTAMP" => TypeCategory::DateTime,
        "TIME" => TypeCategory::Time,
        _ => TypeCategory::Text,
    }
}

/// Unsigned values past `i64::MAX` keep their digits as text.
fn unsigned_cell(value: u64) -> CellValue {
    match i64::try_from(value) {
        Ok(v) => CellValue::Int64(v),
        Err(_) => CellValue::Text(value.to_string()),
    }
}

// =============================================================================
// Row to Cells Trait
// =============================================================================

/// Trait for converting database rows into ordered cells.
pub trait RowToCells {
    fn column_names(&self) -> Vec<String>;
    fn to_cells(&self) -> DbResult<Vec<CellValue>>;
}

impl RowToCells for MySqlRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_cells(&self) -> DbResult<Vec<CellValue>> {
        (0..self.columns().len())
            .map(|idx| mysql::decode_column(self, idx))
            .collect()
    }
}

impl RowToCells for SqliteRow {
    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }

    fn to_cells(&self) -> DbResult<Vec<CellValue>> {
        (0..self.columns().len())
            .map(|idx| sqlite::decode_column(self, idx))
            .collect()
    }
}

fn decode_error(column: &str, err: sqlx::Error) -> DbError {
    DbError::backend(format!("failed to read column '{column}': {err}"), None)
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use sqlx::mysql::types::MySqlTime;

    pub fn decode_column(row: &MySqlRow, idx: usize) -> DbResult<CellValue> {
        let name = row.columns()[idx].name();
        let raw = row.try_get_raw(idx).map_err(|e| decode_error(name, e))?;
        if raw.is_null() {
            return Ok(CellValue::Null);
        }
        let category = categorize_type(raw.type_info().name());

        let cell = match category {
            TypeCategory::Null => Ok(CellValue::Null),
            TypeCategory::Boolean => row.try_get_unchecked::<bool, _>(idx).map(CellValue::Bool),
            TypeCategory::Integer => row.try_get_unchecked::<i64, _>(idx).map(CellValue::Int64),
            TypeCategory::UnsignedInteger => row.try_get_unchecked::<u64, _>(idx).map(unsigned_cell),
            TypeCategory::Float => row.try_get_unchecked::<f64, _>(idx).map(CellValue::Float64),
            TypeCategory::Date => temporal(row, idx, "0000-00-00", |row| {
                row.try_get_unchecked::<NaiveDate, _>(idx)
                    .map(|d| d.to_string())
            }),
            TypeCategory::DateTime => temporal(row, idx, "0000-00-00 00:00:00", |row| {
                row.try_get_unchecked::<NaiveDateTime, _>(idx)
                    .map(|dt| dt.to_string())
            }),
            TypeCategory::Time => temporal(row, idx, "00:00:00", |row| {
                row.try_get_unchecked::<MySqlTime, _>(idx)
                    .map(|t| format_time(&t))
            }),
            TypeCategory::Text => row
                .try_get_unchecked::<&[u8], _>(idx)
                .map(CellValue::from_bytes),
        };
        cell.map_err(|e| decode_error(name, e))
    }

    /// A binary temporal value with a zero length byte is the all-zero value.
    fn temporal<F>(row: &MySqlRow, idx: usize, zero: &str, decode: F) -> Result<CellValue, sqlx::Error>
    where
        F: FnOnce(&MySqlRow) -> Result<String, sqlx::Error>,
    {
        let bytes = row.try_get_unchecked::<&[u8], _>(idx)?;
        if bytes == [0] {
            return Ok(CellValue::Text(zero.to_string()));
        }
        decode(row).map(CellValue::Text)
    }

    /// `[-]HH:MM:SS[.ffffff]`, hours may exceed 24.
    pub(super) fn format_time(time: &MySqlTime) -> String {
        let sign = if time.is_negative() { "-" } else { "" };
        let mut text = format!(
            "{sign}{:02}:{:02}:{:02}",
            time.hours(),
            time.minutes(),
            time.seconds()
        );
        if time.microseconds() != 0 {
            text.push_str(&format!(".{:06}", time.microseconds()));
        }
        text
    }
}

mod sqlite {
    use super::*;

    /// SQLite reports the storage class of each value (INTEGER, REAL, TEXT,
    /// BLOB, NULL), so the category follows the value, not the declaration.
    pub fn decode_column(row: &SqliteRow, idx: usize) -> DbResult<CellValue> {
        let name = row.columns()[idx].name();
        let raw = row.try_get_raw(idx).map_err(|e| decode_error(name, e))?;
        if raw.is_null() {
            return Ok(CellValue::Null);
        }
        let category = categorize_type(raw.type_info().name());

        let cell = match category {
            TypeCategory::Null => Ok(CellValue::Null),
            TypeCategory::Boolean => row.try_get_unchecked::<bool, _>(idx).map(CellValue::Bool),
            TypeCategory::Integer | TypeCategory::UnsignedInteger => {
                row.try_get_unchecked::<i64, _>(idx).map(CellValue::Int64)
            }
            TypeCategory::Float => row.try_get_unchecked::<f64, _>(idx).map(CellValue::Float64),
            TypeCategory::Date
            | TypeCategory::DateTime
            | TypeCategory::Time
            | TypeCategory::Text => row
                .try_get_unchecked::<&[u8], _>(idx)
                .map(CellValue::from_bytes),
        };
        cell.map_err(|e| decode_error(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_integers() {
        assert_eq!(categorize_type("INT"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIGINT"), TypeCategory::Integer);
        assert_eq!(categorize_type("tinyint"), TypeCategory::Integer);
        assert_eq!(categorize_type("INTEGER"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIGINT UNSIGNED"), TypeCategory::UnsignedInteger);
        assert_eq!(categorize_type("INT UNSIGNED"), TypeCategory::UnsignedInteger);
    }

    #[test]
    fn test_categorize_other_numeric() {
        assert_eq!(categorize_type("DOUBLE"), TypeCategory::Float);
        assert_eq!(categorize_type("FLOAT"), TypeCategory::Float);
        assert_eq!(categorize_type("REAL"), TypeCategory::Float);
        assert_eq!(categorize_type("BOOLEAN"), TypeCategory::Boolean);
        // Exact decimals stay textual.
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Text);
    }

    #[test]
    fn test_categorize_text_like() {
        for name in ["VARCHAR", "TEXT", "BLOB", "JSON", "POINT", "ENUM"] {
            assert_eq!(categorize_type(name), TypeCategory::Text, "{name}");
        }
        assert_eq!(categorize_type("NULL"), TypeCategory::Null);
        assert_eq!(categorize_type(""), TypeCategory::Text);
    }

    #[test]
    fn test_categorize_temporal() {
        assert_eq!(categorize_type("DATE"), TypeCategory::Date);
        assert_eq!(categorize_type("DATETIME"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIMESTAMP"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIME"), TypeCategory::Time);
        assert_eq!(categorize_type("YEAR"), TypeCategory::Integer);
    }

    #[test]
    fn test_format_time() {
        use sqlx::mysql::types::{MySqlTime, MySqlTimeSign};

        let t = MySqlTime::new(MySqlTimeSign::Positive, 8, 5, 9, 0).unwrap();
        assert_eq!(mysql::format_time(&t), "08:05:09");

        let t = MySqlTime::new(MySqlTimeSign::Negative, 838, 59, 58, 1500).unwrap();
        assert_eq!(mysql::format_time(&t), "-838:59:58.001500");
    }

    #[test]
    fn test_unsigned_cell() {
        assert_eq!(unsigned_cell(42), CellValue::Int64(42));
        assert_eq!(unsigned_cell(i64::MAX as u64), CellValue::Int64(i64::MAX));
        assert_eq!(
            unsigned_cell(u64::MAX),
            CellValue::Text("18446744073709551615".to_string())
        );
    }
}
