//! Shared helpers for the transformation operations.

use polars::prelude::*;

/// Logical category of a column, as seen by dtype-based selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtypeCategory {
    /// Integers and floats
    Numeric,
    /// Dates, datetimes and times of day
    Datetime,
    Boolean,
    /// Strings and categoricals
    Text,
    /// Columns holding only missing values
    Null,
    Other,
}

impl DtypeCategory {
    /// Category of a Polars data type.
    pub fn of(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64 => Self::Numeric,
            DataType::Date | DataType::Datetime(_, _) | DataType::Time => Self::Datetime,
            DataType::Boolean => Self::Boolean,
            DataType::String | DataType::Categorical(_, _) => Self::Text,
            DataType::Null => Self::Null,
            _ => Self::Other,
        }
    }
}

/// Whether arithmetic on the column is meaningful.
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    DtypeCategory::of(dtype) == DtypeCategory::Numeric
}

// =============================================================================
// Table Utilities
// =============================================================================

/// Column names of a table, in display order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Look up a column as a Series, reporting a missing name as
/// [`ChainError::UnknownColumn`](crate::ChainError::UnknownColumn).
pub fn require_series<'a>(df: &'a DataFrame, name: &str) -> crate::Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| crate::ChainError::UnknownColumn(name.to_string()))
}

// =============================================================================
// Tests
// =============================================================================
