//! Error types for chained table transformations.
//!
//! Every operation reports failures through [`ChainError`]. Errors are raised
//! at the step that detects them and are never retried; a pipeline aborts at
//! the first failing step.
//!
//! Errors serialize as `{ code, message }` so callers can forward them to a
//! UI or a log sink without matching on variants.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for table transformations.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A derivation failed or produced a column of the wrong length.
    #[error("Failed to compute column '{column}': {reason}")]
    ColumnComputation { column: String, reason: String },

    /// A row predicate produced a mask whose length differs from the table.
    #[error("Predicate mask has {actual} rows, table has {expected}")]
    PredicateShape { expected: usize, actual: usize },

    /// A row predicate could not be evaluated.
    #[error("Failed to evaluate predicate: {0}")]
    PredicateFailed(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    UnknownColumn(String),

    /// A split produced a different number of parts than target columns.
    #[error(
        "Splitting column '{column}' at row {row} produced {actual} parts, expected {expected}"
    )]
    SplitArity {
        column: String,
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// An operation received arguments it cannot work with.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A column name pattern is not a valid regular expression.
    #[error("Invalid column pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ChainError>,
    },
}

impl ChainError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ChainError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with every layer of context removed.
    pub fn root(&self) -> &ChainError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable error code, unaffected by added context.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnComputation { .. } => "COLUMN_COMPUTATION",
            Self::PredicateShape { .. } => "PREDICATE_SHAPE",
            Self::PredicateFailed(_) => "PREDICATE_FAILED",
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::SplitArity { .. } => "SPLIT_ARITY",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidPattern(_) => "INVALID_PATTERN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the error stems from malformed input data rather than from
    /// how the pipeline was put together.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self.root(),
            Self::ColumnComputation { .. }
                | Self::PredicateShape { .. }
                | Self::SplitArity { .. }
                | Self::Polars(_)
        )
    }
}

impl Serialize for ChainError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ChainError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for chaining operations.
pub type Result<T> = std::result::Result<T, ChainError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ChainError::Polars(e).with_context(context))
    }
}
