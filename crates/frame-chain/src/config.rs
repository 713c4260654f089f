//! Configuration for loading tables and running pipelines.
//!
//! This module provides configuration options using the builder pattern.
//! Thresholds used by individual steps (for example the minimum mean of
//! [`keep_columns_by_mean`](crate::ops::keep_columns_by_mean)) are step
//! arguments, not configuration.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Values read as missing when no markers are configured explicitly.
pub const DEFAULT_NULL_MARKERS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Configuration shared by the loader and the pipeline driver.
///
/// # Example
///
/// ```rust,ignore
/// use frame_chain::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .separator(';')
///     .row_index_column("idx")
///     .preview_rows(3)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether the first line of the input holds column names.
    /// Default: true
    pub has_header: bool,

    /// Field delimiter. Must be a single ASCII character other than `"`.
    /// Default: ','
    pub separator: char,

    /// Number of rows scanned to infer column types.
    /// `None` scans the whole file.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// Field values read as missing.
    /// Default: [`DEFAULT_NULL_MARKERS`]
    pub null_markers: Vec<String>,

    /// When set, the positional row index is materialized as a `UInt32`
    /// column of this name, placed first.
    /// Default: None
    pub row_index_column: Option<String>,

    /// Rows handed to the observer by an inspect step that does not set
    /// its own count.
    /// Default: 5
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            has_header: true,
            separator: ',',
            infer_schema_length: None,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            row_index_column: None,
            preview_rows: 5,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if !self.separator.is_ascii() || self.separator == '"' {
            return Err(ConfigValidationError::InvalidSeparator(self.separator));
        }

        if self.infer_schema_length == Some(0) {
            return Err(ConfigValidationError::ZeroInferSchemaLength);
        }

        if self.preview_rows == 0 {
            return Err(ConfigValidationError::ZeroPreviewRows);
        }

        if let Some(name) = &self.row_index_column
            && name.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyRowIndexName);
        }

        Ok(())
    }

    /// The separator as the single byte the CSV reader expects.
    pub(crate) fn separator_byte(&self) -> u8 {
        // validate() guarantees an ASCII separator
        self.separator as u8
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid separator {0:?} (must be a single ASCII character other than '\"')")]
    InvalidSeparator(char),

    #[error("infer_schema_length must be at least 1 (use None to scan every row)")]
    ZeroInferSchemaLength,

    #[error("preview_rows must be at least 1")]
    ZeroPreviewRows,

    #[error("row_index_column must not be empty")]
    EmptyRowIndexName,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    has_header: Option<bool>,
    separator: Option<char>,
    infer_schema_length: Option<Option<usize>>,
    null_markers: Option<Vec<String>>,
    row_index_column: Option<String>,
    preview_rows: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Set whether the input has a header row.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    /// Set the field delimiter.
    pub fn separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Limit type inference to the first `rows` rows (`None` scans all).
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Replace the set of values read as missing.
    pub fn null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = Some(markers.into_iter().map(Into::into).collect());
        self
    }

    /// Materialize the positional row index under this column name.
    pub fn row_index_column(mut self, name: impl Into<String>) -> Self {
        self.row_index_column = Some(name.into());
        self
    }

    /// Set the default preview size of inspect steps.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            has_header: self.has_header.unwrap_or(defaults.has_header),
            separator: self.separator.unwrap_or(defaults.separator),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            null_markers: self.null_markers.unwrap_or(defaults.null_markers),
            row_index_column: self.row_index_column.or(defaults.row_index_column),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
        };

        config.validate()?;
        Ok(config)
    }
}
