//! Table ingestion.
//!
//! Reads delimited text with a header row into a [`DataFrame`]. Column types
//! are inferred from the values: all-numeric columns become numeric, columns
//! mixing numbers and text become text, and configured markers become nulls.

use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Read a table from a delimited text file.
pub fn read_table(path: impl AsRef<Path>, config: &PipelineConfig) -> Result<DataFrame> {
    let path = path.as_ref();
    config.validate()?;

    info!("Loading table from: {}", path.display());
    let df = read_options(config)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("opening {}", path.display()))?
        .finish()
        .context(format!("parsing {}", path.display()))?;

    finish(df, config)
}

/// Parse a table held in memory.
pub fn parse_table(content: &str, config: &PipelineConfig) -> Result<DataFrame> {
    config.validate()?;

    let cursor = Cursor::new(content.as_bytes().to_vec());
    let df = read_options(config)
        .into_reader_with_file_handle(cursor)
        .finish()
        .context("parsing table")?;

    finish(df, config)
}

fn read_options(config: &PipelineConfig) -> CsvReadOptions {
    let null_values = NullValues::AllColumns(
        config
            .null_markers
            .iter()
            .map(|marker| PlSmallStr::from(marker.as_str()))
            .collect(),
    );

    CsvReadOptions::default()
        .with_has_header(config.has_header)
        .with_infer_schema_length(config.infer_schema_length)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(config.separator_byte())
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(null_values)),
        )
}

fn finish(df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    let df = match &config.row_index_column {
        Some(name) => df.with_row_index(name.as_str().into(), None)?,
        None => df,
    };

    debug!("Loaded table shape: {:?}", df.shape());
    for (name, dtype) in df.get_column_names().iter().zip(df.dtypes()) {
        debug!("  {}: {}", name, dtype);
    }

    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Open,Close,Flag,MixedTypes\n\
                          160.5,161.0,true,hello world\n\
                          162.0,,false,42\n\
                          158.25,157.5,true,NA\n";

    #[test]
    fn test_parse_infers_types() {
        let df = parse_table(SAMPLE, &PipelineConfig::default()).unwrap();

        assert_eq!(df.shape(), (3, 4));
        assert_eq!(df.column("Open").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Flag").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("MixedTypes").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_null_markers_become_missing() {
        let df = parse_table(SAMPLE, &PipelineConfig::default()).unwrap();

        assert_eq!(df.column("Close").unwrap().null_count(), 1);
        assert_eq!(df.column("MixedTypes").unwrap().null_count(), 1);
    }

    #[test]
    fn test_row_index_column() {
        let config = PipelineConfig::builder()
            .row_index_column("idx")
            .build()
            .unwrap();
        let df = parse_table(SAMPLE, &config).unwrap();

        assert_eq!(df.get_column_names()[0].as_str(), "idx");
        let idx = df.column("idx").unwrap().as_materialized_series();
        let idx = idx.cast(&DataType::Int64).unwrap();
        let values: Vec<Option<i64>> = idx.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_custom_separator() {
        let config = PipelineConfig::builder().separator(';').build().unwrap();
        let df = parse_table("a;b\n1;x\n2;y\n", &config).unwrap();
        assert_eq!(df.shape(), (2, 2));
    }

    #[test]
    fn test_missing_file() {
        let error = read_table("does/not/exist.csv", &PipelineConfig::default()).unwrap_err();
        assert!(error.to_string().contains("exist.csv"));
    }
}
