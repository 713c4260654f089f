//! Readable method chaining over Polars DataFrames.
//!
//! # Overview
//!
//! This library turns a table transformation into a sequence of small,
//! independently readable steps:
//!
//! - **Derive**: append or overwrite columns; later entries in a batch can use
//!   earlier ones
//! - **Filter**: keep rows matching an expression or a mask closure
//! - **Select**: keep columns by name, prefix, substring, regex or type
//! - **Split**: split a text column into several, strictly
//! - **Fan out**: apply a multi-result function and keep results row-aligned
//! - **Keep by mean**: drop numeric columns whose mean is below a threshold
//!
//! No operation mutates its input. Errors are reported through [`ChainError`]
//! at the step that detects them.
//!
//! # Direct chaining
//!
//! ```rust,ignore
//! use frame_chain::{Derivations, PipelineConfig, TableExt, read_table};
//! use polars::prelude::*;
//!
//! let table = read_table("table_1.csv", &PipelineConfig::default())?
//!     .derive_columns(
//!         Derivations::new()
//!             .expr("OpenCloseRange", col("Open") - col("Close"))
//!             .expr("OpenCloseRangeAbs", col("OpenCloseRange").abs()),
//!     )?
//!     .filter_expr(col("Volume").gt(lit(50_000_000)))?;
//! ```
//!
//! # Pipelines
//!
//! ```rust,ignore
//! use frame_chain::{FanOut, Pipeline};
//! use polars::prelude::*;
//!
//! let pipeline = Pipeline::builder()
//!     .inspect("raw")
//!     .filter(col("Volume").gt(lit(50_000_000)))
//!     .fan_out(FanOut::numeric("Volume", ["VolumeK", "VolumeM"], |v| vec![v / 1e3, v / 1e6]))
//!     .on_step(|report| println!("[{}] {} rows", report.label, report.rows_after))
//!     .build()?;
//!
//! let table = pipeline.run_file("table_1.csv")?;
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod loader;
pub mod ops;
pub mod pipeline;
pub mod utils;

// Re-exports for convenient access
pub use chain::TableExt;
pub use config::{ConfigValidationError, DEFAULT_NULL_MARKERS, PipelineConfig, PipelineConfigBuilder};
pub use error::{ChainError, Result, ResultExt};
pub use loader::{parse_table, read_table};
pub use ops::{
    ColumnSelector, Derivation, Derivations, FanOut, RowPredicate, derive_columns, filter_rows,
    if_else, keep_columns_by_mean, multi_output, row_sum, select_choice, select_columns,
    split_column,
};
pub use pipeline::{
    ClosureObserver, Pipeline, PipelineBuilder, PipelineRun, Step, StepKind, StepObserver,
    StepReport,
};
pub use utils::DtypeCategory;
