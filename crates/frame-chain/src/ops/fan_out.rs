//! Fan-out: one source column, several aligned result columns.
//!
//! Results are written positionally next to the rows they came from, so the
//! new columns stay aligned with the source even when earlier steps removed
//! rows. When the table carries an explicit row index column (see
//! [`PipelineConfig::row_index_column`](crate::PipelineConfig)), that index is
//! carried along untouched.

use crate::error::{ChainError, Result};
use crate::utils::{is_numeric_dtype, require_series};
use std::collections::HashSet;
use polars::prelude::*;
use std::fmt;
use tracing::debug;

/// Element-wise function over numbers.
pub type NumericFanFn = dyn Fn(f64) -> Vec<f64> + Send + Sync;

/// Element-wise function over arbitrary values.
pub type ValueFanFn = dyn Fn(&AnyValue<'_>) -> anyhow::Result<Vec<AnyValue<'static>>> + Send + Sync;

enum Kernel {
    Numeric(Box<NumericFanFn>),
    Value(Box<ValueFanFn>),
}

/// A multi-result function applied to one column.
///
/// # Example
///
/// ```rust,ignore
/// use frame_chain::FanOut;
///
/// let scale = FanOut::numeric("Volume", ["VolumeK", "VolumeM"], |v| vec![v / 1e3, v / 1e6]);
/// ```
pub struct FanOut {
    source: String,
    names: Vec<String>,
    kernel: Kernel,
}

impl FanOut {
    /// Fan out a numeric column. The source must be numeric and is cast to
    /// `Float64`; missing inputs give missing outputs.
    pub fn numeric<I, S, F>(source: impl Into<String>, names: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(f64) -> Vec<f64> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            names: names.into_iter().map(Into::into).collect(),
            kernel: Kernel::Numeric(Box::new(f)),
        }
    }

    /// Fan out any column. Missing inputs give missing outputs without
    /// calling `f`. Each output column takes the supertype of its values.
    pub fn values<I, S, F>(source: impl Into<String>, names: I, f: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&AnyValue<'_>) -> anyhow::Result<Vec<AnyValue<'static>>> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            names: names.into_iter().map(Into::into).collect(),
            kernel: Kernel::Value(Box::new(f)),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn arity_error(&self, row: usize, produced: usize) -> ChainError {
        ChainError::ColumnComputation {
            column: self.names.join(", "),
            reason: format!(
                "function returned {} values at row {} of '{}', expected {}",
                produced,
                row,
                self.source,
                self.names.len()
            ),
        }
    }

    fn apply_numeric(&self, source: &Series, f: &NumericFanFn) -> Result<Vec<Series>> {
        if !is_numeric_dtype(source.dtype()) {
            return Err(ChainError::ColumnComputation {
                column: self.names.join(", "),
                reason: format!(
                    "numeric fan-out source '{}' is {}, not numeric",
                    self.source,
                    source.dtype()
                ),
            });
        }

        let numbers = source.cast(&DataType::Float64)?;
        let numbers = numbers.f64()?;
        let mut outputs: Vec<Vec<Option<f64>>> =
            vec![Vec::with_capacity(numbers.len()); self.names.len()];

        for (row, value) in numbers.into_iter().enumerate() {
            match value {
                Some(x) => {
                    let results = f(x);
                    if results.len() != self.names.len() {
                        return Err(self.arity_error(row, results.len()));
                    }
                    for (target, result) in outputs.iter_mut().zip(results) {
                        target.push(Some(result));
                    }
                }
                None => outputs.iter_mut().for_each(|target| target.push(None)),
            }
        }

        Ok(self
            .names
            .iter()
            .zip(outputs)
            .map(|(name, values)| Series::new(name.as_str().into(), values))
            .collect())
    }

    fn apply_values(&self, source: &Series, f: &ValueFanFn) -> Result<Vec<Series>> {
        let mut outputs: Vec<Vec<AnyValue<'static>>> =
            vec![Vec::with_capacity(source.len()); self.names.len()];

        for row in 0..source.len() {
            let value = source.get(row)?;
            if value.is_null() {
                outputs
                    .iter_mut()
                    .for_each(|target| target.push(AnyValue::Null));
                continue;
            }

            let results = f(&value).map_err(|e| ChainError::ColumnComputation {
                column: self.names.join(", "),
                reason: format!("row {row} of '{}': {e}", self.source),
            })?;
            if results.len() != self.names.len() {
                return Err(self.arity_error(row, results.len()));
            }
            for (target, result) in outputs.iter_mut().zip(results) {
                target.push(result);
            }
        }

        self.names
            .iter()
            .zip(outputs)
            .map(|(name, values)| {
                Ok(Series::from_any_values(
                    name.as_str().into(),
                    &values,
                    false,
                )?)
            })
            .collect()
    }
}

impl fmt::Debug for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kernel = match self.kernel {
            Kernel::Numeric(_) => "numeric",
            Kernel::Value(_) => "values",
        };
        f.debug_struct("FanOut")
            .field("source", &self.source)
            .field("names", &self.names)
            .field("kernel", &kernel)
            .finish()
    }
}

/// Apply `fan_out` to its source column and append one column per result.
pub fn multi_output(table: &DataFrame, fan_out: &FanOut) -> Result<DataFrame> {
    if fan_out.names.is_empty() {
        return Err(ChainError::InvalidArgument(format!(
            "fan-out of '{}' needs at least one target column",
            fan_out.source
        )));
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(fan_out.names.len());
    if let Some(duplicate) = fan_out.names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(ChainError::InvalidArgument(format!(
            "fan-out of '{}' names column '{}' more than once",
            fan_out.source, duplicate
        )));
    }

    let source = require_series(table, &fan_out.source)?;
    let columns = match &fan_out.kernel {
        Kernel::Numeric(f) => fan_out.apply_numeric(source, f.as_ref())?,
        Kernel::Value(f) => fan_out.apply_values(source, f.as_ref())?,
    };

    let mut out = table.clone();
    for series in columns {
        out.with_column(series)?;
    }

    debug!(
        "Fanned '{}' out into {:?}",
        fan_out.source, fan_out.names
    );
    Ok(out)
}
