//! Column derivation.
//!
//! A [`Derivations`] batch holds named column computations. Entries run in
//! insertion order, and each one sees the columns produced by the entries
//! before it, so a later entry may build on an earlier one.

use crate::error::{ChainError, Result};
use polars::prelude::*;
use std::fmt;
use tracing::debug;

/// Closure computing a column from the current table.
pub type ColumnFn = dyn Fn(&DataFrame) -> anyhow::Result<Series> + Send + Sync;

/// How a single derived column is computed.
pub enum Derivation {
    /// A Polars expression, evaluated against the table. Scalar results are
    /// broadcast to the table height.
    Expr(Expr),
    /// A closure returning a full-height column.
    Func(Box<ColumnFn>),
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(expr) => f.debug_tuple("Expr").field(expr).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// An ordered batch of named derivations.
///
/// # Example
///
/// ```rust,ignore
/// use frame_chain::Derivations;
/// use polars::prelude::*;
///
/// let batch = Derivations::new()
///     .expr("OpenCloseRange", col("Open") - col("Close"))
///     .expr("OpenCloseRangeAbs", col("OpenCloseRange").abs());
/// ```
#[derive(Debug, Default)]
pub struct Derivations {
    entries: Vec<(String, Derivation)>,
}

impl Derivations {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column computed by an expression.
    pub fn expr(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.entries.push((name.into(), Derivation::Expr(expr)));
        self
    }

    /// Add a column computed by a closure.
    pub fn func<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&DataFrame) -> anyhow::Result<Series> + Send + Sync + 'static,
    {
        self.entries
            .push((name.into(), Derivation::Func(Box::new(f))));
        self
    }

    /// Names of the columns this batch produces, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Append or overwrite the columns of `derivations`.
///
/// The input table is left untouched. A column that already exists keeps its
/// position and takes the new values; new columns are appended in batch
/// order.
pub fn derive_columns(table: &DataFrame, derivations: &Derivations) -> Result<DataFrame> {
    let mut out = table.clone();
    let height = table.height();

    for (name, derivation) in &derivations.entries {
        let series = evaluate(&out, name, derivation)?;

        if series.len() != height {
            return Err(ChainError::ColumnComputation {
                column: name.clone(),
                reason: format!(
                    "produced {} values for a table of {} rows",
                    series.len(),
                    height
                ),
            });
        }

        out.with_column(series.with_name(name.as_str().into()))?;
        debug!("Derived column '{}'", name);
    }

    Ok(out)
}

fn evaluate(table: &DataFrame, name: &str, derivation: &Derivation) -> Result<Series> {
    let computed = match derivation {
        Derivation::Expr(expr) => evaluate_expr(table, name, expr.clone()),
        Derivation::Func(f) => f(table),
    };

    computed.map_err(|e| ChainError::ColumnComputation {
        column: name.to_string(),
        reason: e.to_string(),
    })
}

fn evaluate_expr(table: &DataFrame, name: &str, expr: Expr) -> anyhow::Result<Series> {
    // with_column broadcasts scalar results to the table height
    let evaluated = table
        .clone()
        .lazy()
        .with_column(expr.alias(name))
        .select([col(name)])
        .collect()?;

    Ok(evaluated.column(name)?.as_materialized_series().clone())
}
