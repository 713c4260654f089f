//! Row filtering.

use crate::error::{ChainError, Result};
use polars::prelude::*;
use std::fmt;
use tracing::debug;

/// Closure computing a boolean row mask from the current table.
pub type MaskFn = dyn Fn(&DataFrame) -> anyhow::Result<BooleanChunked> + Send + Sync;

const MASK_COLUMN: &str = "__frame_chain_mask";

/// A row predicate. Rows whose mask value is null are dropped.
pub enum RowPredicate {
    /// A boolean Polars expression.
    Expr(Expr),
    /// A closure producing one boolean per row.
    Mask(Box<MaskFn>),
}

impl RowPredicate {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr(expr)
    }

    pub fn mask<F>(f: F) -> Self
    where
        F: Fn(&DataFrame) -> anyhow::Result<BooleanChunked> + Send + Sync + 'static,
    {
        Self::Mask(Box::new(f))
    }

    /// Evaluate the predicate into a mask, without checking its length.
    fn evaluate(&self, table: &DataFrame) -> anyhow::Result<BooleanChunked> {
        match self {
            Self::Expr(expr) => {
                let evaluated = table
                    .clone()
                    .lazy()
                    .select([expr.clone().alias(MASK_COLUMN)])
                    .collect()?;
                let mask = evaluated
                    .column(MASK_COLUMN)?
                    .as_materialized_series()
                    .bool()?
                    .clone();
                Ok(mask)
            }
            Self::Mask(f) => f(table),
        }
    }
}

impl fmt::Debug for RowPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expr(expr) => f.debug_tuple("Expr").field(expr).finish(),
            Self::Mask(_) => f.write_str("Mask(..)"),
        }
    }
}

impl From<Expr> for RowPredicate {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

/// Keep only the rows where `predicate` is true.
pub fn filter_rows(table: &DataFrame, predicate: &RowPredicate) -> Result<DataFrame> {
    let mask = predicate
        .evaluate(table)
        .map_err(|e| ChainError::PredicateFailed(e.to_string()))?;

    if mask.len() != table.height() {
        return Err(ChainError::PredicateShape {
            expected: table.height(),
            actual: mask.len(),
        });
    }

    let out = table.filter(&mask)?;
    debug!("Filter kept {} of {} rows", out.height(), table.height());
    Ok(out)
}
