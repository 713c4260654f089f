//! Method-chaining surface over [`DataFrame`].
//!
//! Each method borrows the table and returns a new one, so transformations
//! read top to bottom and chain with `?`:
//!
//! ```rust,ignore
//! use frame_chain::{ColumnSelector, Derivations, TableExt};
//! use polars::prelude::*;
//!
//! let out = table
//!     .derive_columns(Derivations::new().expr("Range", col("Open") - col("Close")))?
//!     .filter_expr(col("Volume").gt(lit(50_000_000)))?
//!     .keep_columns(&ColumnSelector::prefix("Close"))?;
//! ```

use crate::error::Result;
use crate::ops::{self, ColumnSelector, Derivations, FanOut, RowPredicate};
use polars::prelude::*;

/// Chainable table operations.
pub trait TableExt {
    /// Append or overwrite derived columns.
    fn derive_columns(&self, derivations: Derivations) -> Result<DataFrame>;

    /// Keep rows matching a predicate.
    fn filter_rows(&self, predicate: RowPredicate) -> Result<DataFrame>;

    /// Keep rows where a boolean expression is true.
    fn filter_expr(&self, predicate: Expr) -> Result<DataFrame>;

    /// Keep the selected columns (`DataFrame::select_columns` is taken).
    fn keep_columns(&self, selector: &ColumnSelector) -> Result<DataFrame>;

    /// Split a text column into one column per name.
    fn split_column<S: AsRef<str>>(
        &self,
        source: &str,
        separator: &str,
        new_names: &[S],
    ) -> Result<DataFrame>;

    /// Fan one column out into several aligned columns.
    fn multi_output(&self, fan_out: &FanOut) -> Result<DataFrame>;

    /// Keep non-numeric columns and numeric columns with mean `>= min_mean`.
    fn keep_columns_by_mean(&self, min_mean: f64) -> Result<DataFrame>;

    /// Apply an arbitrary transformation.
    fn pipe_through<F>(&self, f: F) -> Result<DataFrame>
    where
        F: FnOnce(&DataFrame) -> Result<DataFrame>;
}

impl TableExt for DataFrame {
    fn derive_columns(&self, derivations: Derivations) -> Result<DataFrame> {
        ops::derive_columns(self, &derivations)
    }

    fn filter_rows(&self, predicate: RowPredicate) -> Result<DataFrame> {
        ops::filter_rows(self, &predicate)
    }

    fn filter_expr(&self, predicate: Expr) -> Result<DataFrame> {
        ops::filter_rows(self, &RowPredicate::Expr(predicate))
    }

    fn keep_columns(&self, selector: &ColumnSelector) -> Result<DataFrame> {
        ops::select_columns(self, selector)
    }

    fn split_column<S: AsRef<str>>(
        &self,
        source: &str,
        separator: &str,
        new_names: &[S],
    ) -> Result<DataFrame> {
        ops::split_column(self, source, separator, new_names)
    }

    fn multi_output(&self, fan_out: &FanOut) -> Result<DataFrame> {
        ops::multi_output(self, fan_out)
    }

    fn keep_columns_by_mean(&self, min_mean: f64) -> Result<DataFrame> {
        ops::keep_columns_by_mean(self, min_mean)
    }

    fn pipe_through<F>(&self, f: F) -> Result<DataFrame>
    where
        F: FnOnce(&DataFrame) -> Result<DataFrame>,
    {
        f(self)
    }
}
