//! Element-wise choice and row-wise aggregation helpers.
//!
//! [`if_else`] and [`select_choice`] build Polars expressions meant for
//! [`Derivations::expr`](crate::Derivations::expr); [`row_sum`] works on a
//! materialized table and fits [`Derivations::func`](crate::Derivations::func).

use crate::error::{ChainError, Result};
use crate::ops::select::ColumnSelector;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;

/// `then` where `condition` holds, `otherwise` elsewhere.
pub fn if_else(condition: Expr, then: Expr, otherwise: Expr) -> Expr {
    when(condition).then(then).otherwise(otherwise)
}

/// Multi-way choice: for each row, the choice paired with the first true
/// condition, or `default` when none holds.
///
/// # Example
///
/// ```rust,ignore
/// let range = select_choice(
///     vec![col("Open").gt(lit(165)), col("Open").gt_eq(lit(164))],
///     vec![lit("above 165"), lit("range 164-165")],
///     lit("below 164"),
/// )?;
/// ```
pub fn select_choice(conditions: Vec<Expr>, choices: Vec<Expr>, default: Expr) -> Result<Expr> {
    if conditions.is_empty() {
        return Err(ChainError::InvalidArgument(
            "select_choice needs at least one condition".to_string(),
        ));
    }
    if conditions.len() != choices.len() {
        return Err(ChainError::InvalidArgument(format!(
            "select_choice got {} conditions but {} choices",
            conditions.len(),
            choices.len()
        )));
    }

    // Nest from the last pair outwards so the first condition is tested first.
    let expr = conditions
        .into_iter()
        .zip(choices)
        .rev()
        .fold(default, |otherwise, (condition, choice)| {
            if_else(condition, choice, otherwise)
        });

    Ok(expr)
}

/// Row-wise sum of the selected columns as `Float64`, named `"sum"`.
///
/// Missing values are skipped; a row with no values sums to zero. Every
/// selected column must be numeric.
pub fn row_sum(table: &DataFrame, selector: &ColumnSelector) -> Result<Series> {
    let names = selector.resolve(table)?;
    let mut totals = vec![0.0_f64; table.height()];

    for name in &names {
        let series = table.column(name)?.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            return Err(ChainError::ColumnComputation {
                column: "sum".to_string(),
                reason: format!("column '{}' is {}, not numeric", name, series.dtype()),
            });
        }

        let values = series.cast(&DataType::Float64)?;
        for (total, value) in totals.iter_mut().zip(values.f64()?.into_iter()) {
            *total += value.unwrap_or(0.0);
        }
    }

    Ok(Series::new("sum".into(), totals))
}
