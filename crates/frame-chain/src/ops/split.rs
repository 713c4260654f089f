//! Splitting one text column into several.

use crate::error::{ChainError, Result};
use crate::utils::require_series;
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Split every value of `source` on `separator` into one new column per
/// entry of `new_names`.
///
/// The split is strict: a row that yields a different number of parts than
/// `new_names.len()` fails the whole operation with
/// [`ChainError::SplitArity`]. Missing source values give missing values in
/// every new column. Non-text source columns are cast to text first.
pub fn split_column<S: AsRef<str>>(
    table: &DataFrame,
    source: &str,
    separator: &str,
    new_names: &[S],
) -> Result<DataFrame> {
    if separator.is_empty() {
        return Err(ChainError::InvalidArgument(
            "split separator must not be empty".to_string(),
        ));
    }
    if new_names.is_empty() {
        return Err(ChainError::InvalidArgument(format!(
            "splitting '{source}' needs at least one target column"
        )));
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(new_names.len());
    if let Some(duplicate) = new_names
        .iter()
        .map(|name| name.as_ref())
        .find(|name: &&str| !seen.insert(*name))
    {
        return Err(ChainError::InvalidArgument(format!(
            "splitting '{source}' names column '{duplicate}' more than once"
        )));
    }

    let series = require_series(table, source)?.cast(&DataType::String)?;
    let values = series.str()?;
    let arity = new_names.len();

    let mut parts: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(values.len()); arity];

    for (row, value) in values.into_iter().enumerate() {
        match value {
            Some(text) => {
                let pieces: Vec<&str> = text.split(separator).collect();
                if pieces.len() != arity {
                    return Err(ChainError::SplitArity {
                        column: source.to_string(),
                        row,
                        expected: arity,
                        actual: pieces.len(),
                    });
                }
                for (target, piece) in parts.iter_mut().zip(pieces) {
                    target.push(Some(piece.to_string()));
                }
            }
            None => {
                for target in parts.iter_mut() {
                    target.push(None);
                }
            }
        }
    }

    let mut out = table.clone();
    for (name, values) in new_names.iter().zip(parts) {
        out.with_column(Series::new(name.as_ref().into(), values))?;
    }

    debug!(
        "Split '{}' into {} columns over {} rows",
        source,
        arity,
        out.height()
    );
    Ok(out)
}
