//! Column selection.
//!
//! Name-based selectors are explicit about how they match: [`ColumnSelector::Prefix`]
//! anchors at the start of the name, [`ColumnSelector::Contains`] matches
//! anywhere. A `Contains("Close")` selection also picks up a column such as
//! `OpenNotClose`; use `Prefix` when only the `Close*` family is meant.

use crate::error::{ChainError, Result};
use crate::utils::{DtypeCategory, column_names, is_numeric_dtype};
use polars::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Closure choosing column names from the current table.
pub type NamesFn = dyn Fn(&DataFrame) -> anyhow::Result<Vec<String>> + Send + Sync;

/// Which columns to keep.
pub enum ColumnSelector {
    /// Exactly these columns. Every name must exist.
    Names(Vec<String>),
    /// Columns whose name starts with the text.
    Prefix(String),
    /// Columns whose name contains the text anywhere.
    Contains(String),
    /// Columns whose name matches the regular expression (unanchored unless
    /// the pattern anchors itself).
    Regex(String),
    /// Columns by logical type. An empty `include` list means every
    /// category; `exclude` is applied afterwards.
    Dtypes {
        include: Vec<DtypeCategory>,
        exclude: Vec<DtypeCategory>,
    },
    /// Columns named by a closure. Every returned name must exist.
    Func(Box<NamesFn>),
}

impl ColumnSelector {
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    pub fn contains(text: impl Into<String>) -> Self {
        Self::Contains(text.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex(pattern.into())
    }

    /// Columns of the given categories.
    pub fn include(categories: impl Into<Vec<DtypeCategory>>) -> Self {
        Self::Dtypes {
            include: categories.into(),
            exclude: Vec::new(),
        }
    }

    /// Every column except those of the given categories.
    pub fn exclude(categories: impl Into<Vec<DtypeCategory>>) -> Self {
        Self::Dtypes {
            include: Vec::new(),
            exclude: categories.into(),
        }
    }

    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&DataFrame) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        Self::Func(Box::new(f))
    }

    /// Resolve the selector to column names, in table order.
    pub fn resolve(&self, table: &DataFrame) -> Result<Vec<String>> {
        let all = column_names(table);

        let selected = match self {
            Self::Names(names) => keep_named(&all, names)?,
            Self::Prefix(prefix) => all
                .into_iter()
                .filter(|name| name.starts_with(prefix.as_str()))
                .collect(),
            Self::Contains(text) => all
                .into_iter()
                .filter(|name| name.contains(text.as_str()))
                .collect(),
            Self::Regex(pattern) => {
                let re = Regex::new(pattern)?;
                all.into_iter().filter(|name| re.is_match(name)).collect()
            }
            Self::Dtypes { include, exclude } => table
                .get_columns()
                .iter()
                .filter(|col| {
                    let category = DtypeCategory::of(col.dtype());
                    (include.is_empty() || include.contains(&category))
                        && !exclude.contains(&category)
                })
                .map(|col| col.name().to_string())
                .collect(),
            Self::Func(f) => {
                let names = f(table).map_err(|e| {
                    ChainError::InvalidArgument(format!("column selector failed: {e}"))
                })?;
                keep_named(&all, &names)?
            }
        };

        Ok(selected)
    }
}

impl fmt::Debug for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Names(names) => f.debug_tuple("Names").field(names).finish(),
            Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
            Self::Contains(text) => f.debug_tuple("Contains").field(text).finish(),
            Self::Regex(pattern) => f.debug_tuple("Regex").field(pattern).finish(),
            Self::Dtypes { include, exclude } => f
                .debug_struct("Dtypes")
                .field("include", include)
                .field("exclude", exclude)
                .finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Filter `all` down to `wanted`, keeping table order and rejecting names
/// the table does not have.
fn keep_named(all: &[String], wanted: &[String]) -> Result<Vec<String>> {
    if let Some(missing) = wanted.iter().find(|name| !all.contains(name)) {
        return Err(ChainError::UnknownColumn(missing.clone()));
    }

    let wanted: HashSet<&str> = wanted.iter().map(String::as_str).collect();
    Ok(all
        .iter()
        .filter(|name| wanted.contains(name.as_str()))
        .cloned()
        .collect())
}

/// Keep only the columns chosen by `selector`, in their original order.
pub fn select_columns(table: &DataFrame, selector: &ColumnSelector) -> Result<DataFrame> {
    let names = selector.resolve(table)?;
    debug!("Selected columns: {:?}", names);
    Ok(table.select(names)?)
}

/// Keep every non-numeric column plus the numeric columns whose mean is at
/// least `min_mean`.
///
/// The mean test only looks at numeric columns; the surviving columns keep
/// their original relative order. The mean skips missing values and `NaN`;
/// a numeric column with neither has no mean and is dropped.
pub fn keep_columns_by_mean(table: &DataFrame, min_mean: f64) -> Result<DataFrame> {
    let mut keep = Vec::with_capacity(table.width());

    for column in table.get_columns() {
        let series = column.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            keep.push(series.name().clone());
            continue;
        }

        match mean_ignoring_nan(series)? {
            Some(mean) if mean >= min_mean => keep.push(series.name().clone()),
            Some(mean) => debug!(
                "Dropping '{}': mean {:.3} below {}",
                series.name(),
                mean,
                min_mean
            ),
            None => warn!("Dropping '{}': no values to average", series.name()),
        }
    }

    Ok(table.select(keep)?)
}

fn mean_ignoring_nan(series: &Series) -> Result<Option<f64>> {
    let values = series.cast(&DataType::Float64)?;
    let values = values.f64()?;
    let present = values.filter(&values.is_not_nan())?;
    Ok(present.mean())
}
