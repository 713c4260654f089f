//! Pipeline steps.

use crate::error::Result;
use crate::ops::{self, ColumnSelector, Derivations, FanOut, RowPredicate};
use crate::pipeline::observer::StepKind;
use polars::prelude::DataFrame;
use std::fmt;

/// Closure used by [`Step::Map`].
pub type MapFn = dyn Fn(&DataFrame) -> Result<DataFrame> + Send + Sync;

/// One transformation in a [`Pipeline`](crate::Pipeline).
pub enum Step {
    Derive(Derivations),
    Filter(RowPredicate),
    Select(ColumnSelector),
    Split {
        source: String,
        separator: String,
        new_names: Vec<String>,
    },
    FanOut(FanOut),
    KeepByMean {
        min_mean: f64,
    },
    Map {
        label: String,
        f: Box<MapFn>,
    },
    /// Returns its input unchanged; the driver passes a preview of `rows`
    /// rows (or the configured default) to the observer.
    Inspect {
        label: String,
        rows: Option<usize>,
    },
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Derive(_) => StepKind::Derive,
            Self::Filter(_) => StepKind::Filter,
            Self::Select(_) => StepKind::Select,
            Self::Split { .. } => StepKind::Split,
            Self::FanOut(_) => StepKind::FanOut,
            Self::KeepByMean { .. } => StepKind::KeepByMean,
            Self::Map { .. } => StepKind::Map,
            Self::Inspect { .. } => StepKind::Inspect,
        }
    }

    /// Short description used in logs, reports and error context.
    pub fn label(&self) -> String {
        match self {
            Self::Derive(batch) => {
                format!("derive [{}]", batch.names().collect::<Vec<_>>().join(", "))
            }
            Self::Filter(_) => "filter".to_string(),
            Self::Select(selector) => format!("select {selector:?}"),
            Self::Split {
                source, new_names, ..
            } => format!("split '{}' into [{}]", source, new_names.join(", ")),
            Self::FanOut(fan_out) => format!(
                "fan out '{}' into [{}]",
                fan_out.source(),
                fan_out.names().join(", ")
            ),
            Self::KeepByMean { min_mean } => format!("keep columns with mean >= {min_mean}"),
            Self::Map { label, .. } | Self::Inspect { label, .. } => label.clone(),
        }
    }

    /// Run the step against `table`, producing a new table.
    pub fn apply(&self, table: &DataFrame) -> Result<DataFrame> {
        match self {
            Self::Derive(batch) => ops::derive_columns(table, batch),
            Self::Filter(predicate) => ops::filter_rows(table, predicate),
            Self::Select(selector) => ops::select_columns(table, selector),
            Self::Split {
                source,
                separator,
                new_names,
            } => ops::split_column(table, source, separator, new_names.as_slice()),
            Self::FanOut(fan_out) => ops::multi_output(table, fan_out),
            Self::KeepByMean { min_mean } => ops::keep_columns_by_mean(table, *min_mean),
            Self::Map { f, .. } => f(table),
            Self::Inspect { .. } => Ok(table.clone()),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("kind", &self.kind())
            .field("label", &self.label())
            .finish()
    }
}
