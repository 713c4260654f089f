//! Observation of pipeline execution.
//!
//! Steps never print or display anything. The pipeline driver reports each
//! finished step to a [`StepObserver`], and hands the preview taken by an
//! inspect step to [`StepObserver::on_inspect`]. Callers decide what to do
//! with it: log it, render it, or collect it for assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use frame_chain::Pipeline;
//!
//! let pipeline = Pipeline::builder()
//!     .inspect("raw")
//!     .on_step(|report| println!("{}: {} rows", report.label, report.rows_after))
//!     .build()?;
//! ```

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Kinds of pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Column derivation
    Derive,
    /// Row filtering
    Filter,
    /// Column selection
    Select,
    /// Column splitting
    Split,
    /// Multi-result fan-out
    FanOut,
    /// Mean-threshold column retention
    KeepByMean,
    /// Arbitrary labelled transformation
    Map,
    /// Pass-through preview point
    Inspect,
}

impl StepKind {
    /// Returns a human-readable name for the step kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Derive => "Derive Columns",
            Self::Filter => "Filter Rows",
            Self::Select => "Select Columns",
            Self::Split => "Split Column",
            Self::FanOut => "Fan Out",
            Self::KeepByMean => "Keep Columns By Mean",
            Self::Map => "Map",
            Self::Inspect => "Inspect",
        }
    }
}

/// What happened during one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Zero-based position of the step in the pipeline
    pub index: usize,

    /// Kind of step
    pub kind: StepKind,

    /// Step label (defaults to the kind's display name)
    pub label: String,

    /// Row count of the step's input
    pub rows_before: usize,

    /// Row count of the step's output
    pub rows_after: usize,

    /// Column count of the step's input
    pub columns_before: usize,

    /// Column count of the step's output
    pub columns_after: usize,

    /// Time spent in the step
    pub elapsed_us: u64,
}

impl StepReport {
    /// Rows removed by the step (zero for steps that keep every row).
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Columns added by the step (zero for steps that only drop columns).
    pub fn columns_added(&self) -> usize {
        self.columns_after.saturating_sub(self.columns_before)
    }
}

/// Receiver of pipeline events.
///
/// Implementations must be `Send + Sync` so a pipeline holding one can be
/// shared across threads.
pub trait StepObserver: Send + Sync {
    /// Called after each step completes.
    fn on_step(&self, report: &StepReport);

    /// Called by inspect steps with the first rows of the current table.
    fn on_inspect(&self, _label: &str, _preview: &DataFrame) {}
}

/// Wrapper that implements [`StepObserver`] using a closure over reports.
pub struct ClosureObserver<F>
where
    F: Fn(&StepReport) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureObserver<F>
where
    F: Fn(&StepReport) + Send + Sync,
{
    /// Creates a new closure-based observer.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StepObserver for ClosureObserver<F>
where
    F: Fn(&StepReport) + Send + Sync,
{
    fn on_step(&self, report: &StepReport) {
        (self.callback)(report);
    }
}
