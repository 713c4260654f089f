//! Pipeline construction and execution.
//!
//! A [`Pipeline`] is an ordered list of [`Step`]s plus configuration and an
//! any number of observers. It is built once with [`Pipeline::builder()`] and run
//! against an input table; it keeps no state between runs.

use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::loader;
use crate::ops::{ColumnSelector, Derivations, FanOut, RowPredicate};
use crate::pipeline::observer::{ClosureObserver, StepObserver, StepReport};
use crate::pipeline::step::Step;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// A chain of table transformations.
///
/// # Example
///
/// ```rust,ignore
/// use frame_chain::{ColumnSelector, Derivations, FanOut, Pipeline};
/// use polars::prelude::*;
///
/// let table = Pipeline::builder()
///     .filter(col("Volume").gt(lit(50_000_000)))
///     .fan_out(FanOut::numeric("Volume", ["VolumeK", "VolumeM"], |v| vec![v / 1e3, v / 1e6]))
///     .inspect("scaled")
///     .on_step(|report| println!("{} -> {} rows", report.label, report.rows_after))
///     .build()?
///     .run_file("table_1.csv")?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    steps: Vec<Step>,
    observers: Vec<Arc<dyn StepObserver>>,
}

/// Output of [`Pipeline::run_traced`].
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// The final table
    pub table: DataFrame,
    /// One report per executed step, in order
    pub reports: Vec<StepReport>,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step against `table` and return the final table.
    ///
    /// The input table is not modified. Execution stops at the first failing
    /// step; its error is returned with the step position and label attached.
    pub fn run(&self, table: &DataFrame) -> Result<DataFrame> {
        self.run_traced(table).map(|run| run.table)
    }

    /// Load `path` with this pipeline's configuration, then run.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let table = loader::read_table(path, &self.config)?;
        self.run(&table)
    }

    /// Like [`run`](Self::run), also returning a report for every step.
    pub fn run_traced(&self, table: &DataFrame) -> Result<PipelineRun> {
        info!(
            "Running pipeline of {} steps on {:?} table",
            self.steps.len(),
            table.shape()
        );

        match self.run_internal(table) {
            Ok(run) => {
                info!("Pipeline finished with shape {:?}", run.table.shape());
                Ok(run)
            }
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn run_internal(&self, table: &DataFrame) -> Result<PipelineRun> {
        let mut current = table.clone();
        let mut reports = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let label = step.label();
            let started = Instant::now();

            let next = step
                .apply(&current)
                .context(format!("step {} ({})", index + 1, label))?;

            let report = StepReport {
                index,
                kind: step.kind(),
                label,
                rows_before: current.height(),
                rows_after: next.height(),
                columns_before: current.width(),
                columns_after: next.width(),
                elapsed_us: started.elapsed().as_micros() as u64,
            };
            debug!(
                "Step {} ({}): {:?} -> {:?}",
                index + 1,
                report.label,
                current.shape(),
                next.shape()
            );

            if let Step::Inspect { label, rows } = step {
                self.inspect(label, &next, rows.unwrap_or(self.config.preview_rows));
            }
            for observer in &self.observers {
                observer.on_step(&report);
            }

            reports.push(report);
            current = next;
        }

        Ok(PipelineRun {
            table: current,
            reports,
        })
    }

    fn inspect(&self, label: &str, table: &DataFrame, rows: usize) {
        let preview = table.head(Some(rows));
        debug!("Inspect '{}':\n{}", label, preview);
        for observer in &self.observers {
            observer.on_inspect(label, &preview);
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("steps", &self.steps)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    steps: Vec<Step>,
    observers: Vec<Arc<dyn StepObserver>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Append an arbitrary step.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a column derivation batch.
    pub fn derive(self, derivations: Derivations) -> Self {
        self.step(Step::Derive(derivations))
    }

    /// Append a row filter.
    pub fn filter(self, predicate: impl Into<RowPredicate>) -> Self {
        self.step(Step::Filter(predicate.into()))
    }

    /// Append a column selection.
    pub fn select(self, selector: ColumnSelector) -> Self {
        self.step(Step::Select(selector))
    }

    /// Append a strict column split.
    pub fn split<I, S>(self, source: impl Into<String>, separator: impl Into<String>, new_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.step(Step::Split {
            source: source.into(),
            separator: separator.into(),
            new_names: new_names.into_iter().map(Into::into).collect(),
        })
    }

    /// Append a multi-result fan-out.
    pub fn fan_out(self, fan_out: FanOut) -> Self {
        self.step(Step::FanOut(fan_out))
    }

    /// Append a mean-threshold column retention.
    pub fn keep_columns_by_mean(self, min_mean: f64) -> Self {
        self.step(Step::KeepByMean { min_mean })
    }

    /// Append a labelled arbitrary transformation.
    pub fn map<F>(self, label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&DataFrame) -> Result<DataFrame> + Send + Sync + 'static,
    {
        self.step(Step::Map {
            label: label.into(),
            f: Box::new(f),
        })
    }

    /// Append a preview point using the configured preview size.
    pub fn inspect(self, label: impl Into<String>) -> Self {
        self.step(Step::Inspect {
            label: label.into(),
            rows: None,
        })
    }

    /// Append a preview point showing `rows` rows.
    pub fn inspect_rows(self, label: impl Into<String>, rows: usize) -> Self {
        self.step(Step::Inspect {
            label: label.into(),
            rows: Some(rows),
        })
    }

    /// Add an observer that receives step reports and previews.
    ///
    /// Observers are notified in the order they were added.
    pub fn observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Add a closure receiving one report per step, alongside any other
    /// observer.
    ///
    /// For previews from inspect steps, implement [`StepObserver`] and pass
    /// it to [`observer`](Self::observer).
    pub fn on_step<F>(mut self, callback: F) -> Self
    where
        F: Fn(&StepReport) + Send + Sync + 'static,
    {
        self.observers.push(Arc::new(ClosureObserver::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        debug!("Built pipeline with {} steps", self.steps.len());
        Ok(Pipeline {
            config,
            steps: self.steps,
            observers: self.observers,
        })
    }
}
