//! Pipeline module.
//!
//! This module provides the step-by-step pipeline driver and its observer.

mod builder;
pub mod observer;
mod step;

pub use builder::{Pipeline, PipelineBuilder, PipelineRun};
pub use observer::{ClosureObserver, StepKind, StepObserver, StepReport};
pub use step::{MapFn, Step};
