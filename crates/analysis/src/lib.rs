//! Measurement tasks over snapshots and the pipeline that runs them.
//!
//! A [`Pipeline`] holds [`HandlerTask`]s in configured order. For every
//! snapshot each handler applies its pre-actions, looks up its inputs in the
//! results of the handlers before it, runs its [`Task`] and passes the result
//! through its post-actions.

pub mod actions;
pub mod args;
pub mod error;
pub mod expression;
pub mod handler;
pub mod pipeline;
pub mod task;
pub mod tasks;
pub mod value;

#[cfg(test)]
mod expression_test;

pub use actions::{ActionFactory, PlotSink, ResultAction, SharedPlotSink, SnapshotAction};
pub use error::{ActionError, PipelineError, TaskError};
pub use expression::{Expression, ExpressionError};
pub use handler::{HandlerTask, InputPath, Outputs};
pub use pipeline::{Pipeline, TaskConfig};
pub use task::{Measurement, Task, TaskConstructor, TimeEvolution};
pub use tasks::builtin_tasks;
pub use value::{TaskInputs, TaskResult, Value, result_to_json};
