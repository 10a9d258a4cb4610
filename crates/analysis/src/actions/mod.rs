//! Pre-actions transform the snapshot a task sees, post-actions transform
//! the task's result.
//!
//! Both are configured as mappings with a `type` key, the remaining keys are
//! the action's arguments:
//!
//! ```yaml
//! actions_before:
//!   - {type: slice, parts: [[0, 0.1]]}
//! actions_after:
//!   - {type: fit, degree: 3}
//!   - {type: visualizer, id: profiles, marker: "."}
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::error::Error;
use std::rc::Rc;

use log::error;
use nbody::Snapshot;

use crate::error::ActionError;
use crate::task::TaskResult;

pub mod baryons;
pub mod extract;
pub mod fit;
pub mod logger;
pub mod slice;
pub mod visualizer;

#[cfg(test)]
mod fit_test;
#[cfg(test)]
mod slice_test;

pub use baryons::BaryonsAction;
pub use extract::ExtractAction;
pub use fit::FitAction;
pub use logger::LoggerAction;
pub use slice::SliceAction;
pub use visualizer::VisualizerAction;

/// A snapshot transform applied before the task runs.
pub trait SnapshotAction {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot, ActionError>;
}

/// A result transform applied after the task runs.
pub trait ResultAction {
    fn apply(&mut self, result: TaskResult) -> Result<TaskResult, ActionError>;

    /// Keys present after this action, given the keys before it.
    fn transform_schema(&self, keys: BTreeSet<String>) -> BTreeSet<String> {
        keys
    }
}

/// Receiver of the `visualizer` post-action.
pub trait PlotSink {
    fn plot(
        &mut self,
        data: &TaskResult,
        params: &serde_yaml::Value,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

pub type SharedPlotSink = Rc<RefCell<dyn PlotSink>>;

/// Splits an action config into its `type` and its remaining arguments.
fn split_type(config: &serde_yaml::Value) -> Result<(String, serde_yaml::Value), ActionError> {
    let mut mapping = config
        .as_mapping()
        .cloned()
        .ok_or_else(|| ActionError::Config("action must be a mapping".to_string()))?;
    let kind = mapping
        .remove("type")
        .and_then(|kind| kind.as_str().map(str::to_string))
        .ok_or_else(|| ActionError::Config("action has no `type`".to_string()))?;
    Ok((kind, serde_yaml::Value::Mapping(mapping)))
}

/// Builds actions from their configs.
#[derive(Default, Clone)]
pub struct ActionFactory {
    sink: Option<SharedPlotSink>,
}

impl ActionFactory {
    /// `sink` receives the `visualizer` post-actions; without it they are
    /// skipped.
    pub fn new(sink: Option<SharedPlotSink>) -> Self {
        Self { sink }
    }

    /// Builds a pre-action. Unknown types are logged and skipped.
    pub fn before(
        &self,
        config: &serde_yaml::Value,
    ) -> Result<Option<Box<dyn SnapshotAction>>, ActionError> {
        let (kind, args) = split_type(config)?;
        let action: Box<dyn SnapshotAction> = match kind.as_str() {
            "slice" => Box::new(SliceAction::from_args(&args)?),
            "baryons" => Box::new(BaryonsAction),
            other => {
                error!(target: "actions", "unknown action_before type `{other}`, skipping");
                return Ok(None);
            }
        };
        Ok(Some(action))
    }

    /// Builds a post-action. Unknown types are logged and skipped.
    pub fn after(
        &self,
        config: &serde_yaml::Value,
    ) -> Result<Option<Box<dyn ResultAction>>, ActionError> {
        let (kind, args) = split_type(config)?;
        let action: Box<dyn ResultAction> = match kind.as_str() {
            "logger" => Box::new(LoggerAction::from_args(&args)?),
            "extract" => Box::new(ExtractAction::from_args(&args)?),
            "fit" => Box::new(FitAction::from_args(&args)?),
            "visualizer" => match &self.sink {
                Some(sink) => Box::new(VisualizerAction::new(Rc::clone(sink), args)),
                None => {
                    error!(target: "actions", "no visualizer configured, skipping visualizer action");
                    return Ok(None);
                }
            },
            other => {
                error!(target: "actions", "unknown action_after type `{other}`, skipping");
                return Ok(None);
            }
        };
        Ok(Some(action))
    }
}
