//! A task together with its actions and input wiring.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use nbody::Snapshot;

use crate::actions::{ResultAction, SnapshotAction};
use crate::error::{ActionError, PipelineError, TaskError};
use crate::task::{Task, TaskInputs, TaskResult};

/// Results of the handlers that already ran on the current snapshot, by id.
pub type Outputs = BTreeMap<String, TaskResult>;

/// Reference to another task's result, written `task_id.key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPath {
    pub task_id: String,
    pub key: String,
}

impl FromStr for InputPath {
    type Err = PipelineError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        match path.split_once('.') {
            Some((task_id, key)) if !task_id.is_empty() && !key.is_empty() && !key.contains('.') => {
                Ok(Self {
                    task_id: task_id.to_string(),
                    key: key.to_string(),
                })
            }
            _ => Err(PipelineError::Config(format!(
                "input path `{path}` must have the form `task.key`"
            ))),
        }
    }
}

impl fmt::Display for InputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.task_id, self.key)
    }
}

pub struct HandlerTask {
    id: String,
    task: Box<dyn Task>,
    inputs: BTreeMap<String, InputPath>,
    actions_before: Vec<Box<dyn SnapshotAction>>,
    actions_after: Vec<Box<dyn ResultAction>>,
}

impl HandlerTask {
    pub fn new(id: impl Into<String>, task: Box<dyn Task>) -> Self {
        Self {
            id: id.into(),
            task,
            inputs: BTreeMap::new(),
            actions_before: Vec::new(),
            actions_after: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, path: InputPath) -> Self {
        self.inputs.insert(name.into(), path);
        self
    }

    pub fn with_action_before(mut self, action: Box<dyn SnapshotAction>) -> Self {
        self.actions_before.push(action);
        self
    }

    pub fn with_action_after(mut self, action: Box<dyn ResultAction>) -> Self {
        self.actions_after.push(action);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &dyn Task {
        self.task.as_ref()
    }

    pub fn inputs(&self) -> &BTreeMap<String, InputPath> {
        &self.inputs
    }

    /// Output keys after the post-actions, `None` when the task does not
    /// declare them.
    pub fn schema(&self) -> Option<BTreeSet<String>> {
        let keys = self.task.outputs()?;
        Some(
            self.actions_after
                .iter()
                .fold(keys, |keys, action| action.transform_schema(keys)),
        )
    }

    /// Pre-actions, input lookup, task, post-actions.
    pub fn run(&mut self, snapshot: &Snapshot, previous: &Outputs) -> Result<TaskResult, PipelineError> {
        let mut snapshot = Cow::Borrowed(snapshot);
        for action in &self.actions_before {
            snapshot = Cow::Owned(action.apply(&snapshot).map_err(|source| self.action_error(source))?);
        }

        let inputs = self
            .resolve_inputs(previous)
            .map_err(|source| self.task_error(source))?;
        let mut result = self
            .task
            .run(&snapshot, &inputs)
            .map_err(|source| self.task_error(source))?;

        for action in &mut self.actions_after {
            result = action.apply(result).map_err(|source| PipelineError::Action {
                id: self.id.clone(),
                source,
            })?;
        }
        Ok(result)
    }

    fn resolve_inputs(&self, previous: &Outputs) -> Result<TaskInputs, TaskError> {
        self.inputs
            .iter()
            .map(|(name, path)| {
                previous
                    .get(&path.task_id)
                    .and_then(|result| result.get(&path.key))
                    .map(|value| (name.clone(), value.clone()))
                    .ok_or_else(|| TaskError::MissingInput(path.to_string()))
            })
            .collect()
    }

    fn task_error(&self, source: TaskError) -> PipelineError {
        PipelineError::Task {
            id: self.id.clone(),
            source,
        }
    }

    fn action_error(&self, source: ActionError) -> PipelineError {
        PipelineError::Action {
            id: self.id.clone(),
            source,
        }
    }
}
