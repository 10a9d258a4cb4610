//! Ordered per-snapshot execution of handler tasks.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use log::{debug, warn};
use nbody::Snapshot;
use serde::Deserialize;
use serde_json::json;

use crate::actions::ActionFactory;
use crate::error::PipelineError;
use crate::handler::{HandlerTask, InputPath, Outputs};
use crate::task::TaskConstructor;

/// One entry of the `tasks` list.
///
/// ```yaml
/// - name: MassProfileTask
///   id: profile
///   args: {resolution: 500}
///   inputs: {center: center.position}
///   actions_before: [{type: slice, part: [0, 10000]}]
///   actions_after: [{type: logger, print_last: true}]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    #[serde(default)]
    pub args: serde_yaml::Value,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub inputs: BTreeMap<String, String>,
    #[serde(default)]
    pub actions_before: Vec<serde_yaml::Value>,
    #[serde(default)]
    pub actions_after: Vec<serde_yaml::Value>,
}

impl TaskConfig {
    /// The configured id, the task name otherwise.
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

pub struct Pipeline {
    handlers: Vec<HandlerTask>,
    timings: Vec<(String, Duration)>,
}

impl Pipeline {
    pub fn new(handlers: Vec<HandlerTask>) -> Result<Self, PipelineError> {
        check_wiring(&handlers)?;
        Ok(Self {
            handlers,
            timings: Vec::new(),
        })
    }

    /// Builds the handlers of `configs` in order.
    ///
    /// Tasks that `lookup` does not know are logged and skipped; anything
    /// else that is wrong with the configuration is an error.
    pub fn build<F>(configs: &[TaskConfig], lookup: F, actions: &ActionFactory) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<TaskConstructor>,
    {
        let mut handlers = Vec::with_capacity(configs.len());
        for config in configs {
            let Some(constructor) = lookup(&config.name) else {
                warn!(target: "tasks", "{}", json!({"error": "task not found", "name": config.name}));
                continue;
            };
            let id = config.id().to_string();
            let task = constructor(&config.args).map_err(|source| PipelineError::Task {
                id: id.clone(),
                source,
            })?;
            let action_error = |source| PipelineError::Action {
                id: id.clone(),
                source,
            };

            let mut handler = HandlerTask::new(id.clone(), task);
            for (name, path) in &config.inputs {
                handler = handler.with_input(name.clone(), path.parse()?);
            }
            for action in &config.actions_before {
                if let Some(action) = actions.before(action).map_err(action_error)? {
                    handler = handler.with_action_before(action);
                }
            }
            for action in &config.actions_after {
                if let Some(action) = actions.after(action).map_err(action_error)? {
                    handler = handler.with_action_after(action);
                }
            }
            debug!(target: "tasks", "initialized task {} as `{id}`", config.name);
            handlers.push(handler);
        }
        Self::new(handlers)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(HandlerTask::id)
    }

    /// Runs every handler on `snapshot`, in order, and returns all results.
    pub fn run(&mut self, snapshot: &Snapshot) -> Result<Outputs, PipelineError> {
        let mut outputs = Outputs::new();
        self.timings.clear();
        for handler in &mut self.handlers {
            let start = Instant::now();
            let result = handler.run(snapshot, &outputs)?;
            let elapsed = start.elapsed();
            debug!(
                target: "time_info",
                "{}",
                json!({"task": handler.id(), "time": elapsed.as_secs_f64()})
            );
            self.timings.push((handler.id().to_string(), elapsed));
            outputs.insert(handler.id().to_string(), result);
        }
        Ok(outputs)
    }

    /// Wall time of every handler during the last [`Pipeline::run`].
    pub fn last_timings(&self) -> &[(String, Duration)] {
        &self.timings
    }
}

/// Ids are unique and every input reads a declared key of an earlier task.
fn check_wiring(handlers: &[HandlerTask]) -> Result<(), PipelineError> {
    let mut schemas: BTreeMap<&str, Option<BTreeSet<String>>> = BTreeMap::new();
    for handler in handlers {
        let accepted = handler.task().inputs();
        for (name, path) in handler.inputs() {
            if !accepted.contains(&name.as_str()) {
                return Err(PipelineError::Config(format!(
                    "task `{}` has no input `{name}`; accepted: {accepted:?}",
                    handler.id()
                )));
            }
            check_path(handler.id(), path, &schemas)?;
        }
        if schemas.insert(handler.id(), handler.schema()).is_some() {
            return Err(PipelineError::Config(format!(
                "duplicate task id `{}`",
                handler.id()
            )));
        }
    }
    Ok(())
}

fn check_path(
    id: &str,
    path: &InputPath,
    schemas: &BTreeMap<&str, Option<BTreeSet<String>>>,
) -> Result<(), PipelineError> {
    let schema = schemas.get(path.task_id.as_str()).ok_or_else(|| {
        PipelineError::Config(format!(
            "task `{id}` reads `{path}` but no earlier task has id `{}`",
            path.task_id
        ))
    })?;
    if let Some(keys) = schema {
        if !keys.contains(&path.key) {
            return Err(PipelineError::Config(format!(
                "task `{id}` reads `{path}` but `{}` only produces {keys:?}",
                path.task_id
            )));
        }
    }
    Ok(())
}
