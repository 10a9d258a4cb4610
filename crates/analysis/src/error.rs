use units::UnitError;

use crate::expression::ExpressionError;

/// Failure to construct or run a task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("invalid task arguments: {0}")]
    Args(#[from] serde_yaml::Error),
    #[error("invalid task configuration: {0}")]
    Config(String),
    #[error("missing input `{0}`")]
    MissingInput(String),
    #[error("input `{name}` should be a {expected}, got a {found}")]
    InputType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error("fit failed: {0}")]
    Fit(String),
}

/// Failure to construct or apply a pre- or post-action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("invalid action configuration: {0}")]
    Config(String),
    #[error("invalid action arguments: {0}")]
    Args(#[from] serde_yaml::Error),
    #[error("no field `{0}` in task result")]
    MissingField(String),
    #[error("fit failed: {0}")]
    Fit(String),
    #[error("plotting failed: {0}")]
    Plot(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {0}")]
    Config(String),
    #[error("task `{id}`: {source}")]
    Task {
        id: String,
        #[source]
        source: TaskError,
    },
    #[error("action of task `{id}`: {source}")]
    Action {
        id: String,
        #[source]
        source: ActionError,
    },
}
