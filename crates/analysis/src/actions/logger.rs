use log::info;
use serde::Deserialize;
use serde_json::json;

use super::ResultAction;
use crate::args::parse_args;
use crate::error::ActionError;
use crate::task::TaskResult;

fn default_id() -> String {
    "msg".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    #[serde(default = "default_id")]
    id: String,
    #[serde(default)]
    print_last: bool,
    #[serde(default)]
    fields: Vec<String>,
}

/// Emits a `task_output` record with the selected fields (all of them when
/// `fields` is empty). Arrays are logged whole, or only their final element
/// with `print_last`. The result passes through unchanged.
#[derive(Debug, Clone)]
pub struct LoggerAction {
    id: String,
    print_last: bool,
    fields: Vec<String>,
}

impl LoggerAction {
    pub fn new(id: impl Into<String>, print_last: bool, fields: Vec<String>) -> Self {
        Self {
            id: id.into(),
            print_last,
            fields,
        }
    }

    pub fn from_args(args: &serde_yaml::Value) -> Result<Self, ActionError> {
        let args: Args = parse_args(args)?;
        Ok(Self::new(args.id, args.print_last, args.fields))
    }

    /// The JSON payload logged for `result`.
    pub fn payload(&self, result: &TaskResult) -> Result<serde_json::Value, ActionError> {
        let mut payload = serde_json::Map::new();
        payload.insert("id".to_string(), json!(self.id));

        let fields: Vec<&String> = if self.fields.is_empty() {
            result.keys().collect()
        } else {
            self.fields.iter().collect()
        };
        for field in fields {
            let value = result
                .get(field)
                .ok_or_else(|| ActionError::MissingField(field.clone()))?;
            let logged = match value.last() {
                Some(last) if self.print_last => json!(last),
                _ => value.to_json(),
            };
            payload.insert(field.clone(), logged);
        }
        Ok(serde_json::Value::Object(payload))
    }
}

impl ResultAction for LoggerAction {
    fn apply(&mut self, result: TaskResult) -> Result<TaskResult, ActionError> {
        info!(target: "task_output", "{}", self.payload(&result)?);
        Ok(result)
    }
}
