//! Plucks components of result values into new keys.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use super::ResultAction;
use crate::args::parse_args;
use crate::error::ActionError;
use crate::task::TaskResult;
use crate::value::Value;

fn default_keep_old() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default = "default_keep_old")]
    keep_old: bool,
    #[serde(flatten)]
    targets: BTreeMap<String, String>,
}

/// Component of a value addressed after the first dot of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessor {
    Whole,
    X,
    Y,
    Z,
    Norm,
    First,
    Last,
    Len,
    Index(usize),
}

impl Accessor {
    fn parse(name: &str) -> Result<Self, ActionError> {
        Ok(match name {
            "x" => Accessor::X,
            "y" => Accessor::Y,
            "z" => Accessor::Z,
            "norm" => Accessor::Norm,
            "first" => Accessor::First,
            "last" => Accessor::Last,
            "len" => Accessor::Len,
            other => Accessor::Index(other.parse().map_err(|_| {
                ActionError::Config(format!("unknown accessor `{other}`"))
            })?),
        })
    }

    fn get(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Accessor::Whole, value) => Some(value.clone()),
            (Accessor::X, Value::Vector(v)) => Some(Value::Scalar(v.x)),
            (Accessor::Y, Value::Vector(v)) => Some(Value::Scalar(v.y)),
            (Accessor::Z, Value::Vector(v)) => Some(Value::Scalar(v.z)),
            (Accessor::Norm, Value::Vector(v)) => Some(Value::Scalar(v.magnitude())),
            (Accessor::First, Value::Array(a)) => a.first().copied().map(Value::Scalar),
            (Accessor::Last, Value::Array(a)) => a.last().copied().map(Value::Scalar),
            (Accessor::Len, Value::Array(a)) => Some(Value::Scalar(a.len() as f64)),
            (Accessor::Index(i), Value::Array(a)) => a.get(i).copied().map(Value::Scalar),
            _ => None,
        }
    }
}

/// `key` or `key.accessor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub key: String,
    pub accessor: Accessor,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, ActionError> {
        let (key, accessor) = match path.split_once('.') {
            Some((key, accessor)) => (key, Accessor::parse(accessor)?),
            None => (path, Accessor::Whole),
        };
        if key.is_empty() {
            return Err(ActionError::Config(format!("empty key in path `{path}`")));
        }
        Ok(Self {
            key: key.to_string(),
            accessor,
        })
    }
}

/// Adds one key per configured `target: path` pair. With `keep_old` the
/// original keys are kept and win over extracted keys of the same name.
///
/// ```yaml
/// - {type: extract, keep_old: false, x: position.x, final_mass: bound_mass.last}
/// ```
#[derive(Debug, Clone)]
pub struct ExtractAction {
    keep_old: bool,
    targets: BTreeMap<String, FieldPath>,
}

impl ExtractAction {
    pub fn new(keep_old: bool, targets: BTreeMap<String, FieldPath>) -> Self {
        Self { keep_old, targets }
    }

    pub fn from_args(args: &serde_yaml::Value) -> Result<Self, ActionError> {
        let args: Args = parse_args(args)?;
        let targets = args
            .targets
            .iter()
            .map(|(target, path)| Ok((target.clone(), FieldPath::parse(path)?)))
            .collect::<Result<_, ActionError>>()?;
        Ok(Self::new(args.keep_old, targets))
    }
}

impl ResultAction for ExtractAction {
    fn apply(&mut self, result: TaskResult) -> Result<TaskResult, ActionError> {
        let mut extracted = TaskResult::new();
        for (target, path) in &self.targets {
            let value = result
                .get(&path.key)
                .ok_or_else(|| ActionError::MissingField(path.key.clone()))?;
            let value = path.accessor.get(value).ok_or_else(|| {
                ActionError::Config(format!(
                    "cannot take {:?} of the {} `{}`",
                    path.accessor,
                    value.kind(),
                    path.key
                ))
            })?;
            extracted.insert(target.clone(), value);
        }
        if self.keep_old {
            extracted.extend(result);
        }
        Ok(extracted)
    }

    fn transform_schema(&self, keys: BTreeSet<String>) -> BTreeSet<String> {
        let mut schema: BTreeSet<String> = self.targets.keys().cloned().collect();
        if self.keep_old {
            schema.extend(keys);
        }
        schema
    }
}
