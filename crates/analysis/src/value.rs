//! Values exchanged between tasks, actions and the visualizer.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
use serde_json::json;

/// A single output of a task.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Array(Vec<f64>),
    Vector(Vector3<f64>),
}

/// Task output keyed by name, e.g. `radii` or `bound_mass`.
pub type TaskResult = BTreeMap<String, Value>;

/// Dynamic inputs of a task, keyed by the task's parameter name.
pub type TaskInputs = BTreeMap<String, Value>;

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Array(_) => "array",
            Value::Vector(_) => "vector",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<Vector3<f64>> {
        match self {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point3<f64>> {
        self.as_vector().map(Point3::from)
    }

    /// Last element of an array, the value itself for scalars.
    pub fn last(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Array(v) => v.last().copied(),
            Value::Vector(_) => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Scalar(v) => json!(v),
            Value::Array(v) => json!(v),
            Value::Vector(v) => json!([v.x, v.y, v.z]),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(v)
    }
}

impl From<Vector3<f64>> for Value {
    fn from(v: Vector3<f64>) -> Self {
        Value::Vector(v)
    }
}

impl From<Point3<f64>> for Value {
    fn from(p: Point3<f64>) -> Self {
        Value::Vector(p.coords)
    }
}

/// JSON object with one entry per key of `result`.
pub fn result_to_json(result: &TaskResult) -> serde_json::Value {
    serde_json::Value::Object(
        result
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}
