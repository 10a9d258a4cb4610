//! The task contract and the time-evolution accumulator.

use std::collections::BTreeSet;

use nalgebra::Vector3;
use nbody::Snapshot;
use units::Unit;

use crate::args::OutputUnit;
use crate::error::TaskError;
pub use crate::value::{TaskInputs, TaskResult};
use crate::value::Value;

/// A measurement run once per snapshot.
///
/// Tasks receive the snapshot by reference and never modify it. Returned
/// arrays are already divided by the output units the task was configured
/// with.
pub trait Task {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError>;

    /// Keys of every result, or `None` when they depend on the data.
    fn outputs(&self) -> Option<BTreeSet<String>> {
        None
    }

    /// Names of the dynamic inputs this task accepts.
    fn inputs(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Builds a task from its YAML arguments.
pub type TaskConstructor = fn(&serde_yaml::Value) -> Result<Box<dyn Task>, TaskError>;

/// Set of output keys from a fixed list.
pub fn keys(names: &[&str]) -> Option<BTreeSet<String>> {
    Some(names.iter().map(|name| name.to_string()).collect())
}

/// Optional vector input, checking its type.
pub fn vector_input(inputs: &TaskInputs, name: &str) -> Result<Option<Vector3<f64>>, TaskError> {
    inputs
        .get(name)
        .map(|value| {
            value.as_vector().ok_or_else(|| TaskError::InputType {
                name: name.to_string(),
                expected: "vector",
                found: value.kind(),
            })
        })
        .transpose()
}

/// Required array input, checking its type.
pub fn array_input<'a>(inputs: &'a TaskInputs, name: &str) -> Result<&'a [f64], TaskError> {
    let value = inputs
        .get(name)
        .ok_or_else(|| TaskError::MissingInput(name.to_string()))?;
    value.as_array().ok_or_else(|| TaskError::InputType {
        name: name.to_string(),
        expected: "array",
        found: value.kind(),
    })
}

/// One number per snapshot, tracked over time by [`TimeEvolution`].
pub trait Measurement {
    /// Result key of the accumulated values
    const KEY: &'static str;

    /// Unit the measured value is expressed in
    fn unit(&self) -> Unit;

    fn measure(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<f64, TaskError>;

    fn inputs(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Appends one `(time, value)` pair per call and returns the whole history.
///
/// # Examples
///
/// ```
/// use analysis::args::OutputUnit;
/// use analysis::task::{Measurement, Task, TaskInputs, TimeEvolution};
/// use analysis::TaskError;
/// use nbody::Snapshot;
/// use units::{Time, Unit};
///
/// struct Count;
///
/// impl Measurement for Count {
///     const KEY: &'static str = "count";
///
///     fn unit(&self) -> Unit {
///         Unit::dimensionless()
///     }
///
///     fn measure(&mut self, snapshot: &Snapshot, _: &TaskInputs) -> Result<f64, TaskError> {
///         Ok(snapshot.len() as f64)
///     }
/// }
///
/// let mut task = TimeEvolution::new(Count, OutputUnit::myr(), OutputUnit::of(&Unit::dimensionless()));
/// let inputs = TaskInputs::new();
/// task.run(&Snapshot::new(Default::default(), Time::from_myr(0.0)), &inputs).unwrap();
/// let result = task
///     .run(&Snapshot::new(Default::default(), Time::from_myr(5.0)), &inputs)
///     .unwrap();
///
/// assert_eq!(result["times"].as_array().unwrap(), &[0.0, 5.0]);
/// assert_eq!(result["count"].as_array().unwrap(), &[0.0, 0.0]);
/// ```
pub struct TimeEvolution<M> {
    measurement: M,
    time_unit: OutputUnit,
    value_unit: OutputUnit,
    times: Vec<f64>,
    values: Vec<f64>,
}

impl<M: Measurement> TimeEvolution<M> {
    pub fn new(measurement: M, time_unit: OutputUnit, value_unit: OutputUnit) -> Self {
        Self {
            measurement,
            time_unit,
            value_unit,
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn measurement(&self) -> &M {
        &self.measurement
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl<M: Measurement> Task for TimeEvolution<M> {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let value = self.measurement.measure(snapshot, inputs)?;
        let value = self.value_unit.convert_one(value, &self.measurement.unit())?;
        let time = self
            .time_unit
            .convert_one(snapshot.timestamp.to_myr(), &Unit::myr())?;

        self.times.push(time);
        self.values.push(value);

        let mut result = TaskResult::new();
        result.insert("times".to_string(), Value::Array(self.times.clone()));
        result.insert(M::KEY.to_string(), Value::Array(self.values.clone()));
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        keys(&["times", M::KEY])
    }

    fn inputs(&self) -> &'static [&'static str] {
        self.measurement.inputs()
    }
}
