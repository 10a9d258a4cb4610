//! An aggregated expression tracked over time.

use std::collections::BTreeSet;
use std::fmt;

use nbody::Snapshot;
use serde::Deserialize;
use units::{Dimension, Unit};

use super::FromArgs;
use crate::args::{OutputUnit, parse_args};
use crate::error::TaskError;
use crate::expression::{Expression, particle_variables};
use crate::task::{Measurement, Task, TaskInputs, TaskResult, TimeEvolution};

/// Reduction applied to the per-particle values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Sum,
    Mean,
    /// The expression must evaluate to a single value
    #[default]
    None,
}

impl Reduction {
    /// Sum of nothing is zero, mean of nothing is NaN.
    fn apply(self, values: &[f64]) -> Result<f64, TaskError> {
        match self {
            Reduction::Sum => Ok(values.iter().sum()),
            Reduction::Mean => Ok(values.iter().sum::<f64>() / values.len() as f64),
            Reduction::None => match values {
                [value] => Ok(*value),
                _ => Err(TaskError::Config(format!(
                    "function `none` needs a single value, got {}; use `sum` or `mean`",
                    values.len()
                ))),
            },
        }
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reduction::Sum => "sum",
            Reduction::Mean => "mean",
            Reduction::None => "none",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    expr: String,
    #[serde(default = "OutputUnit::myr")]
    time_unit: OutputUnit,
    value_unit: OutputUnit,
    #[serde(default)]
    function: Reduction,
}

/// A reduced expression over the particle columns.
#[derive(Debug, Clone)]
pub struct ReducedExpression {
    expression: Expression,
    reduction: Reduction,
    dim: Dimension,
}

impl ReducedExpression {
    /// `dim` is the dimension the expression is expected to have.
    pub fn new(source: &str, reduction: Reduction, dim: Dimension) -> Result<Self, TaskError> {
        if source.trim().is_empty() {
            return Err(TaskError::Config("expression is empty".to_string()));
        }
        Ok(Self {
            expression: Expression::parse(source)?,
            reduction,
            dim,
        })
    }
}

impl Measurement for ReducedExpression {
    const KEY: &'static str = "values";

    /// Values are measured in SI of the expected dimension.
    fn unit(&self) -> Unit {
        Unit::si(self.dim)
    }

    fn measure(&mut self, snapshot: &Snapshot, _inputs: &TaskInputs) -> Result<f64, TaskError> {
        let evaluated = self
            .expression
            .evaluate(&particle_variables(&snapshot.particles))?;
        if evaluated.dim != self.dim {
            return Err(units::UnitError::Incompatible {
                left: evaluated.dim,
                right: self.dim,
            }
            .into());
        }
        self.reduction.apply(&evaluated.values)
    }
}

/// Outputs `times` and `values`.
///
/// ```yaml
/// name: TimeEvolutionTask
/// args:
///   expr: (vx^2 + vy^2 + vz^2) * m / 2
///   value_unit: J
///   function: sum
/// ```
pub struct TimeEvolutionTask(TimeEvolution<ReducedExpression>);

impl TimeEvolutionTask {
    pub fn new(
        expr: &str,
        time_unit: OutputUnit,
        value_unit: OutputUnit,
        function: Reduction,
    ) -> Result<Self, TaskError> {
        let measurement = ReducedExpression::new(expr, function, value_unit.dimension())?;
        Ok(Self(TimeEvolution::new(measurement, time_unit, value_unit)))
    }
}

impl FromArgs for TimeEvolutionTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        Self::new(&args.expr, args.time_unit, args.value_unit, args.function)
    }
}

impl Task for TimeEvolutionTask {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        self.0.run(snapshot, inputs)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        self.0.outputs()
    }
}
