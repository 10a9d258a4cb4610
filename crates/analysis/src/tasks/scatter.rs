//! Arbitrary per-particle expressions.

use std::collections::{BTreeMap, BTreeSet};

use nbody::Snapshot;
use serde::Deserialize;

use super::FromArgs;
use crate::args::{OutputUnit, parse_args};
use crate::error::TaskError;
use crate::expression::{Expression, particle_variables};
use crate::task::{Task, TaskInputs, TaskResult};
use crate::value::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    expressions: BTreeMap<String, String>,
    units: BTreeMap<String, OutputUnit>,
}

/// Evaluates every configured expression over the particle columns
/// `x, y, z, vx, vy, vz, m` and divides the values by the declared unit.
///
/// ```yaml
/// name: ScatterTask
/// args:
///   expressions: {x: x, r: "sqrt(x^2 + y^2)"}
///   units: {x: kpc, r: kpc}
/// ```
pub struct ScatterTask {
    expressions: BTreeMap<String, (Expression, OutputUnit)>,
}

impl ScatterTask {
    pub fn new(
        expressions: BTreeMap<String, String>,
        units: BTreeMap<String, OutputUnit>,
    ) -> Result<Self, TaskError> {
        let expressions = expressions
            .into_iter()
            .map(|(id, source)| {
                let unit = units.get(&id).copied().ok_or_else(|| {
                    TaskError::Config(format!("no unit declared for expression `{id}`"))
                })?;
                Ok((id, (Expression::parse(&source)?, unit)))
            })
            .collect::<Result<_, TaskError>>()?;
        Ok(Self { expressions })
    }
}

impl FromArgs for ScatterTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        Self::new(args.expressions, args.units)
    }
}

impl Task for ScatterTask {
    fn run(&mut self, snapshot: &Snapshot, _inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let vars = particle_variables(&snapshot.particles);
        let mut result = TaskResult::new();
        for (id, (expression, unit)) in &self.expressions {
            let evaluated = expression.evaluate(&vars)?;
            let values = unit.convert_si(&evaluated.values, evaluated.dim)?;
            result.insert(id.clone(), Value::Array(values));
        }
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        Some(self.expressions.keys().cloned().collect())
    }
}
