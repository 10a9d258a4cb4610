//! Position and velocity of a chosen center.

use std::collections::BTreeSet;

use nbody::Snapshot;
use nbody::centers::{CenterFinder, CenterType, DEFAULT_CENTER_SOFTENING, DEFAULT_TOP_FRACTION};
use serde::Deserialize;

use super::FromArgs;
use crate::args::{LengthArg, parse_args};
use crate::error::TaskError;
use crate::task::{Task, TaskInputs, TaskResult, keys};
use crate::value::Value;

fn default_eps() -> LengthArg {
    LengthArg(DEFAULT_CENTER_SOFTENING)
}

fn default_top_fraction() -> f64 {
    DEFAULT_TOP_FRACTION
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    center_type: String,
    #[serde(default = "default_eps")]
    eps: LengthArg,
    #[serde(default = "default_top_fraction")]
    top_fraction: f64,
}

/// Arguments of the potential center, which has no `center_type`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PotentialArgs {
    #[serde(default = "default_eps")]
    eps: LengthArg,
    #[serde(default = "default_top_fraction")]
    top_fraction: f64,
}

fn check_top_fraction(top_fraction: f64) -> Result<(), TaskError> {
    if top_fraction > 0.0 && top_fraction <= 1.0 {
        return Ok(());
    }
    Err(TaskError::Config(format!(
        "top_fraction must be in (0, 1], got {top_fraction}"
    )))
}

/// Outputs `position` (kpc) and `velocity` (km/s) vectors, typically wired
/// into the `center` and `center_vel` inputs of the profile tasks.
pub struct CenterTask {
    finder: CenterFinder,
}

impl CenterTask {
    pub fn new(finder: CenterFinder) -> Self {
        Self { finder }
    }
}

impl FromArgs for CenterTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        check_top_fraction(args.top_fraction)?;
        let finder = CenterFinder::new(CenterType::parse_or_mass(&args.center_type))
            .with_potential_parameters(args.eps.0, args.top_fraction);
        Ok(Self::new(finder))
    }
}

/// Builds a [`CenterTask`] fixed to the potential center, registered as
/// `PotentialCenterTask`.
pub fn potential_center(args: &serde_yaml::Value) -> Result<Box<dyn Task>, TaskError> {
    let args: PotentialArgs = parse_args(args)?;
    check_top_fraction(args.top_fraction)?;
    let finder = CenterFinder::new(CenterType::Potential)
        .with_potential_parameters(args.eps.0, args.top_fraction);
    Ok(Box::new(CenterTask::new(finder)))
}

impl Task for CenterTask {
    fn run(&mut self, snapshot: &Snapshot, _inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let particles = &snapshot.particles;
        let mut result = TaskResult::new();
        result.insert(
            "position".to_string(),
            Value::Vector(self.finder.position(particles).coords),
        );
        result.insert(
            "velocity".to_string(),
            Value::Vector(self.finder.velocity(particles)),
        );
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        keys(&["position", "velocity"])
    }
}
