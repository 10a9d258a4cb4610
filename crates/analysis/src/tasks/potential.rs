//! Radial profile of the gravitational potential.

use std::collections::BTreeSet;

use nbody::Snapshot;
use nbody::centers::{CenterFinder, DEFAULT_CENTER_SOFTENING};
use nbody::gravity::{GravitySolver, TreeGravity, tree::DEFAULT_THETA};
use nbody::math::{block_means, mean};
use serde::Deserialize;
use units::Unit;

use super::FromArgs;
use super::profile::{
    RadialOrder, center_finder, check_resolution, default_center_type, default_resolution,
    resolve_center,
};
use crate::args::{LengthArg, OutputUnit, parse_args};
use crate::error::TaskError;
use crate::task::{Task, TaskInputs, TaskResult, keys};
use crate::value::Value;

fn default_eps() -> LengthArg {
    LengthArg(DEFAULT_CENTER_SOFTENING)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    #[serde(default = "default_center_type")]
    center_type: String,
    #[serde(default = "default_resolution")]
    resolution: usize,
    #[serde(default = "OutputUnit::kpc")]
    r_unit: OutputUnit,
    #[serde(default)]
    pot_unit: Option<OutputUnit>,
    #[serde(default = "default_eps")]
    eps: LengthArg,
}

/// How block potentials are scaled for output.
enum Normalization {
    Unit(OutputUnit),
    /// Mean block potential of the first snapshot, fixed afterwards
    FirstMean(Option<f64>),
}

/// Block means of the per-particle potential, ordered by distance to the center.
///
/// Without `pot_unit` the potentials are divided by the mean block potential
/// of the first processed snapshot, so later snapshots share its scale.
pub struct PotentialTask {
    center: CenterFinder,
    resolution: usize,
    r_unit: OutputUnit,
    normalization: Normalization,
    gravity: TreeGravity,
}

impl FromArgs for PotentialTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        Ok(Self {
            center: center_finder(&args.center_type),
            resolution: check_resolution(args.resolution)?,
            r_unit: args.r_unit,
            normalization: match args.pot_unit {
                Some(unit) => Normalization::Unit(unit),
                None => Normalization::FirstMean(None),
            },
            gravity: TreeGravity::with_softening(DEFAULT_THETA, args.eps.0),
        })
    }
}

impl Task for PotentialTask {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let particles = &snapshot.particles;
        let center = resolve_center(&self.center, particles, inputs)?;
        let radial = RadialOrder::new(particles, center, self.resolution);

        let potentials = self.gravity.potentials(particles);
        let blocks = block_means(&radial.sorted(&potentials), self.resolution);

        let potential = match &mut self.normalization {
            Normalization::Unit(unit) => unit.convert(&blocks, &Unit::kms_squared())?,
            Normalization::FirstMean(scale) => {
                if scale.is_none() && !blocks.is_empty() {
                    *scale = Some(mean(&blocks));
                }
                let scale = scale.unwrap_or(1.0);
                blocks.iter().map(|p| p / scale).collect()
            }
        };

        let mut result = TaskResult::new();
        result.insert(
            "radii".to_string(),
            Value::Array(self.r_unit.convert(&radial.block_radii(), &Unit::kpc())?),
        );
        result.insert("potential".to_string(), Value::Array(potential));
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        keys(&["radii", "potential"])
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["center"]
    }
}
