//! Mean speed relative to the center in concentric shells.

use std::collections::BTreeSet;

use nbody::Snapshot;
use nbody::centers::CenterFinder;
use nbody::math::block_means;
use serde::Deserialize;
use units::Unit;

use super::FromArgs;
use super::profile::{
    RadialOrder, center_finder, check_resolution, default_center_type, default_resolution,
    resolve_center,
};
use crate::args::{OutputUnit, parse_args};
use crate::error::TaskError;
use crate::task::{Task, TaskInputs, TaskResult, keys, vector_input};
use crate::value::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    #[serde(default = "default_center_type")]
    center_type: String,
    #[serde(default = "default_resolution")]
    resolution: usize,
    #[serde(default = "OutputUnit::kpc")]
    r_unit: OutputUnit,
    #[serde(default = "OutputUnit::kms")]
    v_unit: OutputUnit,
}

/// Block means of `|v - v_center|` ordered by distance to the center.
///
/// The `center` and `center_vel` inputs override the configured center.
pub struct VelocityProfileTask {
    center: CenterFinder,
    resolution: usize,
    r_unit: OutputUnit,
    v_unit: OutputUnit,
}

impl FromArgs for VelocityProfileTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        Ok(Self {
            center: center_finder(&args.center_type),
            resolution: check_resolution(args.resolution)?,
            r_unit: args.r_unit,
            v_unit: args.v_unit,
        })
    }
}

impl Task for VelocityProfileTask {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let particles = &snapshot.particles;
        let center = resolve_center(&self.center, particles, inputs)?;
        let center_velocity = match vector_input(inputs, "center_vel")? {
            Some(velocity) => velocity,
            None => self.center.velocity(particles),
        };
        let radial = RadialOrder::new(particles, center, self.resolution);

        let speeds: Vec<f64> = particles
            .velocities()
            .iter()
            .map(|v| (v - center_velocity).magnitude())
            .collect();
        let velocity = block_means(&radial.sorted(&speeds), self.resolution);

        let mut result = TaskResult::new();
        result.insert(
            "radii".to_string(),
            Value::Array(self.r_unit.convert(&radial.block_radii(), &Unit::kpc())?),
        );
        result.insert(
            "velocity".to_string(),
            Value::Array(self.v_unit.convert(&velocity, &Unit::kms())?),
        );
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        keys(&["radii", "velocity"])
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["center", "center_vel"]
    }
}
