//! Cumulative mass inside concentric spheres.

use std::collections::BTreeSet;

use nbody::Snapshot;
use nbody::centers::CenterFinder;
use nbody::math::{block_sums, cumsum};
use serde::Deserialize;
use units::Unit;

use super::FromArgs;
use super::profile::{
    RadialOrder, center_finder, check_resolution, default_center_type, default_resolution,
    resolve_center,
};
use crate::args::{OutputUnit, parse_args};
use crate::error::TaskError;
use crate::task::{Task, TaskInputs, TaskResult, keys};
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
    #[serde(default = "OutputUnit::msun")]
    m_unit: OutputUnit,
}

/// Mass enclosed within the radius of every block of `resolution` particles.
///
/// Outputs `radii` and `masses`, both non-decreasing.
pub struct MassProfileTask {
    center: CenterFinder,
    resolution: usize,
    r_unit: OutputUnit,
    m_unit: OutputUnit,
}

impl MassProfileTask {
    pub fn new(center: CenterFinder, resolution: usize) -> Result<Self, TaskError> {
        Ok(Self {
            center,
            resolution: check_resolution(resolution)?,
            r_unit: OutputUnit::kpc(),
            m_unit: OutputUnit::msun(),
        })
    }
}

impl FromArgs for MassProfileTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        Ok(Self {
            center: center_finder(&args.center_type),
            resolution: check_resolution(args.resolution)?,
            r_unit: args.r_unit,
            m_unit: args.m_unit,
        })
    }
}

impl Task for MassProfileTask {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let particles = &snapshot.particles;
        let center = resolve_center(&self.center, particles, inputs)?;
        let radial = RadialOrder::new(particles, center, self.resolution);

        let radii = radial.block_radii();
        let masses = cumsum(&block_sums(
            &radial.sorted(particles.masses()),
            self.resolution,
        ));

        let mut result = TaskResult::new();
        result.insert(
            "radii".to_string(),
            Value::Array(self.r_unit.convert(&radii, &Unit::kpc())?),
        );
        result.insert(
            "masses".to_string(),
            Value::Array(self.m_unit.convert(&masses, &Unit::msun())?),
        );
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        keys(&["radii", "masses"])
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["center"]
    }
}
