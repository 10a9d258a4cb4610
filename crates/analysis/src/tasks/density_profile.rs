//! Mass density in concentric spherical shells.

use std::collections::BTreeSet;
use std::f64::consts::PI;

use nbody::Snapshot;
use nbody::centers::CenterFinder;
use nbody::math::block_sums;
use serde::Deserialize;
use units::{Dimension, Unit};

use super::FromArgs;
use super::profile::{
    RadialOrder, center_finder, check_resolution, default_center_type, default_resolution,
    resolve_center,
};
use crate::args::{OutputUnit, parse_args};
use crate::error::TaskError;
use crate::task::{Task, TaskInputs, TaskResult, keys};
use crate::value::Value;

fn default_density_unit() -> OutputUnit {
    OutputUnit::of(&Unit::msun_per_kpc3())
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
    #[serde(default = "default_density_unit")]
    dens_unit: OutputUnit,
}

/// Mean density between consecutive block radii.
///
/// Shell `i` spans the first radii of blocks `i - 1` and `i` and holds the
/// mass of block `i`; the innermost block has no inner radius and is skipped.
pub struct DensityProfileTask {
    center: CenterFinder,
    resolution: usize,
    r_unit: OutputUnit,
    dens_unit: OutputUnit,
}

impl DensityProfileTask {
    pub fn new(center: CenterFinder, resolution: usize) -> Result<Self, TaskError> {
        Ok(Self {
            center,
            resolution: check_resolution(resolution)?,
            r_unit: OutputUnit::kpc(),
            dens_unit: default_density_unit(),
        })
    }
}

impl FromArgs for DensityProfileTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        if args.dens_unit.dimension() != Dimension::DENSITY {
            return Err(TaskError::Config(format!(
                "dens_unit must be a density, got dimension {}",
                args.dens_unit.dimension()
            )));
        }
        Ok(Self {
            center: center_finder(&args.center_type),
            resolution: check_resolution(args.resolution)?,
            r_unit: args.r_unit,
            dens_unit: args.dens_unit,
        })
    }
}

impl Task for DensityProfileTask {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let particles = &snapshot.particles;
        let center = resolve_center(&self.center, particles, inputs)?;
        let radial = RadialOrder::new(particles, center, self.resolution);

        let radii = radial.block_radii();
        let masses = block_sums(&radial.sorted(particles.masses()), self.resolution);

        let densities: Vec<f64> = radii
            .windows(2)
            .zip(masses.iter().skip(1))
            .map(|(shell, mass)| {
                let volume = 4.0 / 3.0 * PI * (shell[1].powi(3) - shell[0].powi(3));
                mass / volume
            })
            .collect();
        let outer_radii: Vec<f64> = radii.iter().skip(1).copied().collect();

        let mut result = TaskResult::new();
        result.insert(
            "radii".to_string(),
            Value::Array(self.r_unit.convert(&outer_radii, &Unit::kpc())?),
        );
        result.insert(
            "densities".to_string(),
            Value::Array(self.dens_unit.convert(&densities, &Unit::msun_per_kpc3())?),
        );
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        keys(&["radii", "densities"])
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["center"]
    }
}
