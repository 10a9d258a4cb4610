//! Self-bound mass of a particle system over time.

use std::collections::BTreeSet;

use log::debug;
use nbody::centers::DEFAULT_CENTER_SOFTENING;
use nbody::gravity::{GravitySolver, TreeGravity, tree::DEFAULT_THETA};
use nbody::{ParticleSet, Snapshot};
use serde::Deserialize;
use units::Unit;

use super::FromArgs;
use crate::args::{LengthArg, OutputUnit, parse_args};
use crate::error::TaskError;
use crate::task::{Measurement, Task, TaskInputs, TaskResult, TimeEvolution};

fn default_iterations() -> usize {
    3
}

fn default_threshold() -> f64 {
    0.05
}

fn default_eps() -> LengthArg {
    LengthArg(DEFAULT_CENTER_SOFTENING)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    #[serde(default = "OutputUnit::myr")]
    time_unit: OutputUnit,
    #[serde(default = "OutputUnit::msun")]
    mass_unit: OutputUnit,
    #[serde(default = "default_iterations", alias = "max_iter")]
    number_of_iterations: usize,
    #[serde(default = "default_threshold")]
    change_threshold: f64,
    #[serde(default = "default_eps")]
    eps: LengthArg,
}

/// Iterative unbinding.
///
/// Each pass computes the specific energy `φ + |v - v_cm|²/2` of every
/// remaining particle and drops those with non-negative energy. Passes stop
/// once the relative change in particle count falls below `change_threshold`,
/// after `max_iterations` passes, or when nothing is left.
#[derive(Debug, Clone)]
pub struct BoundMass {
    pub max_iterations: usize,
    pub change_threshold: f64,
    gravity: TreeGravity,
}

impl BoundMass {
    pub fn new(max_iterations: usize, change_threshold: f64, softening: f64) -> Self {
        Self {
            max_iterations,
            change_threshold,
            gravity: TreeGravity::with_softening(DEFAULT_THETA, softening),
        }
    }

    fn unbind(&self, particles: &ParticleSet) -> ParticleSet {
        let potentials = self.gravity.potentials(particles);
        let v_cm = particles.center_of_mass_velocity();
        let mask: Vec<bool> = particles
            .velocities()
            .iter()
            .zip(&potentials)
            .map(|(v, phi)| phi + 0.5 * (v - v_cm).magnitude_squared() < 0.0)
            .collect();
        particles.filter_mask(&mask)
    }

    /// The bound subset of `particles`.
    pub fn bound(&self, particles: &ParticleSet) -> ParticleSet {
        let mut bound = particles.clone();
        let mut current = bound.len();
        let mut iterations = 0;

        loop {
            bound = self.unbind(&bound);
            let previous = current;
            current = bound.len();
            iterations += 1;

            if current == 0 || previous == 0 {
                break;
            }
            let change = (previous - current) as f64 / previous as f64;
            if change < self.change_threshold || iterations >= self.max_iterations {
                break;
            }
        }
        debug!(
            target: "bound_mass",
            "{current} of {} particles bound after {iterations} iterations",
            particles.len()
        );
        bound
    }
}

impl Measurement for BoundMass {
    const KEY: &'static str = "bound_mass";

    fn unit(&self) -> Unit {
        Unit::msun()
    }

    fn measure(&mut self, snapshot: &Snapshot, _inputs: &TaskInputs) -> Result<f64, TaskError> {
        Ok(self.bound(&snapshot.particles).total_mass().to_solar_masses())
    }
}

/// Outputs `times` and `bound_mass`.
pub struct BoundMassTask(TimeEvolution<BoundMass>);

impl FromArgs for BoundMassTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        if args.number_of_iterations == 0 {
            return Err(TaskError::Config(
                "number_of_iterations must be positive".to_string(),
            ));
        }
        let measurement = BoundMass::new(
            args.number_of_iterations,
            args.change_threshold,
            args.eps.0,
        );
        Ok(Self(TimeEvolution::new(
            measurement,
            args.time_unit,
            args.mass_unit,
        )))
    }
}

impl Task for BoundMassTask {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        self.0.run(snapshot, inputs)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        self.0.outputs()
    }
}
