//! Radial binning shared by the profile tasks.
//!
//! Particles are sorted by distance to a center (stable sort) and grouped into
//! consecutive blocks of `resolution` particles; a trailing partial block is
//! dropped. Each block is represented by the radius of its first particle.

use nalgebra::Point3;
use nbody::ParticleSet;
use nbody::centers::{CenterFinder, CenterType};
use nbody::math::{argsort, every_nth};

use crate::error::TaskError;
use crate::task::{TaskInputs, vector_input};

pub(crate) fn default_resolution() -> usize {
    1000
}

pub(crate) fn default_center_type() -> String {
    "mass".to_string()
}

pub(crate) fn center_finder(center_type: &str) -> CenterFinder {
    CenterFinder::new(CenterType::parse_or_mass(center_type))
}

pub(crate) fn check_resolution(resolution: usize) -> Result<usize, TaskError> {
    if resolution == 0 {
        return Err(TaskError::Config("resolution must be positive".to_string()));
    }
    Ok(resolution)
}

/// The `center` input when wired, the configured center otherwise.
pub(crate) fn resolve_center(
    finder: &CenterFinder,
    particles: &ParticleSet,
    inputs: &TaskInputs,
) -> Result<Point3<f64>, TaskError> {
    Ok(match vector_input(inputs, "center")? {
        Some(center) => Point3::from(center),
        None => finder.position(particles),
    })
}

/// Particles ordered by distance to a center.
pub(crate) struct RadialOrder {
    pub radii: Vec<f64>,
    pub order: Vec<usize>,
    pub resolution: usize,
}

impl RadialOrder {
    pub fn new(particles: &ParticleSet, center: Point3<f64>, resolution: usize) -> Self {
        let distances: Vec<f64> = particles
            .positions()
            .iter()
            .map(|p| (p - center).magnitude())
            .collect();
        let order = argsort(&distances);
        let radii = order.iter().map(|&i| distances[i]).collect();
        Self {
            radii,
            order,
            resolution,
        }
    }

    /// Number of particles in whole blocks.
    pub fn kept(&self) -> usize {
        (self.radii.len() / self.resolution) * self.resolution
    }

    /// Radius of the first particle of every block.
    pub fn block_radii(&self) -> Vec<f64> {
        every_nth(&self.radii[..self.kept()], self.resolution)
    }

    /// `values` permuted into radial order and cut to whole blocks.
    pub fn sorted(&self, values: &[f64]) -> Vec<f64> {
        self.order[..self.kept()]
            .iter()
            .map(|&i| values[i])
            .collect()
    }
}
