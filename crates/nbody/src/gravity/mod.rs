//! Self-gravity of a particle set.
//!
//! This module provides the `GravitySolver` trait with a direct-summation and a
//! Barnes-Hut implementation. Both use Plummer softening and exclude the
//! self-interaction of each particle.

use crate::particles::ParticleSet;
use nalgebra::Vector3;

pub mod direct;
pub mod tree;

#[cfg(test)]
mod direct_test;

pub use direct::DirectGravity;
pub use tree::TreeGravity;

/// Per-particle accelerations and potentials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GravityField {
    /// (km/s)^2 / kpc
    pub accelerations: Vec<Vector3<f64>>,
    /// Specific potential energy in (km/s)^2
    pub potentials: Vec<f64>,
}

/// A gravity kernel evaluated on a whole particle set.
///
/// # Examples
///
/// ```
/// use nbody::gravity::{DirectGravity, GravitySolver};
/// use nbody::{Particle, ParticleSet};
///
/// let set: ParticleSet = vec![
///     Particle::new(1.0e10, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
///     Particle::new(1.0e10, [2.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
/// ]
/// .into();
///
/// let field = DirectGravity::with_softening(0.1).field(&set);
/// assert!(field.accelerations[0].x > 0.0);
/// assert!(field.potentials[1] < 0.0);
/// ```
pub trait GravitySolver: Send + Sync {
    /// Compute accelerations and potentials for every particle of `particles`
    fn field(&self, particles: &ParticleSet) -> GravityField;

    fn accelerations(&self, particles: &ParticleSet) -> Vec<Vector3<f64>> {
        self.field(particles).accelerations
    }

    fn potentials(&self, particles: &ParticleSet) -> Vec<f64> {
        self.field(particles).potentials
    }

    /// Total potential energy in M_sun (km/s)^2
    fn potential_energy(&self, particles: &ParticleSet) -> f64 {
        0.5 * self
            .potentials(particles)
            .iter()
            .zip(particles.masses())
            .map(|(phi, m)| phi * m)
            .sum::<f64>()
    }
}
