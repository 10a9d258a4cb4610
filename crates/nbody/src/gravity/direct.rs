//! Direct N-body gravity (O(N²) implementation)

use crate::gravity::{GravityField, GravitySolver};
use crate::octree::point_mass_field;
use crate::particles::ParticleSet;

/// Direct O(N²) summation over all particle pairs
///
/// Simple and exact up to softening, but scales poorly for large N.
/// Best for small sets and as a reference for [`TreeGravity`](crate::gravity::TreeGravity).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectGravity {
    /// Plummer softening length (kpc)
    pub softening: f64,
}

impl DirectGravity {
    /// Creates a new direct gravity solver with no softening
    pub fn new() -> Self {
        Self { softening: 0.0 }
    }

    /// Creates a new direct gravity solver with specified softening length
    ///
    /// # Arguments
    ///
    /// * `softening` - Softening length in kpc
    pub fn with_softening(softening: f64) -> Self {
        Self { softening }
    }
}

impl GravitySolver for DirectGravity {
    fn field(&self, particles: &ParticleSet) -> GravityField {
        let eps2 = self.softening * self.softening;
        let positions = particles.positions();
        let masses = particles.masses();

        let (accelerations, potentials) = positions
            .iter()
            .enumerate()
            .map(|(i, &at)| {
                positions
                    .iter()
                    .zip(masses)
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, (&source, &mass))| point_mass_field(at, source, mass, eps2))
                    .fold((nalgebra::Vector3::zeros(), 0.0), |(a, phi), sample| {
                        (a + sample.acceleration, phi + sample.potential)
                    })
            })
            .unzip();

        GravityField {
            accelerations,
            potentials,
        }
    }
}
