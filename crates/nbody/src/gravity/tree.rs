//! Tree-based gravity using Barnes-Hut algorithm (O(N log N))

use crate::gravity::{GravityField, GravitySolver};
use crate::octree::{BoundingBox, Octree};
use crate::particles::ParticleSet;

/// Default opening angle
pub const DEFAULT_THETA: f64 = 0.5;

/// Barnes-Hut tree-based gravitational field computation
///
/// Uses an octree to approximate distant cells by their center of mass.
/// Accuracy is controlled by the opening angle θ:
/// - θ = 0.0: Exact (same as DirectGravity)
/// - θ = 0.5: High accuracy, moderately fast (default)
/// - θ = 1.0: Lower accuracy, very fast
///
/// # Examples
///
/// ```
/// use nbody::gravity::{GravitySolver, TreeGravity};
/// use nbody::sampling::plummer_sphere;
///
/// let set = plummer_sphere(500, 1.0e10, 1.0, 7);
/// let gravity = TreeGravity::with_softening(0.6, 0.05);
/// let potentials = gravity.potentials(&set);
///
/// assert_eq!(potentials.len(), 500);
/// assert!(potentials.iter().all(|phi| *phi < 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeGravity {
    /// Opening angle parameter
    pub theta: f64,
    /// Plummer softening length (kpc)
    pub softening: f64,
}

impl TreeGravity {
    /// Creates a new tree gravity solver with default parameters
    pub fn new() -> Self {
        Self {
            theta: DEFAULT_THETA,
            softening: 0.0,
        }
    }

    pub fn with_theta(theta: f64) -> Self {
        Self {
            theta,
            softening: 0.0,
        }
    }

    /// Creates a tree gravity solver with softening
    ///
    /// # Arguments
    ///
    /// * `theta` - Opening angle
    /// * `softening` - Softening length in kpc
    pub fn with_softening(theta: f64, softening: f64) -> Self {
        Self { theta, softening }
    }
}

impl Default for TreeGravity {
    fn default() -> Self {
        Self::new()
    }
}

impl GravitySolver for TreeGravity {
    fn field(&self, particles: &ParticleSet) -> GravityField {
        if particles.is_empty() {
            return GravityField::default();
        }

        let bounds = BoundingBox::enclosing(particles);
        let tree = Octree::build(particles, bounds);

        let (accelerations, potentials) = particles
            .positions()
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                let sample = tree.field_at(pos, Some(i), self.theta, self.softening);
                (sample.acceleration, sample.potential)
            })
            .unzip();

        GravityField {
            accelerations,
            potentials,
        }
    }
}
