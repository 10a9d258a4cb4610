//! Particle sets, snapshots and self-gravity for galactic N-body models.
//!
//! Units throughout are kpc, km/s, solar masses and Myr.

pub mod centers;
pub mod gravity;
pub mod integrator;
pub mod math;
pub mod octree;
pub mod particle;
pub mod particles;
pub mod sampling;
pub mod snapshot;

#[cfg(test)]
mod integrator_test;
#[cfg(test)]
mod particles_test;

pub use centers::{CenterFinder, CenterType};
pub use gravity::{DirectGravity, GravityField, GravitySolver, TreeGravity};
pub use integrator::{Drift, Integrator, IntegratorError, Leapfrog};
pub use particle::Particle;
pub use particles::ParticleSet;
pub use snapshot::{Snapshot, SnapshotError};
