//! Time integration of snapshots
//!
//! Integrators take a snapshot and return the snapshot one step later; the input is
//! never modified. The primary integrator is the symplectic leapfrog method, which
//! conserves energy and angular momentum over long timescales.

use crate::gravity::GravitySolver;
use crate::particles::ParticleSet;
use crate::snapshot::Snapshot;
use nalgebra::{Point3, Vector3};
use units::Time;
use units::velocity::KMS_TO_KPC_PER_MYR;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegratorError {
    #[error("integration produced a non-finite coordinate for particle {index}")]
    NonFinite { index: usize },
    #[error("timestep must be positive, got {0} Myr")]
    InvalidTimestep(f64),
}

/// A time integrator for snapshots
pub trait Integrator: Send {
    /// Advance `snapshot` by one timestep and return the new snapshot
    fn leapfrog(&mut self, snapshot: &Snapshot) -> Result<Snapshot, IntegratorError>;

    /// Timestep of a single call to [`Integrator::leapfrog`]
    fn timestep(&self) -> Time;

    /// Advance the snapshot by `n_steps` timesteps
    fn integrate(&mut self, snapshot: &Snapshot, n_steps: usize) -> Result<Snapshot, IntegratorError> {
        let mut current = snapshot.clone();
        for _ in 0..n_steps {
            current = self.leapfrog(&current)?;
        }
        Ok(current)
    }
}

fn check_finite(particles: &ParticleSet) -> Result<(), IntegratorError> {
    let bad = particles
        .positions()
        .iter()
        .zip(particles.velocities())
        .position(|(p, v)| !p.coords.iter().chain(v.iter()).all(|c| c.is_finite()));
    match bad {
        Some(index) => Err(IntegratorError::NonFinite { index }),
        None => Ok(()),
    }
}

fn validate_timestep(timestep: Time) -> Result<Time, IntegratorError> {
    if timestep.to_myr() > 0.0 && timestep.to_myr().is_finite() {
        Ok(timestep)
    } else {
        Err(IntegratorError::InvalidTimestep(timestep.to_myr()))
    }
}

/// Accelerations computed at the end of the previous step
struct AccelerationCache {
    positions: Vec<Point3<f64>>,
    accelerations: Vec<Vector3<f64>>,
}

/// Symplectic leapfrog integrator (2nd order)
///
/// The algorithm alternates between half-step velocity updates (kicks)
/// and full-step position updates (drifts):
///
/// 1. Kick: v(t + dt/2) = v(t) + a(t) * dt/2
/// 2. Drift: x(t + dt) = x(t) + v(t + dt/2) * dt
/// 3. Kick: v(t + dt) = v(t + dt/2) + a(t + dt) * dt/2
///
/// The accelerations of the final kick are reused by the first kick of the next
/// step when the next input is the snapshot this integrator produced.
///
/// # Examples
///
/// ```
/// use nbody::gravity::DirectGravity;
/// use nbody::integrator::{Integrator, Leapfrog};
/// use nbody::{Particle, ParticleSet, Snapshot};
/// use units::Time;
///
/// let particles: ParticleSet = vec![
///     Particle::new(1.0e10, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
///     Particle::new(1.0, [10.0, 0.0, 0.0], [0.0, 65.6, 0.0]),
/// ]
/// .into();
/// let snapshot = Snapshot::new(particles, Time::zero());
///
/// let mut integrator = Leapfrog::new(DirectGravity::new(), Time::from_myr(1.0)).unwrap();
/// let next = integrator.leapfrog(&snapshot).unwrap();
///
/// assert_eq!(next.timestamp.to_myr(), 1.0);
/// assert_eq!(snapshot.timestamp.to_myr(), 0.0);
/// ```
pub struct Leapfrog {
    gravity: Box<dyn GravitySolver>,
    timestep: Time,
    /// Whether to use the drift-kick-drift (DKD) variant
    ///
    /// For gravity-only simulations, DKD and KDK are equivalent to second order.
    pub use_dkd: bool,
    cache: Option<AccelerationCache>,
}

impl Leapfrog {
    /// Creates a kick-drift-kick leapfrog integrator
    pub fn new<G: GravitySolver + 'static>(gravity: G, timestep: Time) -> Result<Self, IntegratorError> {
        Ok(Self {
            gravity: Box::new(gravity),
            timestep: validate_timestep(timestep)?,
            use_dkd: false,
            cache: None,
        })
    }

    /// Creates an integrator with timestep `0.5^kmax` Gyr
    pub fn with_kmax<G: GravitySolver + 'static>(gravity: G, kmax: f64) -> Result<Self, IntegratorError> {
        Self::new(gravity, Time::from_gyr(0.5f64.powf(kmax)))
    }

    /// Switches to the drift-kick-drift form
    pub fn dkd(mut self) -> Self {
        self.use_dkd = true;
        self
    }

    fn accelerations(&mut self, particles: &ParticleSet) -> Vec<Vector3<f64>> {
        if let Some(cache) = self.cache.take() {
            if cache.positions.as_slice() == particles.positions() {
                return cache.accelerations;
            }
        }
        self.gravity.accelerations(particles)
    }

    fn kick(particles: &mut ParticleSet, accelerations: &[Vector3<f64>], dt: Time) {
        let factor = dt.to_myr() * KMS_TO_KPC_PER_MYR;
        particles
            .velocities_mut()
            .iter_mut()
            .zip(accelerations)
            .for_each(|(v, a)| *v += a * factor);
    }

    fn drift(particles: &mut ParticleSet, dt: Time) {
        let factor = dt.to_myr() * KMS_TO_KPC_PER_MYR;
        let velocities = particles.velocities().to_vec();
        particles
            .positions_mut()
            .iter_mut()
            .zip(&velocities)
            .for_each(|(p, v)| *p += v * factor);
    }
}

impl Integrator for Leapfrog {
    fn leapfrog(&mut self, snapshot: &Snapshot) -> Result<Snapshot, IntegratorError> {
        let dt = self.timestep;
        let mut particles = snapshot.particles.clone();

        if self.use_dkd {
            Self::drift(&mut particles, dt / 2.0);
            let accelerations = self.gravity.accelerations(&particles);
            Self::kick(&mut particles, &accelerations, dt);
            Self::drift(&mut particles, dt / 2.0);
        } else {
            let accelerations = self.accelerations(&particles);
            Self::kick(&mut particles, &accelerations, dt / 2.0);
            Self::drift(&mut particles, dt);
            let accelerations = self.gravity.accelerations(&particles);
            Self::kick(&mut particles, &accelerations, dt / 2.0);
            self.cache = Some(AccelerationCache {
                positions: particles.positions().to_vec(),
                accelerations,
            });
        }

        check_finite(&particles)?;
        Ok(Snapshot::new(particles, snapshot.timestamp + dt))
    }

    fn timestep(&self) -> Time {
        self.timestep
    }
}

/// Propagates each particle along its velocity vector, ignoring gravity.
///
/// Useful for exercising drivers and pipelines without the cost of a force computation.
pub struct Drift {
    timestep: Time,
}

impl Drift {
    pub fn new(timestep: Time) -> Result<Self, IntegratorError> {
        Ok(Self {
            timestep: validate_timestep(timestep)?,
        })
    }
}

impl Integrator for Drift {
    fn leapfrog(&mut self, snapshot: &Snapshot) -> Result<Snapshot, IntegratorError> {
        let mut particles = snapshot.particles.clone();
        Leapfrog::drift(&mut particles, self.timestep);
        check_finite(&particles)?;
        Ok(Snapshot::new(particles, snapshot.timestamp + self.timestep))
    }

    fn timestep(&self) -> Time {
        self.timestep
    }
}
