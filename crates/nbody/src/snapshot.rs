//! A particle set bound to a timestamp.

use crate::particles::ParticleSet;
use std::ops::Range;
use units::Time;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapshotError {
    #[error("cannot combine snapshots with timestamps {left_myr} Myr and {right_myr} Myr")]
    TimestampMismatch { left_myr: f64, right_myr: f64 },
}

/// Complete state of the particle system at a given time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub particles: ParticleSet,
    pub timestamp: Time,
}

impl Snapshot {
    pub fn new(particles: ParticleSet, timestamp: Time) -> Self {
        Self {
            particles,
            timestamp,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Snapshot of the particles in `range` at the same timestamp.
    ///
    /// # Examples
    ///
    /// ```
    /// use nbody::{Particle, ParticleSet, Snapshot};
    /// use units::Time;
    ///
    /// let particles: ParticleSet = (0..10)
    ///     .map(|i| Particle::new(1.0, [i as f64, 0.0, 0.0], [0.0; 3]))
    ///     .collect();
    /// let snapshot = Snapshot::new(particles, Time::from_myr(5.0));
    ///
    /// let head = snapshot.slice(0..4);
    /// assert_eq!(head.len(), 4);
    /// assert_eq!(head.timestamp, snapshot.timestamp);
    /// assert_eq!(snapshot.slice(8..20).len(), 2);
    /// ```
    pub fn slice(&self, range: Range<usize>) -> Snapshot {
        Snapshot::new(self.particles.slice(range), self.timestamp)
    }

    /// Snapshot of the particles at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Snapshot {
        Snapshot::new(self.particles.select(indices), self.timestamp)
    }

    /// Concatenates two snapshots into a new one.
    ///
    /// Fails with [`SnapshotError::TimestampMismatch`] when the timestamps differ,
    /// unless `ignore_timestamp` is set; the result keeps `self`'s timestamp.
    pub fn concat(&self, other: &Snapshot, ignore_timestamp: bool) -> Result<Snapshot, SnapshotError> {
        let mut result = self.clone();
        result.add(other, ignore_timestamp)?;
        Ok(result)
    }

    /// In-place variant of [`Snapshot::concat`].
    pub fn add(&mut self, other: &Snapshot, ignore_timestamp: bool) -> Result<(), SnapshotError> {
        if !ignore_timestamp && self.timestamp != other.timestamp {
            return Err(SnapshotError::TimestampMismatch {
                left_myr: self.timestamp.to_myr(),
                right_myr: other.timestamp.to_myr(),
            });
        }
        self.particles.extend(&other.particles);
        Ok(())
    }
}
