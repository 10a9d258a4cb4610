//! Reference points of a particle set.
//!
//! Centers are used to measure radial profiles and distances. The potential
//! center is the mass-weighted centroid of the most bound particles, which
//! tracks the density peak of a galaxy better than the center of mass does
//! once tidal debris is present.

use crate::gravity::{GravitySolver, TreeGravity, tree::DEFAULT_THETA};
use crate::math::argsort;
use crate::particles::ParticleSet;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default softening for potential-based centers (kpc)
pub const DEFAULT_CENTER_SOFTENING: f64 = 0.2;

/// Default fraction of most-bound particles used for the potential center
pub const DEFAULT_TOP_FRACTION: f64 = 0.01;

pub fn center_of_mass(particles: &ParticleSet) -> Point3<f64> {
    particles.center_of_mass()
}

pub fn center_of_mass_velocity(particles: &ParticleSet) -> Vector3<f64> {
    particles.center_of_mass_velocity()
}

pub fn at_origin(_particles: &ParticleSet) -> Point3<f64> {
    Point3::origin()
}

pub fn at_origin_velocity(_particles: &ParticleSet) -> Vector3<f64> {
    Vector3::zeros()
}

/// Indices of the `⌊N·top_fraction⌋` particles with the lowest potential (at least one).
fn most_bound(particles: &ParticleSet, softening: f64, top_fraction: f64) -> Vec<usize> {
    let potentials = TreeGravity::with_softening(DEFAULT_THETA, softening).potentials(particles);
    let count = ((particles.len() as f64 * top_fraction) as usize).max(1);
    let mut order = argsort(&potentials);
    order.truncate(count);
    order
}

/// Mass-weighted centroid of the most bound particles.
///
/// # Arguments
///
/// * `softening` - Softening length in kpc used for the potentials
/// * `top_fraction` - Fraction of particles (lowest potential first) to average
pub fn potential_center(particles: &ParticleSet, softening: f64, top_fraction: f64) -> Point3<f64> {
    if particles.is_empty() {
        return Point3::origin();
    }
    particles
        .select(&most_bound(particles, softening, top_fraction))
        .center_of_mass()
}

/// Mass-weighted mean velocity of the most bound particles.
pub fn potential_center_velocity(
    particles: &ParticleSet,
    softening: f64,
    top_fraction: f64,
) -> Vector3<f64> {
    if particles.is_empty() {
        return Vector3::zeros();
    }
    particles
        .select(&most_bound(particles, softening, top_fraction))
        .center_of_mass_velocity()
}

/// Which reference point a measurement is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterType {
    #[default]
    Mass,
    Potential,
    Origin,
}

impl CenterType {
    /// Parses a center name, falling back to the center of mass with a warning
    /// when the name is unknown.
    pub fn parse_or_mass(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            log::warn!("unknown center type `{name}`, using center of mass");
            CenterType::Mass
        })
    }
}

impl FromStr for CenterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mass" => Ok(CenterType::Mass),
            "potential" => Ok(CenterType::Potential),
            "origin" => Ok(CenterType::Origin),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for CenterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CenterType::Mass => "mass",
            CenterType::Potential => "potential",
            CenterType::Origin => "origin",
        };
        write!(f, "{name}")
    }
}

/// A center type together with the parameters of the potential center.
///
/// # Examples
///
/// ```
/// use nbody::centers::{CenterFinder, CenterType};
/// use nbody::{Particle, ParticleSet};
///
/// let set: ParticleSet = vec![
///     Particle::new(1.0, [2.0, 0.0, 0.0], [0.0, 5.0, 0.0]),
///     Particle::new(1.0, [4.0, 0.0, 0.0], [0.0, 5.0, 0.0]),
/// ]
/// .into();
///
/// let finder = CenterFinder::new(CenterType::Mass);
/// assert_eq!(finder.position(&set).x, 3.0);
/// assert_eq!(CenterFinder::new(CenterType::Origin).velocity(&set).y, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterFinder {
    pub kind: CenterType,
    pub softening: f64,
    pub top_fraction: f64,
}

impl CenterFinder {
    pub fn new(kind: CenterType) -> Self {
        Self {
            kind,
            softening: DEFAULT_CENTER_SOFTENING,
            top_fraction: DEFAULT_TOP_FRACTION,
        }
    }

    pub fn with_potential_parameters(mut self, softening: f64, top_fraction: f64) -> Self {
        self.softening = softening;
        self.top_fraction = top_fraction;
        self
    }

    pub fn position(&self, particles: &ParticleSet) -> Point3<f64> {
        match self.kind {
            CenterType::Mass => center_of_mass(particles),
            CenterType::Potential => {
                potential_center(particles, self.softening, self.top_fraction)
            }
            CenterType::Origin => at_origin(particles),
        }
    }

    pub fn velocity(&self, particles: &ParticleSet) -> Vector3<f64> {
        match self.kind {
            CenterType::Mass => center_of_mass_velocity(particles),
            CenterType::Potential => {
                potential_center_velocity(particles, self.softening, self.top_fraction)
            }
            CenterType::Origin => at_origin_velocity(particles),
        }
    }
}

impl Default for CenterFinder {
    fn default() -> Self {
        Self::new(CenterType::Mass)
    }
}
