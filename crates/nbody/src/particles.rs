//! Column-oriented particle storage.

use crate::particle::Particle;
use nalgebra::{Point3, Rotation3, Vector3};
use std::ops::Range;
use units::Mass;

/// Names of the scalar columns addressable through [`ParticleSet::column`].
pub const SCALAR_COLUMNS: [&str; 7] = ["x", "y", "z", "vx", "vy", "vz", "mass"];

/// An ordered set of particles stored as parallel columns.
///
/// All columns always have the same length. Positions are in kpc, velocities
/// in km/s and masses in solar masses.
///
/// # Examples
///
/// ```
/// use nbody::{Particle, ParticleSet};
///
/// let set: ParticleSet = vec![
///     Particle::new(1.0, [1.0, 0.0, 0.0], [0.0, 10.0, 0.0]),
///     Particle::new(3.0, [-1.0, 0.0, 0.0], [0.0, -10.0, 0.0]),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.total_mass().to_solar_masses(), 4.0);
/// assert_eq!(set.center_of_mass().x, -0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSet {
    positions: Vec<Point3<f64>>,
    velocities: Vec<Vector3<f64>>,
    masses: Vec<f64>,
    is_baryon: Vec<bool>,
}

impl ParticleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            masses: Vec::with_capacity(capacity),
            is_baryon: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn push(&mut self, particle: Particle) {
        self.positions.push(particle.position);
        self.velocities.push(particle.velocity);
        self.masses.push(particle.mass);
        self.is_baryon.push(particle.is_baryon);
    }

    /// Appends every particle of `other`, preserving order.
    pub fn extend(&mut self, other: &ParticleSet) {
        self.positions.extend_from_slice(&other.positions);
        self.velocities.extend_from_slice(&other.velocities);
        self.masses.extend_from_slice(&other.masses);
        self.is_baryon.extend_from_slice(&other.is_baryon);
    }

    pub fn get(&self, index: usize) -> Option<Particle> {
        if index >= self.len() {
            return None;
        }
        Some(Particle {
            position: self.positions[index],
            velocity: self.velocities[index],
            mass: self.masses[index],
            is_baryon: self.is_baryon[index],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector3<f64>] {
        &self.velocities
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn is_baryon(&self) -> &[bool] {
        &self.is_baryon
    }

    pub fn positions_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.positions
    }

    pub fn velocities_mut(&mut self) -> &mut [Vector3<f64>] {
        &mut self.velocities
    }

    pub fn masses_mut(&mut self) -> &mut [f64] {
        &mut self.masses
    }

    /// Returns a scalar column by name (`x`, `y`, `z`, `vx`, `vy`, `vz`, `mass`/`m`).
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let column = match name {
            "x" => self.positions.iter().map(|p| p.x).collect(),
            "y" => self.positions.iter().map(|p| p.y).collect(),
            "z" => self.positions.iter().map(|p| p.z).collect(),
            "vx" => self.velocities.iter().map(|v| v.x).collect(),
            "vy" => self.velocities.iter().map(|v| v.y).collect(),
            "vz" => self.velocities.iter().map(|v| v.z).collect(),
            "mass" | "m" => self.masses.clone(),
            _ => return None,
        };
        Some(column)
    }

    /// Particles in `range`, with the range clipped to the set size.
    pub fn slice(&self, range: Range<usize>) -> ParticleSet {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        ParticleSet {
            positions: self.positions[start..end].to_vec(),
            velocities: self.velocities[start..end].to_vec(),
            masses: self.masses[start..end].to_vec(),
            is_baryon: self.is_baryon[start..end].to_vec(),
        }
    }

    /// Particles at the given indices, in the given order. Out-of-range indices are skipped.
    pub fn select(&self, indices: &[usize]) -> ParticleSet {
        let mut selected = ParticleSet::with_capacity(indices.len());
        for particle in indices.iter().filter_map(|&i| self.get(i)) {
            selected.push(particle);
        }
        selected
    }

    pub fn filter<F>(&self, mut predicate: F) -> ParticleSet
    where
        F: FnMut(&Particle) -> bool,
    {
        self.iter().filter(|p| predicate(p)).collect()
    }

    /// Particles whose mask entry is `true`.
    pub fn filter_mask(&self, mask: &[bool]) -> ParticleSet {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect();
        self.select(&indices)
    }

    pub fn baryons(&self) -> ParticleSet {
        self.filter_mask(&self.is_baryon)
    }

    pub fn total_mass(&self) -> Mass {
        Mass::from_solar_masses(self.masses.iter().sum())
    }

    /// Mass-weighted mean position; the origin for an empty or massless set.
    pub fn center_of_mass(&self) -> Point3<f64> {
        let total = self.total_mass().to_solar_masses();
        if total == 0.0 {
            return Point3::origin();
        }
        let weighted = self
            .positions
            .iter()
            .zip(&self.masses)
            .fold(Vector3::zeros(), |acc, (p, m)| acc + p.coords * *m);
        Point3::from(weighted / total)
    }

    /// Mass-weighted mean velocity; zero for an empty or massless set.
    pub fn center_of_mass_velocity(&self) -> Vector3<f64> {
        let total = self.total_mass().to_solar_masses();
        if total == 0.0 {
            return Vector3::zeros();
        }
        self.momentum() / total
    }

    /// Total momentum in M_sun km/s
    pub fn momentum(&self) -> Vector3<f64> {
        self.velocities
            .iter()
            .zip(&self.masses)
            .fold(Vector3::zeros(), |acc, (v, m)| acc + v * *m)
    }

    /// Total kinetic energy in M_sun (km/s)^2
    pub fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, m)| 0.5 * m * v.magnitude_squared())
            .sum()
    }

    pub fn translate(&mut self, offset: Vector3<f64>) {
        self.positions.iter_mut().for_each(|p| *p += offset);
    }

    pub fn boost(&mut self, delta_v: Vector3<f64>) {
        self.velocities.iter_mut().for_each(|v| *v += delta_v);
    }

    /// Rotates positions and velocities about the origin.
    pub fn rotate(&mut self, rotation: &Rotation3<f64>) {
        self.positions.iter_mut().for_each(|p| *p = rotation * *p);
        self.velocities.iter_mut().for_each(|v| *v = rotation * *v);
    }

    /// Moves the set into its center-of-mass frame.
    pub fn move_to_center(&mut self) {
        let center = self.center_of_mass();
        let center_velocity = self.center_of_mass_velocity();
        self.translate(-center.coords);
        self.boost(-center_velocity);
    }

    pub fn scale_masses(&mut self, factor: f64) {
        self.masses.iter_mut().for_each(|m| *m *= factor);
    }
}

impl FromIterator<Particle> for ParticleSet {
    fn from_iter<I: IntoIterator<Item = Particle>>(iter: I) -> Self {
        let mut set = ParticleSet::new();
        for particle in iter {
            set.push(particle);
        }
        set
    }
}

impl From<Vec<Particle>> for ParticleSet {
    fn from(particles: Vec<Particle>) -> Self {
        particles.into_iter().collect()
    }
}

impl crate::octree::MassDistribution for ParticleSet {
    fn count(&self) -> usize {
        self.len()
    }

    fn position_of(&self, index: usize) -> Point3<f64> {
        self.positions[index]
    }

    fn mass_of(&self, index: usize) -> f64 {
        self.masses[index]
    }
}
