use nalgebra::{Point3, Vector3};

/// A single particle in galactic units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Point3<f64>,  // kpc
    pub velocity: Vector3<f64>, // km/s
    pub mass: f64,              // Solar masses
    pub is_baryon: bool,
}

impl Particle {
    /// Creates a baryonic particle from plain coordinate arrays
    ///
    /// Position and velocity are in kpc and km/s respectively.
    pub fn new(mass: f64, position: [f64; 3], velocity: [f64; 3]) -> Self {
        Particle {
            position: Point3::from(position),
            velocity: Vector3::from(velocity),
            mass,
            is_baryon: true,
        }
    }

    /// Marks the particle as dark (non-baryonic) matter
    pub fn dark(mut self) -> Self {
        self.is_baryon = false;
        self
    }

    pub fn momentum(&self) -> Vector3<f64> {
        self.velocity * self.mass
    }

    /// Kinetic energy in M_sun (km/s)^2
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    pub fn distance_to(&self, other: &Particle) -> f64 {
        (self.position - other.position).magnitude()
    }

    /// Distance from the origin
    pub fn radius(&self) -> f64 {
        self.position.coords.magnitude()
    }

    pub fn speed(&self) -> f64 {
        self.velocity.magnitude()
    }
}

impl crate::octree::Massive for Particle {
    fn position(&self) -> Point3<f64> {
        self.position
    }

    fn mass(&self) -> f64 {
        self.mass
    }
}
