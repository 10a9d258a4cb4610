//! Random initial conditions.

use std::f64::consts::PI;

use crate::particle::Particle;
use crate::particles::ParticleSet;
use nalgebra::{Point3, Vector3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use units::G_GALACTIC;

/// Fraction of the Plummer mass profile sampled; the far tail is cut off
const PLUMMER_MASS_CUTOFF: f64 = 0.999;

/// Sample from a Gaussian (normal) distribution using Box-Muller transform
///
/// # Arguments
/// * `rng` - Random number generator
/// * `mean` - Mean of the distribution
/// * `std_dev` - Standard deviation
///
/// # Returns
/// A sample from the normal distribution N(mean, std_dev²)
pub fn sample_gaussian(rng: &mut ChaChaRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z
}

/// Uniformly distributed unit vector
pub fn sample_direction(rng: &mut ChaChaRng) -> Vector3<f64> {
    let cos_theta: f64 = rng.random_range(-1.0..=1.0);
    let phi: f64 = rng.random_range(0.0..2.0 * PI);
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    Vector3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Samples an equal-mass Plummer sphere (Aarseth, Hénon & Wielen 1974).
///
/// The result is in its center-of-mass frame.
///
/// # Arguments
/// * `n` - Number of particles
/// * `total_mass` - Total mass in solar masses
/// * `virial_radius` - Virial radius in kpc; the Plummer scale length is `3π/16` of it
/// * `seed` - Seed of the random generator
///
/// # Example
/// ```
/// use nbody::sampling::plummer_sphere;
///
/// let sphere = plummer_sphere(1000, 1.0e11, 10.0, 42);
/// assert_eq!(sphere.len(), 1000);
/// assert!((sphere.total_mass().to_solar_masses() - 1.0e11).abs() < 1.0);
/// assert!(sphere.center_of_mass().coords.magnitude() < 1e-9);
/// ```
pub fn plummer_sphere(n: usize, total_mass: f64, virial_radius: f64, seed: u64) -> ParticleSet {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    let scale = 3.0 * PI / 16.0 * virial_radius;
    let velocity_scale = (G_GALACTIC * total_mass / scale).sqrt();
    let mass = total_mass / n.max(1) as f64;

    let mut particles: ParticleSet = (0..n)
        .map(|_| {
            let m: f64 = rng.random_range(0.0..PLUMMER_MASS_CUTOFF);
            let r = 1.0 / (m.powf(-2.0 / 3.0) - 1.0).sqrt();
            let position = sample_direction(&mut rng) * r;

            // von Neumann rejection for q = v / v_escape, g(q) ∝ q²(1 - q²)^3.5
            let q = loop {
                let q: f64 = rng.random();
                let g: f64 = rng.random_range(0.0..0.1);
                if g < q * q * (1.0 - q * q).powf(3.5) {
                    break q;
                }
            };
            let speed = q * 2.0f64.sqrt() * (1.0 + r * r).powf(-0.25);
            let velocity = sample_direction(&mut rng) * speed;

            Particle {
                position: Point3::from(position * scale),
                velocity: velocity * velocity_scale,
                mass,
                is_baryon: true,
            }
        })
        .collect();

    particles.move_to_center();
    particles
}

/// Equal-mass particles uniformly distributed in a box centered on the origin,
/// with Gaussian velocity components.
///
/// # Arguments
/// * `n` - Number of particles
/// * `total_mass` - Total mass in solar masses
/// * `velocity_std` - Standard deviation of each velocity component in km/s
/// * `widths` - Box size along x, y and z in kpc
/// * `seed` - Seed of the random generator
pub fn uniform_box(
    n: usize,
    total_mass: f64,
    velocity_std: f64,
    widths: [f64; 3],
    seed: u64,
) -> ParticleSet {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    let mass = total_mass / n.max(1) as f64;

    (0..n)
        .map(|_| {
            let position = Point3::from(std::array::from_fn(|axis| {
                (rng.random::<f64>() - 0.5) * widths[axis]
            }));
            let velocity = Vector3::from(std::array::from_fn(|_| {
                sample_gaussian(&mut rng, 0.0, velocity_std)
            }));
            Particle {
                position,
                velocity,
                mass,
                is_baryon: true,
            }
        })
        .collect()
}
