use approx::assert_relative_eq;

use crate::gravity::{DirectGravity, GravitySolver};
use crate::particle::Particle;
use crate::particles::ParticleSet;
use units::G_GALACTIC;

fn make_pair(separation: f64) -> ParticleSet {
    vec![
        Particle::new(1.0e10, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        Particle::new(2.0e10, [separation, 0.0, 0.0], [0.0, 0.0, 0.0]),
    ]
    .into()
}

#[test]
fn test_pair_accelerations_point_at_each_other() {
    let set = make_pair(2.0);
    let field = DirectGravity::new().field(&set);

    assert_relative_eq!(field.accelerations[0].x, G_GALACTIC * 2.0e10 / 4.0);
    assert_relative_eq!(field.accelerations[1].x, -G_GALACTIC * 1.0e10 / 4.0);
    assert_eq!(field.accelerations[0].y, 0.0);
}

#[test]
fn test_newton_third_law() {
    let set = make_pair(3.0);
    let field = DirectGravity::with_softening(0.5).field(&set);

    let force_sum = field.accelerations[0] * 1.0e10 + field.accelerations[1] * 2.0e10;
    assert_relative_eq!(force_sum.magnitude(), 0.0, epsilon = 1e-3);
}

#[test]
fn test_softened_potential() {
    let set = make_pair(3.0);
    let potentials = DirectGravity::with_softening(4.0).potentials(&set);

    assert_relative_eq!(potentials[0], -G_GALACTIC * 2.0e10 / 5.0);
    assert_relative_eq!(potentials[1], -G_GALACTIC * 1.0e10 / 5.0);
}

#[test]
fn test_potential_energy_counts_pairs_once() {
    let set = make_pair(2.0);
    let energy = DirectGravity::new().potential_energy(&set);

    assert_relative_eq!(energy, -G_GALACTIC * 1.0e10 * 2.0e10 / 2.0);
}

#[test]
fn test_single_particle_feels_nothing() {
    let set: ParticleSet = vec![Particle::new(1.0, [1.0, 1.0, 1.0], [0.0; 3])].into();
    let field = DirectGravity::with_softening(0.1).field(&set);

    assert_eq!(field.potentials, vec![0.0]);
    assert_eq!(field.accelerations[0].magnitude(), 0.0);
}
