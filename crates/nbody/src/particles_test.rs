use approx::assert_relative_eq;
use nalgebra::{Rotation3, Vector3};

use crate::particle::Particle;
use crate::particles::ParticleSet;

fn make_test_set() -> ParticleSet {
    vec![
        Particle::new(1.0, [1.0, 0.0, 0.0], [0.0, 10.0, 0.0]),
        Particle::new(2.0, [0.0, 2.0, 0.0], [5.0, 0.0, 0.0]).dark(),
        Particle::new(1.0, [0.0, 0.0, 3.0], [0.0, 0.0, -4.0]),
    ]
    .into()
}

#[test]
fn test_columns_match_particles() {
    let set = make_test_set();

    assert_eq!(set.column("x").unwrap(), vec![1.0, 0.0, 0.0]);
    assert_eq!(set.column("vz").unwrap(), vec![0.0, 0.0, -4.0]);
    assert_eq!(set.column("m").unwrap(), set.column("mass").unwrap());
    assert!(set.column("temperature").is_none());
    assert_eq!(set.is_baryon(), &[true, false, true]);
}

#[test]
fn test_slice_is_clipped() {
    let set = make_test_set();

    assert_eq!(set.slice(1..3).len(), 2);
    assert_eq!(set.slice(2..10).len(), 1);
    assert!(set.slice(5..10).is_empty());
    assert_eq!(set.slice(1..2).get(0).unwrap().mass, 2.0);
}

#[test]
fn test_select_and_filter() {
    let set = make_test_set();

    let picked = set.select(&[2, 0, 7]);
    assert_eq!(picked.len(), 2);
    assert_eq!(picked.get(0).unwrap().position.z, 3.0);

    let baryons = set.baryons();
    assert_eq!(baryons.len(), 2);
    assert!(baryons.is_baryon().iter().all(|b| *b));

    let heavy = set.filter(|p| p.mass > 1.5);
    assert_eq!(heavy.len(), 1);
}

#[test]
fn test_center_of_mass_and_momentum() {
    let set = make_test_set();

    let com = set.center_of_mass();
    assert_relative_eq!(com.x, 0.25);
    assert_relative_eq!(com.y, 1.0);
    assert_relative_eq!(com.z, 0.75);

    let momentum = set.momentum();
    assert_relative_eq!(momentum.x, 10.0);
    assert_relative_eq!(momentum.y, 10.0);
    assert_relative_eq!(momentum.z, -4.0);
    assert_relative_eq!(set.kinetic_energy(), 0.5 * 100.0 + 0.5 * 2.0 * 25.0 + 0.5 * 16.0);
}

#[test]
fn test_move_to_center() {
    let mut set = make_test_set();
    set.translate(Vector3::new(5.0, -3.0, 1.0));
    set.boost(Vector3::new(100.0, 0.0, 0.0));

    set.move_to_center();

    assert_relative_eq!(set.center_of_mass().coords.magnitude(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(set.center_of_mass_velocity().magnitude(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_rotation_preserves_radii() {
    let mut set = make_test_set();
    let before: Vec<f64> = set.iter().map(|p| p.radius()).collect();

    let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
    set.rotate(&rotation);

    let first = set.get(0).unwrap();
    assert_relative_eq!(first.position.y, 1.0, epsilon = 1e-12);
    assert_relative_eq!(first.velocity.x, -10.0, epsilon = 1e-12);
    for (p, r) in set.iter().zip(before) {
        assert_relative_eq!(p.radius(), r, epsilon = 1e-12);
    }
}

#[test]
fn test_empty_set_centers() {
    let set = ParticleSet::new();

    assert!(set.is_empty());
    assert_eq!(set.total_mass().to_solar_masses(), 0.0);
    assert_eq!(set.center_of_mass().coords.magnitude(), 0.0);
}
