use approx::assert_relative_eq;
use units::{G_GALACTIC, Time};

use crate::gravity::{DirectGravity, GravitySolver, TreeGravity};
use crate::integrator::{Drift, Integrator, IntegratorError, Leapfrog};
use crate::particle::Particle;
use crate::particles::ParticleSet;
use crate::sampling::plummer_sphere;
use crate::snapshot::Snapshot;

const CENTRAL_MASS: f64 = 1.0e10;
const ORBIT_RADIUS: f64 = 10.0;

fn make_test_orbit() -> Snapshot {
    let v_circular = (G_GALACTIC * CENTRAL_MASS / ORBIT_RADIUS).sqrt();
    let particles: ParticleSet = vec![
        Particle::new(CENTRAL_MASS, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
        Particle::new(1.0, [ORBIT_RADIUS, 0.0, 0.0], [0.0, v_circular, 0.0]),
    ]
    .into();
    Snapshot::new(particles, Time::zero())
}

/// Orbital period in Myr of the test particle
fn orbital_period() -> f64 {
    let v_circular = (G_GALACTIC * CENTRAL_MASS / ORBIT_RADIUS).sqrt();
    let v = units::Velocity::from_kms(v_circular).to_kpc_per_myr();
    2.0 * std::f64::consts::PI * ORBIT_RADIUS / v
}

fn total_energy(snapshot: &Snapshot) -> f64 {
    snapshot.particles.kinetic_energy() + DirectGravity::new().potential_energy(&snapshot.particles)
}

#[test]
fn test_leapfrog_advances_time_without_mutating_input() {
    let snapshot = make_test_orbit();
    let mut integrator = Leapfrog::new(DirectGravity::new(), Time::from_myr(1.0)).unwrap();

    let next = integrator.leapfrog(&snapshot).unwrap();

    assert_relative_eq!(next.timestamp.to_myr(), 1.0);
    assert_eq!(snapshot, make_test_orbit());
    assert!((next.particles.positions()[1] - snapshot.particles.positions()[1]).magnitude() > 0.0);
}

#[test]
fn test_leapfrog_circular_orbit() {
    let snapshot = make_test_orbit();
    let period = orbital_period();
    let n_steps = 1000;
    let mut integrator =
        Leapfrog::new(DirectGravity::new(), Time::from_myr(period / n_steps as f64)).unwrap();

    let final_snapshot = integrator.integrate(&snapshot, n_steps).unwrap();

    let final_r = (final_snapshot.particles.positions()[1] - final_snapshot.particles.positions()[0])
        .magnitude();
    let error = (final_r - ORBIT_RADIUS).abs() / ORBIT_RADIUS;
    assert!(error < 0.001, "Radius error: {:.2e}", error);
    assert_relative_eq!(final_snapshot.timestamp.to_myr(), period, max_relative = 1e-9);
}

#[test]
fn test_leapfrog_conserves_energy() {
    let snapshot = make_test_orbit();
    let mut integrator =
        Leapfrog::new(DirectGravity::new(), Time::from_myr(orbital_period() / 500.0)).unwrap();

    let initial = total_energy(&snapshot);
    let evolved = integrator.integrate(&snapshot, 2000).unwrap();
    let drift = ((total_energy(&evolved) - initial) / initial).abs();

    assert!(drift < 1e-3, "Energy drift: {:.2e}", drift);
}

#[test]
fn test_dkd_matches_kdk_closely() {
    let snapshot = make_test_orbit();
    let dt = Time::from_myr(orbital_period() / 1000.0);
    let mut kdk = Leapfrog::new(DirectGravity::new(), dt).unwrap();
    let mut dkd = Leapfrog::new(DirectGravity::new(), dt).unwrap().dkd();

    let a = kdk.integrate(&snapshot, 100).unwrap();
    let b = dkd.integrate(&snapshot, 100).unwrap();

    let gap = (a.particles.positions()[1] - b.particles.positions()[1]).magnitude();
    assert!(gap < 1e-3 * ORBIT_RADIUS);
}

#[test]
fn test_cached_accelerations_do_not_leak_between_inputs() {
    let snapshot = make_test_orbit();
    let dt = Time::from_myr(5.0);
    let mut integrator = Leapfrog::new(DirectGravity::new(), dt).unwrap();
    let mut fresh = Leapfrog::new(DirectGravity::new(), dt).unwrap();

    // Step an unrelated snapshot first to populate the cache
    integrator
        .leapfrog(&Snapshot::new(plummer_sphere(2, 1.0e8, 1.0, 1), Time::zero()))
        .unwrap();

    let a = integrator.leapfrog(&snapshot).unwrap();
    let b = fresh.leapfrog(&snapshot).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_kmax_timestep() {
    let integrator = Leapfrog::with_kmax(TreeGravity::new(), 3.0).unwrap();
    assert_relative_eq!(integrator.timestep().to_myr(), 125.0);
}

#[test]
fn test_invalid_timestep_is_rejected() {
    assert!(matches!(
        Leapfrog::new(DirectGravity::new(), Time::zero()),
        Err(IntegratorError::InvalidTimestep(_))
    ));
    assert!(Drift::new(Time::from_myr(-1.0)).is_err());
}

#[test]
fn test_drift_moves_along_velocity() {
    let particles: ParticleSet =
        vec![Particle::new(1.0, [0.0, 0.0, 0.0], [977.792_221_6, 0.0, 0.0])].into();
    let snapshot = Snapshot::new(particles, Time::from_myr(3.0));
    let mut drift = Drift::new(Time::from_myr(2.0)).unwrap();

    let moved = drift.leapfrog(&snapshot).unwrap();

    assert_relative_eq!(moved.particles.positions()[0].x, 2.0, epsilon = 1e-6);
    assert_relative_eq!(moved.timestamp.to_myr(), 5.0);
}
