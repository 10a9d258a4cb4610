use approx::{assert_abs_diff_eq, assert_relative_eq};
use nbody::{Particle, ParticleSet, Snapshot};
use units::Time;

use crate::config::{ConfigError, parse_yaml};
use crate::creation::{CreationConfig, SnapshotBuilder, build_object, create, downsample};
use crate::plugins::PluginRegistrar;
use crate::profiler::Profiler;

fn line(n: usize) -> Snapshot {
    let particles: ParticleSet = (0..n)
        .map(|i| Particle::new(1.0, [i as f64, 0.0, 0.0], [0.0; 3]))
        .collect();
    Snapshot::new(particles, Time::zero())
}

fn config(yaml: &str) -> CreationConfig {
    crate::config::from_value(parse_yaml(yaml).unwrap()).unwrap()
}

#[test]
fn test_downsample_keeps_every_kth_particle() {
    let result = downsample(line(10), 3);

    assert_eq!(result.len(), 4);
    assert_eq!(result.particles.column("x").unwrap(), vec![0.0, 3.0, 6.0, 9.0]);
    assert!(result.particles.masses().iter().all(|m| *m == 2.5));
}

#[test]
fn test_downsample_conserves_total_mass() {
    for (n, target) in [(10, 3), (100, 7), (12, 4)] {
        let result = downsample(line(n), target);
        assert_relative_eq!(result.particles.total_mass().to_solar_masses(), n as f64, epsilon = 1e-12);
    }

    let mut uneven = line(10);
    uneven.particles.scale_masses(2.0);
    let result = downsample(uneven, 3);
    assert_relative_eq!(result.particles.total_mass().to_solar_masses(), 20.0, epsilon = 1e-12);
}

#[test]
fn test_downsample_to_larger_target_is_noop() {
    let result = downsample(line(5), 10);
    assert_eq!(result.len(), 5);
    assert_eq!(result.particles.masses()[0], 1.0);
}

#[test]
fn test_builder_moves_to_center_of_mass_frame() {
    let mut builder = SnapshotBuilder::new();
    let mut moving = line(1);
    moving.particles.boost([0.0, 10.0, 0.0].into());
    builder.add(&moving);
    builder.add(&line(3));

    let snapshot = builder.build();
    assert_eq!(snapshot.len(), 4);
    assert_abs_diff_eq!(snapshot.particles.center_of_mass().coords.norm(), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(snapshot.particles.center_of_mass_velocity().norm(), 0.0, epsilon = 1e-12);
}

#[test]
fn test_object_is_offset_and_rotated() {
    let config = config(
        "
output_file: out.fits
objects:
  - name: body
    args: {mass: !q [1.0e10, MSun]}
    position: !q [[10, 0, 0], kpc]
    velocity: !q [[0, 200, 0], km/s]
    rotation: {axis: [0, 0, 1], angle: !q [90, deg]}
",
    );
    let registrar = PluginRegistrar::with_builtins();

    let snapshot = build_object(&config.objects[0], &registrar).unwrap().unwrap();
    let position = snapshot.particles.positions()[0];
    let velocity = snapshot.particles.velocities()[0];

    assert_abs_diff_eq!(position.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(position.y, 10.0, max_relative = 1e-12);
    assert_relative_eq!(velocity.x, -200.0, max_relative = 1e-12);
}

#[test]
fn test_unknown_model_is_skipped() {
    let config = config("{output_file: out.fits, objects: [{name: galaxy}]}");
    let registrar = PluginRegistrar::with_builtins();

    assert!(build_object(&config.objects[0], &registrar).unwrap().is_none());
}

#[test]
fn test_position_needs_three_components() {
    let config = config(
        "{output_file: out.fits, objects: [{name: body, args: {mass: !q [1, MSun]}, position: !q [[1, 2], kpc]}]}",
    );
    let registrar = PluginRegistrar::with_builtins();

    let error = build_object(&config.objects[0], &registrar).unwrap_err();
    assert!(matches!(error.downcast_ref::<ConfigError>(), Some(ConfigError::Invalid(_))));
}

#[test]
fn test_create_writes_one_snapshot_and_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("model.fits");
    let yaml = format!(
        "
output_file: {}
objects:
  - name: plummer_sphere
    args: {{number_of_particles: 100, mass: !q [1.0e11, MSun], radius: !q [5, kpc]}}
    downsample_to: 50
  - name: body
    args: {{mass: !q [1.0e9, MSun]}}
    position: !q [[30, 0, 0], kpc]
",
        output.display()
    );
    let registrar = PluginRegistrar::with_builtins();
    let mut profiler = Profiler::new();

    create(&config(&yaml), &registrar, &mut profiler).unwrap();

    let snapshots: Vec<_> = archive::from_fits(&output, None, None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].len(), 51);
    assert_relative_eq!(
        snapshots[0].particles.total_mass().to_solar_masses(),
        1.01e11,
        max_relative = 1e-5
    );
    assert!(profiler.averages().contains_key("Creation"));

    let error = create(&config(&yaml), &registrar, &mut profiler).unwrap_err();
    assert!(matches!(error.downcast_ref::<ConfigError>(), Some(ConfigError::OutputExists(_))));
}
