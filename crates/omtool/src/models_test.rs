use std::io::Write;

use approx::assert_relative_eq;
use nbody::{Particle, ParticleSet, Snapshot};
use units::Time;

use crate::models::{DEFAULT_CSV_MASS_UNIT, ModelConstructor, ModelError, register_builtin_models};
use crate::plugins::Registry;

fn registry() -> Registry<ModelConstructor> {
    let mut registry = Registry::new("model");
    register_builtin_models(&mut registry);
    registry
}

fn run(name: &str, args: &str) -> Result<Snapshot, ModelError> {
    let constructor = registry().get(name).unwrap();
    let mut model = constructor(&serde_yaml::from_str(args).unwrap())?;
    model.run()
}

#[test]
fn test_body_is_one_particle_at_origin() {
    let snapshot = run("body", "{mass: {value: 1.0e10, unit: MSun}}").unwrap();

    assert_eq!(snapshot.len(), 1);
    assert_relative_eq!(snapshot.particles.masses()[0], 1.0e10);
    assert_eq!(snapshot.particles.positions()[0].coords.norm(), 0.0);
    assert!(snapshot.particles.is_baryon()[0]);
    assert_eq!(snapshot.timestamp.to_myr(), 0.0);
}

#[test]
fn test_plummer_sphere_total_mass_and_seed() {
    let args = "{number_of_particles: 200, mass: {value: 1.0e11, unit: MSun}, radius: {value: 10, unit: kpc}, seed: 3}";
    let first = run("plummer_sphere", args).unwrap();
    let second = run("plummer_sphere", args).unwrap();

    assert_eq!(first.len(), 200);
    assert_relative_eq!(first.particles.total_mass().to_solar_masses(), 1.0e11, max_relative = 1e-9);
    assert_eq!(first.particles.positions(), second.particles.positions());
}

#[test]
fn test_set_stays_inside_box() {
    let args = "
number_of_particles: 100
total_mass: {value: 1.0e9, unit: MSun}
velocity_std: {value: 5, unit: km/s}
x_width: {value: 2, unit: kpc}
y_width: {value: 4, unit: kpc}
z_width: {value: 500, unit: pc}
";
    let snapshot = run("set", args).unwrap();

    assert_eq!(snapshot.len(), 100);
    for position in snapshot.particles.positions() {
        assert!(position.x.abs() <= 1.0);
        assert!(position.y.abs() <= 2.0);
        assert!(position.z.abs() <= 0.25);
    }
}

#[test]
fn test_csv_reads_columns_and_baryon_flag() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "x;y;z;vx;vy;vz;m;barion").unwrap();
    writeln!(file, "1;2;3;10;20;30;1;True").unwrap();
    writeln!(file, "4;5;6;40;50;60;2;False").unwrap();
    file.flush().unwrap();

    let args = format!("{{path: {}, delimiter: ';'}}", file.path().display());
    let snapshot = run("csv", &args).unwrap();

    assert_eq!(snapshot.len(), 2);
    assert_relative_eq!(snapshot.particles.masses()[1], 2.0 * DEFAULT_CSV_MASS_UNIT);
    assert_relative_eq!(snapshot.particles.velocities()[1].z, 60.0);
    assert_eq!(snapshot.particles.is_baryon(), &[true, false]);
}

#[test]
fn test_csv_without_flag_column_is_baryonic() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "x,y,z,vx,vy,vz,m").unwrap();
    writeln!(file, "0,0,0,0,0,0,4").unwrap();
    file.flush().unwrap();

    let args = format!(
        "{{path: {}, mass_unit: {{value: 1, unit: MSun}}}}",
        file.path().display()
    );
    let snapshot = run("csv", &args).unwrap();

    assert_relative_eq!(snapshot.particles.masses()[0], 4.0);
    assert!(snapshot.particles.is_baryon()[0]);
}

#[test]
fn test_fits_picks_snapshot_by_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.fits");
    for (i, myr) in [0.0, 10.0, 20.0].into_iter().enumerate() {
        let particles: ParticleSet = vec![Particle::new(1.0 + i as f64, [0.0; 3], [0.0; 3])].into();
        archive::write_fits(&path, &Snapshot::new(particles, Time::from_myr(myr)), i > 0).unwrap();
    }

    let args = format!("{{filename: {}, snapshot_number: 2}}", path.display());
    let snapshot = run("fits", &args).unwrap();
    assert_relative_eq!(snapshot.timestamp.to_myr(), 20.0, epsilon = 1e-4);
    assert_relative_eq!(snapshot.particles.masses()[0], 3.0);

    let args = format!("{{filename: {}, snapshot_number: 7}}", path.display());
    assert!(matches!(run("fits", &args), Err(ModelError::Invalid(_))));
}

#[test]
fn test_unknown_arguments_are_rejected() {
    let result = run("body", "{mass: {value: 1, unit: MSun}, colour: red}");
    assert!(matches!(result, Err(ModelError::Args(_))));
}
