use std::fs;

use approx::assert_relative_eq;
use nbody::{Particle, ParticleSet, Snapshot};
use units::Time;

use crate::csv_log::{from_logged_csvs, to_csv};

#[test]
fn test_logged_csvs_are_zipped_row_by_row() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    fs::write(
        &first,
        "T,x,y,z,vx,vy,vz,m\n0,1,0,0,0,10,0,100\n5,1.1,0.05,0,0,10,0,100\n10,1.2,0.1,0,0,10,0,100\n",
    )
    .unwrap();
    fs::write(
        &second,
        "T,x,y,z,vx,vy,vz,m\n0,-1,0,0,0,-10,0,50\n5,-1.1,-0.05,0,0,-10,0,50\n",
    )
    .unwrap();

    let snapshots: Vec<Snapshot> = from_logged_csvs(&[&first, &second], b',')
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].len(), 2);
    assert_relative_eq!(snapshots[1].timestamp.to_myr(), 5.0);
    assert_relative_eq!(snapshots[1].particles.positions()[1].x, -1.1);
    assert_relative_eq!(snapshots[0].particles.masses()[1], 50.0);
    assert!(snapshots[0].particles.is_baryon().iter().all(|b| *b));
}

#[test]
fn test_logged_csvs_custom_delimiter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "T;x;y;z;vx;vy;vz;m\n2.5;1;2;3;4;5;6;7\n").unwrap();

    let snapshot = from_logged_csvs(&[&path], b';')
        .unwrap()
        .next()
        .unwrap()
        .unwrap();

    assert_relative_eq!(snapshot.timestamp.to_myr(), 2.5);
    assert_relative_eq!(snapshot.particles.velocities()[0].z, 6.0);
}

#[test]
fn test_missing_log_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = from_logged_csvs(&[dir.path().join("absent.csv")], b',');
    assert!(matches!(result, Err(crate::ArchiveError::Io { .. })));
}

#[test]
fn test_export_writes_one_row_per_particle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.csv");
    let particles: ParticleSet = vec![
        Particle::new(2.0, [1.0, 2.0, 3.0], [4.0, 5.0, 6.0]),
        Particle::new(3.0, [0.0; 3], [0.0; 3]).dark(),
    ]
    .into();

    to_csv(&path, &Snapshot::new(particles, Time::from_myr(1.0))).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "x,y,z,vx,vy,vz,mass,is_baryon");
    assert_eq!(lines[1], "1.0,2.0,3.0,4.0,5.0,6.0,2.0,true");
    assert!(lines[2].ends_with("false"));
    assert_eq!(lines.len(), 3);
}
