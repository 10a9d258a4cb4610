use std::fs;

use approx::assert_relative_eq;
use archive::fits::{BinTable, Header, HeaderValue, TableColumn};
use archive::{ArchiveError, from_fits, write_fits};
use nbody::{Particle, ParticleSet, Snapshot};
use units::Time;

fn snapshot(n: usize, time_myr: f64) -> Snapshot {
    let particles: ParticleSet = (0..n)
        .map(|i| {
            let particle = Particle::new(
                1e6 * (i + 1) as f64,
                [i as f64 * 0.1, -(i as f64), 2.5],
                [100.0, -(i as f64) * 3.0, 0.0],
            );
            if i % 2 == 0 { particle } else { particle.dark() }
        })
        .collect();
    Snapshot::new(particles, Time::from_myr(time_myr))
}

/// Writes a primary HDU followed by `tables`, each with its own header tweaks.
fn write_raw(path: &std::path::Path, tables: &[BinTable]) {
    let mut bytes = Vec::new();
    archive::writer::write_primary_header(&mut bytes).unwrap();
    for table in tables {
        bytes.extend(table.header().to_bytes().unwrap());
        let mut data = table.data_bytes().unwrap();
        data.resize(archive::fits::padded_len(data.len()), 0);
        bytes.extend(data);
    }
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_round_trip_preserves_columns_and_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.fits");
    let original = snapshot(17, 125.0);

    write_fits(&path, &original, false).unwrap();
    let read: Vec<Snapshot> = from_fits(&path, None, None)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(read.len(), 1);
    let read = &read[0];
    assert_relative_eq!(read.timestamp.to_myr(), 125.0);
    assert_eq!(read.len(), original.len());
    for (a, b) in read.particles.iter().zip(original.particles.iter()) {
        assert_relative_eq!(a.position, b.position, max_relative = 1e-6);
        assert_relative_eq!(a.velocity, b.velocity, max_relative = 1e-6);
        assert_relative_eq!(a.mass, b.mass, max_relative = 1e-6);
        assert_eq!(a.is_baryon, b.is_baryon);
    }
}

#[test]
fn test_append_adds_tables_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.fits");

    write_fits(&path, &snapshot(4, 0.0), false).unwrap();
    write_fits(&path, &snapshot(4, 10.0), true).unwrap();
    write_fits(&path, &snapshot(4, 20.0), true).unwrap();

    let times: Vec<f64> = from_fits(&path, None, None)
        .unwrap()
        .map(|s| s.unwrap().timestamp.to_myr())
        .collect();
    assert_eq!(times, vec![0.0, 10.0, 20.0]);
}

#[test]
fn test_append_to_missing_file_creates_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.fits");

    write_fits(&path, &snapshot(3, 5.0), true).unwrap();

    let read: Vec<_> = from_fits(&path, None, None).unwrap().collect();
    assert_eq!(read.len(), 1);
}

#[test]
fn test_append_to_garbage_file_recreates_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.fits");
    fs::write(&path, b"not a fits file").unwrap();

    write_fits(&path, &snapshot(3, 5.0), true).unwrap();

    let read: Vec<_> = from_fits(&path, None, None).unwrap().collect();
    assert_eq!(read.len(), 1);
    assert!(read[0].is_ok());
}

#[test]
fn test_limit_reads_lazily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.fits");
    for i in 0..5 {
        write_fits(&path, &snapshot(10, i as f64), i > 0).unwrap();
    }

    let mut reader = from_fits(&path, None, Some(1)).unwrap();
    let first = reader.next().unwrap().unwrap();
    assert!(reader.next().is_none());

    assert_relative_eq!(first.timestamp.to_myr(), 0.0);
    assert!(reader.hdus_visited() <= 2);
}

#[test]
fn test_snapshot_index_selects_one_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.fits");
    for i in 0..4 {
        write_fits(&path, &snapshot(5, 10.0 * i as f64), i > 0).unwrap();
    }

    let mut reader = from_fits(&path, Some(3), None).unwrap();
    let selected: Vec<Snapshot> = reader.by_ref().map(Result::unwrap).collect();

    assert_eq!(selected.len(), 1);
    assert_relative_eq!(selected[0].timestamp.to_myr(), 20.0);
    assert_eq!(reader.hdus_visited(), 4);
}

#[test]
fn test_snapshot_index_past_end_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.fits");
    write_fits(&path, &snapshot(5, 0.0), false).unwrap();

    assert_eq!(from_fits(&path, Some(7), None).unwrap().count(), 0);
}

#[test]
fn test_legacy_flag_and_foreign_units() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.fits");
    let table = BinTable {
        columns: vec![
            TableColumn::float("x", "pc", vec![1000.0]),
            TableColumn::float("y", "kpc", vec![1.0]),
            TableColumn::float("z", "kpc", vec![0.0]),
            TableColumn::float("vx", "km/s", vec![10.0]),
            TableColumn::float("vy", "kms", vec![0.0]),
            TableColumn::float("vz", "kms", vec![0.0]),
            TableColumn::float("mass", "solar mass MSun", vec![5.0]),
            TableColumn::logical("is_barion", vec![false]),
        ],
        extra: vec![
            ("TIME".to_string(), HeaderValue::Float(2.0)),
            ("TIMEUNIT".to_string(), HeaderValue::Text("Gyr".to_string())),
        ],
    };
    write_raw(&path, &[table]);

    let snapshot = from_fits(&path, None, None).unwrap().next().unwrap().unwrap();

    assert_relative_eq!(snapshot.timestamp.to_myr(), 2000.0);
    let particle = snapshot.particles.get(0).unwrap();
    assert_relative_eq!(particle.position.x, 1.0, max_relative = 1e-6);
    assert_relative_eq!(particle.velocity.x, 10.0, max_relative = 1e-6);
    assert_relative_eq!(particle.mass, 5.0);
    assert!(!particle.is_baryon);
}

#[test]
fn test_missing_column_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.fits");
    let table = BinTable {
        columns: vec![TableColumn::float("x", "kpc", vec![1.0])],
        extra: vec![("TIME".to_string(), HeaderValue::Float(0.0))],
    };
    write_raw(&path, &[table]);

    let result = from_fits(&path, None, None).unwrap().next().unwrap();
    assert!(matches!(result, Err(ArchiveError::Schema(_))));
}

#[test]
fn test_missing_time_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timeless.fits");
    let mut table = archive::writer::snapshot_table(&snapshot(2, 0.0));
    table.extra.clear();
    write_raw(&path, &[table]);

    let mut reader = from_fits(&path, None, None).unwrap();
    assert!(matches!(reader.next(), Some(Err(ArchiveError::Schema(_)))));
    assert!(reader.next().is_none());
}

#[test]
fn test_wrong_dimension_unit_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad_unit.fits");
    let mut table = archive::writer::snapshot_table(&snapshot(2, 0.0));
    table.columns[6].unit = Some("kpc".to_string());
    write_raw(&path, &[table]);

    let result = from_fits(&path, None, None).unwrap().next().unwrap();
    assert!(matches!(result, Err(ArchiveError::Schema(_))));
}

#[test]
fn test_primary_header_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.fits");
    write_fits(&path, &snapshot(1, 0.0), false).unwrap();

    let bytes = fs::read(&path).unwrap();
    let primary = Header::read_from(&mut bytes.as_slice()).unwrap().unwrap();
    assert_eq!(primary.get_i64("NAXIS"), Some(0));
    assert!(!primary.is_bintable());
}

#[test]
fn test_archive_without_primary_hdu_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.fits");
    let mut bytes = Vec::new();
    archive::write_snapshot_hdu(&mut bytes, &snapshot(3, 5.0)).unwrap();
    archive::write_snapshot_hdu(&mut bytes, &snapshot(3, 10.0)).unwrap();
    fs::write(&path, bytes).unwrap();

    let times: Vec<f64> = from_fits(&path, None, None)
        .unwrap()
        .map(|s| s.unwrap().timestamp.to_myr())
        .collect();
    assert_eq!(times.len(), 2);
    assert_relative_eq!(times[0], 5.0, epsilon = 1e-4);

    let second = from_fits(&path, Some(2), None).unwrap().next().unwrap().unwrap();
    assert_relative_eq!(second.timestamp.to_myr(), 10.0, epsilon = 1e-4);
}
