//! Row-wise CSV logs and CSV export.

use std::fs::File;
use std::path::{Path, PathBuf};

use nalgebra::{Point3, Vector3};
use nbody::{Particle, ParticleSet, Snapshot};
use serde::{Deserialize, Serialize};
use units::Time;

use crate::error::ArchiveError;

/// One logged state of a single particle (Myr, kpc, km/s, M_sun)
#[derive(Debug, Clone, Copy, Deserialize)]
struct LogRow {
    #[serde(rename = "T")]
    time: f64,
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    m: f64,
}

impl LogRow {
    fn particle(&self) -> Particle {
        Particle::new(self.m, [self.x, self.y, self.z], [self.vx, self.vy, self.vz])
    }
}

type Rows = csv::DeserializeRecordsIntoIter<File, LogRow>;

/// Iterator fusing the n-th row of every log into one snapshot.
pub struct CsvLogReader {
    sources: Vec<(PathBuf, Rows)>,
    finished: bool,
}

impl Iterator for CsvLogReader {
    type Item = Result<Snapshot, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.sources.is_empty() {
            return None;
        }

        let mut particles = ParticleSet::with_capacity(self.sources.len());
        let mut time = None;
        for (path, rows) in &mut self.sources {
            match rows.next() {
                Some(Ok(row)) => {
                    time.get_or_insert(row.time);
                    particles.push(row.particle());
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(ArchiveError::schema(format!(
                        "{}: {e}",
                        path.display()
                    ))));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }

        let time = time.unwrap_or_default();
        Some(Ok(Snapshot::new(particles, Time::from_myr(time))))
    }
}

/// Reads snapshots from per-particle CSV logs with columns `T,x,y,z,vx,vy,vz,m`.
///
/// Each file contributes one particle per snapshot; iteration stops at the
/// end of the shortest file. The timestamp is taken from the first file.
pub fn from_logged_csvs<P: AsRef<Path>>(paths: &[P], delimiter: u8) -> Result<CsvLogReader, ArchiveError> {
    let sources = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
            let reader = csv::ReaderBuilder::new()
                .delimiter(delimiter)
                .trim(csv::Trim::All)
                .from_reader(file);
            Ok((path.to_path_buf(), reader.into_deserialize()))
        })
        .collect::<Result<Vec<_>, ArchiveError>>()?;

    Ok(CsvLogReader {
        sources,
        finished: false,
    })
}

#[derive(Debug, Serialize)]
struct ExportRow {
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    mass: f64,
    is_baryon: bool,
}

/// Writes every particle of `snapshot` as one CSV row in canonical units.
pub fn to_csv(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<(), ArchiveError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    for particle in snapshot.particles.iter() {
        writer.serialize(ExportRow {
            x: particle.position.x,
            y: particle.position.y,
            z: particle.position.z,
            vx: particle.velocity.x,
            vy: particle.velocity.y,
            vz: particle.velocity.z,
            mass: particle.mass,
            is_baryon: particle.is_baryon,
        })?;
    }
    writer.flush().map_err(|e| ArchiveError::io(path, e))?;
    Ok(())
}
