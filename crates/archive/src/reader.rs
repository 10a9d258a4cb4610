//! Lazy snapshot streaming from FITS archives.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::warn;
use nalgebra::{Point3, Vector3};
use nbody::{Particle, ParticleSet, Snapshot};
use units::{Time, Unit};

use crate::columns::{BARYON_ALIASES, Column};
use crate::error::ArchiveError;
use crate::fits::{BinTable, ColumnData, Header, padded_len};

/// Iterator over the snapshots stored in a FITS archive.
///
/// Header-data units are read one at a time. The primary HDU and every table
/// that is not yielded are skipped by seeking past their data unit. The
/// iterator ends after the first error.
pub struct FitsReader<R> {
    reader: R,
    snapshot_index: Option<usize>,
    limit: Option<usize>,
    visited: usize,
    tables: usize,
    yielded: usize,
    finished: bool,
}

impl<R: Read + Seek> FitsReader<R> {
    /// `snapshot_index` is one-based: 1 selects the first binary table. `limit` caps the number of yielded snapshots.
    pub fn new(reader: R, snapshot_index: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            reader,
            snapshot_index,
            limit,
            visited: 0,
            tables: 0,
            yielded: 0,
            finished: false,
        }
    }

    /// Number of header-data units read so far, the primary one included.
    pub fn hdus_visited(&self) -> usize {
        self.visited
    }

    fn wants(&self, table_position: usize) -> bool {
        self.snapshot_index.is_none_or(|index| index == table_position)
    }

    fn next_snapshot(&mut self) -> Result<Option<Snapshot>, ArchiveError> {
        loop {
            let Some(header) = Header::read_from(&mut self.reader)? else {
                return Ok(None);
            };
            let position = self.visited;
            self.visited += 1;

            // Archives normally start with an empty primary HDU, but a bare
            // table in first position is read as well.
            let data_len = padded_len(header.data_len()?);
            let is_table = header.is_bintable();
            if is_table {
                self.tables += 1;
            }
            if !is_table || !self.wants(self.tables) {
                self.reader.seek(SeekFrom::Current(data_len as i64))?;
                continue;
            }

            let mut data = vec![0u8; data_len];
            self.reader.read_exact(&mut data).map_err(|e| {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    ArchiveError::schema(format!("data unit of HDU {position} is truncated"))
                } else {
                    e.into()
                }
            })?;
            let table = BinTable::decode(&header, &data)?;
            return snapshot_from_table(&header, &table).map(Some);
        }
    }
}

impl<R: Read + Seek> Iterator for FitsReader<R> {
    type Item = Result<Snapshot, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.limit.is_some_and(|limit| self.yielded >= limit) {
            return None;
        }

        match self.next_snapshot() {
            Ok(Some(snapshot)) => {
                self.yielded += 1;
                if self.snapshot_index.is_some() {
                    self.finished = true;
                }
                Some(Ok(snapshot))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Opens a FITS archive for lazy iteration.
///
/// # Examples
///
/// ```no_run
/// let snapshots = archive::from_fits("input.fits", None, Some(10)).unwrap();
/// for snapshot in snapshots {
///     let snapshot = snapshot.unwrap();
///     println!("{} particles at {} Myr", snapshot.len(), snapshot.timestamp.to_myr());
/// }
/// ```
pub fn from_fits(
    path: impl AsRef<Path>,
    snapshot_index: Option<usize>,
    limit: Option<usize>,
) -> Result<FitsReader<BufReader<File>>, ArchiveError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
    Ok(FitsReader::new(BufReader::new(file), snapshot_index, limit))
}

fn snapshot_from_table(header: &Header, table: &BinTable) -> Result<Snapshot, ArchiveError> {
    let time = header
        .get_f64("TIME")
        .ok_or_else(|| ArchiveError::schema("table header has no TIME card"))?;
    let time_factor = match header.get_str("TIMEUNIT") {
        Some(label) => Unit::parse(label)
            .and_then(|unit| unit.factor_to(&Unit::myr()))
            .map_err(|e| ArchiveError::schema(format!("TIMEUNIT `{label}`: {e}")))?,
        None => 1.0,
    };

    let mut columns = Vec::with_capacity(Column::ALL.len());
    for column in Column::ALL {
        let source = table
            .column(column.name())
            .ok_or_else(|| ArchiveError::schema(format!("missing column `{}`", column.name())))?;
        let ColumnData::Numbers(values) = &source.data else {
            return Err(ArchiveError::schema(format!(
                "column `{}` is not numeric",
                column.name()
            )));
        };
        let factor = unit_factor(column, source.unit.as_deref())?;
        columns.push(values.iter().map(|v| v * factor).collect::<Vec<f64>>());
    }

    let flags = BARYON_ALIASES
        .iter()
        .find_map(|name| table.column(name))
        .map(|column| match &column.data {
            ColumnData::Flags(flags) => flags.clone(),
            ColumnData::Numbers(values) => values.iter().map(|v| *v != 0.0).collect(),
        });

    let [x, y, z, vx, vy, vz, mass] = columns.as_slice() else {
        return Err(ArchiveError::schema("unexpected column layout"));
    };
    let particles: ParticleSet = (0..table.rows())
        .map(|i| Particle {
            position: Point3::new(x[i], y[i], z[i]),
            velocity: Vector3::new(vx[i], vy[i], vz[i]),
            mass: mass[i],
            is_baryon: flags.as_ref().is_none_or(|flags| flags[i]),
        })
        .collect();

    Ok(Snapshot::new(particles, Time::from_myr(time * time_factor)))
}

/// Conversion factor from a column's `TUNITn` label to its canonical unit.
///
/// Unparseable labels fall back to their last word (`"kilo parsec kpc"`), then
/// to the canonical unit with a warning. A parseable label of the wrong
/// dimension is a schema error.
fn unit_factor(column: Column, label: Option<&str>) -> Result<f64, ArchiveError> {
    let Some(label) = label else {
        return Ok(1.0);
    };
    let parsed = Unit::parse(label).or_else(|e| {
        label
            .split_whitespace()
            .last()
            .map_or(Err(e), Unit::parse)
    });

    match parsed {
        Ok(unit) => unit.factor_to(&column.canonical_unit()).map_err(|e| {
            ArchiveError::schema(format!("column `{}` unit `{label}`: {e}", column.name()))
        }),
        Err(_) => {
            warn!(
                target: "archive",
                "unknown unit `{label}` for column `{}`, assuming {}",
                column.name(),
                column.unit_label()
            );
            Ok(1.0)
        }
    }
}
