//! Writing snapshots as FITS binary tables.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, warn};
use nbody::Snapshot;

use crate::columns::{BARYON_COLUMN, Column};
use crate::error::ArchiveError;
use crate::fits::{BLOCK_SIZE, BinTable, Header, HeaderValue, TableColumn, padded_len};

/// Writes the data-less primary HDU every archive starts with.
pub fn write_primary_header<W: Write>(writer: &mut W) -> Result<(), ArchiveError> {
    let mut header = Header::new();
    header.set("SIMPLE", HeaderValue::Logical(true));
    header.set("BITPIX", HeaderValue::Integer(8));
    header.set("NAXIS", HeaderValue::Integer(0));
    header.set("EXTEND", HeaderValue::Logical(true));
    header.write_to(writer)
}

/// Table holding one snapshot in canonical units
pub fn snapshot_table(snapshot: &Snapshot) -> BinTable {
    let particles = &snapshot.particles;
    let mut columns: Vec<TableColumn> = Column::ALL
        .iter()
        .map(|column| {
            let values = match column {
                Column::X => particles.positions().iter().map(|p| p.x).collect(),
                Column::Y => particles.positions().iter().map(|p| p.y).collect(),
                Column::Z => particles.positions().iter().map(|p| p.z).collect(),
                Column::Vx => particles.velocities().iter().map(|v| v.x).collect(),
                Column::Vy => particles.velocities().iter().map(|v| v.y).collect(),
                Column::Vz => particles.velocities().iter().map(|v| v.z).collect(),
                Column::Mass => particles.masses().to_vec(),
            };
            TableColumn::float(column.name(), column.unit_label(), values)
        })
        .collect();
    columns.push(TableColumn::logical(
        BARYON_COLUMN,
        particles.is_baryon().to_vec(),
    ));

    BinTable {
        columns,
        extra: vec![
            (
                "TIME".to_string(),
                HeaderValue::Float(snapshot.timestamp.to_myr()),
            ),
            ("TIMEUNIT".to_string(), HeaderValue::Text("Myr".to_string())),
        ],
    }
}

/// Writes one snapshot as a binary table extension.
pub fn write_snapshot_hdu<W: Write>(writer: &mut W, snapshot: &Snapshot) -> Result<(), ArchiveError> {
    let table = snapshot_table(snapshot);
    table.header().write_to(writer)?;

    let mut data = table.data_bytes()?;
    data.resize(padded_len(data.len()), 0);
    writer.write_all(&data)?;
    Ok(())
}

/// Writes `snapshot` to the archive at `path`.
///
/// With `append` the snapshot is added as a new table at the end of an
/// existing archive. If that archive is missing or is not a whole number of
/// FITS blocks, a fresh archive is created instead.
pub fn write_fits(path: impl AsRef<Path>, snapshot: &Snapshot, append: bool) -> Result<(), ArchiveError> {
    let path = path.as_ref();

    if append {
        match open_for_append(path) {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                write_snapshot_hdu(&mut writer, snapshot)?;
                writer.flush().map_err(|e| ArchiveError::io(path, e))?;
                debug!(target: "archive", "appended snapshot to {}", path.display());
                return Ok(());
            }
            Err(e) => warn!(
                target: "archive",
                "cannot append to {} ({e}), creating a new archive",
                path.display()
            ),
        }
    }

    let file = File::create(path).map_err(|e| ArchiveError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_primary_header(&mut writer)?;
    write_snapshot_hdu(&mut writer, snapshot)?;
    writer.flush().map_err(|e| ArchiveError::io(path, e))?;
    Ok(())
}

fn open_for_append(path: &Path) -> Result<File, ArchiveError> {
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| ArchiveError::io(path, e))?;
    let len = file
        .metadata()
        .map_err(|e| ArchiveError::io(path, e))?
        .len();
    if len == 0 || len % BLOCK_SIZE as u64 != 0 {
        return Err(ArchiveError::Header(format!(
            "{} is not a FITS archive ({len} bytes)",
            path.display()
        )));
    }
    Ok(file)
}
