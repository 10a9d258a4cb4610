//! Snapshot archives.
//!
//! Snapshots are stored as FITS files holding one binary table per timestamp
//! ([`from_fits`], [`write_fits`]). Trajectories logged as one CSV file per
//! particle are read with [`from_logged_csvs`].

pub mod columns;
pub mod csv_log;
pub mod error;
pub mod fits;
pub mod reader;
pub mod writer;

#[cfg(test)]
mod csv_log_test;

pub use csv_log::{CsvLogReader, from_logged_csvs, to_csv};
pub use error::ArchiveError;
pub use reader::{FitsReader, from_fits};
pub use writer::{write_fits, write_snapshot_hdu};
