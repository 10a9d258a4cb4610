//! Minimal FITS support: headers and binary table extensions.
//!
//! Files are sequences of header-data units (HDUs). Headers are 80-character
//! ASCII cards padded to 2880-byte blocks; data units are big-endian and padded
//! with zeros to the same block size.

pub mod header;
pub mod table;

#[cfg(test)]
mod header_test;

pub use header::{Header, HeaderValue};
pub use table::{BinTable, ColumnData, ColumnFormat, TableColumn};

pub const BLOCK_SIZE: usize = 2880;
pub const CARD_SIZE: usize = 80;

/// Rounds `len` up to a whole number of blocks.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}
