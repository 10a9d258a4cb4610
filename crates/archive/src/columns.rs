//! Column layout of a snapshot table.

use units::Unit;

/// Flag column written by this crate
pub const BARYON_COLUMN: &str = "is_baryon";

/// Flag column names accepted when reading, in order of preference
pub const BARYON_ALIASES: [&str; 2] = ["is_baryon", "is_barion"];

/// A required numeric column and the unit values are stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    X,
    Y,
    Z,
    Vx,
    Vy,
    Vz,
    Mass,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::X,
        Column::Y,
        Column::Z,
        Column::Vx,
        Column::Vy,
        Column::Vz,
        Column::Mass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::X => "x",
            Column::Y => "y",
            Column::Z => "z",
            Column::Vx => "vx",
            Column::Vy => "vy",
            Column::Vz => "vz",
            Column::Mass => "mass",
        }
    }

    /// Unit the in-memory particle set uses for this column
    pub fn canonical_unit(self) -> Unit {
        match self {
            Column::X | Column::Y | Column::Z => Unit::kpc(),
            Column::Vx | Column::Vy | Column::Vz => Unit::kms(),
            Column::Mass => Unit::msun(),
        }
    }

    /// Unit string written to `TUNITn`
    pub fn unit_label(self) -> &'static str {
        match self {
            Column::X | Column::Y | Column::Z => "kpc",
            Column::Vx | Column::Vy | Column::Vz => "kms",
            Column::Mass => "MSun",
        }
    }
}
