use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Meters in one kiloparsec
pub const KPC_TO_M: f64 = 3.085_677_581_491_367e19;
pub const KPC_TO_KM: f64 = KPC_TO_M / 1_000.0;
pub const KPC_TO_PC: f64 = 1_000.0;
pub const AU_TO_M: f64 = 1.495_978_707e11;

/// A physical length quantity using f64 precision.
///
/// The `Length` struct represents length values with kiloparsecs as the base unit,
/// the natural scale for galactic dynamics.
///
/// # Examples
///
/// ```rust
/// use units::Length;
///
/// let disk_scale = Length::from_kpc(3.0);
/// let cluster = Length::from_pc(250.0);
///
/// assert!(cluster < disk_scale);
/// assert_eq!(cluster.to_kpc(), 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Length(f64); // Base unit: kpc

impl Length {
    /// Creates a zero length value
    pub fn zero() -> Self {
        Self(0.0)
    }

    /// Creates a new `Length` from a value in kiloparsecs.
    pub fn from_kpc(value: f64) -> Self {
        Self(value)
    }

    /// Creates a new `Length` from a value in parsecs.
    pub fn from_pc(value: f64) -> Self {
        Self(value / KPC_TO_PC)
    }

    /// Creates a new `Length` from a value in astronomical units.
    pub fn from_au(value: f64) -> Self {
        Self(value * AU_TO_M / KPC_TO_M)
    }

    /// Creates a new `Length` from a value in kilometers.
    pub fn from_km(value: f64) -> Self {
        Self(value / KPC_TO_KM)
    }

    /// Creates a new `Length` from a value in meters.
    pub fn from_meters(value: f64) -> Self {
        Self(value / KPC_TO_M)
    }

    /// Returns the length in kiloparsecs.
    pub fn to_kpc(&self) -> f64 {
        self.0
    }

    /// Converts the length to parsecs.
    pub fn to_pc(&self) -> f64 {
        self.0 * KPC_TO_PC
    }

    /// Converts the length to astronomical units.
    pub fn to_au(&self) -> f64 {
        self.0 * KPC_TO_M / AU_TO_M
    }

    /// Converts the length to kilometers.
    pub fn to_km(&self) -> f64 {
        self.0 * KPC_TO_KM
    }

    /// Converts the length to meters.
    pub fn to_m(&self) -> f64 {
        self.0 * KPC_TO_M
    }

    /// Returns the minimum of two lengths.
    pub fn min(self, other: Self) -> Self {
        if self.0 < other.0 { self } else { other }
    }

    /// Returns the maximum of two lengths.
    pub fn max(self, other: Self) -> Self {
        if self.0 > other.0 { self } else { other }
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Add for Length {
    type Output = Length;

    fn add(self, rhs: Length) -> Length {
        Length(self.0 + rhs.0)
    }
}

impl Sub for Length {
    type Output = Length;

    fn sub(self, rhs: Length) -> Length {
        Length(self.0 - rhs.0)
    }
}

impl Neg for Length {
    type Output = Length;

    fn neg(self) -> Length {
        Length(-self.0)
    }
}

impl Mul<f64> for Length {
    type Output = Length;

    fn mul(self, rhs: f64) -> Length {
        Length(self.0 * rhs)
    }
}

impl Div<f64> for Length {
    type Output = Length;

    fn div(self, rhs: f64) -> Length {
        Length(self.0 / rhs)
    }
}

/// Division of Length by Length returns a dimensionless ratio
impl Div for Length {
    type Output = f64;

    fn div(self, rhs: Self) -> f64 {
        self.0 / rhs.0
    }
}

/// Allow f64 * Length (commutative multiplication)
impl Mul<Length> for f64 {
    type Output = Length;

    fn mul(self, rhs: Length) -> Length {
        rhs * self
    }
}
