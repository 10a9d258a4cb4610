use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Sub};

pub(crate) const DAYS_PER_YEAR: f64 = 365.25;
pub const SECONDS_PER_YEAR: f64 = 31_557_600.0; // 365.25 days per year

/// Years in one million years
pub(crate) const MYR_TO_YEARS: f64 = 1_000_000.0;
pub const MYR_TO_SECONDS: f64 = MYR_TO_YEARS * SECONDS_PER_YEAR;

/// A physical time quantity using f64 precision.
///
/// The `Time` struct represents time with million years (Myr) as the base unit,
/// matching the timestamps stored in snapshot archives.
///
/// # Examples
///
/// ```rust
/// use units::Time;
///
/// let step = Time::from_gyr(0.5);
/// assert_eq!(step.to_myr(), 500.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(f64); // Base unit: Myr

impl Time {
    /// Creates a zero time value
    pub fn zero() -> Self {
        Self(0.0)
    }

    /// Creates a time from a value in million years (Myr)
    pub fn from_myr(value: f64) -> Self {
        Self(value)
    }

    /// Creates a time from a value in billion years (Gyr)
    pub fn from_gyr(value: f64) -> Self {
        Self(value * 1_000.0)
    }

    /// Creates a new `Time` from a value in years.
    pub fn from_years(value: f64) -> Self {
        Self(value / MYR_TO_YEARS)
    }

    /// Creates a new `Time` from a value in seconds.
    pub fn from_seconds(value: f64) -> Self {
        Self(value / MYR_TO_SECONDS)
    }

    /// Returns the time in million years
    pub fn to_myr(&self) -> f64 {
        self.0
    }

    pub fn to_gyr(&self) -> f64 {
        self.0 / 1_000.0
    }

    pub fn to_years(&self) -> f64 {
        self.0 * MYR_TO_YEARS
    }

    /// Converts the time to days.
    pub fn to_days(&self) -> f64 {
        self.to_years() * DAYS_PER_YEAR
    }

    /// Converts the time to seconds.
    pub fn to_seconds(&self) -> f64 {
        self.0 * MYR_TO_SECONDS
    }
}

impl Add for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Time) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Time {
        Time(self.0 - rhs.0)
    }
}

impl Mul<f64> for Time {
    type Output = Time;

    fn mul(self, rhs: f64) -> Time {
        Time(self.0 * rhs)
    }
}

impl Div<f64> for Time {
    type Output = Time;

    fn div(self, rhs: f64) -> Time {
        Time(self.0 / rhs)
    }
}

/// Division of Time by Time returns a dimensionless ratio
impl Div for Time {
    type Output = f64;

    fn div(self, rhs: Time) -> f64 {
        self.0 / rhs.0
    }
}

/// Allow f64 * Time (commutative multiplication)
impl Mul<Time> for f64 {
    type Output = Time;

    fn mul(self, rhs: Time) -> Time {
        rhs * self
    }
}
