use crate::length::{KPC_TO_KM, Length};
use crate::mass::Mass;
use crate::time::{MYR_TO_SECONDS, Time};
use std::ops::{Add, Div, Mul, Sub};

/// Gravitational constant in SI units (m^3 kg^-1 s^-2)
pub const G_SI: f64 = 6.674_30e-11;

/// Gravitational constant in kpc (km/s)^2 / M_sun
pub const G_GALACTIC: f64 =
    G_SI * crate::mass::SOLAR_MASS_KG / crate::length::KPC_TO_M / 1.0e6;

/// One km/s expressed in kpc/Myr
pub const KMS_TO_KPC_PER_MYR: f64 = MYR_TO_SECONDS / KPC_TO_KM;

/// Circular velocity at radius `radius` around an enclosed mass
///
/// # Arguments
/// * `enclosed_mass` - Mass inside the orbit
/// * `radius` - Orbital radius
///
/// # Returns
/// Circular orbital velocity
///
/// # Examples
/// ```
/// use units::{Length, Mass, circular_velocity};
///
/// let v = circular_velocity(Mass::from_solar_masses(1.0e11), Length::from_kpc(10.0));
/// assert!((v.to_kms() - 207.4).abs() < 0.5);
/// ```
pub fn circular_velocity(enclosed_mass: Mass, radius: Length) -> Velocity {
    Velocity::from_kms((G_GALACTIC * enclosed_mass.to_solar_masses() / radius.to_kpc()).sqrt())
}

#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Velocity(f64); // Base unit: km/s

impl Velocity {
    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn from_kms(value: f64) -> Self {
        Self(value)
    }

    pub fn from_meters_per_sec(value: f64) -> Self {
        Self(value / 1_000.0)
    }

    pub fn from_kpc_per_myr(value: f64) -> Self {
        Self(value / KMS_TO_KPC_PER_MYR)
    }

    pub fn to_kms(&self) -> f64 {
        self.0
    }

    pub fn to_meters_per_sec(&self) -> f64 {
        self.0 * 1_000.0
    }

    pub fn to_kpc_per_myr(&self) -> f64 {
        self.0 * KMS_TO_KPC_PER_MYR
    }
}

impl Add for Velocity {
    type Output = Velocity;

    fn add(self, rhs: Velocity) -> Velocity {
        Velocity(self.0 + rhs.0)
    }
}

impl Sub for Velocity {
    type Output = Velocity;

    fn sub(self, rhs: Velocity) -> Velocity {
        Velocity(self.0 - rhs.0)
    }
}

impl Mul<f64> for Velocity {
    type Output = Velocity;

    fn mul(self, rhs: f64) -> Velocity {
        Velocity(self.0 * rhs)
    }
}

/// Distance covered at this velocity over `rhs`
impl Mul<Time> for Velocity {
    type Output = Length;

    fn mul(self, rhs: Time) -> Length {
        Length::from_kpc(self.to_kpc_per_myr() * rhs.to_myr())
    }
}

impl Div<f64> for Velocity {
    type Output = Velocity;

    fn div(self, rhs: f64) -> Velocity {
        Velocity(self.0 / rhs)
    }
}
