use crate::dimension::Dimension;
use crate::error::UnitError;
use crate::unit::Unit;
use crate::{Length, Mass, Time, Velocity};
use serde::Deserialize;
use std::ops::{Div, Mul, Neg};

/// A scalar value with a runtime-checked physical dimension.
///
/// The value is stored in SI. Addition and subtraction of quantities with
/// different dimensions fail with [`UnitError::Incompatible`]; multiplication and
/// division combine the dimensions.
///
/// # Examples
///
/// ```rust
/// use units::{Quantity, Unit};
///
/// let r = Quantity::new(2.0, &Unit::kpc());
/// let t = Quantity::new(1.0, &Unit::myr());
///
/// assert!(r.checked_add(t).is_err());
/// let v = r / t;
/// assert!((v.value_in(&Unit::kms()).unwrap() - 1955.6).abs() < 0.1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "QuantityRepr")]
pub struct Quantity {
    value: f64,
    dim: Dimension,
}

/// Serialized form: `{ value: 1.5, unit: "kpc" }`
#[derive(Debug, Clone, Deserialize)]
struct QuantityRepr {
    value: f64,
    unit: Unit,
}

impl TryFrom<QuantityRepr> for Quantity {
    type Error = UnitError;

    fn try_from(repr: QuantityRepr) -> Result<Self, Self::Error> {
        Ok(Quantity::new(repr.value, &repr.unit))
    }
}

impl Quantity {
    pub fn new(value: f64, unit: &Unit) -> Self {
        Self {
            value: value * unit.scale(),
            dim: unit.dimension(),
        }
    }

    pub fn from_si(value: f64, dim: Dimension) -> Self {
        Self { value, dim }
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::from_si(value, Dimension::NONE)
    }

    pub fn si_value(&self) -> f64 {
        self.value
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    /// Expresses this quantity as a number of `unit`.
    pub fn value_in(&self, unit: &Unit) -> Result<f64, UnitError> {
        self.ensure_dimension(unit.dimension())?;
        Ok(self.value / unit.scale())
    }

    pub fn ensure_dimension(&self, dim: Dimension) -> Result<(), UnitError> {
        if self.dim != dim {
            return Err(UnitError::Incompatible {
                left: self.dim,
                right: dim,
            });
        }
        Ok(())
    }

    pub fn checked_add(self, rhs: Quantity) -> Result<Quantity, UnitError> {
        self.ensure_dimension(rhs.dim)?;
        Ok(Quantity::from_si(self.value + rhs.value, self.dim))
    }

    pub fn checked_sub(self, rhs: Quantity) -> Result<Quantity, UnitError> {
        self.ensure_dimension(rhs.dim)?;
        Ok(Quantity::from_si(self.value - rhs.value, self.dim))
    }

    pub fn powi(self, n: i8) -> Quantity {
        Quantity::from_si(self.value.powi(n as i32), self.dim.powi(n))
    }

    pub fn sqrt(self) -> Result<Quantity, UnitError> {
        let dim = self.dim.sqrt().ok_or(UnitError::InvalidOperation {
            operation: "square root",
            dim: self.dim,
        })?;
        Ok(Quantity::from_si(self.value.sqrt(), dim))
    }

    pub fn abs(self) -> Quantity {
        Quantity::from_si(self.value.abs(), self.dim)
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity::from_si(self.value * rhs.value, self.dim * rhs.dim)
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity::from_si(self.value / rhs.value, self.dim / rhs.dim)
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity::from_si(self.value * rhs, self.dim)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        Quantity::from_si(-self.value, self.dim)
    }
}

impl From<Length> for Quantity {
    fn from(length: Length) -> Self {
        Quantity::new(length.to_kpc(), &Unit::kpc())
    }
}

impl From<Mass> for Quantity {
    fn from(mass: Mass) -> Self {
        Quantity::new(mass.to_solar_masses(), &Unit::msun())
    }
}

impl From<Time> for Quantity {
    fn from(time: Time) -> Self {
        Quantity::new(time.to_myr(), &Unit::myr())
    }
}

impl From<Velocity> for Quantity {
    fn from(velocity: Velocity) -> Self {
        Quantity::new(velocity.to_kms(), &Unit::kms())
    }
}

impl TryFrom<Quantity> for Length {
    type Error = UnitError;

    fn try_from(q: Quantity) -> Result<Self, Self::Error> {
        Ok(Length::from_kpc(q.value_in(&Unit::kpc())?))
    }
}

impl TryFrom<Quantity> for Mass {
    type Error = UnitError;

    fn try_from(q: Quantity) -> Result<Self, Self::Error> {
        Ok(Mass::from_solar_masses(q.value_in(&Unit::msun())?))
    }
}

impl TryFrom<Quantity> for Time {
    type Error = UnitError;

    fn try_from(q: Quantity) -> Result<Self, Self::Error> {
        Ok(Time::from_myr(q.value_in(&Unit::myr())?))
    }
}

impl TryFrom<Quantity> for Velocity {
    type Error = UnitError;

    fn try_from(q: Quantity) -> Result<Self, Self::Error> {
        Ok(Velocity::from_kms(q.value_in(&Unit::kms())?))
    }
}
