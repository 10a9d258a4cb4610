use crate::dimension::Dimension;
use crate::error::UnitError;
use crate::length::{AU_TO_M, KPC_TO_M};
use crate::mass::SOLAR_MASS_KG;
use crate::time::{MYR_TO_SECONDS, SECONDS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named physical unit: a scale factor to SI and a dimension.
///
/// Units are parsed from strings such as `"kpc"`, `"km/s"`, `"MSun/kpc^3"`
/// or `"J/MSun"`. Powers may be written as `^n` or `**n`.
///
/// # Examples
///
/// ```rust
/// use units::{Dimension, Unit};
///
/// let density: Unit = "MSun/kpc**3".parse().unwrap();
/// assert_eq!(density.dimension(), Dimension::DENSITY);
///
/// let pc = Unit::parse("pc").unwrap();
/// assert!((pc.factor_to(&Unit::kpc()).unwrap() - 1.0e-3).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit {
    symbol: String,
    scale: f64,
    dim: Dimension,
}

/// Base symbols: SI scale and dimension
fn base_unit(name: &str) -> Option<(f64, Dimension)> {
    let entry = match name {
        "kpc" => (KPC_TO_M, Dimension::LENGTH),
        "pc" => (KPC_TO_M / 1_000.0, Dimension::LENGTH),
        "AU" | "au" => (AU_TO_M, Dimension::LENGTH),
        "km" => (1_000.0, Dimension::LENGTH),
        "m" => (1.0, Dimension::LENGTH),
        "cm" => (0.01, Dimension::LENGTH),
        "kms" => (1_000.0, Dimension::VELOCITY),
        "MSun" | "Msun" | "msun" => (SOLAR_MASS_KG, Dimension::MASS),
        "kg" => (1.0, Dimension::MASS),
        "g" => (1.0e-3, Dimension::MASS),
        "Gyr" => (MYR_TO_SECONDS * 1_000.0, Dimension::TIME),
        "Myr" => (MYR_TO_SECONDS, Dimension::TIME),
        "yr" => (SECONDS_PER_YEAR, Dimension::TIME),
        "s" => (1.0, Dimension::TIME),
        "J" => (1.0, Dimension::ENERGY),
        "rad" => (1.0, Dimension::NONE),
        "deg" => (std::f64::consts::PI / 180.0, Dimension::NONE),
        "none" => (1.0, Dimension::NONE),
        _ => return None,
    };
    Some(entry)
}

impl Unit {
    /// Parses a unit expression made of base symbols joined by `*` and `/`.
    pub fn parse(text: &str) -> Result<Self, UnitError> {
        let normalized = text.trim().replace("**", "^");
        if normalized.is_empty() {
            return Ok(Self::dimensionless());
        }

        let mut scale = 1.0;
        let mut dim = Dimension::NONE;
        let mut dividing = false;
        let mut token = String::new();

        let mut apply = |token: &str, dividing: bool| -> Result<(), UnitError> {
            let (factor_scale, factor_dim) = parse_factor(token, text)?;
            if dividing {
                scale /= factor_scale;
                dim = dim / factor_dim;
            } else {
                scale *= factor_scale;
                dim = dim * factor_dim;
            }
            Ok(())
        };

        for ch in normalized.chars() {
            match ch {
                '*' | '/' => {
                    apply(token.trim(), dividing)?;
                    token.clear();
                    dividing = ch == '/';
                }
                _ => token.push(ch),
            }
        }
        apply(token.trim(), dividing)?;

        Ok(Self {
            symbol: text.trim().to_string(),
            scale,
            dim,
        })
    }

    pub fn dimensionless() -> Self {
        Self {
            symbol: "1".to_string(),
            scale: 1.0,
            dim: Dimension::NONE,
        }
    }

    pub fn kpc() -> Self {
        Self::named("kpc", KPC_TO_M, Dimension::LENGTH)
    }

    pub fn kms() -> Self {
        Self::named("km/s", 1_000.0, Dimension::VELOCITY)
    }

    pub fn msun() -> Self {
        Self::named("MSun", SOLAR_MASS_KG, Dimension::MASS)
    }

    pub fn myr() -> Self {
        Self::named("Myr", MYR_TO_SECONDS, Dimension::TIME)
    }

    /// Specific energy in (km/s)^2, the natural unit of the gravitational potential
    pub fn kms_squared() -> Self {
        Self::named("km^2/s^2", 1.0e6, Dimension::SPECIFIC_ENERGY)
    }

    /// Mass density in M_sun per cubic kpc
    pub fn msun_per_kpc3() -> Self {
        Self::named("MSun/kpc^3", SOLAR_MASS_KG / KPC_TO_M.powi(3), Dimension::DENSITY)
    }

    /// Coherent SI unit of the given dimension
    pub fn si(dim: Dimension) -> Self {
        Self::named("SI", 1.0, dim)
    }

    fn named(symbol: &str, scale: f64, dim: Dimension) -> Self {
        Self {
            symbol: symbol.to_string(),
            scale,
            dim,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Value of one of this unit in SI
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    /// Multiplier converting a value in `self` into a value in `target`.
    pub fn factor_to(&self, target: &Unit) -> Result<f64, UnitError> {
        if self.dim != target.dim {
            return Err(UnitError::Incompatible {
                left: self.dim,
                right: target.dim,
            });
        }
        Ok(self.scale / target.scale)
    }
}

fn parse_factor(token: &str, whole: &str) -> Result<(f64, Dimension), UnitError> {
    let (name, exponent) = match token.split_once('^') {
        Some((name, exp)) => {
            let exp = exp
                .trim()
                .parse::<i8>()
                .map_err(|_| UnitError::InvalidExponent(whole.to_string()))?;
            (name.trim(), exp)
        }
        None => (token, 1),
    };

    if let Ok(number) = name.parse::<f64>() {
        return Ok((number.powi(exponent as i32), Dimension::NONE));
    }

    let (scale, dim) =
        base_unit(name).ok_or_else(|| UnitError::UnknownUnit(whole.to_string()))?;
    Ok((scale.powi(exponent as i32), dim.powi(exponent)))
}

impl FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

impl TryFrom<String> for Unit {
    type Error = UnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Unit::parse(&value)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> String {
        unit.symbol
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
