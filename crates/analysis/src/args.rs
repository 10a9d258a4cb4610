//! Helpers for deserializing task and action arguments.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use units::{Dimension, Quantity, Unit, UnitError};

/// Deserializes `args`, treating a missing (null) value as an empty mapping.
pub fn parse_args<T: DeserializeOwned>(args: &serde_yaml::Value) -> Result<T, serde_yaml::Error> {
    match args {
        serde_yaml::Value::Null => {
            serde_yaml::from_value(serde_yaml::Value::Mapping(serde_yaml::Mapping::new()))
        }
        other => serde_yaml::from_value(other.clone()),
    }
}

/// The unit an output array is divided by.
///
/// Accepts a unit string (`"kpc"`) or a quantity mapping (`{value: 10, unit: kpc}`,
/// which is what `!q [10, kpc]` resolves to).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "UnitRepr")]
pub struct OutputUnit(Quantity);

#[derive(Deserialize)]
#[serde(untagged)]
enum UnitRepr {
    Symbol(Unit),
    Quantity(Quantity),
}

impl From<UnitRepr> for OutputUnit {
    fn from(repr: UnitRepr) -> Self {
        match repr {
            UnitRepr::Symbol(unit) => OutputUnit::of(&unit),
            UnitRepr::Quantity(q) => OutputUnit(q),
        }
    }
}

impl OutputUnit {
    pub fn of(unit: &Unit) -> Self {
        OutputUnit(Quantity::new(1.0, unit))
    }

    pub fn kpc() -> Self {
        Self::of(&Unit::kpc())
    }

    pub fn kms() -> Self {
        Self::of(&Unit::kms())
    }

    pub fn msun() -> Self {
        Self::of(&Unit::msun())
    }

    pub fn myr() -> Self {
        Self::of(&Unit::myr())
    }

    pub fn quantity(&self) -> Quantity {
        self.0
    }

    pub fn dimension(&self) -> Dimension {
        self.0.dimension()
    }

    /// Divides values given in `unit` by this output unit.
    pub fn convert(&self, values: &[f64], unit: &Unit) -> Result<Vec<f64>, UnitError> {
        self.0.ensure_dimension(unit.dimension())?;
        let factor = unit.scale() / self.0.si_value();
        Ok(values.iter().map(|v| v * factor).collect())
    }

    pub fn convert_one(&self, value: f64, unit: &Unit) -> Result<f64, UnitError> {
        self.0.ensure_dimension(unit.dimension())?;
        Ok(value * unit.scale() / self.0.si_value())
    }

    /// Divides SI values of dimension `dim` by this output unit.
    pub fn convert_si(&self, values: &[f64], dim: Dimension) -> Result<Vec<f64>, UnitError> {
        self.0.ensure_dimension(dim)?;
        let scale = self.0.si_value();
        Ok(values.iter().map(|v| v / scale).collect())
    }
}

/// A length argument such as a softening, in kpc.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "OutputUnit")]
pub struct LengthArg(pub f64);

impl TryFrom<OutputUnit> for LengthArg {
    type Error = UnitError;

    fn try_from(value: OutputUnit) -> Result<Self, Self::Error> {
        Ok(LengthArg(value.quantity().value_in(&Unit::kpc())?))
    }
}

/// A range of particle indices.
///
/// Written as `[start, stop]` or as the `{start, stop, step}` mapping that
/// `!slice` resolves to; a missing `stop` runs to the end of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RangeRepr")]
pub struct ParticleRange {
    pub start: usize,
    pub stop: Option<usize>,
    pub step: usize,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RangeRepr {
    Pair([usize; 2]),
    Slice {
        #[serde(default)]
        start: Option<usize>,
        #[serde(default)]
        stop: Option<usize>,
        #[serde(default)]
        step: Option<usize>,
    },
}

impl TryFrom<RangeRepr> for ParticleRange {
    type Error = String;

    fn try_from(repr: RangeRepr) -> Result<Self, Self::Error> {
        match repr {
            RangeRepr::Pair([start, stop]) => Ok(ParticleRange {
                start,
                stop: Some(stop),
                step: 1,
            }),
            RangeRepr::Slice { step: Some(0), .. } => Err("slice step cannot be zero".to_string()),
            RangeRepr::Slice { start, stop, step } => Ok(ParticleRange {
                start: start.unwrap_or(0),
                stop,
                step: step.unwrap_or(1),
            }),
        }
    }
}

impl ParticleRange {
    /// Indices of the range within a set of `n` particles.
    pub fn indices(&self, n: usize) -> Vec<usize> {
        let stop = self.stop.unwrap_or(n).min(n);
        (self.start.min(stop)..stop).step_by(self.step.max(1)).collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use units::Unit;

    use super::{LengthArg, OutputUnit, ParticleRange, parse_args};

    #[test]
    fn test_output_unit_from_symbol_or_quantity() {
        let symbol: OutputUnit = serde_yaml::from_str("pc").unwrap();
        let quantity: OutputUnit = serde_yaml::from_str("{value: 10, unit: kpc}").unwrap();

        assert_relative_eq!(symbol.convert_one(1.0, &Unit::kpc()).unwrap(), 1000.0, max_relative = 1e-12);
        assert_relative_eq!(quantity.convert_one(5.0, &Unit::kpc()).unwrap(), 0.5, max_relative = 1e-12);
        assert!(quantity.convert(&[1.0], &Unit::kms()).is_err());
    }

    #[test]
    fn test_length_arg_converts_to_kpc() {
        let eps: LengthArg = serde_yaml::from_str("{value: 200, unit: pc}").unwrap();
        assert_relative_eq!(eps.0, 0.2, max_relative = 1e-12);
        assert!(serde_yaml::from_str::<LengthArg>("{value: 1, unit: Myr}").is_err());
    }

    #[test]
    fn test_null_args_are_empty_mapping() {
        #[derive(serde::Deserialize, Default)]
        struct Args {
            #[serde(default)]
            resolution: usize,
        }
        let args: Args = parse_args(&serde_yaml::Value::Null).unwrap();
        assert_eq!(args.resolution, 0);
    }

    #[test]
    fn test_particle_range_from_pair_or_slice() {
        let pair: ParticleRange = serde_yaml::from_str("[2, 5]").unwrap();
        assert_eq!(pair.indices(10), vec![2, 3, 4]);
        assert_eq!(pair.indices(4), vec![2, 3]);

        let stepped: ParticleRange = serde_yaml::from_str("{start: 1, stop: null, step: 3}").unwrap();
        assert_eq!(stepped.indices(8), vec![1, 4, 7]);

        assert!(serde_yaml::from_str::<ParticleRange>("{start: 0, step: 0}").is_err());
    }
}
