use crate::dimension::Dimension;
use crate::error::UnitError;
use crate::quantity::Quantity;
use crate::unit::Unit;
use serde::Deserialize;

/// A list of values sharing one physical dimension, stored in SI.
///
/// Deserializes from `{ value: [1.0, 2.0, 3.0], unit: "kpc" }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "VectorRepr")]
pub struct VectorQuantity {
    values: Vec<f64>,
    dim: Dimension,
}

#[derive(Debug, Clone, Deserialize)]
struct VectorRepr {
    value: Vec<f64>,
    unit: Unit,
}

impl TryFrom<VectorRepr> for VectorQuantity {
    type Error = UnitError;

    fn try_from(repr: VectorRepr) -> Result<Self, Self::Error> {
        Ok(VectorQuantity::new(&repr.value, &repr.unit))
    }
}

impl VectorQuantity {
    pub fn new(values: &[f64], unit: &Unit) -> Self {
        Self {
            values: values.iter().map(|v| v * unit.scale()).collect(),
            dim: unit.dimension(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    pub fn get(&self, index: usize) -> Option<Quantity> {
        self.values
            .get(index)
            .map(|v| Quantity::from_si(*v, self.dim))
    }

    /// The values expressed as numbers of `unit`.
    pub fn values_in(&self, unit: &Unit) -> Result<Vec<f64>, UnitError> {
        if self.dim != unit.dimension() {
            return Err(UnitError::Incompatible {
                left: self.dim,
                right: unit.dimension(),
            });
        }
        Ok(self.values.iter().map(|v| v / unit.scale()).collect())
    }

    /// Collects scalar quantities, which must all share one dimension.
    pub fn from_quantities<I: IntoIterator<Item = Quantity>>(iter: I) -> Result<Self, UnitError> {
        let mut dim = None;
        let mut values = Vec::new();
        for q in iter {
            match dim {
                None => dim = Some(q.dimension()),
                Some(d) => q.ensure_dimension(d)?,
            }
            values.push(q.si_value());
        }
        Ok(VectorQuantity {
            values,
            dim: dim.unwrap_or(Dimension::NONE),
        })
    }
}
