use crate::dimension::Dimension;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
    #[error("invalid exponent in unit `{0}`")]
    InvalidExponent(String),
    #[error("incompatible units: {left} and {right}")]
    Incompatible { left: Dimension, right: Dimension },
    #[error("cannot take {operation} of a quantity with dimension {dim}")]
    InvalidOperation {
        operation: &'static str,
        dim: Dimension,
    },
}
