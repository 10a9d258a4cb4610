use std::fmt;
use std::ops::{Div, Mul};

/// Integer exponents of the base dimensions (length, mass, time).
///
/// Angles are treated as dimensionless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub length: i8,
    pub mass: i8,
    pub time: i8,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new(0, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(1, 0, 0);
    pub const MASS: Dimension = Dimension::new(0, 1, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1);
    pub const VELOCITY: Dimension = Dimension::new(1, 0, -1);
    pub const ENERGY: Dimension = Dimension::new(2, 1, -2);
    /// Energy per unit mass, the dimension of a gravitational potential
    pub const SPECIFIC_ENERGY: Dimension = Dimension::new(2, 0, -2);
    pub const DENSITY: Dimension = Dimension::new(-3, 1, 0);

    pub const fn new(length: i8, mass: i8, time: i8) -> Self {
        Self { length, mass, time }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::NONE
    }

    pub fn powi(self, n: i8) -> Self {
        Self::new(self.length * n, self.mass * n, self.time * n)
    }

    /// Halves every exponent, or `None` when any exponent is odd.
    pub fn sqrt(self) -> Option<Self> {
        if self.length % 2 != 0 || self.mass % 2 != 0 || self.time % 2 != 0 {
            return None;
        }
        Some(Self::new(self.length / 2, self.mass / 2, self.time / 2))
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Dimension) -> Dimension {
        Dimension::new(
            self.length + rhs.length,
            self.mass + rhs.mass,
            self.time + rhs.time,
        )
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Dimension) -> Dimension {
        Dimension::new(
            self.length - rhs.length,
            self.mass - rhs.mass,
            self.time - rhs.time,
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "[1]");
        }
        let mut parts = Vec::new();
        for (symbol, exp) in [("L", self.length), ("M", self.mass), ("T", self.time)] {
            match exp {
                0 => {}
                1 => parts.push(symbol.to_string()),
                _ => parts.push(format!("{symbol}^{exp}")),
            }
        }
        write!(f, "[{}]", parts.join(" "))
    }
}
