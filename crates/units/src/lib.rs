//! Physical quantities for galactic dynamics.
//!
//! Typed newtypes ([`Length`], [`Mass`], [`Time`], [`Velocity`]) cover the
//! canonical units used throughout the workspace (kpc, M_sun, Myr, km/s).
//! [`Unit`] and [`Quantity`] carry a runtime [`Dimension`] for values whose
//! units are only known from configuration.

pub mod dimension;
pub mod error;
pub mod length;
pub mod mass;
pub mod quantity;
pub mod time;
pub mod unit;
pub mod vector_quantity;
pub mod velocity;

#[cfg(test)]
mod length_test;
#[cfg(test)]
mod quantity_test;
#[cfg(test)]
mod time_test;
#[cfg(test)]
mod vector_quantity_test;
#[cfg(test)]
mod velocity_test;

pub use dimension::Dimension;
pub use error::UnitError;
pub use length::Length;
pub use mass::{Mass, SOLAR_MASS_KG};
pub use quantity::Quantity;
pub use time::Time;
pub use unit::Unit;
pub use vector_quantity::VectorQuantity;
pub use velocity::{G_GALACTIC, Velocity, circular_velocity};
