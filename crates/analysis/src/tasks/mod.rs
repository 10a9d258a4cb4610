//! Built-in measurement tasks.

use crate::error::TaskError;
use crate::task::{Task, TaskConstructor};

pub mod bound_mass;
pub mod center;
pub mod density_profile;
pub mod distance;
pub mod ellipse_fit;
pub mod mass_profile;
pub mod potential;
mod profile;
pub mod scatter;
pub mod time_evolution;
pub mod velocity_profile;

#[cfg(test)]
mod ellipse_fit_test;

pub use bound_mass::BoundMassTask;
pub use center::CenterTask;
pub use density_profile::DensityProfileTask;
pub use distance::DistanceTask;
pub use ellipse_fit::EllipseFitTask;
pub use mass_profile::MassProfileTask;
pub use potential::PotentialTask;
pub use scatter::ScatterTask;
pub use time_evolution::TimeEvolutionTask;
pub use velocity_profile::VelocityProfileTask;

/// A task that can be built from YAML arguments.
pub trait FromArgs: Sized {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError>;
}

/// Boxing constructor for any [`FromArgs`] task.
pub fn construct<T: Task + FromArgs + 'static>(
    args: &serde_yaml::Value,
) -> Result<Box<dyn Task>, TaskError> {
    Ok(Box::new(T::from_args(args)?))
}

/// Registry names and constructors of the built-in tasks.
pub fn builtin_tasks() -> Vec<(&'static str, TaskConstructor)> {
    vec![
        ("MassProfileTask", construct::<MassProfileTask> as TaskConstructor),
        ("DensityProfileTask", construct::<DensityProfileTask> as TaskConstructor),
        ("VelocityProfileTask", construct::<VelocityProfileTask> as TaskConstructor),
        ("PotentialTask", construct::<PotentialTask> as TaskConstructor),
        ("BoundMassTask", construct::<BoundMassTask> as TaskConstructor),
        ("DistanceTask", construct::<DistanceTask> as TaskConstructor),
        ("ScatterTask", construct::<ScatterTask> as TaskConstructor),
        ("TimeEvolutionTask", construct::<TimeEvolutionTask> as TaskConstructor),
        ("EllipseFitTask", construct::<EllipseFitTask> as TaskConstructor),
        ("CenterTask", construct::<CenterTask> as TaskConstructor),
        ("PotentialCenterTask", center::potential_center as TaskConstructor),
    ]
}
