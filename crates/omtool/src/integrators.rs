//! Time-steppers selectable from the integrate configuration.

use nbody::gravity::tree::DEFAULT_THETA;
use nbody::gravity::{DirectGravity, TreeGravity};
use nbody::{Drift, Integrator, IntegratorError, Leapfrog};
use serde::Deserialize;
use units::{Quantity, Time, Unit, UnitError};

use crate::plugins::Registry;

#[derive(Debug, thiserror::Error)]
pub enum IntegratorConfigError {
    #[error("invalid integrator arguments: {0}")]
    Args(#[from] serde_yaml::Error),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Integrator(#[from] IntegratorError),
    #[error("exactly one of `timestep` and `kmax` must be set")]
    StepSize,
}

pub type IntegratorConstructor =
    fn(&serde_yaml::Value) -> Result<Box<dyn Integrator>, IntegratorConfigError>;

pub fn register_builtin_integrators(registry: &mut Registry<IntegratorConstructor>) {
    registry.register("leapfrog", leapfrog);
    registry.register("dummy", dummy);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Solver {
    #[default]
    Tree,
    Direct,
}

fn default_theta() -> f64 {
    DEFAULT_THETA
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeapfrogArgs {
    /// Softening length
    pub eps: Quantity,
    #[serde(default)]
    pub timestep: Option<Quantity>,
    /// Step of `0.5^kmax` Gyr
    #[serde(default)]
    pub kmax: Option<f64>,
    #[serde(default = "default_theta")]
    pub theta: f64,
    #[serde(default)]
    pub solver: Solver,
}

fn leapfrog(args: &serde_yaml::Value) -> Result<Box<dyn Integrator>, IntegratorConfigError> {
    let args: LeapfrogArgs = analysis::args::parse_args(args)?;
    let eps = args.eps.value_in(&Unit::kpc())?;

    let timestep = match (&args.timestep, args.kmax) {
        (Some(step), None) => Time::from_myr(step.value_in(&Unit::myr())?),
        (None, Some(kmax)) => Time::from_gyr(0.5f64.powf(kmax)),
        _ => return Err(IntegratorConfigError::StepSize),
    };

    let integrator = match args.solver {
        Solver::Tree => Leapfrog::new(TreeGravity::with_softening(args.theta, eps), timestep)?,
        Solver::Direct => Leapfrog::new(DirectGravity::with_softening(eps), timestep)?,
    };
    Ok(Box::new(integrator))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DummyArgs {
    pub timestep: Quantity,
}

fn dummy(args: &serde_yaml::Value) -> Result<Box<dyn Integrator>, IntegratorConfigError> {
    let args: DummyArgs = analysis::args::parse_args(args)?;
    let timestep = Time::from_myr(args.timestep.value_in(&Unit::myr())?);
    Ok(Box::new(Drift::new(timestep)?))
}
