//! Separation between two points over time.

use std::collections::BTreeSet;

use nalgebra::{Point3, Vector3};
use nbody::Snapshot;
use nbody::centers::CenterType;
use serde::Deserialize;
use units::{Unit, VectorQuantity};

use super::FromArgs;
use super::profile::center_finder;
use crate::args::{OutputUnit, ParticleRange, parse_args};
use crate::error::TaskError;
use crate::task::{Measurement, Task, TaskInputs, TaskResult, TimeEvolution, vector_input};

/// A configured end of the distance vector.
///
/// ```yaml
/// start: {id: 0}
/// end: {center: potential, part: !slice [100, 200], offset: !q [[1, 0, 0], kpc]}
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    /// Position of the particle with this index
    Particle {
        id: usize,
        #[serde(default)]
        offset: Option<VectorQuantity>,
    },
    /// A center of the whole set, or of the particles in `part`
    Center {
        center: String,
        #[serde(default)]
        part: Option<ParticleRange>,
        #[serde(default)]
        offset: Option<VectorQuantity>,
    },
}

impl Endpoint {
    fn resolve(&self, snapshot: &Snapshot) -> Result<Point3<f64>, TaskError> {
        let (position, offset) = match self {
            Endpoint::Particle { id, offset } => {
                let particle = snapshot.particles.get(*id).ok_or_else(|| {
                    TaskError::Config(format!(
                        "particle {id} is out of range for a snapshot of {} particles",
                        snapshot.len()
                    ))
                })?;
                (particle.position, offset)
            }
            Endpoint::Center {
                center,
                part,
                offset,
            } => {
                let finder = center_finder(center);
                let position = match part {
                    Some(range) => finder.position(&snapshot.particles.select(&range.indices(snapshot.len()))),
                    None => finder.position(&snapshot.particles),
                };
                (position, offset)
            }
        };
        Ok(position + offset_vector(offset.as_ref())?)
    }

    fn check(&self) -> Result<(), TaskError> {
        if let Endpoint::Center { center, .. } = self {
            center.parse::<CenterType>().map_err(|name| {
                TaskError::Config(format!("unknown center type `{name}`"))
            })?;
        }
        Ok(())
    }
}

fn offset_vector(offset: Option<&VectorQuantity>) -> Result<Vector3<f64>, TaskError> {
    let Some(offset) = offset else {
        return Ok(Vector3::zeros());
    };
    match offset.values_in(&Unit::kpc())?.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        other => Err(TaskError::Config(format!(
            "offset must have three components, got {}",
            other.len()
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    #[serde(default = "OutputUnit::myr")]
    time_unit: OutputUnit,
    #[serde(default = "OutputUnit::kpc")]
    dist_unit: OutputUnit,
    #[serde(default)]
    start: Option<Endpoint>,
    #[serde(default)]
    end: Option<Endpoint>,
}

/// Length of `end - start` in kpc.
///
/// The `start` and `end` inputs win over the configured endpoints.
#[derive(Debug, Clone, Default)]
pub struct Distance {
    pub start: Option<Endpoint>,
    pub end: Option<Endpoint>,
}

impl Distance {
    fn endpoint(
        configured: Option<&Endpoint>,
        name: &str,
        snapshot: &Snapshot,
        inputs: &TaskInputs,
    ) -> Result<Point3<f64>, TaskError> {
        if let Some(position) = vector_input(inputs, name)? {
            return Ok(Point3::from(position));
        }
        configured
            .ok_or_else(|| TaskError::MissingInput(name.to_string()))?
            .resolve(snapshot)
    }
}

impl Measurement for Distance {
    const KEY: &'static str = "dist";

    fn unit(&self) -> Unit {
        Unit::kpc()
    }

    fn measure(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<f64, TaskError> {
        let start = Self::endpoint(self.start.as_ref(), "start", snapshot, inputs)?;
        let end = Self::endpoint(self.end.as_ref(), "end", snapshot, inputs)?;
        Ok((end - start).magnitude())
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["start", "end"]
    }
}

/// Outputs `times` and `dist`.
pub struct DistanceTask(TimeEvolution<Distance>);

impl DistanceTask {
    pub fn new(distance: Distance, time_unit: OutputUnit, dist_unit: OutputUnit) -> Self {
        Self(TimeEvolution::new(distance, time_unit, dist_unit))
    }
}

impl FromArgs for DistanceTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let args: Args = parse_args(args)?;
        for endpoint in args.start.iter().chain(args.end.iter()) {
            endpoint.check()?;
        }
        let distance = Distance {
            start: args.start,
            end: args.end,
        };
        Ok(Self::new(distance, args.time_unit, args.dist_unit))
    }
}

impl Task for DistanceTask {
    fn run(&mut self, snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        self.0.run(snapshot, inputs)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        self.0.outputs()
    }

    fn inputs(&self) -> &'static [&'static str] {
        self.0.inputs()
    }
}
