//! The `create` mode: compose model outputs into one initial snapshot.

use std::path::{Path, PathBuf};

use anyhow::Context;
use archive::ArchiveError;
use log::{info, warn};
use nalgebra::{Rotation3, Unit as Axis, Vector3};
use nbody::Snapshot;
use serde::Deserialize;
use serde_json::json;
use units::{Dimension, Quantity, Unit, VectorQuantity};

use crate::config::{ConfigError, prepare_output};
use crate::logging::LoggingConfig;
use crate::plugins::{Imports, PluginRegistrar};
use crate::profiler::Profiler;

/// Rotation about an axis through the origin.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationConfig {
    pub axis: [f64; 3],
    /// Dimensionless, in `rad` or `deg`
    pub angle: Quantity,
}

impl RotationConfig {
    pub fn rotation(&self) -> Result<Rotation3<f64>, ConfigError> {
        let axis = Vector3::from(self.axis);
        if axis.norm() == 0.0 {
            return Err(ConfigError::Invalid("rotation axis must not be zero".to_string()));
        }
        self.angle
            .ensure_dimension(Dimension::NONE)
            .map_err(|e| ConfigError::Invalid(format!("rotation angle: {e}")))?;
        Ok(Rotation3::from_axis_angle(
            &Axis::new_normalize(axis),
            self.angle.si_value(),
        ))
    }
}

/// One entry of `objects`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectConfig {
    pub name: String,
    #[serde(default)]
    pub args: serde_yaml::Value,
    #[serde(default)]
    pub position: Option<VectorQuantity>,
    #[serde(default)]
    pub velocity: Option<VectorQuantity>,
    #[serde(default)]
    pub downsample_to: Option<usize>,
    #[serde(default)]
    pub rotation: Option<RotationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreationConfig {
    pub output_file: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
    pub objects: Vec<ObjectConfig>,
    #[serde(default)]
    pub imports: Imports,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A 3-vector in `unit`, zero when absent.
fn vector3(quantity: Option<&VectorQuantity>, unit: &Unit, field: &str) -> Result<Vector3<f64>, ConfigError> {
    let Some(quantity) = quantity else {
        return Ok(Vector3::zeros());
    };
    let values = quantity
        .values_in(unit)
        .map_err(|e| ConfigError::Invalid(format!("{field}: {e}")))?;
    match values.as_slice() {
        &[x, y, z] => Ok(Vector3::new(x, y, z)),
        _ => Err(ConfigError::Invalid(format!(
            "{field} must have 3 components, got {}",
            values.len()
        ))),
    }
}

/// Keeps every `⌊N/target⌋`-th particle and scales the kept masses so the
/// total mass is unchanged.
///
/// Snapshots that already have at most `target` particles are returned as is.
pub fn downsample(snapshot: Snapshot, target: usize) -> Snapshot {
    let n = snapshot.len();
    if target == 0 || target >= n {
        return snapshot;
    }
    let step = n / target;
    let indices: Vec<usize> = (0..n).step_by(step).collect();
    let total = snapshot.particles.total_mass().to_solar_masses();
    let mut result = snapshot.select(&indices);
    let kept = result.particles.total_mass().to_solar_masses();
    if kept > 0.0 {
        result.particles.scale_masses(total / kept);
    }
    result
}

/// Accumulates model snapshots into the initial conditions.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, snapshot: &Snapshot) {
        self.snapshot.particles.extend(&snapshot.particles);
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// The combined set in its center-of-mass frame.
    pub fn build(&self) -> Snapshot {
        let mut snapshot = self.snapshot.clone();
        snapshot.particles.move_to_center();
        snapshot
    }

    /// Writes [`SnapshotBuilder::build`] as a fresh archive.
    pub fn to_archive(&self, path: impl AsRef<Path>) -> Result<(), ArchiveError> {
        archive::write_fits(path, &self.build(), false)
    }
}

/// Runs one object's model and applies its placement.
///
/// Returns `None` when the model is not registered.
pub fn build_object(object: &ObjectConfig, registrar: &PluginRegistrar) -> anyhow::Result<Option<Snapshot>> {
    let Some(constructor) = registrar.models.get(&object.name) else {
        warn!(target: "models", "{}", json!({"error": "model not found", "name": object.name}));
        return Ok(None);
    };

    let mut model = constructor(&object.args).with_context(|| format!("cannot construct model `{}`", object.name))?;
    let mut snapshot = model
        .run()
        .with_context(|| format!("model `{}` failed", object.name))?;

    let offset = vector3(object.position.as_ref(), &Unit::kpc(), "position")?;
    let velocity = vector3(object.velocity.as_ref(), &Unit::kms(), "velocity")?;
    snapshot.particles.translate(offset);
    snapshot.particles.boost(velocity);

    if let Some(target) = object.downsample_to {
        snapshot = downsample(snapshot, target);
    }
    if let Some(rotation) = &object.rotation {
        snapshot.particles.rotate(&rotation.rotation()?);
    }
    Ok(Some(snapshot))
}

pub fn create(config: &CreationConfig, registrar: &PluginRegistrar, profiler: &mut Profiler) -> anyhow::Result<()> {
    prepare_output(&config.output_file, config.overwrite)?;

    let mut builder = SnapshotBuilder::new();
    for object in &config.objects {
        let Some(snapshot) = profiler.measure("Creation", || build_object(object, registrar))? else {
            continue;
        };
        info!(
            target: "models",
            "{}",
            json!({
                "message": "added snapshot",
                "name": object.name,
                "n": snapshot.len(),
                "total_mass_MSun": snapshot.particles.total_mass().to_solar_masses(),
            })
        );
        builder.add(&snapshot);
    }

    builder
        .to_archive(&config.output_file)
        .with_context(|| format!("cannot write {}", config.output_file.display()))?;
    info!(
        target: "models",
        "{}",
        json!({"message": "snapshot written", "n": builder.len(), "path": config.output_file.display().to_string()})
    );
    Ok(())
}
