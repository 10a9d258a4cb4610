//! The `integrate` mode: step a snapshot forward in time.

use std::path::PathBuf;

use analysis::TaskConfig;
use anyhow::Context;
use log::{Level, info};
use nbody::{Integrator, Snapshot};
use serde::Deserialize;
use serde_json::json;
use units::{Quantity, Time};
use visualizer::VisualizerConfig;

use crate::analyze::{InputConfig, Session};
use crate::config::{ConfigError, prepare_output};
use crate::logging::{LoggingConfig, emit};
use crate::plugins::{Imports, PluginRegistrar};
use crate::profiler::Profiler;

#[derive(Debug, Clone, Deserialize)]
pub struct IntegratorConfig {
    pub name: String,
    #[serde(default)]
    pub args: serde_yaml::Value,
}

/// Phase-space coordinates of particle `point_id`, logged as `logger_id` every step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleLogConfig {
    pub point_id: usize,
    pub logger_id: String,
}

fn default_snapshot_interval() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationConfig {
    pub input_file: InputConfig,
    pub output_file: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
    pub model_time: Quantity,
    pub integrator: IntegratorConfig,
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: usize,
    #[serde(default)]
    pub logs: Vec<ParticleLogConfig>,
    #[serde(default)]
    pub visualizer: Option<VisualizerConfig>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub imports: Imports,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl IntegrationConfig {
    fn validate(&self, particles: usize) -> Result<Time, ConfigError> {
        if self.snapshot_interval == 0 {
            return Err(ConfigError::Invalid("snapshot_interval must be at least 1".to_string()));
        }
        if let Some(log) = self.logs.iter().find(|log| log.point_id >= particles) {
            return Err(ConfigError::Invalid(format!(
                "logged particle {} is out of range for {particles} particles",
                log.point_id
            )));
        }
        Time::try_from(self.model_time).map_err(|e| ConfigError::Invalid(format!("model_time: {e}")))
    }
}

/// The record emitted for one logged particle.
pub fn particle_record(snapshot: &Snapshot, point_id: usize) -> Option<serde_json::Value> {
    let particle = snapshot.particles.get(point_id)?;
    Some(json!({
        "timestamp": snapshot.timestamp.to_myr(),
        "x": particle.position.x,
        "y": particle.position.y,
        "z": particle.position.z,
        "vx": particle.velocity.x,
        "vy": particle.velocity.y,
        "vz": particle.velocity.z,
        "m": particle.mass,
    }))
}

fn save_step(config: &IntegrationConfig, i: usize, snapshot: &Snapshot, written: &mut bool) -> anyhow::Result<()> {
    if i % config.snapshot_interval == 0 {
        archive::write_fits(&config.output_file, snapshot, *written)
            .with_context(|| format!("cannot write {}", config.output_file.display()))?;
        *written = true;
    }

    for log in &config.logs {
        if let Some(record) = particle_record(snapshot, log.point_id) {
            emit(Level::Info, &log.logger_id, &record);
        }
    }
    info!(target: "integration_timing", "{}", json!({"timestamp": snapshot.timestamp.to_myr()}));
    Ok(())
}

/// Integrates until `model_time`; returns the number of steps taken.
pub fn integrate(config: &IntegrationConfig, registrar: &PluginRegistrar, profiler: &mut Profiler) -> anyhow::Result<usize> {
    prepare_output(&config.output_file, config.overwrite)?;

    let constructor = registrar.integrators.require(&config.integrator.name)?;
    let mut integrator: Box<dyn Integrator> = constructor(&config.integrator.args)
        .with_context(|| format!("cannot construct integrator `{}`", config.integrator.name))?;

    let mut snapshot = config.input_file.first_snapshot()?;
    let model_time = config.validate(snapshot.len())?;
    let mut session = Session::new(&config.tasks, config.visualizer.clone(), registrar)?;

    info!("Integration started");
    let mut i = 0;
    let mut written = false;
    while snapshot.timestamp < model_time {
        snapshot = profiler
            .measure("Integration stage", || integrator.leapfrog(&snapshot))
            .with_context(|| format!("integration step {i} failed"))?;
        session.process(i, &snapshot, profiler)?;
        profiler.measure("Saving to file stage", || save_step(config, i, &snapshot, &mut written))?;
        i += 1;
    }
    Ok(i)
}
