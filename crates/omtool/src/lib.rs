//! Create, integrate and analyze galactic N-body models.
//!
//! Every mode reads one YAML file. [`run`] resolves its custom tags, starts
//! JSON-lines logging, builds the plugin registries and dispatches to
//! [`creation::create`], [`integration::integrate`] or [`analyze::analyze`].

pub mod analyze;
pub mod config;
pub mod creation;
pub mod integration;
pub mod integrators;
pub mod logging;
pub mod models;
pub mod plugins;
pub mod profiler;

#[cfg(test)]
mod creation_test;
#[cfg(test)]
mod models_test;

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;

use crate::analyze::AnalysisConfig;
use crate::creation::CreationConfig;
use crate::integration::IntegrationConfig;
use crate::plugins::{Imports, PluginRegistrar};
use crate::profiler::Profiler;

pub use config::ConfigError;
pub use plugins::PluginError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Build initial conditions from models
    Create,
    /// Step a snapshot forward in time
    Integrate,
    /// Run the task pipeline over an archive
    #[value(alias = "analize")]
    Analyze,
}

/// Registries with the built-ins plus every library matched by `imports`.
pub fn registrar(imports: &Imports) -> PluginRegistrar {
    let mut registrar = PluginRegistrar::with_builtins();
    registrar.load(imports.all());
    registrar
}

/// Runs `mode` on an already parsed config document.
pub fn run_document(mode: Mode, document: serde_yaml::Value, profiler: &mut Profiler) -> anyhow::Result<()> {
    match mode {
        Mode::Create => {
            let config: CreationConfig = config::from_value(document).context("invalid creation config")?;
            creation::create(&config, &registrar(&config.imports), profiler)
        }
        Mode::Integrate => {
            let config: IntegrationConfig = config::from_value(document).context("invalid integration config")?;
            integration::integrate(&config, &registrar(&config.imports), profiler).map(|_| ())
        }
        Mode::Analyze => {
            let config: AnalysisConfig = config::from_value(document).context("invalid analysis config")?;
            analyze::analyze(&config, &registrar(&config.imports), profiler).map(|_| ())
        }
    }
}

/// Loads the config at `path`, initializes logging and runs `mode`.
pub fn run(mode: Mode, path: &Path, verbose: bool) -> anyhow::Result<()> {
    let document = config::load_yaml(path).with_context(|| format!("cannot load {}", path.display()))?;
    logging::init(&config::logging_section(&document)?, verbose)?;

    let mut profiler = Profiler::new();
    let result = run_document(mode, document, &mut profiler);
    profiler.log_summary();
    result
}
