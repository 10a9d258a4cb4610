//! The `analyze` mode and the per-snapshot session it shares with `integrate`.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use analysis::{ActionFactory, Outputs, Pipeline, SharedPlotSink, TaskConfig};
use anyhow::Context;
use archive::ArchiveError;
use log::info;
use nbody::Snapshot;
use serde::Deserialize;
use serde_json::json;
use visualizer::{VisualizerConfig, VisualizerService};

use crate::config::ConfigError;
use crate::logging::LoggingConfig;
use crate::plugins::{Imports, PluginRegistrar};
use crate::profiler::Profiler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Fits,
    Csv,
}

fn default_delimiter() -> char {
    ','
}

/// Where snapshots are read from.
///
/// FITS archives listed in `filenames` are read one after another. CSV
/// logs are one file per particle and together form a single stream.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub format: InputFormat,
    pub filenames: Vec<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

pub type SnapshotStream = Box<dyn Iterator<Item = Result<Snapshot, ArchiveError>>>;

impl InputConfig {
    /// A lazy stream over every configured snapshot.
    pub fn snapshots(&self) -> Result<SnapshotStream, ConfigError> {
        if self.filenames.is_empty() {
            return Err(ConfigError::Invalid("input_file.filenames is empty".to_string()));
        }
        match self.format {
            InputFormat::Fits => {
                let files = self.filenames.clone();
                Ok(Box::new(files.into_iter().flat_map(
                    |path| -> Box<dyn Iterator<Item = Result<Snapshot, ArchiveError>>> {
                        match archive::from_fits(&path, None, None) {
                            Ok(reader) => Box::new(reader),
                            Err(error) => Box::new(std::iter::once(Err(error))),
                        }
                    },
                )))
            }
            InputFormat::Csv => {
                let delimiter = u8::try_from(self.delimiter).map_err(|_| {
                    ConfigError::Invalid(format!("delimiter `{}` is not ASCII", self.delimiter))
                })?;
                match archive::from_logged_csvs(&self.filenames, delimiter) {
                    Ok(reader) => Ok(Box::new(reader)),
                    Err(error) => Ok(Box::new(std::iter::once(Err(error)))),
                }
            }
        }
    }

    /// The first snapshot of the stream.
    pub fn first_snapshot(&self) -> anyhow::Result<Snapshot> {
        self.snapshots()?
            .next()
            .context("input contains no snapshots")?
            .context("cannot read the first snapshot")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    pub input_file: InputConfig,
    #[serde(default)]
    pub visualizer: Option<VisualizerConfig>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub imports: Imports,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timings of one [`Session::process`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IterationTimes {
    pub computation: Duration,
    pub saving: Duration,
}

/// The task pipeline and the figure it draws into.
pub struct Session {
    pipeline: Pipeline,
    visualizer: Option<Rc<RefCell<VisualizerService>>>,
}

impl Session {
    pub fn new(
        tasks: &[TaskConfig],
        visualizer: Option<VisualizerConfig>,
        registrar: &PluginRegistrar,
    ) -> anyhow::Result<Self> {
        let visualizer = visualizer
            .map(VisualizerService::new)
            .transpose()
            .context("cannot set up the visualizer")?
            .map(|service| Rc::new(RefCell::new(service)));
        let sink = visualizer.clone().map(|service| -> SharedPlotSink { service });

        let actions = ActionFactory::new(sink);
        let pipeline = Pipeline::build(tasks, |name| registrar.tasks.get(name), &actions)
            .context("cannot build the task pipeline")?;

        Ok(Self { pipeline, visualizer })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn visualizer(&self) -> Option<&Rc<RefCell<VisualizerService>>> {
        self.visualizer.as_ref()
    }

    /// Runs every task on `snapshot`, then saves figure number `i`.
    pub fn process(
        &mut self,
        i: usize,
        snapshot: &Snapshot,
        profiler: &mut Profiler,
    ) -> anyhow::Result<(Outputs, IterationTimes)> {
        let start = Instant::now();
        let outputs = profiler
            .measure("Analysis stage", || self.pipeline.run(snapshot))
            .with_context(|| format!("analysis of snapshot {i} failed"))?;
        let computation = start.elapsed();

        let start = Instant::now();
        if let Some(service) = &self.visualizer {
            profiler
                .measure("Saving stage", || {
                    service.borrow_mut().save(i, snapshot.timestamp.to_myr())
                })
                .with_context(|| format!("cannot save figure {i}"))?;
        }
        let saving = start.elapsed();

        Ok((outputs, IterationTimes { computation, saving }))
    }
}

pub fn time_info(i: usize, snapshot: &Snapshot, times: &IterationTimes) -> serde_json::Value {
    json!({
        "i": format!("{i:03}"),
        "timestamp_Myr": format!("{:.1}", snapshot.timestamp.to_myr()),
        "computation_time_s": format!("{:.1}", times.computation.as_secs_f64()),
        "saving_time_s": format!("{:.1}", times.saving.as_secs_f64()),
    })
}

/// Streams the input through the session; returns the number of snapshots.
pub fn analyze(config: &AnalysisConfig, registrar: &PluginRegistrar, profiler: &mut Profiler) -> anyhow::Result<usize> {
    let mut session = Session::new(&config.tasks, config.visualizer.clone(), registrar)?;
    let snapshots = config.input_file.snapshots()?;

    info!("Analysis started");
    let mut count = 0;
    for (i, snapshot) in snapshots.enumerate() {
        let snapshot = snapshot.with_context(|| format!("cannot read snapshot {i}"))?;
        let (_, times) = session.process(i, &snapshot, profiler)?;
        info!(target: "time_info", "{}", time_info(i, &snapshot, &times));
        count += 1;
    }
    Ok(count)
}
