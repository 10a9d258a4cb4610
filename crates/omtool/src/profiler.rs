//! Wall-clock timing of driver stages.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Durations recorded per named stage, averaged at the end of a run.
#[derive(Debug, Default)]
pub struct Profiler {
    stages: BTreeMap<String, Vec<Duration>>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` and records how long it took under `stage`.
    pub fn measure<T>(&mut self, stage: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.record(stage, start.elapsed());
        result
    }

    pub fn record(&mut self, stage: &str, elapsed: Duration) {
        self.stages.entry(stage.to_string()).or_default().push(elapsed);
    }

    /// Mean seconds per stage
    pub fn averages(&self) -> BTreeMap<String, f64> {
        self.stages
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(stage, samples)| {
                let total: f64 = samples.iter().map(Duration::as_secs_f64).sum();
                (stage.clone(), total / samples.len() as f64)
            })
            .collect()
    }

    pub fn log_summary(&self) {
        for (stage, average) in self.averages() {
            log::info!("{stage} worked {average:.2} seconds on average");
        }
    }
}
