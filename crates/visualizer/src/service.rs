use std::fs;
use std::path::{Path, PathBuf};

use analysis::{PlotSink, TaskResult};
use log::debug;

use crate::config::{DrawParams, VisualizerConfig};
use crate::error::VisualizerError;
use crate::figure::Visualizer;
use crate::pdf::PdfBook;
use crate::template::{TemplateArg, render};

/// The configured figure plus file naming, shared with `visualizer` actions.
#[derive(Debug)]
pub struct VisualizerService {
    figure: Visualizer,
    output_dir: PathBuf,
    title: String,
    pic_filename: String,
    pickle_filename: Option<String>,
    pdf: Option<PdfBook>,
}

impl VisualizerService {
    /// Creates `output_dir` and the panels.
    pub fn new(config: VisualizerConfig) -> Result<Self, VisualizerError> {
        fs::create_dir_all(&config.output_dir).map_err(|source| VisualizerError::Io {
            path: config.output_dir.clone(),
            source,
        })?;

        let pdf = config
            .pdf_name
            .as_ref()
            .map(|name| PdfBook::new(config.output_dir.join(name)));
        let mut figure = Visualizer::new(config.figsize, config.dpi);
        for panel in config.panels {
            figure.add_panel(panel)?;
        }

        Ok(Self {
            figure,
            output_dir: config.output_dir,
            title: config.title,
            pic_filename: config.pic_filename,
            pickle_filename: config.pickle_filename,
            pdf,
        })
    }

    pub fn figure(&self) -> &Visualizer {
        &self.figure
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn pdf(&self) -> Option<&PdfBook> {
        self.pdf.as_ref()
    }

    /// Parses `params` and queues one layer.
    pub fn plot(&mut self, data: &TaskResult, params: &serde_yaml::Value) -> Result<(), VisualizerError> {
        let params: DrawParams = serde_yaml::from_value(params.clone())?;
        self.figure.plot(data, params)
    }

    /// Writes the figure of iteration `i` at `time_myr` and returns its path.
    pub fn save(&mut self, i: usize, time_myr: f64) -> Result<PathBuf, VisualizerError> {
        let args = [
            ("i", TemplateArg::Int(i as i64)),
            ("time", TemplateArg::Float(time_myr)),
        ];
        self.figure.set_title(render(&self.title, &args)?);

        if let Some(template) = &self.pickle_filename {
            let path = self.output_dir.join(render(template, &args)?);
            let dump = serde_json::to_string(&self.figure.dump()?)?;
            fs::write(&path, dump).map_err(|source| VisualizerError::Io { path, source })?;
        }

        let path = self.output_dir.join(render(&self.pic_filename, &args)?);
        match &mut self.pdf {
            Some(pdf) => {
                let pixels = self.figure.save_with_pixels(&path)?;
                pdf.add_page(self.figure.size(), self.figure.dpi(), &pixels)?;
            }
            None => self.figure.save(&path)?,
        }
        debug!(target: "visualizer", "saved {}", path.display());
        Ok(path)
    }
}

impl PlotSink for VisualizerService {
    fn plot(
        &mut self,
        data: &TaskResult,
        params: &serde_yaml::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        VisualizerService::plot(self, data, params).map_err(Into::into)
    }
}
