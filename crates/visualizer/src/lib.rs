//! Multi-panel figures of task results.
//!
//! Layers queued with [`Visualizer::plot`] are drawn on
//! [`Visualizer::save`]: line and scatter layers directly, density layers
//! histogrammed and summed into one RGB image per panel.

pub mod config;
pub mod density;
pub mod error;
pub mod figure;
pub mod pdf;
pub mod service;
pub mod style;
pub mod template;

#[cfg(test)]
mod density_test;

pub use config::{Channel, DrawParams, PanelConfig, VisualizerConfig};
pub use density::{DensityAccumulator, histogram2d};
pub use error::VisualizerError;
pub use figure::{Layer, Panel, Visualizer};
pub use pdf::PdfBook;
pub use service::VisualizerService;
pub use style::PanelStyle;
