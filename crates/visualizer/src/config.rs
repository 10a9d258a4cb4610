//! Figure configuration and per-plot draw parameters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::style::PanelStyle;

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_figsize() -> [u32; 2] {
    [1600, 900]
}

fn default_dpi() -> u32 {
    120
}

fn default_pic_filename() -> String {
    "img-{i:03d}.png".to_string()
}

/// The `visualizer` section of a config file.
///
/// ```yaml
/// visualizer:
///   output_dir: output/
///   title: "Time: {time:.0f} Myr"
///   pic_filename: "img-{i:03d}.png"
///   panels:
///     - id: xy
///       coords: [0.05, 0.1, 0.4, 0.8]
///       params: {xlim: [-50, 50], ylim: [-50, 50], xlabel: "x, kpc"}
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VisualizerConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub title: String,
    /// Width and height in pixels
    #[serde(default = "default_figsize")]
    pub figsize: [u32; 2],
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_pic_filename")]
    pub pic_filename: String,
    #[serde(default)]
    pub pickle_filename: Option<String>,
    pub panels: Vec<PanelConfig>,
    /// Every saved picture is also appended as a page of this PDF
    #[serde(default)]
    pub pdf_name: Option<String>,
}

fn default_coords() -> [f64; 4] {
    [0.0, 1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PanelConfig {
    pub id: String,
    /// `[left, bottom, width, height]` in fractions of the figure, counted
    /// from its bottom left corner
    #[serde(default = "default_coords")]
    pub coords: [f64; 4],
    #[serde(default)]
    pub params: PanelStyle,
}

/// Colour channel of a density layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    R,
    G,
    #[default]
    B,
}

impl Channel {
    pub fn index(self) -> usize {
        match self {
            Channel::R => 0,
            Channel::G => 1,
            Channel::B => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::R => "r",
            Channel::G => "g",
            Channel::B => "b",
        }
    }
}

fn default_markersize() -> f64 {
    0.1
}

fn default_linestyle() -> String {
    "None".to_string()
}

fn default_color() -> String {
    "b".to_string()
}

fn default_marker() -> String {
    "o".to_string()
}

fn default_resolution() -> usize {
    100
}

fn default_extent() -> [f64; 4] {
    [0.0, 100.0, 0.0, 100.0]
}

fn default_x() -> String {
    "x".to_string()
}

fn default_y() -> String {
    "y".to_string()
}

/// Arguments of a `visualizer` post-action.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DrawParams {
    /// Panel to draw on
    pub id: String,
    #[serde(default = "default_markersize")]
    pub markersize: f64,
    #[serde(default = "default_linestyle")]
    pub linestyle: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default)]
    pub is_density_plot: bool,
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    /// `[xmin, xmax, ymin, ymax]` of a density layer
    #[serde(default = "default_extent")]
    pub extent: [f64; 4],
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub channel: Channel,
    #[serde(default = "default_x")]
    pub x: String,
    #[serde(default = "default_y")]
    pub y: String,
    #[serde(default)]
    pub weights: Option<String>,
}
