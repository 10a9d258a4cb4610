//! Additive RGB density images.

use std::collections::BTreeMap;

use crate::config::Channel;
use crate::error::VisualizerError;

/// Gray level of pixels no channel covers.
pub const BACKGROUND: f64 = 0.85;

/// Weighted 2D histogram of `(x, y)` over `extent = [xmin, xmax, ymin, ymax]`.
///
/// The result is row-major with `resolution` rows; row 0 holds the largest
/// `y` bin so the image reads top-down. Points outside the extent are
/// dropped, points on the upper edge land in the last bin. With weights the
/// histogram is normalised to a probability density over the extent.
pub fn histogram2d(
    x: &[f64],
    y: &[f64],
    weights: Option<&[f64]>,
    resolution: usize,
    extent: [f64; 4],
) -> Vec<f64> {
    let mut grid = vec![0.0; resolution * resolution];
    let [xmin, xmax, ymin, ymax] = extent;
    if resolution == 0 || xmax <= xmin || ymax <= ymin {
        return grid;
    }

    let bin = |value: f64, lo: f64, hi: f64| -> Option<usize> {
        if !(lo..=hi).contains(&value) {
            return None;
        }
        let index = ((value - lo) / (hi - lo) * resolution as f64) as usize;
        Some(index.min(resolution - 1))
    };

    for (i, (&px, &py)) in x.iter().zip(y).enumerate() {
        let (Some(column), Some(ybin)) = (bin(px, xmin, xmax), bin(py, ymin, ymax)) else {
            continue;
        };
        let row = resolution - 1 - ybin;
        grid[row * resolution + column] += weights.map_or(1.0, |w| w[i]);
    }

    if weights.is_some() {
        let total: f64 = grid.iter().sum();
        let cell_area = (xmax - xmin) * (ymax - ymin) / (resolution * resolution) as f64;
        if total != 0.0 {
            grid.iter_mut().for_each(|v| *v /= total * cell_area);
        }
    }
    grid
}

/// Accumulated channels of one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityImage {
    pub resolution: usize,
    pub extent: [f64; 4],
    channels: [Vec<f64>; 3],
    /// Legend entries in insertion order
    pub labels: Vec<(Channel, String)>,
}

impl DensityImage {
    fn new(resolution: usize, extent: [f64; 4]) -> Self {
        let empty = vec![0.0; resolution * resolution];
        Self {
            resolution,
            extent,
            channels: [empty.clone(), empty.clone(), empty],
            labels: Vec::new(),
        }
    }

    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.channels[channel.index()]
    }

    /// Final colours, row-major, each component in `[0, 1]`.
    pub fn rgb(&self) -> Vec<[f64; 3]> {
        let scaled: Vec<Vec<f64>> = self.channels.iter().map(|c| rescale(c)).collect();
        (0..self.resolution * self.resolution)
            .map(|i| {
                let empty = self.channels.iter().all(|c| c[i] == 0.0);
                if empty {
                    [BACKGROUND; 3]
                } else {
                    [scaled[0][i], scaled[1][i], scaled[2][i]]
                }
            })
            .collect()
    }
}

/// Inverse linear rescale: the densest cell maps to 0 and the sparsest to 1.
fn rescale(channel: &[f64]) -> Vec<f64> {
    let (min, max) = channel
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = max - min;
    channel
        .iter()
        .map(|&v| {
            let diff = v - min;
            if span > 0.0 && diff != 0.0 {
                1.0 - diff / span
            } else {
                v
            }
        })
        .collect()
}

/// Density buffers keyed by panel id, filled by `plot` and drained by `save`.
#[derive(Debug, Default)]
pub struct DensityAccumulator {
    images: BTreeMap<String, DensityImage>,
}

impl DensityAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a histogram to `channel` of the panel's image.
    pub fn add(
        &mut self,
        panel: &str,
        channel: Channel,
        histogram: &[f64],
        resolution: usize,
        extent: [f64; 4],
        label: Option<&str>,
    ) -> Result<(), VisualizerError> {
        let image = self
            .images
            .entry(panel.to_string())
            .or_insert_with(|| DensityImage::new(resolution, extent));
        if image.resolution != resolution || histogram.len() != resolution * resolution {
            return Err(VisualizerError::Config(format!(
                "density layers of panel `{panel}` mix resolutions {} and {resolution}",
                image.resolution
            )));
        }

        image.channels[channel.index()]
            .iter_mut()
            .zip(histogram)
            .for_each(|(acc, v)| *acc += v);
        if let Some(label) = label {
            image.labels.push((channel, label.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, panel: &str) -> Option<&DensityImage> {
        self.images.get(panel)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}
