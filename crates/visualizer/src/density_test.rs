use approx::assert_relative_eq;

use crate::config::Channel;
use crate::density::{BACKGROUND, DensityAccumulator, histogram2d};
use crate::error::VisualizerError;

#[test]
fn test_histogram_rows_read_top_down() {
    let x = [0.5, 9.5, 10.0, 11.0];
    let y = [0.5, 9.5, 10.0, 5.0];
    let grid = histogram2d(&x, &y, None, 10, [0.0, 10.0, 0.0, 10.0]);

    assert_eq!(grid.len(), 100);
    // bottom-left cell is the first column of the last row
    assert_eq!(grid[90], 1.0);
    // the upper edge belongs to the last bin
    assert_eq!(grid[9], 2.0);
    assert_eq!(grid.iter().sum::<f64>(), 3.0);
}

#[test]
fn test_weighted_histogram_is_a_density() {
    let x = [0.5, 1.5, 1.5, 3.5];
    let y = [0.5, 0.5, 2.5, 3.5];
    let weights = [1.0, 2.0, 3.0, 4.0];
    let extent = [0.0, 4.0, 0.0, 4.0];
    let grid = histogram2d(&x, &y, Some(&weights), 4, extent);

    let cell_area = 1.0;
    assert_relative_eq!(grid.iter().sum::<f64>() * cell_area, 1.0, epsilon = 1e-12);
    assert_relative_eq!(grid[3], 0.4, epsilon = 1e-12);
    assert_relative_eq!(grid[12], 0.1, epsilon = 1e-12);
}

#[test]
fn test_degenerate_extent_gives_empty_grid() {
    let grid = histogram2d(&[1.0], &[1.0], None, 3, [1.0, 1.0, 0.0, 2.0]);
    assert_eq!(grid, vec![0.0; 9]);
}

#[test]
fn test_channels_accumulate_and_rescale() {
    let mut density = DensityAccumulator::new();
    let extent = [0.0, 2.0, 0.0, 2.0];
    density
        .add("xy", Channel::B, &[1.0, 1.0, 0.0, 0.0], 2, extent, Some("disk"))
        .unwrap();
    density
        .add("xy", Channel::B, &[1.0, 0.0, 0.0, 0.0], 2, extent, None)
        .unwrap();
    density
        .add("xy", Channel::R, &[0.0, 0.0, 4.0, 0.0], 2, extent, Some("halo"))
        .unwrap();

    let image = density.get("xy").unwrap();
    assert_eq!(image.channel(Channel::B), &[2.0, 1.0, 0.0, 0.0]);
    assert_eq!(image.labels.len(), 2);

    let rgb = image.rgb();
    assert_eq!(rgb[0], [0.0, 0.0, 0.0]);
    assert_eq!(rgb[1], [0.0, 0.0, 0.5]);
    assert_eq!(rgb[2], [0.0, 0.0, 0.0]);
    assert_eq!(rgb[3], [BACKGROUND; 3]);
}

#[test]
fn test_panels_are_independent() {
    let mut density = DensityAccumulator::new();
    density
        .add("left", Channel::G, &[1.0; 4], 2, [0.0, 1.0, 0.0, 1.0], None)
        .unwrap();
    assert!(density.get("right").is_none());

    let mismatch = density.add("left", Channel::G, &[1.0; 9], 3, [0.0, 1.0, 0.0, 1.0], None);
    assert!(matches!(mismatch, Err(VisualizerError::Config(_))));

    density.clear();
    assert!(density.is_empty());
}
