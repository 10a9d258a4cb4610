//! The multi-panel figure and its bitmap renderer.

use std::fmt::Display;
use std::path::Path;

use analysis::{TaskResult, Value};
use log::warn;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;

use crate::config::{Channel, DrawParams, PanelConfig};
use crate::density::{DensityAccumulator, DensityImage, histogram2d};
use crate::error::VisualizerError;
use crate::style::{Axis, PanelStyle, TicksDirection, format_tick, parse_color};

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Point = (f64, f64);

const TICK_LENGTH_PX: f64 = 6.0;
const LEGEND_ROW_PX: f64 = 18.0;
const GRID_COLOR: RGBColor = RGBColor(210, 210, 210);

/// A named drawing region of the figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub id: String,
    pub coords: [f64; 4],
    pub style: PanelStyle,
}

/// One pending `plot` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub panel: String,
    pub params: DrawParams,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub weights: Option<Vec<f64>>,
}

/// A figure with fixed panels and the layers drawn since the last save.
#[derive(Debug)]
pub struct Visualizer {
    size: (u32, u32),
    dpi: u32,
    title: String,
    panels: Vec<Panel>,
    layers: Vec<Layer>,
    density: DensityAccumulator,
    text_disabled: bool,
}

impl Visualizer {
    pub fn new(size: [u32; 2], dpi: u32) -> Self {
        Self {
            size: (size[0], size[1]),
            dpi,
            title: String::new(),
            panels: Vec::new(),
            layers: Vec::new(),
            density: DensityAccumulator::new(),
            text_disabled: false,
        }
    }

    pub fn add_panel(&mut self, config: PanelConfig) -> Result<(), VisualizerError> {
        if self.panel(&config.id).is_some() {
            return Err(VisualizerError::Config(format!(
                "panel `{}` is defined twice",
                config.id
            )));
        }
        let [_, _, width, height] = config.coords;
        if !(width > 0.0 && height > 0.0) {
            return Err(VisualizerError::Config(format!(
                "panel `{}` has an empty area",
                config.id
            )));
        }
        self.panels.push(Panel {
            id: config.id,
            coords: config.coords,
            style: config.params,
        });
        Ok(())
    }

    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.id == id)
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Queues a layer; nothing is drawn until [`Visualizer::save`].
    pub fn plot(&mut self, data: &TaskResult, params: DrawParams) -> Result<(), VisualizerError> {
        if self.panel(&params.id).is_none() {
            return Err(VisualizerError::UnknownPanel(params.id));
        }

        let x = field(data, &params.x)?;
        let y = field(data, &params.y)?;
        check_lengths(&params.x, &x, &params.y, &y)?;
        let weights = match &params.weights {
            Some(key) => {
                let weights = field(data, key)?;
                check_lengths(&params.x, &x, key, &weights)?;
                Some(weights)
            }
            None => None,
        };

        self.layers.push(Layer {
            panel: params.id.clone(),
            params,
            x,
            y,
            weights,
        });
        Ok(())
    }

    /// JSON image of the figure and its pending layers.
    pub fn dump(&self) -> Result<serde_json::Value, VisualizerError> {
        Ok(serde_json::json!({
            "title": self.title,
            "size": [self.size.0, self.size.1],
            "dpi": self.dpi,
            "panels": serde_json::to_value(&self.panels)?,
            "layers": serde_json::to_value(&self.layers)?,
        }))
    }

    /// Draws every pending layer into `path`, then clears them.
    pub fn save(&mut self, path: &Path) -> Result<(), VisualizerError> {
        let size = self.size;
        let result = self
            .accumulate()
            .and_then(|()| self.render(BitMapBackend::new(path, size)));
        self.clear();
        result
    }

    /// Like [`Visualizer::save`], also returning the picture as RGB bytes.
    pub fn save_with_pixels(&mut self, path: &Path) -> Result<Vec<u8>, VisualizerError> {
        let size = self.size;
        let mut pixels = vec![0u8; size.0 as usize * size.1 as usize * 3];
        let result = self.accumulate().and_then(|()| {
            self.render(BitMapBackend::new(path, size))?;
            self.render(BitMapBackend::with_buffer(&mut pixels, size))
        });
        self.clear();
        result.map(|()| pixels)
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.density.clear();
    }

    fn accumulate(&mut self) -> Result<(), VisualizerError> {
        for layer in self.layers.iter().filter(|l| l.params.is_density_plot) {
            let params = &layer.params;
            let histogram = histogram2d(
                &layer.x,
                &layer.y,
                layer.weights.as_deref(),
                params.resolution,
                params.extent,
            );
            self.density.add(
                &layer.panel,
                params.channel,
                &histogram,
                params.resolution,
                params.extent,
                params.label.as_deref(),
            )?;
        }
        Ok(())
    }

    fn render(&mut self, backend: BitMapBackend<'_>) -> Result<(), VisualizerError> {
        let area = backend.into_drawing_area();
        area.fill(&WHITE).map_err(draw_error)?;

        let mut text = TextPainter {
            disabled: self.text_disabled,
            scale: self.dpi as f64 / 100.0,
        };
        for panel in &self.panels {
            let layers: Vec<&Layer> = self.layers.iter().filter(|l| l.panel == panel.id).collect();
            let frame = Frame::of(panel.coords, self.size);
            let renderer = PanelRenderer {
                area: &area,
                panel,
                frame,
                density: self.density.get(&panel.id),
                dpi: self.dpi,
            };
            renderer.draw(&layers, &mut text)?;
        }
        text.draw(
            &area,
            &self.title,
            16.0,
            Pos::new(HPos::Center, VPos::Top),
            (self.size.0 as f64 / 2.0, self.size.1 as f64 * 0.01),
            false,
        );
        self.text_disabled = text.disabled;

        area.present().map_err(draw_error)
    }
}

fn field(data: &TaskResult, key: &str) -> Result<Vec<f64>, VisualizerError> {
    match data.get(key) {
        Some(Value::Array(values)) => Ok(values.clone()),
        Some(Value::Scalar(value)) => Ok(vec![*value]),
        _ => Err(VisualizerError::MissingField(key.to_string())),
    }
}

fn check_lengths(x: &str, xs: &[f64], y: &str, ys: &[f64]) -> Result<(), VisualizerError> {
    if xs.len() != ys.len() {
        return Err(VisualizerError::LengthMismatch {
            x: x.to_string(),
            x_len: xs.len(),
            y: y.to_string(),
            y_len: ys.len(),
        });
    }
    Ok(())
}

fn draw_error(error: impl Display) -> VisualizerError {
    VisualizerError::Draw(error.to_string())
}

fn round_i32(value: f64) -> i32 {
    value.round() as i32
}

fn to_pixels(points: &[Point]) -> Vec<(i32, i32)> {
    points.iter().map(|&(x, y)| (round_i32(x), round_i32(y))).collect()
}

/// Draws text until the first failure, then stays silent.
struct TextPainter {
    disabled: bool,
    scale: f64,
}

impl TextPainter {
    fn draw(&mut self, area: &Area<'_>, text: &str, size: f64, pos: Pos, at: Point, rotate: bool) {
        if self.disabled || text.is_empty() {
            return;
        }
        let mut style = ("sans-serif", size * self.scale)
            .into_font()
            .into_text_style(area)
            .pos(pos);
        if rotate {
            style = style.transform(FontTransform::Rotate90);
        }
        if let Err(error) = area.draw_text(text, &style, (round_i32(at.0), round_i32(at.1))) {
            warn!(target: "visualizer", "text rendering disabled: {error}");
            self.disabled = true;
        }
    }
}

/// Pixel rectangle of a panel; `top < bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Frame {
    fn of(coords: [f64; 4], (width, height): (u32, u32)) -> Self {
        let [left, bottom, w, h] = coords;
        let (width, height) = (width as f64, height as f64);
        Self {
            left: left * width,
            top: (1.0 - bottom - h) * height,
            right: (left + w) * width,
            bottom: (1.0 - bottom) * height,
        }
    }

    fn contains(&self, (x, y): Point) -> bool {
        (self.left..=self.right).contains(&x) && (self.top..=self.bottom).contains(&y)
    }

    fn clamp(&self, (x, y): Point) -> Point {
        (x.clamp(self.left, self.right), y.clamp(self.top, self.bottom))
    }

    fn outline(&self) -> Vec<Point> {
        vec![
            (self.left, self.top),
            (self.right, self.top),
            (self.right, self.bottom),
            (self.left, self.bottom),
            (self.left, self.top),
        ]
    }
}

/// Liang-Barsky clipping of the segment `a -> b` to `frame`.
fn clip_segment(a: Point, b: Point, frame: &Frame) -> Option<(Point, Point)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-dx, a.0 - frame.left),
        (dx, frame.right - a.0),
        (-dy, a.1 - frame.top),
        (dy, frame.bottom - a.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some(((a.0 + t0 * dx, a.1 + t0 * dy), (a.0 + t1 * dx, a.1 + t1 * dy)))
}

/// Splits a segment into dashes, carrying the pattern phase across calls.
fn dash_segment(a: Point, b: Point, (on, off): (f64, f64), phase: &mut f64) -> Vec<(Point, Point)> {
    let length = (b.0 - a.0).hypot(b.1 - a.1);
    let at = |s: f64| (a.0 + (b.0 - a.0) * s / length, a.1 + (b.1 - a.1) * s / length);
    let period = on + off;
    let mut dashes = Vec::new();
    let mut s = 0.0;
    while s < length {
        let offset = *phase % period;
        let (end, visible) = if offset < on {
            ((s + on - offset).min(length), true)
        } else {
            ((s + period - offset).min(length), false)
        };
        if visible {
            dashes.push((at(s), at(end)));
        }
        *phase += end - s;
        s = end;
    }
    dashes
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LineStyle {
    Solid,
    Dashed(f64, f64),
}

fn line_style(name: &str) -> Option<LineStyle> {
    match name {
        "None" | "none" | "" | " " => None,
        "-" | "solid" => Some(LineStyle::Solid),
        "--" | "dashed" => Some(LineStyle::Dashed(6.0, 4.0)),
        ":" | "dotted" => Some(LineStyle::Dashed(1.5, 3.0)),
        "-." | "dashdot" => Some(LineStyle::Dashed(6.0, 3.0)),
        other => {
            warn!(target: "visualizer", "unknown linestyle `{other}`, drawing a solid line");
            Some(LineStyle::Solid)
        }
    }
}

fn layer_color(name: &str) -> RGBColor {
    parse_color(name).unwrap_or_else(|| {
        warn!(target: "visualizer", "unknown color `{name}`, using black");
        BLACK
    })
}

fn channel_color(channel: Channel) -> RGBColor {
    match channel {
        Channel::R => RGBColor(255, 0, 0),
        Channel::G => RGBColor(0, 255, 0),
        Channel::B => RGBColor(0, 0, 255),
    }
}

enum LegendMark {
    Line { color: RGBColor, line: bool, marker: bool },
    Patch(RGBColor),
}

struct PanelRenderer<'a, 'b> {
    area: &'a Area<'b>,
    panel: &'a Panel,
    frame: Frame,
    density: Option<&'a DensityImage>,
    dpi: u32,
}

impl PanelRenderer<'_, '_> {
    fn draw(&self, layers: &[&Layer], text: &mut TextPainter) -> Result<(), VisualizerError> {
        let style = &self.panel.style;
        let lines: Vec<&Layer> = layers
            .iter()
            .copied()
            .filter(|l| !l.params.is_density_plot)
            .collect();

        let extent = self.density.map(|image| image.extent);
        let xs = lines
            .iter()
            .flat_map(|l| l.x.iter().copied())
            .chain(extent.into_iter().flat_map(|e| [e[0], e[1]]));
        let ys = lines
            .iter()
            .flat_map(|l| l.y.iter().copied())
            .chain(extent.into_iter().flat_map(|e| [e[2], e[3]]));
        let x_axis = Axis::fit(style.xscale, style.basex, style.xlim, xs);
        let y_axis = Axis::fit(style.yscale, style.basey, style.ylim, ys);

        if let Some(image) = self.density {
            self.draw_density(image, &x_axis, &y_axis)?;
        }

        let x_ticks = x_axis.ticks(style.xticks.as_deref());
        let y_ticks = y_axis.ticks(style.yticks.as_deref());
        if style.grid {
            self.draw_grid(&x_axis, &y_axis, &x_ticks, &y_ticks)?;
        }
        for layer in &lines {
            self.draw_layer(layer, &x_axis, &y_axis)?;
        }
        self.draw_frame(&x_axis, &y_axis, &x_ticks, &y_ticks, text)?;
        self.draw_legend(&lines, text)
    }

    fn stroke(&self) -> u32 {
        (self.dpi as f64 / 100.0).round().max(1.0) as u32
    }

    fn project(&self, x_axis: &Axis, y_axis: &Axis, (x, y): Point) -> Option<Point> {
        let fx = x_axis.fraction(x)?;
        let fy = y_axis.fraction(y)?;
        let frame = &self.frame;
        Some((
            frame.left + fx * (frame.right - frame.left),
            frame.bottom - fy * (frame.bottom - frame.top),
        ))
    }

    fn path(&self, points: &[Point], style: ShapeStyle) -> Result<(), VisualizerError> {
        self.area
            .draw(&PathElement::new(to_pixels(points), style))
            .map_err(draw_error)
    }

    fn draw_density(&self, image: &DensityImage, x_axis: &Axis, y_axis: &Axis) -> Result<(), VisualizerError> {
        let [xmin, xmax, ymin, ymax] = image.extent;
        let n = image.resolution;
        let (dx, dy) = ((xmax - xmin) / n as f64, (ymax - ymin) / n as f64);

        for (i, rgb) in image.rgb().into_iter().enumerate() {
            let (row, column) = (i / n, i % n);
            let upper_left = (xmin + column as f64 * dx, ymax - row as f64 * dy);
            let lower_right = (upper_left.0 + dx, upper_left.1 - dy);
            let (Some(a), Some(b)) = (
                self.project(x_axis, y_axis, upper_left),
                self.project(x_axis, y_axis, lower_right),
            ) else {
                continue;
            };
            let (a, b) = (self.frame.clamp(a), self.frame.clamp(b));
            if a.0 == b.0 || a.1 == b.1 {
                continue;
            }
            let [r, g, b_] = rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
            self.area
                .draw(&Rectangle::new(
                    [(round_i32(a.0), round_i32(a.1)), (round_i32(b.0), round_i32(b.1))],
                    RGBColor(r, g, b_).filled(),
                ))
                .map_err(draw_error)?;
        }
        Ok(())
    }

    fn draw_grid(&self, x_axis: &Axis, y_axis: &Axis, x_ticks: &[f64], y_ticks: &[f64]) -> Result<(), VisualizerError> {
        let frame = &self.frame;
        for fx in x_ticks.iter().filter_map(|&t| x_axis.fraction(t)) {
            let x = frame.left + fx * (frame.right - frame.left);
            self.path(&[(x, frame.top), (x, frame.bottom)], ShapeStyle::from(&GRID_COLOR))?;
        }
        for fy in y_ticks.iter().filter_map(|&t| y_axis.fraction(t)) {
            let y = frame.bottom - fy * (frame.bottom - frame.top);
            self.path(&[(frame.left, y), (frame.right, y)], ShapeStyle::from(&GRID_COLOR))?;
        }
        Ok(())
    }

    fn draw_layer(&self, layer: &Layer, x_axis: &Axis, y_axis: &Axis) -> Result<(), VisualizerError> {
        let params = &layer.params;
        let color = layer_color(&params.color);
        let projected: Vec<Option<Point>> = layer
            .x
            .iter()
            .zip(&layer.y)
            .map(|(&x, &y)| self.project(x_axis, y_axis, (x, y)))
            .collect();

        if let Some(line) = line_style(&params.linestyle) {
            let style = color.stroke_width(self.stroke());
            let mut phase = 0.0;
            for pair in projected.windows(2) {
                let (Some(a), Some(b)) = (pair[0], pair[1]) else {
                    continue;
                };
                let Some((a, b)) = clip_segment(a, b, &self.frame) else {
                    continue;
                };
                match line {
                    LineStyle::Solid => self.path(&[a, b], style)?,
                    LineStyle::Dashed(on, off) => {
                        let scale = self.dpi as f64 / 100.0;
                        for (start, end) in dash_segment(a, b, (on * scale, off * scale), &mut phase) {
                            self.path(&[start, end], style)?;
                        }
                    }
                }
            }
        }

        let radius = (params.markersize * self.dpi as f64 / 72.0 / 2.0).max(1.0);
        for point in projected.into_iter().flatten() {
            if self.frame.contains(point) {
                self.draw_marker(&params.marker, point, radius, color)?;
            }
        }
        Ok(())
    }

    fn draw_marker(&self, marker: &str, (x, y): Point, radius: f64, color: RGBColor) -> Result<(), VisualizerError> {
        let center = (round_i32(x), round_i32(y));
        let r = radius.round().max(1.0);
        match marker {
            "None" | "none" | "" | " " => Ok(()),
            "s" => self
                .area
                .draw(&Rectangle::new(
                    [(round_i32(x - r), round_i32(y - r)), (round_i32(x + r), round_i32(y + r))],
                    color.filled(),
                ))
                .map_err(draw_error),
            "+" => {
                self.path(&[(x - r, y), (x + r, y)], ShapeStyle::from(&color))?;
                self.path(&[(x, y - r), (x, y + r)], ShapeStyle::from(&color))
            }
            "x" => {
                self.path(&[(x - r, y - r), (x + r, y + r)], ShapeStyle::from(&color))?;
                self.path(&[(x - r, y + r), (x + r, y - r)], ShapeStyle::from(&color))
            }
            "." => self
                .area
                .draw(&Circle::new(center, (r / 2.0).max(1.0) as u32, color.filled()))
                .map_err(draw_error),
            _ => self
                .area
                .draw(&Circle::new(center, r as u32, color.filled()))
                .map_err(draw_error),
        }
    }

    fn draw_frame(
        &self,
        x_axis: &Axis,
        y_axis: &Axis,
        x_ticks: &[f64],
        y_ticks: &[f64],
        text: &mut TextPainter,
    ) -> Result<(), VisualizerError> {
        let frame = &self.frame;
        let style = &self.panel.style;
        self.path(&frame.outline(), ShapeStyle::from(&BLACK))?;

        let (inward, outward) = match style.ticks_direction {
            TicksDirection::In => (TICK_LENGTH_PX, 0.0),
            TicksDirection::Out => (0.0, TICK_LENGTH_PX),
            TicksDirection::Inout => (TICK_LENGTH_PX / 2.0, TICK_LENGTH_PX / 2.0),
        };

        for &tick in x_ticks {
            let Some(fx) = x_axis.fraction(tick) else {
                continue;
            };
            let x = frame.left + fx * (frame.right - frame.left);
            self.path(
                &[(x, frame.bottom + outward), (x, frame.bottom - inward)],
                ShapeStyle::from(&BLACK),
            )?;
            text.draw(
                self.area,
                &format_tick(tick),
                10.0,
                Pos::new(HPos::Center, VPos::Top),
                (x, frame.bottom + outward + 4.0),
                false,
            );
        }
        for &tick in y_ticks {
            let Some(fy) = y_axis.fraction(tick) else {
                continue;
            };
            let y = frame.bottom - fy * (frame.bottom - frame.top);
            self.path(
                &[(frame.left - outward, y), (frame.left + inward, y)],
                ShapeStyle::from(&BLACK),
            )?;
            text.draw(
                self.area,
                &format_tick(tick),
                10.0,
                Pos::new(HPos::Right, VPos::Center),
                (frame.left - outward - 4.0, y),
                false,
            );
        }

        let center_x = (frame.left + frame.right) / 2.0;
        let center_y = (frame.top + frame.bottom) / 2.0;
        text.draw(
            self.area,
            &style.xlabel,
            12.0,
            Pos::new(HPos::Center, VPos::Top),
            (center_x, frame.bottom + outward + 4.0 * TICK_LENGTH_PX),
            false,
        );
        text.draw(
            self.area,
            &style.ylabel,
            12.0,
            Pos::new(HPos::Center, VPos::Center),
            (frame.left - outward - 8.0 * TICK_LENGTH_PX, center_y),
            true,
        );
        text.draw(
            self.area,
            &style.title,
            13.0,
            Pos::new(HPos::Center, VPos::Bottom),
            (center_x, frame.top - TICK_LENGTH_PX),
            false,
        );
        Ok(())
    }

    fn draw_legend(&self, lines: &[&Layer], text: &mut TextPainter) -> Result<(), VisualizerError> {
        let mut entries: Vec<(&str, LegendMark)> = lines
            .iter()
            .filter_map(|layer| {
                let params = &layer.params;
                let label = params.label.as_deref()?;
                let mark = LegendMark::Line {
                    color: layer_color(&params.color),
                    line: line_style(&params.linestyle).is_some(),
                    marker: !matches!(params.marker.as_str(), "None" | "none" | "" | " "),
                };
                Some((label, mark))
            })
            .collect();
        if let Some(image) = self.density {
            entries.extend(
                image
                    .labels
                    .iter()
                    .map(|(channel, label)| (label.as_str(), LegendMark::Patch(channel_color(*channel)))),
            );
        }
        if entries.is_empty() {
            return Ok(());
        }

        let longest = entries.iter().map(|(label, _)| label.chars().count()).max().unwrap_or(0);
        let width = 40.0 + 7.0 * longest as f64;
        let height = LEGEND_ROW_PX * entries.len() as f64 + 8.0;
        let left = self.frame.right - width - 8.0;
        let top = self.frame.top + 8.0;

        self.area
            .draw(&Rectangle::new(
                [(round_i32(left), round_i32(top)), (round_i32(left + width), round_i32(top + height))],
                WHITE.filled(),
            ))
            .map_err(draw_error)?;
        self.path(
            &[
                (left, top),
                (left + width, top),
                (left + width, top + height),
                (left, top + height),
                (left, top),
            ],
            ShapeStyle::from(&GRID_COLOR),
        )?;

        for (row, (label, mark)) in entries.iter().enumerate() {
            let y = top + 4.0 + LEGEND_ROW_PX * (row as f64 + 0.5);
            let (x0, x1) = (left + 6.0, left + 28.0);
            match mark {
                LegendMark::Line { color, line, marker } => {
                    if *line {
                        self.path(&[(x0, y), (x1, y)], color.stroke_width(self.stroke()))?;
                    }
                    if *marker {
                        self.draw_marker("o", ((x0 + x1) / 2.0, y), 3.0, *color)?;
                    }
                }
                LegendMark::Patch(color) => {
                    self.area
                        .draw(&Rectangle::new(
                            [(round_i32(x0), round_i32(y - 5.0)), (round_i32(x1), round_i32(y + 5.0))],
                            color.filled(),
                        ))
                        .map_err(draw_error)?;
                }
            }
            text.draw(
                self.area,
                label,
                10.0,
                Pos::new(HPos::Left, VPos::Center),
                (x1 + 6.0, y),
                false,
            );
        }
        Ok(())
    }
}
