//! Panel styles, colours and axis mapping.

use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Linear,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicksDirection {
    #[default]
    In,
    Out,
    Inout,
}

fn default_base() -> f64 {
    10.0
}

/// Axis limits; a missing side is fitted to the data.
pub type Limits = [Option<f64>; 2];

/// The `params` of a panel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelStyle {
    pub grid: bool,
    pub xlim: Limits,
    pub ylim: Limits,
    pub xlabel: String,
    pub ylabel: String,
    pub xticks: Option<Vec<f64>>,
    pub yticks: Option<Vec<f64>>,
    pub title: String,
    pub ticks_direction: TicksDirection,
    pub xscale: Scale,
    #[serde(default = "default_base")]
    pub basex: f64,
    pub yscale: Scale,
    #[serde(default = "default_base")]
    pub basey: f64,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            grid: false,
            xlim: [None, None],
            ylim: [None, None],
            xlabel: String::new(),
            ylabel: String::new(),
            xticks: None,
            yticks: None,
            title: String::new(),
            ticks_direction: TicksDirection::In,
            xscale: Scale::Linear,
            basex: default_base(),
            yscale: Scale::Linear,
            basey: default_base(),
        }
    }
}

/// Matplotlib-style colour: one-letter codes, a few names or `#rrggbb`.
pub fn parse_color(name: &str) -> Option<RGBColor> {
    let color = match name {
        "b" | "blue" => RGBColor(0, 0, 255),
        "g" | "green" => RGBColor(0, 128, 0),
        "r" | "red" => RGBColor(255, 0, 0),
        "c" | "cyan" => RGBColor(0, 191, 191),
        "m" | "magenta" => RGBColor(191, 0, 191),
        "y" | "yellow" => RGBColor(191, 191, 0),
        "k" | "black" => RGBColor(0, 0, 0),
        "w" | "white" => RGBColor(255, 255, 255),
        "gray" | "grey" => RGBColor(128, 128, 128),
        "orange" => RGBColor(255, 165, 0),
        hex => {
            let digits = hex.strip_prefix('#')?;
            if digits.len() != 6 {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
            RGBColor(channel(0)?, channel(2)?, channel(4)?)
        }
    };
    Some(color)
}

/// Relative margin added around autoscaled data.
const AUTOSCALE_MARGIN: f64 = 0.05;

/// Maps data values onto `[0, 1]` along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Axis {
    scale: Scale,
    base: f64,
    /// Limits in transformed space
    lo: f64,
    hi: f64,
}

impl Axis {
    /// Fits the axis to `data`, then applies the configured limits.
    pub fn fit(scale: Scale, base: f64, limits: Limits, data: impl IntoIterator<Item = f64>) -> Self {
        let mut axis = Self {
            scale,
            base,
            lo: 0.0,
            hi: 1.0,
        };

        let (lo, hi) = data
            .into_iter()
            .filter_map(|v| axis.transform(v))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let (mut lo, mut hi) = match (lo.is_finite(), lo < hi) {
            (false, _) => (0.0, 1.0),
            (true, false) => (lo - 0.5, hi + 0.5),
            (true, true) => {
                let margin = (hi - lo) * AUTOSCALE_MARGIN;
                (lo - margin, hi + margin)
            }
        };
        if let Some(v) = limits[0].and_then(|v| axis.transform(v)) {
            lo = v;
        }
        if let Some(v) = limits[1].and_then(|v| axis.transform(v)) {
            hi = v;
        }
        if lo == hi {
            hi = lo + 1.0;
        }
        axis.lo = lo;
        axis.hi = hi;
        axis
    }

    /// Value in transformed space; `None` for values a log axis cannot show.
    pub fn transform(&self, value: f64) -> Option<f64> {
        let t = match self.scale {
            Scale::Linear => value,
            Scale::Log if value > 0.0 && self.base == 10.0 => value.log10(),
            Scale::Log if value > 0.0 && self.base == 2.0 => value.log2(),
            Scale::Log if value > 0.0 => value.ln() / self.base.ln(),
            Scale::Log => return None,
        };
        t.is_finite().then_some(t)
    }

    /// Position of `value` between the lower (0) and upper (1) limit.
    pub fn fraction(&self, value: f64) -> Option<f64> {
        self.transform(value)
            .map(|t| (t - self.lo) / (self.hi - self.lo))
    }

    /// Explicit ticks inside the limits, or automatic ones.
    pub fn ticks(&self, explicit: Option<&[f64]>) -> Vec<f64> {
        let inside = |v: &f64| self.fraction(*v).is_some_and(|f| (-1e-9..=1.0 + 1e-9).contains(&f));
        match (explicit, self.scale) {
            (Some(ticks), _) => ticks.iter().copied().filter(inside).collect(),
            (None, Scale::Linear) => linear_ticks(self.lo.min(self.hi), self.lo.max(self.hi)),
            (None, Scale::Log) => {
                let (lo, hi) = (self.lo.min(self.hi), self.lo.max(self.hi));
                ((lo - 1e-9).ceil() as i32..=(hi + 1e-9).floor() as i32)
                    .map(|power| self.base.powi(power))
                    .collect()
            }
        }
    }
}

/// Evenly spaced ticks at "nice" values covering `[lo, hi]`.
pub fn linear_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let step = nice_number((hi - lo) / 5.0);
    if !(step > 0.0 && step.is_finite()) {
        return vec![lo];
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn nice_number(value: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    let exponent = value.log10().floor();
    let fraction = value / 10f64.powf(exponent);
    let nice = if fraction < 1.5 {
        1.0
    } else if fraction < 3.0 {
        2.0
    } else if fraction < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * 10f64.powf(exponent)
}

/// Short tick label without trailing zeros.
pub fn format_tick(value: f64) -> String {
    if value.abs() < 1e-12 {
        return "0".to_string();
    }
    if value.abs() >= 1e5 || value.abs() < 1e-3 {
        return format!("{value:.0e}");
    }
    let mut text = format!("{:.3}", (value * 1000.0).round() / 1000.0);
    while text.contains('.') && text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    text
}
