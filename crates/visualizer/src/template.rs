//! `{name:spec}` templates for titles and file names.
//!
//! Supports the subset of Python format specs used in configs: an optional
//! `0` fill flag, a width, a precision and one of the types `d`, `f`, `e`
//! or none. `{{` and `}}` are literal braces.

use crate::error::VisualizerError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemplateArg {
    Int(i64),
    Float(f64),
}

/// Substitutes every placeholder of `template` from `args`.
///
/// ```
/// use visualizer::template::{render, TemplateArg};
///
/// let name = render("img-{i:03d}.png", &[("i", TemplateArg::Int(7))]).unwrap();
/// assert_eq!(name, "img-007.png");
/// ```
pub fn render(template: &str, args: &[(&str, TemplateArg)]) -> Result<String, VisualizerError> {
    let error = |message: String| VisualizerError::Template {
        template: template.to_string(),
        message,
    };

    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '}' => return Err(error("single `}`".to_string())),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => field.push(c),
                        None => return Err(error("unclosed `{`".to_string())),
                    }
                }
                let (name, spec) = field.split_once(':').unwrap_or((field.as_str(), ""));
                let arg = args
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, arg)| *arg)
                    .ok_or_else(|| error(format!("unknown placeholder `{name}`")))?;
                output.push_str(&format_arg(arg, spec).map_err(error)?);
            }
            c => output.push(c),
        }
    }
    Ok(output)
}

#[derive(Debug, Default, PartialEq)]
struct Spec {
    zero: bool,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

fn parse_spec(spec: &str) -> Result<Spec, String> {
    let mut rest = spec;
    let mut parsed = Spec::default();

    if let Some(stripped) = rest.strip_prefix('0') {
        parsed.zero = true;
        rest = stripped;
    }
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        parsed.width = rest[..digits].parse().map_err(|_| format!("bad width in `{spec}`"))?;
        rest = &rest[digits..];
    }
    if let Some(stripped) = rest.strip_prefix('.') {
        let digits = stripped.len() - stripped.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let precision = stripped[..digits]
            .parse()
            .map_err(|_| format!("bad precision in `{spec}`"))?;
        parsed.precision = Some(precision);
        rest = &stripped[digits..];
    }
    let mut kind = rest.chars();
    parsed.kind = kind.next();
    if kind.next().is_some() || !matches!(parsed.kind, None | Some('d' | 'f' | 'e')) {
        return Err(format!("unsupported format spec `{spec}`"));
    }
    Ok(parsed)
}

fn format_arg(arg: TemplateArg, spec: &str) -> Result<String, String> {
    let spec = parse_spec(spec)?;
    let body = match (arg, spec.kind) {
        (TemplateArg::Int(value), None | Some('d')) => {
            if spec.precision.is_some() {
                return Err("precision is not allowed for integers".to_string());
            }
            value.to_string()
        }
        (TemplateArg::Float(_), Some('d')) => {
            return Err("`d` needs an integer".to_string());
        }
        (TemplateArg::Int(value), Some(kind)) => float(value as f64, kind, spec.precision),
        (TemplateArg::Float(value), Some(kind)) => float(value, kind, spec.precision),
        (TemplateArg::Float(value), None) => match spec.precision {
            Some(precision) => format!("{value:.precision$}"),
            None if value.is_finite() && value.fract() == 0.0 => format!("{value:.1}"),
            None => value.to_string(),
        },
    };
    Ok(pad(body, spec.width, spec.zero))
}

fn float(value: f64, kind: char, precision: Option<usize>) -> String {
    let precision = precision.unwrap_or(6);
    match kind {
        'e' => {
            let text = format!("{value:.precision$e}");
            match text.split_once('e') {
                Some((mantissa, exponent)) => {
                    let (sign, digits) = match exponent.strip_prefix('-') {
                        Some(digits) => ('-', digits),
                        None => ('+', exponent),
                    };
                    format!("{mantissa}e{sign}{digits:0>2}")
                }
                None => text,
            }
        }
        _ => format!("{value:.precision$}"),
    }
}

fn pad(body: String, width: usize, zero: bool) -> String {
    if body.len() >= width {
        return body;
    }
    let fill = width - body.len();
    if !zero {
        return format!("{}{body}", " ".repeat(fill));
    }
    match body.strip_prefix('-') {
        Some(digits) => format!("-{}{digits}", "0".repeat(fill)),
        None => format!("{}{body}", "0".repeat(fill)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both(template: &str, i: i64, time: f64) -> String {
        render(
            template,
            &[("i", TemplateArg::Int(i)), ("time", TemplateArg::Float(time))],
        )
        .unwrap()
    }

    #[test]
    fn test_formats_python_specs() {
        assert_eq!(both("img-{i:03d}.png", 7, 0.0), "img-007.png");
        assert_eq!(both("{i}", 12, 0.0), "12");
        assert_eq!(both("Time: {time:.1f} Myr", 0, 12.345), "Time: 12.3 Myr");
        assert_eq!(both("{time}", 0, 10.0), "10.0");
        assert_eq!(both("{time:08.2f}", 0, -3.5), "-0003.50");
        assert_eq!(both("{time:.2e}", 0, 1234.5), "1.23e+03");
        assert_eq!(both("{{i}} {i:4}", 3, 0.0), "{i}    3");
    }

    #[test]
    fn test_rejects_bad_templates() {
        for template in ["{j}", "{i", "i}", "{time:d}", "{i:.2d}", "{i:x}"] {
            let result = render(template, &[("i", TemplateArg::Int(1)), ("time", TemplateArg::Float(1.0))]);
            assert!(
                matches!(result, Err(VisualizerError::Template { .. })),
                "{template}"
            );
        }
    }
}
