//! Direct least-squares ellipse fitting (Halir and Flusser, 1998).

use std::collections::BTreeSet;

use nalgebra::{DMatrix, Matrix3, Vector3};
use nbody::Snapshot;
use serde::Deserialize;

use super::FromArgs;
use crate::args::parse_args;
use crate::error::TaskError;
use crate::task::{Task, TaskInputs, TaskResult, array_input, keys};
use crate::value::Value;

/// Imaginary parts below this are treated as zero.
const REAL_EIGENVALUE_TOLERANCE: f64 = 1e-9;

/// Geometric parameters of a fitted ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipse {
    pub center: [f64; 2],
    pub width: f64,
    pub height: f64,
}

impl Ellipse {
    pub fn semi_major(&self) -> f64 {
        self.width.max(self.height)
    }

    pub fn semi_minor(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn eccentricity(&self) -> f64 {
        let a = self.semi_major();
        let b = self.semi_minor();
        (1.0 - b * b / (a * a)).sqrt()
    }
}

/// Coefficients `[a, b, c, d, e, f]` of `a x² + b xy + c y² + d x + e y + f = 0`.
pub fn fit_conic(x: &[f64], y: &[f64]) -> Result<[f64; 6], TaskError> {
    if x.len() != y.len() {
        return Err(TaskError::Fit(format!(
            "x has {} points, y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 5 {
        return Err(TaskError::Fit(format!(
            "an ellipse needs at least 5 points, got {}",
            x.len()
        )));
    }

    let n = x.len();
    let quadratic = DMatrix::from_fn(n, 3, |i, j| match j {
        0 => x[i] * x[i],
        1 => x[i] * y[i],
        _ => y[i] * y[i],
    });
    let linear = DMatrix::from_fn(n, 3, |i, j| match j {
        0 => x[i],
        1 => y[i],
        _ => 1.0,
    });

    let s1: Matrix3<f64> = (quadratic.transpose() * &quadratic).fixed_view::<3, 3>(0, 0).into();
    let s2: Matrix3<f64> = (quadratic.transpose() * &linear).fixed_view::<3, 3>(0, 0).into();
    let s3: Matrix3<f64> = (linear.transpose() * &linear).fixed_view::<3, 3>(0, 0).into();

    let s3_inv = s3
        .try_inverse()
        .ok_or_else(|| TaskError::Fit("points are collinear".to_string()))?;
    let t = -s3_inv * s2.transpose();
    let reduced = s1 + s2 * t;

    // Inverse of the constraint matrix [[0, 0, 2], [0, -1, 0], [2, 0, 0]]
    let constraint_inv = Matrix3::new(0.0, 0.0, 0.5, 0.0, -1.0, 0.0, 0.5, 0.0, 0.0);
    let m = constraint_inv * reduced;

    let quadratic_part = m
        .complex_eigenvalues()
        .iter()
        .filter(|lambda| lambda.im.abs() <= REAL_EIGENVALUE_TOLERANCE * lambda.re.abs().max(1.0))
        .filter_map(|lambda| null_vector(&(m - Matrix3::identity() * lambda.re)))
        .find(|v| 4.0 * v[0] * v[2] - v[1] * v[1] > 0.0)
        .ok_or_else(|| TaskError::Fit("no elliptical solution".to_string()))?;
    let linear_part = t * quadratic_part;

    Ok([
        quadratic_part[0],
        quadratic_part[1],
        quadratic_part[2],
        linear_part[0],
        linear_part[1],
        linear_part[2],
    ])
}

/// Right singular vector of the smallest singular value.
fn null_vector(matrix: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let svd = matrix.svd(false, true);
    let v_t = svd.v_t?;
    let (index, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    Some(v_t.row(index).transpose())
}

/// Center and semi-axes of the ellipse described by conic coefficients.
pub fn conic_to_ellipse(coefficients: [f64; 6]) -> Result<Ellipse, TaskError> {
    let [a, b, c, d, f, g] = coefficients;
    let (b, d, f) = (b / 2.0, d / 2.0, f / 2.0);

    let det = b * b - a * c;
    if det >= 0.0 {
        return Err(TaskError::Fit("conic is not an ellipse".to_string()));
    }
    let center = [(c * d - b * f) / det, (a * f - b * d) / det];

    let numerator = 2.0 * (a * f * f + c * d * d + g * b * b - 2.0 * b * d * f - a * c * g);
    let root = ((a - c).powi(2) + 4.0 * b * b).sqrt();
    let width = (numerator / (det * (root - (a + c)))).sqrt();
    let height = (numerator / (det * (-root - (a + c)))).sqrt();

    if !(width.is_finite() && height.is_finite()) {
        return Err(TaskError::Fit("degenerate ellipse".to_string()));
    }
    Ok(Ellipse {
        center,
        width,
        height,
    })
}

pub fn fit_ellipse(x: &[f64], y: &[f64]) -> Result<Ellipse, TaskError> {
    conic_to_ellipse(fit_conic(x, y)?)
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {}

/// Fits an ellipse to the points given by the `x` and `y` inputs.
///
/// Outputs the semi-major axis `a` and the eccentricity `e`.
#[derive(Debug, Default)]
pub struct EllipseFitTask;

impl FromArgs for EllipseFitTask {
    fn from_args(args: &serde_yaml::Value) -> Result<Self, TaskError> {
        let Args {} = parse_args(args)?;
        Ok(Self)
    }
}

impl Task for EllipseFitTask {
    fn run(&mut self, _snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let ellipse = fit_ellipse(array_input(inputs, "x")?, array_input(inputs, "y")?)?;

        let mut result = TaskResult::new();
        result.insert("a".to_string(), Value::Scalar(ellipse.semi_major()));
        result.insert("e".to_string(), Value::Scalar(ellipse.eccentricity()));
        Ok(result)
    }

    fn outputs(&self) -> Option<BTreeSet<String>> {
        keys(&["a", "e"])
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["x", "y"]
    }
}
