//! Least-squares curve fits.

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;

use super::ResultAction;
use crate::args::parse_args;
use crate::error::ActionError;
use crate::task::TaskResult;
use crate::value::Value;

const SVD_EPSILON: f64 = 1e-12;

fn default_x() -> String {
    "x".to_string()
}

fn default_y() -> String {
    "y".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitType {
    #[default]
    Polynomial,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    #[serde(default)]
    fit_type: FitType,
    degree: usize,
    #[serde(default = "default_x")]
    x: String,
    #[serde(default = "default_y")]
    y: String,
}

/// Coefficients of the least-squares polynomial, lowest order first.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Vec<f64>, ActionError> {
    if x.len() != y.len() {
        return Err(ActionError::Fit(format!(
            "x has {} points, y has {}",
            x.len(),
            y.len()
        )));
    }
    if x.len() <= degree {
        return Err(ActionError::Fit(format!(
            "degree {degree} needs more than {} points",
            x.len()
        )));
    }
    let vandermonde = DMatrix::from_fn(x.len(), degree + 1, |i, j| x[i].powi(j as i32));
    let rhs = DVector::from_column_slice(y);
    let coefficients = vandermonde
        .svd(true, true)
        .solve(&rhs, SVD_EPSILON)
        .map_err(|err| ActionError::Fit(err.to_string()))?;
    Ok(coefficients.iter().copied().collect())
}

/// Horner evaluation of lowest-order-first coefficients.
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Replaces the `y` array by the fitted curve evaluated at `x`.
#[derive(Debug, Clone)]
pub struct FitAction {
    fit_type: FitType,
    degree: usize,
    x: String,
    y: String,
}

impl FitAction {
    pub fn polynomial(degree: usize) -> Self {
        Self {
            fit_type: FitType::Polynomial,
            degree,
            x: default_x(),
            y: default_y(),
        }
    }

    pub fn from_args(args: &serde_yaml::Value) -> Result<Self, ActionError> {
        let args: Args = parse_args(args)?;
        Ok(Self {
            fit_type: args.fit_type,
            degree: args.degree,
            x: args.x,
            y: args.y,
        })
    }

    fn array<'a>(result: &'a TaskResult, key: &str) -> Result<&'a [f64], ActionError> {
        result
            .get(key)
            .ok_or_else(|| ActionError::MissingField(key.to_string()))?
            .as_array()
            .ok_or_else(|| ActionError::Fit(format!("`{key}` is not an array")))
    }
}

impl ResultAction for FitAction {
    fn apply(&mut self, mut result: TaskResult) -> Result<TaskResult, ActionError> {
        let x = Self::array(&result, &self.x)?;
        let fitted: Vec<f64> = match self.fit_type {
            FitType::Polynomial => {
                let coefficients = polyfit(x, Self::array(&result, &self.y)?, self.degree)?;
                x.iter().map(|&x| polyval(&coefficients, x)).collect()
            }
        };
        result.insert(self.y.clone(), Value::Array(fitted));
        Ok(result)
    }
}
