use approx::assert_relative_eq;

use super::ResultAction;
use super::fit::{FitAction, polyfit, polyval};
use crate::error::ActionError;
use crate::task::TaskResult;
use crate::value::Value;

#[test]
fn test_polyfit_recovers_exact_polynomial() {
    let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
    let y: Vec<f64> = x.iter().map(|x| 2.0 - 3.0 * x + 0.5 * x * x).collect();

    let coefficients = polyfit(&x, &y, 2).unwrap();

    assert_relative_eq!(coefficients[0], 2.0, epsilon = 1e-9);
    assert_relative_eq!(coefficients[1], -3.0, epsilon = 1e-9);
    assert_relative_eq!(coefficients[2], 0.5, epsilon = 1e-9);
    assert_relative_eq!(polyval(&coefficients, 4.0), 2.0 - 12.0 + 8.0, epsilon = 1e-9);
}

#[test]
fn test_linear_fit_of_noisy_points() {
    let x = [0.0, 1.0, 2.0, 3.0];
    let y = [0.1, 0.9, 2.1, 2.9];

    let coefficients = polyfit(&x, &y, 1).unwrap();

    assert_relative_eq!(coefficients[1], 0.96, epsilon = 1e-9);
    assert_relative_eq!(coefficients[0], 0.06, epsilon = 1e-9);
}

#[test]
fn test_fit_action_replaces_y() {
    let mut result = TaskResult::new();
    result.insert("x".to_string(), Value::Array(vec![0.0, 1.0, 2.0]));
    result.insert("y".to_string(), Value::Array(vec![1.0, 3.0, 5.0]));
    result.insert("label".to_string(), Value::Scalar(7.0));

    let fitted = FitAction::polynomial(1).apply(result).unwrap();

    assert_eq!(fitted["x"], Value::Array(vec![0.0, 1.0, 2.0]));
    assert_eq!(fitted["label"], Value::Scalar(7.0));
    let y = fitted["y"].as_array().unwrap();
    for (actual, expected) in y.iter().zip([1.0, 3.0, 5.0]) {
        assert_relative_eq!(*actual, expected, epsilon = 1e-9);
    }
}

#[test]
fn test_custom_keys_and_errors() {
    let args: serde_yaml::Value = serde_yaml::from_str("{degree: 1, x: radii, y: masses}").unwrap();
    let mut action = FitAction::from_args(&args).unwrap();

    let mut result = TaskResult::new();
    result.insert("radii".to_string(), Value::Array(vec![0.0, 1.0]));
    assert!(matches!(
        action.apply(result.clone()),
        Err(ActionError::MissingField(key)) if key == "masses"
    ));

    result.insert("masses".to_string(), Value::Array(vec![1.0]));
    assert!(matches!(action.apply(result), Err(ActionError::Fit(_))));

    let unknown: serde_yaml::Value = serde_yaml::from_str("{degree: 1, fit_type: spline}").unwrap();
    assert!(FitAction::from_args(&unknown).is_err());
}
