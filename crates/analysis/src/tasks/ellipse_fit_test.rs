use approx::assert_relative_eq;
use nbody::Snapshot;

use super::EllipseFitTask;
use super::ellipse_fit::fit_ellipse;
use crate::error::TaskError;
use crate::task::{Task, TaskInputs};
use crate::value::Value;

fn sample(a: f64, b: f64, phases: &[f64], offset: [f64; 2]) -> (Vec<f64>, Vec<f64>) {
    phases
        .iter()
        .map(|phi| (a * phi.cos() + offset[0], b * phi.sin() + offset[1]))
        .unzip()
}

const PHASES: [f64; 7] = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

#[test]
fn test_unit_circle() {
    let (x, y) = sample(1.0, 1.0, &PHASES, [0.0, 0.0]);
    let mut inputs = TaskInputs::new();
    inputs.insert("x".to_string(), Value::Array(x));
    inputs.insert("y".to_string(), Value::Array(y));

    let result = EllipseFitTask.run(&Snapshot::default(), &inputs).unwrap();

    assert_relative_eq!(result["a"].as_scalar().unwrap(), 1.0, epsilon = 1e-2);
    assert_relative_eq!(result["e"].as_scalar().unwrap(), 0.0, epsilon = 1e-2);
}

#[test]
fn test_offset_ellipse() {
    let (x, y) = sample(1.0, 0.5, &PHASES, [5.0, 7.0]);
    let ellipse = fit_ellipse(&x, &y).unwrap();

    assert_relative_eq!(ellipse.semi_major(), 1.0, epsilon = 1e-6);
    assert_relative_eq!(ellipse.semi_minor(), 0.5, epsilon = 1e-6);
    assert_relative_eq!(ellipse.eccentricity(), 0.75f64.sqrt(), epsilon = 1e-6);
    assert_relative_eq!(ellipse.center[0], 5.0, epsilon = 1e-6);
    assert_relative_eq!(ellipse.center[1], 7.0, epsilon = 1e-6);
}

#[test]
fn test_arc_of_an_ellipse() {
    let phases: Vec<f64> = (0..7).map(|i| i as f64 * 0.5 / 6.0).collect();
    let (x, y) = sample(1.0, 0.5, &phases, [0.0, 0.0]);
    let ellipse = fit_ellipse(&x, &y).unwrap();

    assert_relative_eq!(ellipse.semi_major(), 1.0, epsilon = 1e-2);
    assert_relative_eq!(ellipse.eccentricity(), 0.75f64.sqrt(), epsilon = 1e-1);
}

#[test]
fn test_bad_inputs() {
    assert!(matches!(
        fit_ellipse(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0]),
        Err(TaskError::Fit(_))
    ));
    assert!(matches!(
        fit_ellipse(&[0.0; 6], &[0.0; 5]),
        Err(TaskError::Fit(_))
    ));

    let mut inputs = TaskInputs::new();
    inputs.insert("x".to_string(), Value::Array(vec![1.0; 7]));
    assert!(matches!(
        EllipseFitTask.run(&Snapshot::default(), &inputs),
        Err(TaskError::MissingInput(name)) if name == "y"
    ));
}
