use nbody::{Particle, ParticleSet, Snapshot};
use units::Time;

use super::slice::{Selection, SliceAction};
use super::{BaryonsAction, SnapshotAction};
use crate::error::ActionError;

fn args(yaml: &str) -> serde_yaml::Value {
    serde_yaml::from_str(yaml).unwrap()
}

/// Particle `i` has mass `10 i + 1`.
fn numbered(n: usize) -> Snapshot {
    let set: ParticleSet = (0..n)
        .map(|i| Particle::new(10.0 * i as f64 + 1.0, [i as f64, 0.0, 0.0], [0.0; 3]))
        .collect();
    Snapshot::new(set, Time::from_myr(3.0))
}

fn masses(snapshot: &Snapshot) -> Vec<f64> {
    snapshot.particles.masses().to_vec()
}

#[test]
fn test_fractional_parts_keep_order() {
    let snapshot = numbered(100);
    let action = SliceAction::from_args(&args("parts: [[0, 0.1], [0.2, 0.3]]")).unwrap();

    let sliced = action.apply(&snapshot).unwrap();

    assert_eq!(sliced.len(), 20);
    assert_eq!(sliced.timestamp, snapshot.timestamp);
    let expected: Vec<f64> = masses(&snapshot.slice(0..10))
        .into_iter()
        .chain(masses(&snapshot.slice(20..30)))
        .collect();
    assert_eq!(masses(&sliced), expected);
}

#[test]
fn test_overlapping_parts_repeat_particles() {
    let action = SliceAction::from_args(&args("parts: [[0, 0.2], [0.1, 0.3]]")).unwrap();
    assert_eq!(action.apply(&numbered(100)).unwrap().len(), 40);
}

#[test]
fn test_fractions_outside_unit_interval() {
    assert!(matches!(
        SliceAction::from_args(&args("parts: [[0, 10]]")),
        Err(ActionError::Config(_))
    ));
    assert!(matches!(
        SliceAction::new(Selection::Parts(vec![(-0.1, 0.5)])),
        Err(ActionError::Config(_))
    ));
}

#[test]
fn test_absolute_part() {
    let snapshot = numbered(100);
    let action = SliceAction::from_args(&args("part: [0, 20]")).unwrap();
    assert_eq!(masses(&action.apply(&snapshot).unwrap()), masses(&snapshot.slice(0..20)));

    let outside = SliceAction::from_args(&args("part: [1000, 2000]")).unwrap();
    assert!(outside.apply(&snapshot).unwrap().is_empty());

    assert!(matches!(
        SliceAction::from_args(&args("part: [0, 1, 2, 3]")),
        Err(ActionError::Config(_))
    ));
}

#[test]
fn test_ids() {
    let snapshot = numbered(100);

    let single = SliceAction::from_args(&args("id: 10")).unwrap();
    assert_eq!(masses(&single.apply(&snapshot).unwrap()), vec![101.0]);

    let missing = SliceAction::from_args(&args("id: 150")).unwrap();
    assert!(missing.apply(&snapshot).unwrap().is_empty());

    let several = SliceAction::from_args(&args("ids: [5, 500, 2]")).unwrap();
    assert_eq!(masses(&several.apply(&snapshot).unwrap()), vec![51.0, 21.0]);

    let default = SliceAction::from_args(&serde_yaml::Value::Null).unwrap();
    assert_eq!(default.selection(), &Selection::Ids(vec![0]));
}

#[test]
fn test_baryons_action() {
    let set: ParticleSet = vec![
        Particle::new(1.0, [0.0; 3], [0.0; 3]),
        Particle::new(2.0, [0.0; 3], [0.0; 3]).dark(),
        Particle::new(3.0, [0.0; 3], [0.0; 3]),
    ]
    .into();
    let snapshot = Snapshot::new(set, Time::from_myr(0.0));

    let baryons = BaryonsAction.apply(&snapshot).unwrap();

    assert_eq!(masses(&baryons), vec![1.0, 3.0]);
}
