use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use analysis::{
    ActionFactory, Pipeline, PipelineError, PlotSink, SharedPlotSink, Task, TaskConfig,
    TaskConstructor, TaskError, TaskInputs, TaskResult, Value, builtin_tasks,
};
use approx::assert_relative_eq;
use nbody::{Particle, ParticleSet, Snapshot};
use units::Time;

/// Returns its `values` input unchanged.
struct EchoTask;

impl Task for EchoTask {
    fn run(&mut self, _snapshot: &Snapshot, inputs: &TaskInputs) -> Result<TaskResult, TaskError> {
        let values = inputs
            .get("values")
            .cloned()
            .ok_or_else(|| TaskError::MissingInput("values".to_string()))?;
        Ok(TaskResult::from([("received".to_string(), values)]))
    }

    fn inputs(&self) -> &'static [&'static str] {
        &["values"]
    }
}

fn echo(_args: &serde_yaml::Value) -> Result<Box<dyn Task>, TaskError> {
    Ok(Box::new(EchoTask))
}

fn lookup(name: &str) -> Option<TaskConstructor> {
    if name == "EchoTask" {
        return Some(echo as TaskConstructor);
    }
    builtin_tasks()
        .into_iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, constructor)| constructor)
}

fn configs(yaml: &str) -> Vec<TaskConfig> {
    serde_yaml::from_str(yaml).unwrap()
}

fn snapshot(time: f64) -> Snapshot {
    let set: ParticleSet = (0..10)
        .map(|i| Particle::new(1.0, [i as f64, 0.0, 0.0], [0.0, i as f64, 0.0]))
        .collect();
    Snapshot::new(set, Time::from_myr(time))
}

#[derive(Default)]
struct Recorder {
    calls: Vec<(TaskResult, serde_yaml::Value)>,
}

impl PlotSink for Recorder {
    fn plot(
        &mut self,
        data: &TaskResult,
        params: &serde_yaml::Value,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.calls.push((data.clone(), params.clone()));
        Ok(())
    }
}

#[test]
fn test_downstream_task_receives_transformed_output() {
    let configs = configs(
        r#"
- name: ScatterTask
  id: a
  args:
    expressions: {x: x, v: x * x}
    units: {x: kpc, v: kpc^2}
  actions_after:
    - {type: extract, keep_old: false, x: x, y: v}
    - {type: fit, degree: 1}
- name: EchoTask
  id: b
  inputs: {values: a.y}
"#,
    );
    let mut pipeline = Pipeline::build(&configs, lookup, &ActionFactory::default()).unwrap();

    let outputs = pipeline.run(&snapshot(0.0)).unwrap();

    let fitted = outputs["a"]["y"].clone();
    assert_ne!(fitted, outputs["a"]["x"]);
    assert_eq!(outputs["b"]["received"], fitted);
}

#[test]
fn test_outputs_flow_between_tasks() {
    let configs = configs(
        r#"
- name: CenterTask
  id: center
  args: {center_type: mass}
  actions_after:
    - {type: extract, shifted: position}
- name: MassProfileTask
  id: profile
  args: {center_type: origin, resolution: 1}
  inputs: {center: center.shifted}
"#,
    );
    let mut pipeline = Pipeline::build(&configs, lookup, &ActionFactory::default()).unwrap();

    let outputs = pipeline.run(&snapshot(0.0)).unwrap();

    assert_eq!(outputs["center"]["shifted"], outputs["center"]["position"]);
    let radii = outputs["profile"]["radii"].as_array().unwrap();
    assert_eq!(radii[0], 0.5);
    assert_eq!(pipeline.last_timings().len(), 2);
    assert_eq!(pipeline.ids().collect::<Vec<_>>(), vec!["center", "profile"]);
}

#[test]
fn test_potential_center_task_by_name() {
    let configs = configs(
        r#"
- name: PotentialCenterTask
  id: center
  args: {eps: 0.1, top_fraction: 0.2}
- name: MassProfileTask
  id: profile
  args: {center_type: origin, resolution: 1}
  inputs: {center: center.position}
"#,
    );
    let mut pipeline = Pipeline::build(&configs, lookup, &ActionFactory::default()).unwrap();

    let outputs = pipeline.run(&snapshot(0.0)).unwrap();

    let position = outputs["center"]["position"].as_vector().unwrap();
    let velocity = outputs["center"]["velocity"].as_vector().unwrap();
    assert_relative_eq!(position.x, 4.5, epsilon = 1e-9);
    assert_relative_eq!(velocity.y, 4.5, epsilon = 1e-9);
    assert_eq!(outputs["profile"]["radii"].as_array().unwrap()[0], 0.5);
}

#[test]
fn test_potential_center_task_rejects_center_type() {
    let configs = configs("[{name: PotentialCenterTask, args: {center_type: mass}}]");
    let result = Pipeline::build(&configs, lookup, &ActionFactory::default());
    assert!(matches!(result, Err(PipelineError::Task { .. })));
}

#[test]
fn test_time_evolution_accumulates_across_runs() {
    let configs = configs(
        r#"
- name: TimeEvolutionTask
  args: {expr: m, value_unit: MSun, function: sum}
  actions_before:
    - {type: slice, parts: [[0, 0.5]]}
"#,
    );
    let mut pipeline = Pipeline::build(&configs, lookup, &ActionFactory::default()).unwrap();

    for time in [0.0, 1.0, 2.0] {
        pipeline.run(&snapshot(time)).unwrap();
    }
    let outputs = pipeline.run(&snapshot(3.0)).unwrap();

    let result = &outputs["TimeEvolutionTask"];
    assert_eq!(result["times"], Value::Array(vec![0.0, 1.0, 2.0, 3.0]));
    assert_eq!(result["values"], Value::Array(vec![5.0; 4]));
}

#[test]
fn test_visualizer_action_forwards_params() {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let sink: SharedPlotSink = recorder.clone();
    let factory = ActionFactory::new(Some(sink));
    let configs = configs(
        r#"
- name: ScatterTask
  args: {expressions: {x: x}, units: {x: kpc}}
  actions_after:
    - {type: visualizer, id: main, marker: "."}
"#,
    );
    let mut pipeline = Pipeline::build(&configs, lookup, &factory).unwrap();

    pipeline.run(&snapshot(0.0)).unwrap();

    let recorder = recorder.borrow();
    let calls = &recorder.calls;
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains_key("x"));
    let expected: serde_yaml::Value = serde_yaml::from_str("{id: main, marker: '.'}").unwrap();
    assert_eq!(calls[0].1, expected);
}

#[test]
fn test_unknown_tasks_and_actions_are_skipped() {
    let configs = configs(
        r#"
- name: NoSuchTask
- name: CenterTask
  args: {center_type: origin}
  actions_after:
    - {type: no_such_action}
"#,
    );
    let pipeline = Pipeline::build(&configs, lookup, &ActionFactory::default()).unwrap();
    assert_eq!(pipeline.len(), 1);
}

#[test]
fn test_wiring_is_checked_at_build_time() {
    let cases = [
        // unknown producer
        "[{name: MassProfileTask, inputs: {center: c.position}}]",
        // producer configured later
        "[{name: MassProfileTask, inputs: {center: c.position}}, {name: CenterTask, id: c, args: {center_type: mass}}]",
        // key the producer does not declare
        "[{name: CenterTask, id: c, args: {center_type: mass}}, {name: MassProfileTask, inputs: {center: c.middle}}]",
        // key dropped by the producer's post-actions
        "[{name: CenterTask, id: c, args: {center_type: mass}, actions_after: [{type: extract, keep_old: false, p: position}]}, {name: MassProfileTask, inputs: {center: c.position}}]",
        // input the consumer does not accept
        "[{name: CenterTask, id: c, args: {center_type: mass}}, {name: MassProfileTask, inputs: {middle: c.position}}]",
        // malformed path
        "[{name: CenterTask, id: c, args: {center_type: mass}}, {name: MassProfileTask, inputs: {center: position}}]",
        // duplicate ids
        "[{name: CenterTask, args: {center_type: mass}}, {name: CenterTask, args: {center_type: origin}}]",
    ];
    for yaml in cases {
        let result = Pipeline::build(&configs(yaml), lookup, &ActionFactory::default());
        assert!(
            matches!(result, Err(PipelineError::Config(_))),
            "accepted: {yaml}"
        );
    }
}

#[test]
fn test_bad_task_arguments_name_the_task() {
    let configs = configs("[{name: MassProfileTask, id: mp, args: {resolution: 0}}]");
    let result = Pipeline::build(&configs, lookup, &ActionFactory::default());
    assert!(matches!(result, Err(PipelineError::Task { id, .. }) if id == "mp"));
}
