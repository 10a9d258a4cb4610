use super::{ResultAction, SharedPlotSink};
use crate::error::ActionError;
use crate::task::TaskResult;

/// Forwards the result and the draw parameters to the plot sink.
pub struct VisualizerAction {
    sink: SharedPlotSink,
    params: serde_yaml::Value,
}

impl VisualizerAction {
    pub fn new(sink: SharedPlotSink, params: serde_yaml::Value) -> Self {
        Self { sink, params }
    }
}

impl ResultAction for VisualizerAction {
    fn apply(&mut self, result: TaskResult) -> Result<TaskResult, ActionError> {
        self.sink
            .borrow_mut()
            .plot(&result, &self.params)
            .map_err(ActionError::Plot)?;
        Ok(result)
    }
}
