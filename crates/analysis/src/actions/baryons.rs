use nbody::Snapshot;

use super::SnapshotAction;
use crate::error::ActionError;

/// Keeps only the baryonic particles.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaryonsAction;

impl SnapshotAction for BaryonsAction {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot, ActionError> {
        Ok(Snapshot::new(snapshot.particles.baryons(), snapshot.timestamp))
    }
}
