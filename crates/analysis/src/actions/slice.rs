//! Particle subsets by fraction, range or id.

use log::warn;
use nbody::Snapshot;
use serde::Deserialize;

use super::SnapshotAction;
use crate::args::parse_args;
use crate::error::ActionError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Args {
    #[serde(default)]
    parts: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    part: Option<Vec<usize>>,
    #[serde(default)]
    ids: Option<Vec<usize>>,
    #[serde(default)]
    id: Option<usize>,
}

/// What the slice keeps. The first configured of `parts`, `part`, `ids`
/// and `id` wins; with none of them the slice keeps particle 0.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Fractional ranges `[from, to]`, concatenated in order
    Parts(Vec<(f64, f64)>),
    /// Absolute index range, clipped to the snapshot
    Range(usize, usize),
    /// Particle ids, in order
    Ids(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceAction {
    selection: Selection,
}

fn pair<T: Copy + std::fmt::Debug>(values: &[T], name: &str) -> Result<(T, T), ActionError> {
    match values {
        [start, end] => Ok((*start, *end)),
        other => Err(ActionError::Config(format!(
            "`{name}` needs two values, got {other:?}"
        ))),
    }
}

impl SliceAction {
    pub fn new(selection: Selection) -> Result<Self, ActionError> {
        if let Selection::Parts(parts) = &selection {
            let outside = |f: f64| !(0.0..=1.0).contains(&f);
            if let Some((from, to)) = parts.iter().find(|(from, to)| outside(*from) || outside(*to)) {
                return Err(ActionError::Config(format!(
                    "fractions must be within [0, 1], got [{from}, {to}]"
                )));
            }
        }
        Ok(Self { selection })
    }

    pub fn from_args(args: &serde_yaml::Value) -> Result<Self, ActionError> {
        let args: Args = parse_args(args)?;
        let selection = if let Some(parts) = args.parts {
            Selection::Parts(
                parts
                    .iter()
                    .map(|part| pair(part, "parts"))
                    .collect::<Result<_, _>>()?,
            )
        } else if let Some(part) = args.part {
            let (start, end) = pair(&part, "part")?;
            Selection::Range(start, end)
        } else if let Some(ids) = args.ids {
            Selection::Ids(ids)
        } else {
            Selection::Ids(vec![args.id.unwrap_or(0)])
        };
        Self::new(selection)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    fn indices(&self, n: usize) -> Vec<usize> {
        match &self.selection {
            Selection::Parts(parts) => parts
                .iter()
                .flat_map(|(from, to)| {
                    let start = (from * n as f64).floor() as usize;
                    let end = (to * n as f64).floor() as usize;
                    start..end.max(start)
                })
                .collect(),
            Selection::Range(start, end) => ((*start).min(n)..(*end).min(n)).collect(),
            Selection::Ids(ids) => ids
                .iter()
                .copied()
                .filter(|&id| {
                    if id >= n {
                        warn!(target: "slice", "particle {id} is out of range for {n} particles");
                    }
                    id < n
                })
                .collect(),
        }
    }
}

impl SnapshotAction for SliceAction {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot, ActionError> {
        Ok(snapshot.select(&self.indices(snapshot.len())))
    }
}
