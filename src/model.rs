//! A loaded chain of either order, behind one interface for the commands.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde::Serialize;

use chainsim_markov::{HigherOrderChain, HistoryCodec, MarkovChain, RunSummary, State};

/// A ready-to-run chain built from a model file or a preset.
#[derive(Debug)]
pub enum Model {
    FirstOrder(MarkovChain),
    HigherOrder {
        chain: HigherOrderChain,
        codec: HistoryCodec,
    },
}

/// n-step transition probabilities keyed by display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub description: String,
    pub n: i64,
    pub rows: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Per-step state distributions from the start position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    pub description: String,
    pub start: String,
    pub steps: Vec<BTreeMap<String, f64>>,
}

/// Longest trajectory the CLI will compute and print.
pub const MAX_TRAJECTORY_STEPS: usize = 100_000;

fn stringify(dist: BTreeMap<State, f64>) -> BTreeMap<String, f64> {
    dist.into_iter().map(|(s, p)| (s.to_string(), p)).collect()
}

impl Model {
    pub fn description(&self) -> &str {
        match self {
            Model::FirstOrder(chain) => chain.description(),
            Model::HigherOrder { chain, .. } => chain.description(),
        }
    }

    /// History width; 1 for first-order chains.
    pub fn order(&self) -> usize {
        match self {
            Model::FirstOrder(_) => 1,
            Model::HigherOrder { chain, .. } => chain.order(),
        }
    }

    /// Start state or encoded initial history.
    pub fn start_label(&self) -> Result<String> {
        Ok(match self {
            Model::FirstOrder(chain) => chain.start_state().to_string(),
            Model::HigherOrder { chain, codec } => codec.encode(chain.initial_history())?,
        })
    }

    /// Runs a fresh simulation of `steps` steps and returns its summary.
    pub fn run(&mut self, steps: usize) -> Result<RunSummary> {
        Ok(match self {
            Model::FirstOrder(chain) => {
                chain.run(steps)?;
                chain.summary()
            }
            Model::HigherOrder { chain, .. } => {
                chain.run(steps)?;
                chain.summary()
            }
        })
    }

    /// Exact n-step transition probabilities. Higher-order rows are keyed by
    /// encoded history.
    pub fn predict(&self, n: i64) -> Result<Prediction> {
        let rows = match self {
            Model::FirstOrder(chain) => chain
                .predict_nth_state(n)?
                .rows()
                .map(|(from, row)| (from.to_string(), stringify(row.clone())))
                .collect(),
            Model::HigherOrder { chain, codec } => {
                let mut rows = BTreeMap::new();
                for (history, row) in chain.predict_nth_state(n)?.rows() {
                    rows.insert(codec.encode(history)?, stringify(row.clone()));
                }
                rows
            }
        };
        Ok(Prediction {
            description: self.description().to_string(),
            n,
            rows,
        })
    }

    /// Distribution of the emitted state for steps `0..=steps`.
    pub fn trajectory(&self, steps: i64) -> Result<Trajectory> {
        let Ok(steps) = usize::try_from(steps) else {
            bail!("trajectory length must be >= 0, got {steps}");
        };
        if steps > MAX_TRAJECTORY_STEPS {
            bail!("trajectory length must be at most {MAX_TRAJECTORY_STEPS}, got {steps}");
        }
        let dists = match self {
            Model::FirstOrder(chain) => {
                let initial = BTreeMap::from([(chain.start_state().clone(), 1.0)]);
                chain.trajectory(&initial, steps)?
            }
            Model::HigherOrder { chain, .. } => chain.trajectory(steps)?,
        };
        Ok(Trajectory {
            description: self.description().to_string(),
            start: self.start_label()?,
            steps: dists.into_iter().map(stringify).collect(),
        })
    }
}
