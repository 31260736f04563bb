//! Snapshot of a finished simulation run.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::{Cursor, Engine};

/// Statistics of the most recent run of a chain.
///
/// Built by `summary()` on either chain type; serializes to the JSON report
/// printed by the command-line front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Chain description.
    pub description: String,
    /// History width (1 for first-order chains).
    pub order: usize,
    /// Steps taken.
    pub total_steps: usize,
    /// Visits per state.
    pub counts: BTreeMap<String, usize>,
    /// Longest run of identical consecutive states.
    pub longest_streak: usize,
    /// 1-based index of the first state change, if one happened.
    pub first_passage: Option<usize>,
    /// Shannon entropy of the visit counts, in bits.
    pub entropy: f64,
    /// Position after the last step, as a display string.
    pub final_position: String,
}

impl RunSummary {
    pub(crate) fn from_engine<C>(description: &str, order: usize, engine: &Engine<C>) -> Self
    where
        C: Cursor + std::fmt::Display,
    {
        Self {
            description: description.to_string(),
            order,
            total_steps: engine.total_steps(),
            counts: engine
                .counts()
                .iter()
                .map(|(s, &c)| (s.to_string(), c))
                .collect(),
            longest_streak: engine.longest_streak(),
            first_passage: engine.first_passage(),
            entropy: engine.entropy(),
            final_position: engine.cursor().to_string(),
        }
    }

    /// Fraction of steps spent in `state`; 0 if the run was empty.
    pub fn frequency(&self, state: &str) -> f64 {
        if self.total_steps == 0 {
            return 0.0;
        }
        self.counts.get(state).copied().unwrap_or(0) as f64 / self.total_steps as f64
    }
}
