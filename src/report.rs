//! Plain-text and JSON rendering of command results.

use std::fmt::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use chainsim_markov::RunSummary;

use crate::model::{Prediction, Trajectory};

/// Pretty-printed JSON for any report.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize report")
}

/// Human-readable summary of a simulation run.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", summary.description);
    let _ = writeln!(out, "Total steps: {}", summary.total_steps);
    for (state, count) in &summary.counts {
        let _ = writeln!(
            out,
            "{state}: {count} ({:.2}%)",
            100.0 * summary.frequency(state)
        );
    }
    let _ = writeln!(out, "Longest streak: {}", summary.longest_streak);
    match summary.first_passage {
        Some(step) => {
            let _ = writeln!(out, "First state change: step {step}");
        }
        None => {
            let _ = writeln!(out, "First state change: never");
        }
    }
    let _ = writeln!(
        out,
        "Entropy: {:.4} bits (max {:.4})",
        summary.entropy,
        chainsim_stats::max_entropy(summary.counts.len())
    );
    let _ = writeln!(out, "Final position: {}", summary.final_position);
    out
}

/// One line per source row: `from -> to: p, ...`.
pub fn render_prediction(prediction: &Prediction) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== {}: {}-step transition probabilities ===",
        prediction.description, prediction.n
    );
    for (from, row) in &prediction.rows {
        let cells: Vec<String> = row.iter().map(|(to, p)| format!("{to}={p:.4}")).collect();
        let _ = writeln!(out, "{from} -> {}", cells.join(", "));
    }
    out
}

/// One line per step with the state distribution.
pub fn render_trajectory(trajectory: &Trajectory) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "=== {}: distribution from {} ===",
        trajectory.description, trajectory.start
    );
    for (t, dist) in trajectory.steps.iter().enumerate() {
        let cells: Vec<String> = dist.iter().map(|(s, p)| format!("{s}={p:.4}")).collect();
        let _ = writeln!(out, "t={t}: {}", cells.join(", "));
    }
    out
}
