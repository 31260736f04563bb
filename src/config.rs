use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Rows of a transition table as written in TOML: source key to
/// destination-probability pairs.
pub type TransitionsToml = BTreeMap<String, BTreeMap<String, f64>>;

/// Top-level model file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelFile {
    /// Human-readable label used in reports.
    #[serde(default = "default_description")]
    pub description: String,

    /// RNG seed; the CLI `--seed` flag takes precedence.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Reject rows that do not sum to 1.
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Row-sum tolerance used when `strict` is set.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Transition model.
    pub model: ModelToml,
}

/// Transition model, tagged by `kind`.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ModelToml {
    /// Next state depends on the current state.
    FirstOrder {
        #[serde(default)]
        start: Option<String>,
        transitions: TransitionsToml,
    },
    /// Next state depends on the last `initial.len()` states. Row keys are
    /// histories joined with `|`.
    HigherOrder {
        initial: Vec<String>,
        #[serde(default)]
        require_coverage: bool,
        transitions: TransitionsToml,
    },
}

fn default_description() -> String {
    "Markov chain".to_string()
}
fn default_true() -> bool {
    true
}
fn default_tolerance() -> f64 {
    1e-9
}

impl ModelFile {
    /// Parses a model from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse TOML model")
    }

    /// Reads and parses a model file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model file: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }
}
