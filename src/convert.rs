//! Pure conversion functions: TOML model structs -> chain types.

use anyhow::{Context, Result, bail};

use chainsim_markov::{
    ChainConfig, HigherOrderChain, HigherOrderMatrix, History, HistoryCodec, MarkovChain, State,
    TransitionMatrix,
};

use crate::config::{ModelFile, ModelToml, TransitionsToml};
use crate::model::Model;

/// Builds the chain configuration. `seed_override` wins over the file's seed.
pub fn build_chain_config(file: &ModelFile, seed_override: Option<u64>) -> ChainConfig {
    ChainConfig::new()
        .with_seed_opt(seed_override.or(file.seed))
        .with_strict(file.strict)
        .with_tolerance(file.tolerance)
}

/// Converts first-order TOML rows into a transition matrix.
pub fn build_transition_matrix(transitions: &TransitionsToml) -> TransitionMatrix {
    TransitionMatrix::from_entries(
        transitions
            .iter()
            .map(|(from, row)| (from.as_str(), row.iter().map(|(to, &p)| (to.as_str(), p)))),
    )
}

/// Converts higher-order TOML rows, decoding each key into a history.
pub fn build_higher_order_matrix(
    transitions: &TransitionsToml,
    codec: &HistoryCodec,
) -> Result<HigherOrderMatrix> {
    let mut matrix = HigherOrderMatrix::new();
    for (key, row) in transitions {
        let history = codec
            .decode(key)
            .with_context(|| format!("invalid history key {key:?}"))?;
        if history.is_empty() {
            bail!("history key cannot be empty");
        }
        for (to, &p) in row {
            matrix.insert(history.clone(), State::from(to.as_str()), p);
        }
    }
    Ok(matrix)
}

/// Builds a ready-to-run model from a parsed model file.
pub fn build_model(file: &ModelFile, seed_override: Option<u64>) -> Result<Model> {
    let config = build_chain_config(file, seed_override);
    match &file.model {
        ModelToml::FirstOrder { start, transitions } => {
            let matrix = build_transition_matrix(transitions);
            let start = start.as_deref().map(State::from);
            let chain = MarkovChain::new(matrix, file.description.as_str(), start, &config)
                .context("invalid first-order model")?;
            Ok(Model::FirstOrder(chain))
        }
        ModelToml::HigherOrder {
            initial,
            require_coverage,
            transitions,
        } => {
            let codec = HistoryCodec::default();
            let matrix = build_higher_order_matrix(transitions, &codec)?;
            let config = config.with_require_coverage(*require_coverage);
            let initial = History::new(initial.iter().map(String::as_str));
            let chain = HigherOrderChain::new(matrix, initial, file.description.as_str(), &config)
                .context("invalid higher-order model")?;
            Ok(Model::HigherOrder { chain, codec })
        }
    }
}
