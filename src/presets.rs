//! Built-in models selectable with `--preset`.

use anyhow::{Result, bail};

use chainsim_markov::{
    ChainConfig, HigherOrderChain, HigherOrderMatrix, History, HistoryCodec, MarkovChain, State,
    StateAlphabet, TransitionMatrix, enumerate,
};

use crate::model::Model;

/// Preset names with a one-line summary, in listing order.
pub const PRESETS: &[(&str, &str)] = &[
    ("fair-coin", "coin where every flip is 50/50"),
    ("biased-coin", "coin that keeps its face with probability 0.95"),
    ("uneven-coin", "Heads is sticky (0.95), Tails is 50/50"),
    ("arizona-weather", "mostly sunny first-order weather"),
    ("random-weather", "four weather states, every transition 1/4"),
    (
        "stay-the-same-weather",
        "second-order weather that locks in after two equal days",
    ),
];

const WEATHER: [&str; 4] = ["Cloudy", "Rainy", "Snowy", "Sunny"];

fn coin(heads: [f64; 2], tails: [f64; 2]) -> TransitionMatrix {
    TransitionMatrix::from_entries([
        ("Heads", [("Heads", heads[0]), ("Tails", heads[1])]),
        ("Tails", [("Heads", tails[0]), ("Tails", tails[1])]),
    ])
}

fn first_order(matrix: TransitionMatrix, description: &str, config: &ChainConfig) -> Result<Model> {
    Ok(Model::FirstOrder(MarkovChain::new(
        matrix,
        description,
        None,
        config,
    )?))
}

fn higher_order(
    matrix: HigherOrderMatrix,
    initial: History,
    description: &str,
    config: &ChainConfig,
) -> Result<Model> {
    let config = config.clone().with_require_coverage(true);
    Ok(Model::HigherOrder {
        chain: HigherOrderChain::new(matrix, initial, description, &config)?,
        codec: HistoryCodec::default(),
    })
}

fn arizona() -> HigherOrderMatrix {
    let rows: [(&str, [f64; 3]); 3] = [
        ("Sunny", [0.9, 0.0, 0.1]),
        ("Rainy", [0.6, 0.1, 0.3]),
        ("Cloudy", [0.8, 0.1, 0.1]),
    ];
    let mut m = HigherOrderMatrix::new();
    for (from, probs) in rows {
        for (to, p) in ["Sunny", "Rainy", "Cloudy"].into_iter().zip(probs) {
            m.insert(History::new([from]), State::from(to), p);
        }
    }
    m
}

fn uniform(alphabet: &StateAlphabet, k: usize) -> HigherOrderMatrix {
    let p = 1.0 / alphabet.len() as f64;
    let mut m = HigherOrderMatrix::new();
    for h in enumerate(alphabet, k) {
        for to in alphabet {
            m.insert(h.clone(), to.clone(), p);
        }
    }
    m
}

/// Two equal days in a row lock the weather in; any other pair is uniform.
fn stay_the_same(alphabet: &StateAlphabet) -> HigherOrderMatrix {
    let mut m = uniform(alphabet, 2);
    for state in alphabet {
        let pair = History::new([state.clone(), state.clone()]);
        m.insert_row(pair, [(state.clone(), 1.0)].into());
    }
    m
}

/// Builds the preset called `name`.
pub fn build(name: &str, seed: Option<u64>) -> Result<Model> {
    let config = ChainConfig::new().with_seed_opt(seed);
    let weather = StateAlphabet::new(WEATHER);
    match name {
        "fair-coin" => first_order(coin([0.5, 0.5], [0.5, 0.5]), "Fair coin", &config),
        "biased-coin" => first_order(
            coin([0.95, 0.05], [0.05, 0.95]),
            "Evenly biased coin",
            &config,
        ),
        "uneven-coin" => first_order(
            coin([0.95, 0.05], [0.5, 0.5]),
            "Unevenly biased coin",
            &config,
        ),
        "arizona-weather" => higher_order(
            arizona(),
            History::new(["Sunny"]),
            "Arizona weather",
            &config,
        ),
        "random-weather" => higher_order(
            uniform(&weather, 1),
            History::new(["Sunny"]),
            "Random weather",
            &config,
        ),
        "stay-the-same-weather" => higher_order(
            stay_the_same(&weather),
            History::new(["Snowy", "Sunny"]),
            "Stay-the-same weather",
            &config,
        ),
        other => {
            let known: Vec<&str> = PRESETS.iter().map(|(n, _)| *n).collect();
            bail!("unknown preset {other:?} (available: {})", known.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_preset_builds() {
        for (name, _) in PRESETS {
            let model = build(name, Some(1)).unwrap();
            assert!(!model.description().is_empty(), "{name}");
        }
    }

    #[test]
    fn unknown_preset_lists_names() {
        let err = build("loaded-dice", None).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("loaded-dice"));
        assert!(msg.contains("fair-coin"));
    }

    #[test]
    fn arizona_rows_are_normalized() {
        let m = arizona();
        for (_, row) in m.rows() {
            let sum: f64 = row.values().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn stay_the_same_is_second_order() {
        let model = build("stay-the-same-weather", Some(4)).unwrap();
        assert_eq!(model.order(), 2);
        assert_eq!(model.start_label().unwrap(), "Snowy|Sunny");
    }

    #[test]
    fn stay_the_same_locks_in() {
        let mut model = build("stay-the-same-weather", Some(4)).unwrap();
        let summary = model.run(300).unwrap();
        assert_eq!(summary.counts.values().filter(|&&c| c > 250).count(), 1);
    }
}
