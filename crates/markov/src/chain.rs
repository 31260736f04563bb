//! First-order and K-th order chains.
//!
//! Both chain types hold an immutable transition model and delegate all
//! sampling and bookkeeping to a shared [`Engine`], keyed by a [`State`] for
//! first-order chains and by a [`History`] for higher-order ones.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, instrument};

use crate::config::ChainConfig;
use crate::engine::Engine;
use crate::error::MarkovError;
use crate::higher_order::{self, HigherOrderMatrix};
use crate::history::{History, HistoryCodec};
use crate::matrix::{self, TransitionMatrix};
use crate::result::RunSummary;
use crate::state::{State, StateAlphabet};

fn validate_model<R, C>(
    matrix: &matrix::Matrix<R, C>,
    config: &ChainConfig,
) -> Result<(), MarkovError>
where
    R: Ord + std::fmt::Display,
    C: Ord + std::fmt::Display,
{
    config.validate()?;
    if config.strict() {
        matrix.validate(config.tolerance())
    } else {
        matrix.validate_entries()
    }
}

/// A first-order chain: the next state depends only on the current state.
///
/// # Example
///
/// ```
/// use chainsim_markov::{ChainConfig, MarkovChain, State, TransitionMatrix};
///
/// let matrix = TransitionMatrix::from_entries([
///     ("Heads", [("Heads", 1.0), ("Tails", 0.0)]),
///     ("Tails", [("Heads", 0.0), ("Tails", 1.0)]),
/// ]);
/// let config = ChainConfig::new().with_seed(1);
/// let mut chain =
///     MarkovChain::new(matrix, "sticky coin", Some(State::from("Heads")), &config).unwrap();
///
/// let counts = chain.run(500).unwrap();
/// assert_eq!(counts["Heads"], 500);
/// assert_eq!(chain.longest_streak(), 500);
/// ```
#[derive(Debug, Clone)]
pub struct MarkovChain {
    matrix: TransitionMatrix,
    description: String,
    states: Vec<State>,
    engine: Engine<State>,
}

impl MarkovChain {
    /// Creates a chain over `matrix`.
    ///
    /// If `start` is `None` the start state is drawn uniformly from the
    /// matrix's source states using the chain's own random source.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the matrix is empty or not
    /// row-stochastic (strict mode), and [`MarkovError::UnknownState`] if
    /// `start` has no row.
    pub fn new(
        matrix: TransitionMatrix,
        description: impl Into<String>,
        start: Option<State>,
        config: &ChainConfig,
    ) -> Result<Self, MarkovError> {
        validate_model(&matrix, config)?;
        let mut rng = config.rng();
        let states: Vec<State> = matrix.sources().cloned().collect();
        let start = match start {
            Some(s) if matrix.contains_source(&s) => s,
            Some(s) => return Err(MarkovError::UnknownState { state: s.to_string() }),
            None => states[rng.random_range(0..states.len())].clone(),
        };
        let description = description.into();
        debug!(%description, %start, n_states = states.len(), "first-order chain created");
        let engine = Engine::new(start, &matrix.alphabet(), rng);
        Ok(Self {
            matrix,
            description,
            states,
            engine,
        })
    }

    /// Advances the chain by one transition and returns the emitted state.
    pub fn step(&mut self) -> Result<State, MarkovError> {
        self.engine.step(&self.matrix)
    }

    /// Resets all counters, then simulates `steps` transitions.
    ///
    /// Returns visit counts for every known state, including unvisited ones.
    #[instrument(skip(self), fields(description = %self.description))]
    pub fn run(&mut self, steps: usize) -> Result<BTreeMap<State, usize>, MarkovError> {
        self.engine.run(&self.matrix, steps)
    }

    /// Exact `n`-step transition matrix over the matrix's source states.
    ///
    /// Independent of simulation progress. Fails with
    /// [`MarkovError::UnknownState`] if a reachable state has no row.
    #[instrument(skip(self), fields(description = %self.description))]
    pub fn predict_nth_state(&self, n: i64) -> Result<TransitionMatrix, MarkovError> {
        self.matrix.check_closed()?;
        matrix::power(&self.matrix, n, &self.states)
    }

    /// Distribution over states for each of the next `steps` steps, starting
    /// from `initial`.
    pub fn trajectory(
        &self,
        initial: &BTreeMap<State, f64>,
        steps: usize,
    ) -> Result<Vec<BTreeMap<State, f64>>, MarkovError> {
        self.matrix.check_closed()?;
        matrix::evolve(&self.matrix, initial, steps, &self.states)
    }

    /// The transition model.
    pub fn matrix(&self) -> &TransitionMatrix {
        &self.matrix
    }

    /// The source states, in the order used for prediction.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The state runs start from.
    pub fn start_state(&self) -> &State {
        self.engine.start()
    }

    /// The current state.
    pub fn current_state(&self) -> &State {
        self.engine.cursor()
    }

    /// Emitted states since the last reset.
    pub fn log(&self) -> &[State] {
        self.engine.log()
    }

    /// Visits per state since the last reset.
    pub fn counts(&self) -> &BTreeMap<State, usize> {
        self.engine.counts()
    }

    /// Longest run of identical consecutive states.
    pub fn longest_streak(&self) -> usize {
        self.engine.longest_streak()
    }

    /// 1-based step index of the first state change, or `None`.
    pub fn first_passage(&self) -> Option<usize> {
        self.engine.first_passage()
    }

    /// Steps since the last reset.
    pub fn total_steps(&self) -> usize {
        self.engine.total_steps()
    }

    /// Shannon entropy in bits of the visit counts.
    pub fn entropy(&self) -> f64 {
        self.engine.entropy()
    }

    /// Snapshot of the current statistics.
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_engine(&self.description, 1, &self.engine)
    }
}

/// A K-th order chain: the next state depends on the last K states.
///
/// K is the width of the initial history and never changes.
#[derive(Debug, Clone)]
pub struct HigherOrderChain {
    matrix: HigherOrderMatrix,
    description: String,
    alphabet: StateAlphabet,
    order: usize,
    engine: Engine<History>,
}

impl HigherOrderChain {
    /// Creates a chain over `matrix` starting from `initial`.
    ///
    /// # Errors
    ///
    /// - [`MarkovError::InvalidArgument`] if `initial` is empty or a matrix
    ///   row is keyed by a history of a different width.
    /// - [`MarkovError::Encoding`] if a state label cannot be part of a
    ///   history key.
    /// - [`MarkovError::UnknownHistory`] if `initial` has no row, or, when
    ///   coverage is required, if any possible history has no row.
    /// - Validation errors as for [`MarkovChain::new`].
    pub fn new(
        matrix: HigherOrderMatrix,
        initial: History,
        description: impl Into<String>,
        config: &ChainConfig,
    ) -> Result<Self, MarkovError> {
        if initial.is_empty() {
            return Err(MarkovError::InvalidArgument {
                reason: "initial history cannot be empty".to_string(),
            });
        }
        let order = initial.len();
        if let Some(bad) = matrix.sources().find(|h| h.len() != order) {
            return Err(MarkovError::InvalidArgument {
                reason: format!(
                    "history {bad} has width {}, expected {order}",
                    bad.len()
                ),
            });
        }
        validate_model(&matrix, config)?;

        let mut labels: Vec<State> = initial.states().to_vec();
        labels.extend(higher_order::alphabet(&matrix).iter().cloned());
        let alphabet = StateAlphabet::new(labels);
        let codec = HistoryCodec::default();
        codec.validate_alphabet(&alphabet)?;

        if !matrix.contains_source(&initial) {
            return Err(MarkovError::UnknownHistory {
                history: codec.encode(&initial)?,
            });
        }
        if config.require_coverage() {
            higher_order::check_coverage(&matrix, &alphabet, order)?;
        }

        let description = description.into();
        debug!(%description, %initial, order, "higher-order chain created");
        let engine = Engine::new(initial, &alphabet, config.rng());
        Ok(Self {
            matrix,
            description,
            alphabet,
            order,
            engine,
        })
    }

    /// Advances the chain by one transition and returns the emitted state.
    ///
    /// Fails with [`MarkovError::UnknownHistory`] if the current history has
    /// no row.
    pub fn step(&mut self) -> Result<State, MarkovError> {
        self.engine.step(&self.matrix)
    }

    /// Resets all counters, then simulates `steps` transitions.
    #[instrument(skip(self), fields(description = %self.description, order = self.order))]
    pub fn run(&mut self, steps: usize) -> Result<BTreeMap<State, usize>, MarkovError> {
        self.engine.run(&self.matrix, steps)
    }

    /// Exact `n`-step model: row `h` is the distribution of the state emitted
    /// `n` steps after observing `h`, for every history that has a row.
    ///
    /// Fails with [`MarkovError::UnknownHistory`] if a row leads to a history
    /// without one.
    #[instrument(skip(self), fields(description = %self.description, order = self.order))]
    pub fn predict_nth_state(&self, n: i64) -> Result<HigherOrderMatrix, MarkovError> {
        higher_order::power(&self.matrix, n, &self.alphabet, self.order)
    }

    /// Distribution of the emitted state for each of the next `steps` steps,
    /// starting from the initial history. Entry 0 is the initial history's
    /// most recent state.
    pub fn trajectory(&self, steps: usize) -> Result<Vec<BTreeMap<State, f64>>, MarkovError> {
        let histories =
            higher_order::covered_histories(&self.matrix, &self.alphabet, self.order)?;
        let lifted = higher_order::lift(&self.matrix, &histories);
        let initial = BTreeMap::from([(self.engine.start().clone(), 1.0)]);
        let dists = matrix::evolve(&lifted, &initial, steps, &histories)?;
        Ok(dists
            .into_iter()
            .map(|dist| {
                let mut by_state: BTreeMap<State, f64> = BTreeMap::new();
                for (h, p) in dist {
                    if let Some(last) = h.last() {
                        *by_state.entry(last.clone()).or_insert(0.0) += p;
                    }
                }
                by_state
            })
            .collect())
    }

    /// Possible histories with no row in the matrix.
    pub fn missing_histories(&self) -> Vec<History> {
        higher_order::missing_histories(&self.matrix, &self.alphabet, self.order)
    }

    /// The transition model.
    pub fn matrix(&self) -> &HigherOrderMatrix {
        &self.matrix
    }

    /// Every state the model mentions.
    pub fn alphabet(&self) -> &StateAlphabet {
        &self.alphabet
    }

    /// History width K.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The history runs start from.
    pub fn initial_history(&self) -> &History {
        self.engine.start()
    }

    /// The current history.
    pub fn current_history(&self) -> &History {
        self.engine.cursor()
    }

    /// Emitted states since the last reset.
    pub fn log(&self) -> &[State] {
        self.engine.log()
    }

    /// Visits per state since the last reset.
    pub fn counts(&self) -> &BTreeMap<State, usize> {
        self.engine.counts()
    }

    /// Longest run of identical consecutive states.
    pub fn longest_streak(&self) -> usize {
        self.engine.longest_streak()
    }

    /// 1-based step index of the first state change, or `None`.
    pub fn first_passage(&self) -> Option<usize> {
        self.engine.first_passage()
    }

    /// Steps since the last reset.
    pub fn total_steps(&self) -> usize {
        self.engine.total_steps()
    }

    /// Shannon entropy in bits of the visit counts.
    pub fn entropy(&self) -> f64 {
        self.engine.entropy()
    }

    /// Snapshot of the current statistics.
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_engine(&self.description, self.order, &self.engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::enumerate;
    use approx::assert_abs_diff_eq;

    fn s(label: &str) -> State {
        State::from(label)
    }

    fn seeded(seed: u64) -> ChainConfig {
        ChainConfig::new().with_seed(seed)
    }

    fn coin(stay: f64) -> TransitionMatrix {
        TransitionMatrix::from_entries([
            ("Heads", [("Heads", stay), ("Tails", 1.0 - stay)]),
            ("Tails", [("Heads", 1.0 - stay), ("Tails", stay)]),
        ])
    }

    #[test]
    fn explicit_start_is_used() {
        let chain = MarkovChain::new(coin(0.5), "fair", Some(s("Tails")), &seeded(1)).unwrap();
        assert_eq!(chain.current_state(), &s("Tails"));
        assert_eq!(chain.start_state(), &s("Tails"));
    }

    #[test]
    fn random_start_is_a_source_state() {
        for seed in 0..20 {
            let chain = MarkovChain::new(coin(0.5), "fair", None, &seeded(seed)).unwrap();
            assert!(chain.states().contains(chain.current_state()));
        }
    }

    #[test]
    fn unknown_start_rejected() {
        let err = MarkovChain::new(coin(0.5), "fair", Some(s("Edge")), &seeded(1)).unwrap_err();
        assert_eq!(
            err,
            MarkovError::UnknownState {
                state: "Edge".to_string()
            }
        );
    }

    #[test]
    fn strict_mode_rejects_short_row() {
        let m = TransitionMatrix::from_entries([("Heads", [("Heads", 0.5), ("Tails", 0.4)])]);
        let err = MarkovChain::new(m.clone(), "bad", None, &seeded(1)).unwrap_err();
        assert!(matches!(err, MarkovError::RowSumMismatch { .. }));

        let lenient = seeded(1).with_strict(false);
        assert!(MarkovChain::new(m, "bad", None, &lenient).is_ok());
    }

    #[test]
    fn empty_matrix_rejected() {
        let err = MarkovChain::new(TransitionMatrix::new(), "empty", None, &seeded(1)).unwrap_err();
        assert!(matches!(err, MarkovError::EmptyMatrix { .. }));
    }

    #[test]
    fn sticky_coin_run() {
        let mut chain = MarkovChain::new(
            TransitionMatrix::from_entries([
                ("Heads", [("Heads", 1.0), ("Tails", 0.0)]),
                ("Tails", [("Heads", 0.0), ("Tails", 1.0)]),
            ]),
            "sticky",
            Some(s("Heads")),
            &seeded(5),
        )
        .unwrap();
        let counts = chain.run(500).unwrap();
        assert_eq!(counts, BTreeMap::from([(s("Heads"), 500), (s("Tails"), 0)]));
        assert_eq!(chain.longest_streak(), 500);
        assert_eq!(chain.first_passage(), None);
        assert_eq!(chain.entropy(), 0.0);
        assert_eq!(chain.log().len(), 500);
    }

    #[test]
    fn run_restarts_from_start_state() {
        let m = TransitionMatrix::from_entries([("A", [("B", 1.0)]), ("B", [("A", 1.0)])]);
        let mut chain = MarkovChain::new(m, "flip", Some(s("A")), &seeded(1)).unwrap();
        chain.run(3).unwrap();
        assert_eq!(chain.current_state(), &s("B"));
        chain.run(1).unwrap();
        assert_eq!(chain.log(), &[s("B")]);
        assert_eq!(chain.first_passage(), Some(1));
    }

    #[test]
    fn predict_does_not_touch_counters() {
        let mut chain =
            MarkovChain::new(coin(0.9), "biased", Some(s("Heads")), &seeded(2)).unwrap();
        chain.run(50).unwrap();
        let before = chain.summary();
        let p2 = chain.predict_nth_state(2).unwrap();
        assert_abs_diff_eq!(p2.prob(&s("Heads"), &s("Heads")), 0.82, epsilon = 1e-12);
        assert_eq!(chain.summary(), before);
    }

    #[test]
    fn predict_negative_fails() {
        let chain = MarkovChain::new(coin(0.9), "biased", None, &seeded(2)).unwrap();
        assert!(matches!(
            chain.predict_nth_state(-3),
            Err(MarkovError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn predict_fails_when_destination_has_no_row() {
        let m = TransitionMatrix::from_entries([("A", [("B", 1.0)])]);
        let chain = MarkovChain::new(m, "leaky", Some(s("A")), &seeded(1)).unwrap();
        let missing = MarkovError::UnknownState {
            state: "B".to_string(),
        };
        assert_eq!(chain.predict_nth_state(1).unwrap_err(), missing);
        let initial = BTreeMap::from([(s("A"), 1.0)]);
        assert_eq!(chain.trajectory(&initial, 3).unwrap_err(), missing);
    }

    #[test]
    fn trajectory_starts_at_initial() {
        let chain = MarkovChain::new(coin(0.9), "biased", None, &seeded(2)).unwrap();
        let initial = BTreeMap::from([(s("Heads"), 0.5), (s("Tails"), 0.5)]);
        let traj = chain.trajectory(&initial, 10).unwrap();
        assert_eq!(traj.len(), 11);
        // Symmetric chain keeps the uniform distribution.
        for dist in &traj {
            assert_abs_diff_eq!(dist[&s("Heads")], 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn summary_reports_order_and_counts() {
        let mut chain = MarkovChain::new(coin(0.5), "fair", Some(s("Heads")), &seeded(3)).unwrap();
        chain.run(10).unwrap();
        let summary = chain.summary();
        assert_eq!(summary.order, 1);
        assert_eq!(summary.total_steps, 10);
        assert_eq!(summary.counts.values().sum::<usize>(), 10);
        assert_eq!(summary.final_position, chain.current_state().to_string());
    }

    fn two_day() -> HigherOrderMatrix {
        let mut m = HigherOrderMatrix::new();
        m.insert(History::new(["Rainy", "Rainy"]), s("Rainy"), 1.0);
        m.insert(History::new(["Sunny", "Sunny"]), s("Sunny"), 1.0);
        m.insert(History::new(["Rainy", "Sunny"]), s("Sunny"), 1.0);
        m.insert(History::new(["Sunny", "Rainy"]), s("Rainy"), 1.0);
        m
    }

    #[test]
    fn higher_order_infers_order() {
        let chain =
            HigherOrderChain::new(two_day(), History::new(["Rainy", "Sunny"]), "k2", &seeded(1))
                .unwrap();
        assert_eq!(chain.order(), 2);
        assert_eq!(chain.alphabet().len(), 2);
        assert!(chain.missing_histories().is_empty());
    }

    #[test]
    fn higher_order_slides_window() {
        let mut chain =
            HigherOrderChain::new(two_day(), History::new(["Rainy", "Sunny"]), "k2", &seeded(1))
                .unwrap();
        assert_eq!(chain.step().unwrap(), s("Sunny"));
        assert_eq!(chain.current_history(), &History::new(["Sunny", "Sunny"]));
        assert_eq!(chain.first_passage(), None);
        assert_eq!(chain.longest_streak(), 1);
    }

    #[test]
    fn higher_order_empty_initial_rejected() {
        let err =
            HigherOrderChain::new(two_day(), History::default(), "k0", &seeded(1)).unwrap_err();
        assert!(matches!(err, MarkovError::InvalidArgument { .. }));
    }

    #[test]
    fn higher_order_width_mismatch_rejected() {
        let mut m = two_day();
        m.insert(History::new(["Sunny"]), s("Sunny"), 1.0);
        let err = HigherOrderChain::new(m, History::new(["Sunny", "Sunny"]), "mixed", &seeded(1))
            .unwrap_err();
        assert!(matches!(err, MarkovError::InvalidArgument { .. }));
    }

    #[test]
    fn higher_order_separator_in_label_rejected() {
        let mut m = HigherOrderMatrix::new();
        m.insert(History::new(["a|b"]), s("a|b"), 1.0);
        let err = HigherOrderChain::new(m, History::new(["a|b"]), "bad", &seeded(1)).unwrap_err();
        assert!(matches!(err, MarkovError::Encoding { .. }));
    }

    #[test]
    fn higher_order_unknown_initial_rejected() {
        let mut m = HigherOrderMatrix::new();
        m.insert(History::new(["Sunny", "Sunny"]), s("Sunny"), 1.0);
        let err = HigherOrderChain::new(m, History::new(["Rainy", "Sunny"]), "gap", &seeded(1))
            .unwrap_err();
        assert_eq!(
            err,
            MarkovError::UnknownHistory {
                history: "Rainy|Sunny".to_string()
            }
        );
    }

    #[test]
    fn higher_order_unreachable_row_fails_during_run() {
        let mut m = HigherOrderMatrix::new();
        m.insert(History::new(["Sunny", "Sunny"]), s("Rainy"), 1.0);
        let mut chain =
            HigherOrderChain::new(m, History::new(["Sunny", "Sunny"]), "gap", &seeded(1)).unwrap();
        let err = chain.run(5).unwrap_err();
        assert_eq!(
            err,
            MarkovError::UnknownHistory {
                history: "Sunny|Rainy".to_string()
            }
        );
        assert_eq!(chain.log(), &[s("Rainy")]);
    }

    #[test]
    fn higher_order_coverage_required() {
        let mut m = HigherOrderMatrix::new();
        m.insert(History::new(["Sunny", "Sunny"]), s("Rainy"), 1.0);
        let config = seeded(1).with_require_coverage(true);
        let err =
            HigherOrderChain::new(m, History::new(["Sunny", "Sunny"]), "gap", &config).unwrap_err();
        assert!(matches!(err, MarkovError::UnknownHistory { .. }));
    }

    #[test]
    fn higher_order_predict_zero() {
        let chain =
            HigherOrderChain::new(two_day(), History::new(["Rainy", "Sunny"]), "k2", &seeded(1))
                .unwrap();
        let p0 = chain.predict_nth_state(0).unwrap();
        assert_eq!(p0.prob(&History::new(["Sunny", "Rainy"]), &s("Rainy")), 1.0);
    }

    #[test]
    fn higher_order_predict_fails_on_uncovered_history() {
        let mut m = HigherOrderMatrix::new();
        m.insert(History::new(["Sunny", "Sunny"]), s("Rainy"), 1.0);
        let chain =
            HigherOrderChain::new(m, History::new(["Sunny", "Sunny"]), "gap", &seeded(1)).unwrap();
        let missing = MarkovError::UnknownHistory {
            history: "Sunny|Rainy".to_string(),
        };
        assert_eq!(chain.predict_nth_state(2).unwrap_err(), missing);
        assert_eq!(chain.trajectory(2).unwrap_err(), missing);
    }

    #[test]
    fn higher_order_trajectory_matches_prediction() {
        let mut m = HigherOrderMatrix::new();
        for h in enumerate(&StateAlphabet::new(["Rainy", "Sunny"]), 2) {
            m.insert(h.clone(), s("Rainy"), 0.3);
            m.insert(h, s("Sunny"), 0.7);
        }
        let initial = History::new(["Rainy", "Rainy"]);
        let chain = HigherOrderChain::new(m, initial.clone(), "k2", &seeded(1)).unwrap();
        let traj = chain.trajectory(4).unwrap();
        assert_eq!(traj.len(), 5);
        assert_eq!(traj[0][&s("Rainy")], 1.0);
        let p3 = chain.predict_nth_state(3).unwrap();
        assert_abs_diff_eq!(traj[3][&s("Sunny")], p3.prob(&initial, &s("Sunny")), epsilon = 1e-12);
        assert_abs_diff_eq!(traj[3][&s("Sunny")], 0.7, epsilon = 1e-12);
    }
}
