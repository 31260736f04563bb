//! Generic stepping engine shared by first- and higher-order chains.
//!
//! The [`Engine`] owns everything that changes during a simulation: the
//! cursor (current state or current history), the random source, visit
//! counts, the visit log, and the streak and first-passage statistics. It is
//! parameterized by the cursor type, which is also the row key of the
//! transition matrix it samples from.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::error::MarkovError;
use crate::history::History;
use crate::matrix::{Matrix, sample_row};
use crate::state::{State, StateAlphabet};

/// The position of a chain, used as the row key of its transition matrix.
pub trait Cursor: Clone + Ord + fmt::Debug {
    /// The most recently observed state, if any.
    fn current(&self) -> Option<&State>;

    /// Moves the cursor after `next` has been emitted.
    fn advance(&mut self, next: &State);

    /// The error reported when this cursor has no row in the matrix.
    fn unknown(&self) -> MarkovError;
}

impl Cursor for State {
    fn current(&self) -> Option<&State> {
        Some(self)
    }

    fn advance(&mut self, next: &State) {
        *self = next.clone();
    }

    fn unknown(&self) -> MarkovError {
        MarkovError::UnknownState {
            state: self.to_string(),
        }
    }
}

impl Cursor for History {
    fn current(&self) -> Option<&State> {
        self.last()
    }

    fn advance(&mut self, next: &State) {
        self.shift(next.clone());
    }

    fn unknown(&self) -> MarkovError {
        MarkovError::UnknownHistory {
            history: self.to_string(),
        }
    }
}

/// Mutable simulation state of one chain.
#[derive(Debug, Clone)]
pub struct Engine<C: Cursor> {
    start: C,
    cursor: C,
    rng: StdRng,
    known: Vec<State>,
    counts: BTreeMap<State, usize>,
    log: Vec<State>,
    current_streak: usize,
    longest_streak: usize,
    first_passage: Option<usize>,
    total_steps: usize,
}

impl<C: Cursor> Engine<C> {
    /// Creates an engine positioned at `start`.
    ///
    /// Every state of `alphabet` is reported in the counts, with zero if never
    /// visited.
    pub fn new(start: C, alphabet: &StateAlphabet, rng: StdRng) -> Self {
        let known = alphabet.states().to_vec();
        let counts = known.iter().map(|s| (s.clone(), 0)).collect();
        Self {
            cursor: start.clone(),
            start,
            rng,
            known,
            counts,
            log: Vec::new(),
            current_streak: 0,
            longest_streak: 0,
            first_passage: None,
            total_steps: 0,
        }
    }

    /// Clears all counters and returns the cursor to the start position.
    ///
    /// The random source is not re-seeded.
    pub fn reset(&mut self) {
        self.cursor = self.start.clone();
        self.counts = self.known.iter().map(|s| (s.clone(), 0)).collect();
        self.log.clear();
        self.current_streak = 0;
        self.longest_streak = 0;
        self.first_passage = None;
        self.total_steps = 0;
    }

    /// Samples one transition from `matrix` and records it.
    ///
    /// # Errors
    ///
    /// Returns the cursor's unknown-key error if the current position has no
    /// row, or [`MarkovError::EmptyMatrix`] if that row is empty.
    pub fn step(&mut self, matrix: &Matrix<C, State>) -> Result<State, MarkovError> {
        let row = matrix.row(&self.cursor).ok_or_else(|| self.cursor.unknown())?;
        let u: f64 = self.rng.random();
        let next = sample_row(row, u)
            .ok_or_else(|| MarkovError::EmptyMatrix {
                reason: format!("row {:?} has no entries", self.cursor),
            })?
            .clone();

        self.total_steps += 1;
        if self.cursor.current() == Some(&next) {
            self.current_streak += 1;
        } else {
            if self.first_passage.is_none() {
                self.first_passage = Some(self.total_steps);
            }
            self.current_streak = 1;
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);

        trace!(step = self.total_steps, u, next = %next, "transition");
        *self.counts.entry(next.clone()).or_insert(0) += 1;
        self.log.push(next.clone());
        self.cursor.advance(&next);
        Ok(next)
    }

    /// Resets, then steps `steps` times, returning the visit counts.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::InvalidArgument`] if `steps` is 0, or the first
    /// error from [`step`](Self::step).
    pub fn run(
        &mut self,
        matrix: &Matrix<C, State>,
        steps: usize,
    ) -> Result<BTreeMap<State, usize>, MarkovError> {
        if steps == 0 {
            return Err(MarkovError::InvalidArgument {
                reason: "steps must be positive".to_string(),
            });
        }
        self.reset();
        for _ in 0..steps {
            self.step(matrix)?;
        }
        debug!(
            steps,
            longest_streak = self.longest_streak,
            first_passage = ?self.first_passage,
            "run complete"
        );
        Ok(self.counts.clone())
    }

    /// The start position restored by [`reset`](Self::reset).
    pub fn start(&self) -> &C {
        &self.start
    }

    /// The current position.
    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    /// Visits per state since the last reset.
    pub fn counts(&self) -> &BTreeMap<State, usize> {
        &self.counts
    }

    /// Emitted states in order since the last reset.
    pub fn log(&self) -> &[State] {
        &self.log
    }

    /// Length of the run of identical states ending at the last step.
    pub fn current_streak(&self) -> usize {
        self.current_streak
    }

    /// Longest run of identical consecutive states since the last reset.
    pub fn longest_streak(&self) -> usize {
        self.longest_streak
    }

    /// 1-based index of the first step that changed state, if any.
    pub fn first_passage(&self) -> Option<usize> {
        self.first_passage
    }

    /// Steps taken since the last reset.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Shannon entropy in bits of the visit counts.
    pub fn entropy(&self) -> f64 {
        chainsim_stats::entropy(self.counts.values().copied(), self.total_steps)
    }
}
