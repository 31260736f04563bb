//! Fixed-width state histories and their composite string keys.
//!
//! A [`History`] is the ordered window of the K most recent states (oldest
//! first). It is a value type and is used directly as a map key; the
//! [`HistoryCodec`] converts it to and from a single string key for
//! configuration files and reports.

use std::fmt;

use crate::error::MarkovError;
use crate::state::{State, StateAlphabet};

/// Separator used by [`HistoryCodec::default`].
pub const DEFAULT_SEPARATOR: char = '|';

/// An ordered window of states, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct History(Vec<State>);

impl History {
    /// Creates a history from states ordered oldest first.
    pub fn new<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        Self(states.into_iter().map(Into::into).collect())
    }

    /// Width of the window.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the zero-width history.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The states, oldest first.
    pub fn states(&self) -> &[State] {
        &self.0
    }

    /// The most recently observed state.
    pub fn last(&self) -> Option<&State> {
        self.0.last()
    }

    /// Slides the window: drops the oldest state and appends `next`.
    ///
    /// The width never changes; a zero-width history stays empty.
    pub fn shift(&mut self, next: State) {
        if self.0.is_empty() {
            return;
        }
        self.0.rotate_left(1);
        if let Some(slot) = self.0.last_mut() {
            *slot = next;
        }
    }

    /// Returns the history obtained by observing `next` after `self`.
    pub fn shifted(&self, next: State) -> Self {
        let mut h = self.clone();
        h.shift(next);
        h
    }
}

impl fmt::Display for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{DEFAULT_SEPARATOR}")?;
            }
            f.write_str(s.as_str())?;
        }
        Ok(())
    }
}

impl From<Vec<State>> for History {
    fn from(states: Vec<State>) -> Self {
        Self(states)
    }
}

/// Encodes histories as `separator`-joined strings and decodes them back.
///
/// Encoding is injective only when no label is empty or contains the
/// separator; both are rejected with [`MarkovError::Encoding`].
///
/// # Example
///
/// ```
/// use chainsim_markov::{History, HistoryCodec};
///
/// let codec = HistoryCodec::default();
/// let h = History::new(["Sunny", "Rainy"]);
/// let key = codec.encode(&h).unwrap();
/// assert_eq!(key, "Sunny|Rainy");
/// assert_eq!(codec.decode(&key).unwrap(), h);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCodec {
    separator: char,
}

impl Default for HistoryCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl HistoryCodec {
    /// Creates a codec with a custom separator.
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Returns the separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Checks that a single label can take part in a key.
    pub fn check_label(&self, label: &str) -> Result<(), MarkovError> {
        if label.is_empty() {
            return Err(MarkovError::Encoding {
                label: label.to_string(),
                reason: "label is empty".to_string(),
            });
        }
        if label.contains(self.separator) {
            return Err(MarkovError::Encoding {
                label: label.to_string(),
                reason: format!("contains separator '{}'", self.separator),
            });
        }
        Ok(())
    }

    /// Checks every label of an alphabet.
    pub fn validate_alphabet(&self, alphabet: &StateAlphabet) -> Result<(), MarkovError> {
        alphabet.iter().try_for_each(|s| self.check_label(s.as_str()))
    }

    /// Joins the labels of `history` into one key.
    pub fn encode(&self, history: &History) -> Result<String, MarkovError> {
        let mut key = String::new();
        for (i, s) in history.states().iter().enumerate() {
            self.check_label(s.as_str())?;
            if i > 0 {
                key.push(self.separator);
            }
            key.push_str(s.as_str());
        }
        Ok(key)
    }

    /// Splits a key back into its history. The empty key is the empty history.
    pub fn decode(&self, key: &str) -> Result<History, MarkovError> {
        if key.is_empty() {
            return Ok(History::default());
        }
        key.split(self.separator)
            .map(|part| {
                self.check_label(part)?;
                Ok(State::from(part))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(History::from)
    }
}

/// Enumerates every history of width `k` over `alphabet`, in lexicographic order.
///
/// Yields `alphabet.len().pow(k)` distinct histories. For `k = 0` this is a
/// single empty history.
pub fn enumerate(alphabet: &StateAlphabet, k: usize) -> Vec<History> {
    let mut histories = vec![History::default()];
    for _ in 0..k {
        let mut next = Vec::with_capacity(histories.len() * alphabet.len());
        for prefix in &histories {
            for s in alphabet {
                let mut states = prefix.states().to_vec();
                states.push(s.clone());
                next.push(History::from(states));
            }
        }
        histories = next;
    }
    histories
}
