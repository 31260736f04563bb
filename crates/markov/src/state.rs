//! State labels and the alphabet they are drawn from.

use std::borrow::Borrow;
use std::fmt;

/// An opaque state label.
///
/// Identity is exact string equality. Where an ordering is needed (matrix
/// iteration, sampling, enumeration) states compare lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct State(String);

impl State {
    /// Creates a state from any string-like label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for State {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for State {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl Borrow<str> for State {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A finite, lexically ordered set of states without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateAlphabet {
    states: Vec<State>,
}

impl StateAlphabet {
    /// Builds an alphabet from any collection of states, sorting and removing duplicates.
    pub fn new<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        let mut states: Vec<State> = states.into_iter().map(Into::into).collect();
        states.sort();
        states.dedup();
        Self { states }
    }

    /// Number of distinct states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns `true` if the alphabet has no states.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns `true` if `state` belongs to the alphabet.
    pub fn contains(&self, state: &str) -> bool {
        self.states
            .binary_search_by(|s| s.as_str().cmp(state))
            .is_ok()
    }

    /// The states in lexical order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Iterates the states in lexical order.
    pub fn iter(&self) -> std::slice::Iter<'_, State> {
        self.states.iter()
    }
}

impl<'a> IntoIterator for &'a StateAlphabet {
    type Item = &'a State;
    type IntoIter = std::slice::Iter<'a, State>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
