//! Error types for the chainsim-markov crate.

/// Error type for all fallible operations in the chainsim-markov crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarkovError {
    /// Returned when an argument is outside its valid domain.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when the current state has no outgoing row in the matrix.
    #[error("unknown state: {state:?} has no outgoing transition row")]
    UnknownState {
        /// Label of the missing source state.
        state: String,
    },

    /// Returned when the current history has no row in a higher-order matrix.
    #[error("unknown history: {history} has no outgoing transition row")]
    UnknownHistory {
        /// Encoded form of the missing history.
        history: String,
    },

    /// Returned when a label cannot be encoded into a history key.
    #[error("cannot encode state {label:?}: {reason}")]
    Encoding {
        /// The offending label.
        label: String,
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a key ordering cannot index a matrix.
    #[error("invalid key order: {reason}")]
    Domain {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when a probability is non-finite or outside `[0, 1]`.
    #[error("invalid probability {value} for {from} -> {to}")]
    InvalidProbability {
        /// Source key of the offending entry.
        from: String,
        /// Destination state of the offending entry.
        to: String,
        /// The invalid value.
        value: f64,
    },

    /// Returned when a row does not sum to 1 within tolerance.
    #[error("row {from} sums to {sum}, expected 1.0 (tolerance {tolerance})")]
    RowSumMismatch {
        /// Source key of the offending row.
        from: String,
        /// Actual row sum.
        sum: f64,
        /// Tolerance in effect.
        tolerance: f64,
    },

    /// Returned when a matrix has no rows, or a row has no entries.
    #[error("empty transition matrix: {reason}")]
    EmptyMatrix {
        /// Description of the problem.
        reason: String,
    },
}
