//! Algebra for K-th order transition models.
//!
//! A [`HigherOrderMatrix`] maps a history of the last K states to a
//! distribution over the next state. Emitting state `s` from history `h`
//! moves the chain to `h.shifted(s)`; for K = 1 this promotes `s` to the
//! single-state history of having just observed it.
//!
//! Exponentiation does not compose history -> state matrices directly, since
//! for K > 1 the distribution of the emitted state alone does not determine
//! the next history. Instead the model is lifted to a square history ->
//! history matrix over every enumerated history, raised to the power with the
//! generic algebra in [`crate::matrix`], and projected back onto the most
//! recent state of each target history.

use std::collections::BTreeMap;

use crate::error::MarkovError;
use crate::history::{History, HistoryCodec, enumerate};
use crate::matrix::{self, Matrix};
use crate::state::{State, StateAlphabet};

/// A K-th order transition matrix: history -> next state -> probability.
pub type HigherOrderMatrix = Matrix<History, State>;

/// Every state mentioned by a higher-order matrix, in histories or destinations.
pub fn alphabet(p: &HigherOrderMatrix) -> StateAlphabet {
    let mut states: Vec<State> = p
        .sources()
        .flat_map(|h| h.states().iter().cloned())
        .collect();
    states.extend(p.destinations().into_iter().cloned());
    StateAlphabet::new(states)
}

/// The zero-step model: each history emits its own most recent state.
///
/// Zero-width histories have no most recent state and get no row.
pub fn identity(histories: &[History]) -> HigherOrderMatrix {
    let mut out = HigherOrderMatrix::new();
    for h in histories {
        if let Some(last) = h.last() {
            out.insert(h.clone(), last.clone(), 1.0);
        }
    }
    out
}

/// Lifts `p` to a square history -> history matrix over `histories`.
///
/// `L[h][h.shifted(s)] = P[h][s]`. Histories without a row in `p` get no row.
pub fn lift(p: &HigherOrderMatrix, histories: &[History]) -> Matrix<History> {
    let mut out = Matrix::new();
    for h in histories {
        let Some(row) = p.row(h) else {
            continue;
        };
        let mut lifted = BTreeMap::new();
        for (s, &prob) in row {
            *lifted.entry(h.shifted(s.clone())).or_insert(0.0) += prob;
        }
        out.insert_row(h.clone(), lifted);
    }
    out
}

/// Projects a history -> history matrix onto the most recent state of each target.
pub fn project(lifted: &Matrix<History>) -> HigherOrderMatrix {
    let mut out = HigherOrderMatrix::new();
    for (from, row) in lifted.rows() {
        let mut projected: BTreeMap<State, f64> = BTreeMap::new();
        for (to, &prob) in row {
            if let Some(last) = to.last() {
                *projected.entry(last.clone()).or_insert(0.0) += prob;
            }
        }
        out.insert_row(from.clone(), projected);
    }
    out
}

/// One-step composition: `C[h][s] = sum_t A[h][t] * B[h.shifted(t)][s]`.
///
/// Exact when `a` is the one-step model, so `multiply(P, P^m) = P^(m+1)` for
/// any order. For K = 1 it is exact for any two powers.
///
/// # Errors
///
/// Returns [`MarkovError::Domain`] if `histories` repeats a history.
pub fn multiply(
    a: &HigherOrderMatrix,
    b: &HigherOrderMatrix,
    histories: &[History],
) -> Result<HigherOrderMatrix, MarkovError> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = HigherOrderMatrix::new();
    for h in histories {
        if !seen.insert(h) {
            return Err(MarkovError::Domain {
                reason: format!("duplicate key {h}"),
            });
        }
        let mut row: BTreeMap<State, f64> = BTreeMap::new();
        if let Some(a_row) = a.row(h) {
            for (t, &pa) in a_row {
                if pa == 0.0 {
                    continue;
                }
                if let Some(b_row) = b.row(&h.shifted(t.clone())) {
                    for (s, &pb) in b_row {
                        *row.entry(s.clone()).or_insert(0.0) += pa * pb;
                    }
                }
            }
        }
        out.insert_row(h.clone(), row);
    }
    Ok(out)
}

/// Checks that every history reachable from a row of `p` has a row itself,
/// so no probability mass leaves the model.
///
/// # Errors
///
/// Returns [`MarkovError::UnknownHistory`] for the first history reached
/// with positive probability that has no row.
pub fn check_closed(p: &HigherOrderMatrix) -> Result<(), MarkovError> {
    for (h, row) in p.rows() {
        for (s, &prob) in row {
            let next = h.shifted(s.clone());
            if prob > 0.0 && !p.contains_source(&next) {
                return Err(unknown_history(&next));
            }
        }
    }
    Ok(())
}

/// Every width-`k` history of `alphabet` that has a row in `p`, in
/// enumeration order, after checking that `p` is closed.
///
/// # Errors
///
/// Returns [`MarkovError::InvalidArgument`] for `k = 0` and the error of
/// [`check_closed`].
pub fn covered_histories(
    p: &HigherOrderMatrix,
    alphabet: &StateAlphabet,
    k: usize,
) -> Result<Vec<History>, MarkovError> {
    if k == 0 {
        return Err(MarkovError::InvalidArgument {
            reason: "history width must be at least 1".to_string(),
        });
    }
    check_closed(p)?;
    Ok(enumerate(alphabet, k)
        .into_iter()
        .filter(|h| p.contains_source(h))
        .collect())
}

/// Computes the n-step model over every width-`k` history of `alphabet`
/// that has a row in `p`.
///
/// Row `h` of the result is the distribution of the state emitted `n` steps
/// after observing `h`. `n = 0` yields [`identity`].
///
/// # Errors
///
/// Returns [`MarkovError::InvalidArgument`] for negative `n` or `k = 0`, and
/// [`MarkovError::UnknownHistory`] if a row leads to a history without one.
pub fn power(
    p: &HigherOrderMatrix,
    n: i64,
    alphabet: &StateAlphabet,
    k: usize,
) -> Result<HigherOrderMatrix, MarkovError> {
    if n < 0 {
        return Err(MarkovError::InvalidArgument {
            reason: format!("negative exponent {n}"),
        });
    }
    let histories = covered_histories(p, alphabet, k)?;
    let lifted = lift(p, &histories);
    let raised = matrix::power(&lifted, n, &histories)?;
    Ok(project(&raised))
}

/// Lists every width-`k` history over `alphabet` that has no row in `p`.
pub fn missing_histories(
    p: &HigherOrderMatrix,
    alphabet: &StateAlphabet,
    k: usize,
) -> Vec<History> {
    enumerate(alphabet, k)
        .into_iter()
        .filter(|h| !p.contains_source(h))
        .collect()
}

/// Fails with [`MarkovError::UnknownHistory`] on the first uncovered history.
pub fn check_coverage(
    p: &HigherOrderMatrix,
    alphabet: &StateAlphabet,
    k: usize,
) -> Result<(), MarkovError> {
    match missing_histories(p, alphabet, k).first() {
        None => Ok(()),
        Some(h) => Err(unknown_history(h)),
    }
}

fn unknown_history(h: &History) -> MarkovError {
    MarkovError::UnknownHistory {
        history: HistoryCodec::default()
            .encode(h)
            .unwrap_or_else(|_| h.to_string()),
    }
}
