//! Sparse row-stochastic matrices and their algebra.
//!
//! A [`Matrix`] maps a source key to a distribution over destination keys.
//! Missing entries are zero. The algebra functions ([`identity`],
//! [`multiply`], [`power`], [`evolve`]) work on square matrices over any
//! ordered key type and always iterate keys in the caller-supplied `order`,
//! so the same code serves raw states and lifted histories.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::MarkovError;
use crate::state::{State, StateAlphabet};

/// A first-order transition matrix: state -> state -> probability.
pub type TransitionMatrix = Matrix<State>;

/// A mapping from source key to a probability distribution over destinations.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<R: Ord, C: Ord = R> {
    rows: BTreeMap<R, BTreeMap<C, f64>>,
}

impl<R: Ord, C: Ord> Default for Matrix<R, C> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<R: Ord, C: Ord> Matrix<R, C> {
    /// Creates an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps pre-built rows.
    pub fn from_rows(rows: BTreeMap<R, BTreeMap<C, f64>>) -> Self {
        Self { rows }
    }

    /// Builds a matrix from nested `(from, [(to, p), ..])` entries.
    ///
    /// # Example
    ///
    /// ```
    /// use chainsim_markov::TransitionMatrix;
    ///
    /// let m = TransitionMatrix::from_entries([
    ///     ("Heads", [("Heads", 0.5), ("Tails", 0.5)]),
    ///     ("Tails", [("Heads", 0.5), ("Tails", 0.5)]),
    /// ]);
    /// assert_eq!(m.len(), 2);
    /// ```
    pub fn from_entries<I, J, RK, CK>(entries: I) -> Self
    where
        I: IntoIterator<Item = (RK, J)>,
        J: IntoIterator<Item = (CK, f64)>,
        RK: Into<R>,
        CK: Into<C>,
    {
        let rows = entries
            .into_iter()
            .map(|(from, row)| {
                let row = row.into_iter().map(|(to, p)| (to.into(), p)).collect();
                (from.into(), row)
            })
            .collect();
        Self { rows }
    }

    /// Sets a single entry, creating the row if needed.
    pub fn insert(&mut self, from: R, to: C, p: f64) {
        self.rows.entry(from).or_default().insert(to, p);
    }

    /// Replaces a whole row.
    pub fn insert_row(&mut self, from: R, row: BTreeMap<C, f64>) {
        self.rows.insert(from, row);
    }

    /// Returns the outgoing distribution of `from`, in destination order.
    pub fn row(&self, from: &R) -> Option<&BTreeMap<C, f64>> {
        self.rows.get(from)
    }

    /// Returns the probability of `from -> to`; missing entries are 0.
    pub fn prob(&self, from: &R, to: &C) -> f64 {
        self.rows
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0.0)
    }

    /// Iterates rows in source order.
    pub fn rows(&self) -> impl Iterator<Item = (&R, &BTreeMap<C, f64>)> {
        self.rows.iter()
    }

    /// Iterates source keys in order.
    pub fn sources(&self) -> impl Iterator<Item = &R> {
        self.rows.keys()
    }

    /// Returns `true` if `from` has a row.
    pub fn contains_source(&self, from: &R) -> bool {
        self.rows.contains_key(from)
    }

    /// All destination keys that appear in any row.
    pub fn destinations(&self) -> BTreeSet<&C> {
        self.rows.values().flat_map(|row| row.keys()).collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: Ord + fmt::Display, C: Ord + fmt::Display> Matrix<R, C> {
    /// Checks structure only: at least one row, no empty rows, and every
    /// probability finite and in `[0, 1]`.
    pub fn validate_entries(&self) -> Result<(), MarkovError> {
        if self.rows.is_empty() {
            return Err(MarkovError::EmptyMatrix {
                reason: "no rows".to_string(),
            });
        }
        for (from, row) in &self.rows {
            if row.is_empty() {
                return Err(MarkovError::EmptyMatrix {
                    reason: format!("row {from} has no entries"),
                });
            }
            for (to, &p) in row {
                if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                    return Err(MarkovError::InvalidProbability {
                        from: from.to_string(),
                        to: to.to_string(),
                        value: p,
                    });
                }
            }
        }
        Ok(())
    }

    /// Validates that the matrix is row-stochastic.
    ///
    /// In addition to [`validate_entries`](Self::validate_entries), every row
    /// must sum to 1.0 within `tolerance`.
    pub fn validate(&self, tolerance: f64) -> Result<(), MarkovError> {
        self.validate_entries()?;
        for (from, row) in &self.rows {
            let sum: f64 = row.values().sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(MarkovError::RowSumMismatch {
                    from: from.to_string(),
                    sum,
                    tolerance,
                });
            }
        }
        Ok(())
    }
}

impl<R: Ord> Matrix<R, State> {
    /// Every state that appears as a destination, as an alphabet.
    pub fn destination_alphabet(&self) -> StateAlphabet {
        StateAlphabet::new(self.destinations().into_iter().cloned())
    }
}

impl Matrix<State> {
    /// Every state that appears as a source or a destination.
    pub fn alphabet(&self) -> StateAlphabet {
        StateAlphabet::new(
            self.sources()
                .chain(self.destinations())
                .cloned()
                .collect::<Vec<_>>(),
        )
    }

    /// Checks that every destination reachable with positive probability has
    /// its own row, so no probability mass leaves the matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MarkovError::UnknownState`] for the first destination
    /// without a row.
    pub fn check_closed(&self) -> Result<(), MarkovError> {
        for row in self.rows.values() {
            for (to, &p) in row {
                if p > 0.0 && !self.rows.contains_key(to) {
                    return Err(MarkovError::UnknownState {
                        state: to.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<R: Ord, C: Ord> FromIterator<(R, BTreeMap<C, f64>)> for Matrix<R, C> {
    fn from_iter<T: IntoIterator<Item = (R, BTreeMap<C, f64>)>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Picks a destination from `row` for the uniform draw `u` in `[0, 1)`.
///
/// Walks destinations in key order, accumulating probability, and returns
/// the first one with `u < cumulative`. If rounding exhausts the row, the
/// last destination with positive probability is returned (or the last
/// destination if every entry is zero). Returns `None` only for an empty row.
pub fn sample_row<C: Ord>(row: &BTreeMap<C, f64>, u: f64) -> Option<&C> {
    let mut cumulative = 0.0;
    let mut fallback = None;
    for (to, &p) in row {
        cumulative += p;
        if u < cumulative {
            return Some(to);
        }
        if p > 0.0 {
            fallback = Some(to);
        }
    }
    fallback.or_else(|| row.keys().next_back())
}

/// Rejects orders that repeat a key; a repeated key would be summed twice.
fn check_order<K: Ord + fmt::Display>(order: &[K]) -> Result<(), MarkovError> {
    let mut seen = BTreeSet::new();
    for k in order {
        if !seen.insert(k) {
            return Err(MarkovError::Domain {
                reason: format!("duplicate key {k}"),
            });
        }
    }
    Ok(())
}

/// The identity over `order`: `I[k][k] = 1.0`, everything else absent.
pub fn identity<K: Ord + Clone>(order: &[K]) -> Matrix<K> {
    order
        .iter()
        .map(|k| (k.clone(), BTreeMap::from([(k.clone(), 1.0)])))
        .collect()
}

/// Matrix product over `order`: `C[i][j] = sum_k A[i][k] * B[k][j]`.
///
/// The result is dense over `order`; keys outside `order` are ignored.
///
/// # Errors
///
/// Returns [`MarkovError::Domain`] if `order` repeats a key.
pub fn multiply<K>(a: &Matrix<K>, b: &Matrix<K>, order: &[K]) -> Result<Matrix<K>, MarkovError>
where
    K: Ord + Clone + fmt::Display,
{
    check_order(order)?;
    Ok(multiply_unchecked(a, b, order))
}

fn multiply_unchecked<K: Ord + Clone>(a: &Matrix<K>, b: &Matrix<K>, order: &[K]) -> Matrix<K> {
    let mut c = Matrix::new();
    for i in order {
        let mut row = BTreeMap::new();
        let a_row = a.row(i);
        for j in order {
            let mut sum = 0.0;
            if let Some(a_row) = a_row {
                for k in order {
                    let aik = a_row.get(k).copied().unwrap_or(0.0);
                    if aik != 0.0 {
                        sum += aik * b.prob(k, j);
                    }
                }
            }
            row.insert(j.clone(), sum);
        }
        c.insert_row(i.clone(), row);
    }
    c
}

/// Computes `P^n` over `order` by repeated squaring. `P^0` is [`identity`].
///
/// # Errors
///
/// Returns [`MarkovError::InvalidArgument`] for negative `n` and
/// [`MarkovError::Domain`] if `order` repeats a key.
pub fn power<K>(p: &Matrix<K>, n: i64, order: &[K]) -> Result<Matrix<K>, MarkovError>
where
    K: Ord + Clone + fmt::Display,
{
    if n < 0 {
        return Err(MarkovError::InvalidArgument {
            reason: format!("negative exponent {n}"),
        });
    }
    check_order(order)?;
    let mut result = identity(order);
    let mut base = p.clone();
    let mut n = n as u64;
    while n > 0 {
        if n & 1 == 1 {
            result = multiply_unchecked(&result, &base, order);
        }
        n >>= 1;
        if n > 0 {
            base = multiply_unchecked(&base, &base, order);
        }
    }
    Ok(result)
}

/// Upper bound on the distributions reserved up front by [`evolve`].
const EVOLVE_PREALLOC: usize = 1024;

/// Propagates a distribution through `p` for `steps` steps.
///
/// Returns `steps + 1` distributions: `initial` restricted to `order`
/// followed by `pi_{t+1}[j] = sum_i pi_t[i] * P[i][j]`.
///
/// # Errors
///
/// Returns [`MarkovError::InvalidArgument`] if `steps + 1` distributions
/// cannot be indexed, and [`MarkovError::Domain`] if `order` repeats a key.
pub fn evolve<K>(
    p: &Matrix<K>,
    initial: &BTreeMap<K, f64>,
    steps: usize,
    order: &[K],
) -> Result<Vec<BTreeMap<K, f64>>, MarkovError>
where
    K: Ord + Clone + fmt::Display,
{
    let len = steps
        .checked_add(1)
        .ok_or_else(|| MarkovError::InvalidArgument {
            reason: format!("trajectory of {steps} steps is too long"),
        })?;
    check_order(order)?;
    let mut out = Vec::with_capacity(len.min(EVOLVE_PREALLOC));
    let mut current: BTreeMap<K, f64> = order
        .iter()
        .map(|k| (k.clone(), initial.get(k).copied().unwrap_or(0.0)))
        .collect();
    for _ in 0..steps {
        let next = order
            .iter()
            .map(|j| {
                let mass = order
                    .iter()
                    .map(|i| current.get(i).copied().unwrap_or(0.0) * p.prob(i, j))
                    .sum();
                (j.clone(), mass)
            })
            .collect();
        out.push(std::mem::replace(&mut current, next));
    }
    out.push(current);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn s(label: &str) -> State {
        State::from(label)
    }

    fn coin(stay: f64) -> TransitionMatrix {
        TransitionMatrix::from_entries([
            ("Heads", [("Heads", stay), ("Tails", 1.0 - stay)]),
            ("Tails", [("Heads", 1.0 - stay), ("Tails", stay)]),
        ])
    }

    fn order() -> Vec<State> {
        vec![s("Heads"), s("Tails")]
    }

    #[test]
    fn prob_missing_is_zero() {
        let m = TransitionMatrix::from_entries([("Heads", [("Heads", 1.0)])]);
        assert_eq!(m.prob(&s("Heads"), &s("Tails")), 0.0);
        assert_eq!(m.prob(&s("Tails"), &s("Heads")), 0.0);
    }

    #[test]
    fn alphabet_includes_destinations() {
        let m = TransitionMatrix::from_entries([("A", [("B", 1.0)])]);
        assert_eq!(m.alphabet().states(), &[s("A"), s("B")]);
        assert_eq!(m.destination_alphabet().states(), &[s("B")]);
    }

    #[test]
    fn validate_ok() {
        assert!(coin(0.95).validate(1e-9).is_ok());
    }

    #[test]
    fn validate_rejects_short_row() {
        let m = TransitionMatrix::from_entries([("Heads", [("Heads", 0.5), ("Tails", 0.4)])]);
        let err = m.validate(1e-9).unwrap_err();
        assert!(matches!(err, MarkovError::RowSumMismatch { ref from, .. } if from == "Heads"));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let m = TransitionMatrix::from_entries([("Heads", [("Heads", 1.5), ("Tails", -0.5)])]);
        assert!(matches!(
            m.validate(1e-9),
            Err(MarkovError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn validate_rejects_nan() {
        let m = TransitionMatrix::from_entries([("Heads", [("Heads", f64::NAN)])]);
        assert!(m.validate_entries().is_err());
    }

    #[test]
    fn validate_rejects_empty() {
        assert!(matches!(
            TransitionMatrix::new().validate(1e-9),
            Err(MarkovError::EmptyMatrix { .. })
        ));
        let mut m = TransitionMatrix::new();
        m.insert_row(s("Heads"), BTreeMap::new());
        assert!(matches!(
            m.validate_entries(),
            Err(MarkovError::EmptyMatrix { .. })
        ));
    }

    #[test]
    fn validate_entries_allows_unnormalized() {
        let m = TransitionMatrix::from_entries([("Heads", [("Heads", 0.5), ("Tails", 0.4)])]);
        assert!(m.validate_entries().is_ok());
    }

    #[test]
    fn sample_row_uses_lexical_order() {
        let row = BTreeMap::from([(s("Tails"), 0.5), (s("Heads"), 0.5)]);
        assert_eq!(sample_row(&row, 0.0), Some(&s("Heads")));
        assert_eq!(sample_row(&row, 0.49), Some(&s("Heads")));
        assert_eq!(sample_row(&row, 0.5), Some(&s("Tails")));
        assert_eq!(sample_row(&row, 0.999), Some(&s("Tails")));
    }

    #[test]
    fn sample_row_skips_zero_mass() {
        let row = BTreeMap::from([(s("Heads"), 0.0), (s("Tails"), 1.0)]);
        assert_eq!(sample_row(&row, 0.0), Some(&s("Tails")));
    }

    #[test]
    fn sample_row_rounding_fallback() {
        // Row sums to slightly less than the draw.
        let row = BTreeMap::from([(s("A"), 0.3), (s("B"), 0.3), (s("C"), 0.0)]);
        assert_eq!(sample_row(&row, 0.9), Some(&s("B")));
        let zeros = BTreeMap::from([(s("A"), 0.0), (s("B"), 0.0)]);
        assert_eq!(sample_row(&zeros, 0.5), Some(&s("B")));
    }

    #[test]
    fn sample_row_empty() {
        let row: BTreeMap<State, f64> = BTreeMap::new();
        assert_eq!(sample_row(&row, 0.5), None);
    }

    #[test]
    fn identity_diagonal() {
        let i = identity(&order());
        assert_eq!(i.prob(&s("Heads"), &s("Heads")), 1.0);
        assert_eq!(i.prob(&s("Heads"), &s("Tails")), 0.0);
        assert_eq!(i.len(), 2);
    }

    #[test]
    fn multiply_known_product() {
        let p = coin(0.9);
        let p2 = multiply(&p, &p, &order()).unwrap();
        // 0.9 * 0.9 + 0.1 * 0.1
        assert_abs_diff_eq!(p2.prob(&s("Heads"), &s("Heads")), 0.82, epsilon = 1e-12);
        assert_abs_diff_eq!(p2.prob(&s("Heads"), &s("Tails")), 0.18, epsilon = 1e-12);
    }

    #[test]
    fn multiply_rejects_duplicate_order() {
        let p = coin(0.5);
        let err = multiply(&p, &p, &[s("Heads"), s("Heads")]).unwrap_err();
        assert!(matches!(err, MarkovError::Domain { .. }));
    }

    #[test]
    fn power_zero_is_identity() {
        let p = coin(0.7);
        assert_eq!(power(&p, 0, &order()).unwrap(), identity(&order()));
    }

    #[test]
    fn power_one_is_p() {
        let p = coin(0.7);
        let p1 = power(&p, 1, &order()).unwrap();
        for i in &order() {
            for j in &order() {
                assert_abs_diff_eq!(p1.prob(i, j), p.prob(i, j), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn power_negative_fails() {
        let p = coin(0.7);
        assert!(matches!(
            power(&p, -1, &order()),
            Err(MarkovError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn power_converges_to_stationary() {
        // Uneven coin: stationary = (10/11, 1/11).
        let p = TransitionMatrix::from_entries([
            ("Heads", [("Heads", 0.95), ("Tails", 0.05)]),
            ("Tails", [("Heads", 0.5), ("Tails", 0.5)]),
        ]);
        let p1000 = power(&p, 1000, &order()).unwrap();
        for from in &order() {
            assert_abs_diff_eq!(p1000.prob(from, &s("Heads")), 10.0 / 11.0, epsilon = 1e-9);
            assert_abs_diff_eq!(p1000.prob(from, &s("Tails")), 1.0 / 11.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn power_restricted_to_order() {
        let p = TransitionMatrix::from_entries([
            ("A", [("A", 0.5), ("B", 0.5)]),
            ("B", [("A", 0.5), ("B", 0.5)]),
        ]);
        let pa = power(&p, 1, &[s("A")]).unwrap();
        assert_eq!(pa.len(), 1);
        assert_eq!(pa.prob(&s("A"), &s("B")), 0.0);
    }

    #[test]
    fn evolve_trajectory() {
        let p = coin(0.9);
        let initial = BTreeMap::from([(s("Heads"), 1.0)]);
        let traj = evolve(&p, &initial, 2, &order()).unwrap();
        assert_eq!(traj.len(), 3);
        assert_eq!(traj[0][&s("Tails")], 0.0);
        assert_abs_diff_eq!(traj[1][&s("Heads")], 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(traj[2][&s("Heads")], 0.82, epsilon = 1e-12);
    }

    #[test]
    fn evolve_matches_power_row() {
        let p = coin(0.8);
        let initial = BTreeMap::from([(s("Tails"), 1.0)]);
        let traj = evolve(&p, &initial, 7, &order()).unwrap();
        let p7 = power(&p, 7, &order()).unwrap();
        for j in &order() {
            assert_abs_diff_eq!(traj[7][j], p7.prob(&s("Tails"), j), epsilon = 1e-12);
        }
    }

    #[test]
    fn evolve_rejects_unrepresentable_length() {
        let p = coin(0.9);
        let initial = BTreeMap::from([(s("Heads"), 1.0)]);
        assert!(matches!(
            evolve(&p, &initial, usize::MAX, &order()),
            Err(MarkovError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn check_closed_reports_destination_without_row() {
        let open = TransitionMatrix::from_entries([("A", [("A", 0.5), ("B", 0.5)])]);
        assert_eq!(
            open.check_closed().unwrap_err(),
            MarkovError::UnknownState {
                state: "B".to_string()
            }
        );
        // A zero-probability destination cannot be reached.
        let closed = TransitionMatrix::from_entries([("A", [("A", 1.0), ("B", 0.0)])]);
        assert!(closed.check_closed().is_ok());
        assert!(coin(0.9).check_closed().is_ok());
    }
}
