//! Empirical statistics over the visit counts of a simulated chain.

/// Shannon entropy in bits of the empirical distribution `count / total`.
///
/// Zero counts contribute nothing. Returns 0.0 if `total` is 0.
pub fn entropy<I>(counts: I, total: usize) -> f64
where
    I: IntoIterator<Item = usize>,
{
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    let mut h = 0.0;
    for c in counts {
        if c == 0 {
            continue;
        }
        let p = c as f64 / n;
        h -= p * p.log2();
    }
    // -0.0 for a single certain outcome
    h.max(0.0)
}

/// Relative frequencies `count / total`, in input order.
///
/// Returns all zeros if `total` is 0.
pub fn frequencies<I>(counts: I, total: usize) -> Vec<f64>
where
    I: IntoIterator<Item = usize>,
{
    if total == 0 {
        return counts.into_iter().map(|_| 0.0).collect();
    }
    let n = total as f64;
    counts.into_iter().map(|c| c as f64 / n).collect()
}

/// Total variation distance `0.5 * sum |p_i - q_i|` between two distributions.
///
/// The shorter slice is padded with zeros.
pub fn total_variation(p: &[f64], q: &[f64]) -> f64 {
    let n = p.len().max(q.len());
    let mut sum = 0.0;
    for i in 0..n {
        let a = p.get(i).copied().unwrap_or(0.0);
        let b = q.get(i).copied().unwrap_or(0.0);
        sum += (a - b).abs();
    }
    0.5 * sum
}

/// Maximum possible entropy in bits for `n_states` equiprobable outcomes.
pub fn max_entropy(n_states: usize) -> f64 {
    if n_states <= 1 {
        return 0.0;
    }
    (n_states as f64).log2()
}
