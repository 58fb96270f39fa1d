//! Shared math utilities.

use std::cmp::Ordering;

/// Logistic function.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Replace logits with softmax probabilities, in place.
///
/// The maximum is subtracted first so large logits cannot overflow.
pub fn softmax_in_place(v: &mut [f64]) {
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return;
    }
    let mut sum = 0.0;
    for x in v.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in v.iter_mut() {
        *x /= sum;
    }
}

/// Rank order for `(label_id, probability)` pairs: higher probability first,
/// lower label id on ties.
pub fn rank_order(a: &(usize, f64), b: &(usize, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let mut v = vec![1.0, 2.0, 3.0];
        softmax_in_place(&mut v);
        assert!((v.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(v[2] > v[1] && v[1] > v[0]);
    }

    #[test]
    fn test_softmax_large_logits() {
        let mut v = vec![1000.0, 1000.0];
        softmax_in_place(&mut v);
        assert!((v[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rank_order_breaks_ties_by_label() {
        let mut pairs = vec![(2, 0.25), (0, 0.5), (1, 0.25)];
        pairs.sort_by(rank_order);
        assert_eq!(pairs, vec![(0, 0.5), (1, 0.25), (2, 0.25)]);
    }
}
