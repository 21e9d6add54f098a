//! Tree reductions used for the layer maximum and the energy total.
//!
//! The tree is split at the midpoint until a slice fits in one leaf, so its
//! shape depends only on the input length. Floating-point sums are therefore
//! bit-identical for any worker count.

/// Slices at or below this length are folded on one worker.
const LEAF_LEN: usize = 1024;

/// Reduce `values` with an associative `op`.
pub fn tree_reduce<T, F>(values: &[T], identity: T, op: &F) -> T
where
    T: Copy + Send + Sync,
    F: Fn(T, T) -> T + Sync,
{
    if values.len() <= LEAF_LEN {
        return values.iter().fold(identity, |acc, &v| op(acc, v));
    }

    let (lo, hi) = values.split_at(values.len() / 2);

    #[cfg(feature = "parallel")]
    let (a, b) = rayon::join(
        || tree_reduce(lo, identity, op),
        || tree_reduce(hi, identity, op),
    );

    #[cfg(not(feature = "parallel"))]
    let (a, b) = (tree_reduce(lo, identity, op), tree_reduce(hi, identity, op));

    op(a, b)
}

/// Largest value, or 0 for an empty slice.
pub fn max_u32(values: &[u32]) -> u32 {
    tree_reduce(values, 0, &u32::max)
}

pub fn sum_f64(values: &[f64]) -> f64 {
    tree_reduce(values, 0.0, &|a: f64, b: f64| a + b)
}
