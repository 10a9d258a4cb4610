//! Array helpers shared by the analysis code.

use nalgebra::Vector3;

/// Euclidean length of every vector.
pub fn lengths(vectors: &[Vector3<f64>]) -> Vec<f64> {
    vectors.iter().map(|v| v.magnitude()).collect()
}

/// Indices that sort `values` ascending. The sort is stable, so ties keep their
/// original order; NaNs sort last.
pub fn argsort(values: &[f64]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    indices
}

/// Sorts `keys` ascending and applies the same permutation to `values`.
///
/// # Examples
///
/// ```
/// use nbody::math::sort_with;
///
/// let (keys, values) = sort_with(&[3.0, 1.0, 2.0], &["c", "a", "b"]);
/// assert_eq!(keys, vec![1.0, 2.0, 3.0]);
/// assert_eq!(values, vec!["a", "b", "c"]);
/// ```
pub fn sort_with<T: Clone>(keys: &[f64], values: &[T]) -> (Vec<f64>, Vec<T>) {
    let permutation = argsort(keys);
    let sorted_keys = permutation.iter().map(|&i| keys[i]).collect();
    let sorted_values = permutation.iter().map(|&i| values[i].clone()).collect();
    (sorted_keys, sorted_values)
}

/// Running sum.
pub fn cumsum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Sums of consecutive blocks of `block` elements. A trailing partial block is dropped.
pub fn block_sums(values: &[f64], block: usize) -> Vec<f64> {
    if block == 0 {
        return Vec::new();
    }
    values
        .chunks_exact(block)
        .map(|chunk| chunk.iter().sum())
        .collect()
}

/// Means of consecutive blocks of `block` elements. A trailing partial block is dropped.
pub fn block_means(values: &[f64], block: usize) -> Vec<f64> {
    block_sums(values, block)
        .into_iter()
        .map(|sum| sum / block as f64)
        .collect()
}

/// Every `step`-th element starting from the first.
pub fn every_nth(values: &[f64], step: usize) -> Vec<f64> {
    if step == 0 {
        return Vec::new();
    }
    values.iter().step_by(step).copied().collect()
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
