//! Probability utilities shared by the engine and the agent wrapper.
//!
//! Every function here is side-effect free apart from the explicit in-place
//! variants, and all of them absorb numeric degeneracy locally: zero-sum
//! columns fall back to the uniform distribution and logarithms are floored
//! so that no `-inf` or NaN escapes into belief arithmetic.

use ndarray::{Array, Array1, Array2, ArrayBase, Data, DataMut, Dimension, Ix1, Ix2};

/// Additive floor applied before every logarithm.
pub const LOG_FLOOR: f64 = 1e-16;

/// Natural logarithm of a scalar with the [`LOG_FLOOR`] added first.
///
/// ```
/// use aip::numeric::{safe_ln, LOG_FLOOR};
///
/// assert_eq!(safe_ln(0.0), LOG_FLOOR.ln());
/// assert!(safe_ln(1.0).abs() < 1e-12);
/// ```
pub fn safe_ln(value: f64) -> f64 {
    (value + LOG_FLOOR).ln()
}

/// Elementwise [`safe_ln`] over a vector, matrix or higher-rank array.
pub fn safe_log<S, D>(values: &ArrayBase<S, D>) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    values.mapv(safe_ln)
}

/// Normalize every column of `matrix` in place.
///
/// Columns with a strictly positive sum are divided by that sum; any other
/// column (zero, negative or non-finite sum) is replaced by the uniform
/// distribution over the rows. Returns the number of columns that needed the
/// uniform fallback.
pub fn normalize_columns_in_place<S>(matrix: &mut ArrayBase<S, Ix2>) -> usize
where
    S: DataMut<Elem = f64>,
{
    let rows = matrix.nrows();
    if rows == 0 {
        return 0;
    }
    let uniform = 1.0 / rows as f64;
    let mut degenerate = 0;
    for mut column in matrix.columns_mut() {
        let sum: f64 = column.sum();
        if sum > 0.0 && sum.is_finite() {
            column.mapv_inplace(|value| value / sum);
        } else {
            column.fill(uniform);
            degenerate += 1;
        }
    }
    degenerate
}

/// Column-normalize a matrix and return it.
///
/// Idempotent: normalizing an already normalized matrix leaves it unchanged.
///
/// ```
/// use aip::numeric::column_normalize;
/// use ndarray::array;
///
/// let m = column_normalize(array![[1.0, 0.0], [3.0, 0.0]]);
/// assert_eq!(m, array![[0.25, 0.5], [0.75, 0.5]]);
/// ```
pub fn column_normalize(mut matrix: Array2<f64>) -> Array2<f64> {
    normalize_columns_in_place(&mut matrix);
    matrix
}

/// Single-column form of [`column_normalize`].
pub fn normalize_vector<S>(values: &ArrayBase<S, Ix1>) -> Array1<f64>
where
    S: Data<Elem = f64>,
{
    let len = values.len();
    if len == 0 {
        return Array1::zeros(0);
    }
    let sum = values.sum();
    if sum > 0.0 && sum.is_finite() {
        values.mapv(|value| value / sum)
    } else {
        Array1::from_elem(len, 1.0 / len as f64)
    }
}

/// Softmax of a single column: `exp(x) / Σ exp(x)`.
///
/// The column maximum is subtracted before exponentiating, which leaves the
/// result unchanged but keeps large log-messages from overflowing. A column
/// without any finite maximum yields the uniform distribution.
pub fn softmax<S>(values: &ArrayBase<S, Ix1>) -> Array1<f64>
where
    S: Data<Elem = f64>,
{
    let len = values.len();
    if len == 0 {
        return Array1::zeros(0);
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Array1::from_elem(len, 1.0 / len as f64);
    }
    let exps = values.mapv(|value| (value - max).exp());
    normalize_vector(&exps)
}

/// Column-wise [`softmax`] of a matrix.
pub fn column_softmax<S>(matrix: &ArrayBase<S, Ix2>) -> Array2<f64>
where
    S: Data<Elem = f64>,
{
    let mut result = Array2::zeros(matrix.raw_dim());
    for (source, mut target) in matrix.columns().into_iter().zip(result.columns_mut()) {
        target.assign(&softmax(&source));
    }
    result
}

/// `safe_log(softmax(values))`: turns raw preferences into log-probabilities.
pub fn log_softmax<S>(values: &ArrayBase<S, Ix1>) -> Array1<f64>
where
    S: Data<Elem = f64>,
{
    safe_log(&softmax(values))
}

/// Index of the largest entry; ties resolve to the lowest index.
///
/// NaN entries are never selected. An empty input returns 0.
pub fn argmax<S>(values: &ArrayBase<S, Ix1>) -> usize
where
    S: Data<Elem = f64>,
{
    let mut best_index = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (index, &value) in values.iter().enumerate() {
        if value > best_value {
            best_value = value;
            best_index = index;
        }
    }
    best_index
}

/// One-hot column of length `len` with a 1 at `index`.
pub fn one_hot(len: usize, index: usize) -> Array1<f64> {
    let mut vector = Array1::zeros(len);
    if index < len {
        vector[index] = 1.0;
    }
    vector
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn column_sums(matrix: &Array2<f64>) -> Vec<f64> {
        matrix.columns().into_iter().map(|c| c.sum()).collect()
    }

    #[test]
    fn safe_ln_of_zero_is_finite_floor() {
        let value = safe_ln(0.0);
        assert!(value.is_finite());
        assert_eq!(value, (1e-16_f64).ln());
    }

    #[test]
    fn safe_log_preserves_shape() {
        let logs = safe_log(&array![[1.0, 0.0], [0.5, 0.25]]);
        assert_eq!(logs.dim(), (2, 2));
        assert!(logs.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_column_falls_back_to_uniform() {
        let mut matrix = array![[0.0, 2.0], [0.0, 2.0], [0.0, 4.0]];
        let degenerate = normalize_columns_in_place(&mut matrix);
        assert_eq!(degenerate, 1);
        assert_eq!(matrix.column(0).to_vec(), vec![1.0 / 3.0; 3]);
        assert_eq!(matrix.column(1).to_vec(), vec![0.25, 0.25, 0.5]);
    }

    #[test]
    fn column_normalize_is_idempotent() {
        let once = column_normalize(array![[0.2, 7.0, 0.0], [0.3, 1.0, 0.0], [0.9, 2.0, 0.0]]);
        let twice = column_normalize(once.clone());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-15, "{a} vs {b}");
        }
        for sum in column_sums(&once) {
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn softmax_handles_large_inputs() {
        let result = softmax(&array![1000.0, 1000.0, 0.0]);
        assert!((result[0] - 0.5).abs() < 1e-12);
        assert!((result[1] - 0.5).abs() < 1e-12);
        assert!(result[2] >= 0.0);
    }

    #[test]
    fn softmax_matches_direct_formula() {
        let input = array![0.1, -0.4, 2.0];
        let total: f64 = input.iter().map(|v: &f64| v.exp()).sum();
        let result = softmax(&input);
        for (value, raw) in result.iter().zip(input.iter()) {
            assert!((value - raw.exp() / total).abs() < 1e-12);
        }
    }

    #[test]
    fn column_softmax_normalizes_each_column() {
        let result = column_softmax(&array![[0.0, -50.0], [1.0, 3.0], [2.0, 0.5]]);
        for sum in column_sums(&result) {
            assert!((sum - 1.0).abs() < 1e-12);
        }
        assert!(result.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn argmax_prefers_first_of_ties() {
        assert_eq!(argmax(&array![0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&array![f64::NAN, 0.1]), 1);
    }

    #[test]
    fn log_softmax_of_preference_is_negative() {
        let ln_c = log_softmax(&array![1.0, 0.0, 0.0]);
        assert!(ln_c.iter().all(|v| *v < 0.0));
        assert!(ln_c[0] > ln_c[1]);
        assert!((ln_c[1] - ln_c[2]).abs() < 1e-12);
    }
}
