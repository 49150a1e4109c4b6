//! # Elementary Statistics Module
//!
//! Scalar reductions over per-node field values. These are the primitives the
//! calculations are built from; they operate on plain slices and know nothing
//! about grids.
//!
//! All functions return `None` for empty input rather than a sentinel value,
//! so callers decide whether an empty sample is an error.

/// Percentile of a sample via linear interpolation between order statistics.
///
/// Matches the conventional definition: percentile 0 is the minimum of the
/// sample, percentile 100 the maximum, and fractional ranks interpolate
/// linearly between the two neighboring order statistics.
///
/// # Arguments
/// * `values` - Sample values (unsorted is fine; the input is not mutated)
/// * `q` - Percentile in [0, 100]
///
/// # Returns
/// * `Some(p)` - The interpolated percentile
/// * `None` - If `values` is empty
///
/// # Examples
/// ```
/// use tm_core::stats::percentile;
///
/// let values = [4.0, 1.0, 3.0, 2.0];
/// assert_eq!(percentile(&values, 0.0), Some(1.0));
/// assert_eq!(percentile(&values, 50.0), Some(2.5));
/// assert_eq!(percentile(&values, 100.0), Some(4.0));
/// ```
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    if n == 1 {
        return Some(sorted[0]);
    }

    // Fractional rank into the sorted sample, clamped so q outside [0, 100]
    // cannot index out of bounds.
    let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }

    let weight = rank - lo as f64;
    Some(sorted[lo] * (1.0 - weight) + sorted[hi] * weight)
}

/// Arithmetic mean, `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (percentile 50).
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Minimum, `None` for empty input.
pub fn min(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().cloned().fold(f64::INFINITY, f64::min))
}

/// Maximum, `None` for empty input.
pub fn max(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
}

/// Sum over the sample. Defined as 0.0 for empty input (additive identity).
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Population variance (normalized by N, not N-1), `None` for empty input.
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / values.len() as f64)
}

/// Population standard deviation, `None` for empty input.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Least-squares linear fit `y = slope * x + intercept`.
///
/// Returns `None` for an empty sample, mismatched lengths, or a constant `x`
/// (the slope is undefined when the predictor has zero spread).
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }

    let x_mean = mean(x)?;
    let y_mean = mean(y)?;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        sxx += (xi - x_mean) * (xi - x_mean);
        sxy += (xi - x_mean) * (yi - y_mean);
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some((slope, y_mean - slope * x_mean))
}
