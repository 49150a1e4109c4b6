//! # Hypsometric Integral Calculation
//!
//! Classic landscape-maturity index: `(mean(z) - min(z)) / (max(z) - min(z))`
//! over core nodes. Values near 1 indicate plateau-like relief, values near 0
//! deeply dissected relief.

use crate::error::{ComputationError, Result};
use crate::grid::{core_values, MetricGrid};
use crate::stats;

/// Hypsometric integral of a field over the grid's core nodes.
///
/// Fails with [`ComputationError::DegenerateField`] when the field is
/// constant over core nodes (zero relief, undefined ratio).
pub fn hypsometric_integral<G: MetricGrid + ?Sized>(grid: &G, field: &str) -> Result<f64> {
    let values = core_values(grid, field)?;

    let empty = || ComputationError::EmptySample {
        field: field.to_string(),
    };
    let mean = stats::mean(&values).ok_or_else(empty)?;
    let min = stats::min(&values).ok_or_else(empty)?;
    let max = stats::max(&values).ok_or_else(empty)?;

    if max == min {
        return Err(ComputationError::DegenerateField {
            field: field.to_string(),
            operation: "hypsometric integral",
        }
        .into());
    }
    Ok((mean - min) / (max - min))
}
