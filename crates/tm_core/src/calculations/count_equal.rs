//! # Count-Equal Calculation
//!
//! Number of core nodes whose field value equals a target exactly. Useful for
//! counting flagged cells (e.g., nodes tagged with an integer class id stored
//! in a float field); exact comparison is intentional.

use crate::error::Result;
use crate::grid::{core_values, MetricGrid};

/// Count core nodes where `field == value`, returned as f64 so the result
/// fits the scalar metric surface.
pub fn count_equal<G: MetricGrid + ?Sized>(grid: &G, field: &str, value: f64) -> Result<f64> {
    let values = core_values(grid, field)?;
    Ok(values.iter().filter(|&&v| v == value).count() as f64)
}
