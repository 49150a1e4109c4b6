//! # Aggregate Calculation
//!
//! Reduces one field's core-node values to a scalar with a configurable
//! method (mean, median, min, max, sum, std, var, or an arbitrary
//! percentile).

use serde::{Deserialize, Serialize};

use crate::error::{ComputationError, ConfigurationError, Result};
use crate::grid::{core_values, MetricGrid};
use crate::stats;

/// Reduction method for [`aggregate`].
///
/// Serialized with a `method` tag so it flattens into the declarative
/// calculation configuration:
///
/// ```yaml
/// calc: aggregate
/// field: topographic__elevation
/// method: percentile
/// percentile: 10
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AggregationMethod {
    Mean,
    Median,
    Min,
    Max,
    Sum,
    /// Population standard deviation (normalized by N).
    Std,
    /// Population variance (normalized by N).
    Var,
    Percentile { percentile: f64 },
}

impl AggregationMethod {
    /// Eager parameter validation, run at configuration-load time.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if let AggregationMethod::Percentile { percentile } = self {
            if !(0.0..=100.0).contains(percentile) {
                return Err(ConfigurationError::PercentileOutOfRange { value: *percentile });
            }
        }
        Ok(())
    }
}

/// Reduce a field's core-node values with the given method.
///
/// # Examples
/// ```
/// use tm_core::calculations::{aggregate, AggregationMethod};
/// use tm_core::grid::RasterGrid;
///
/// let mut grid = RasterGrid::new(3, 3);
/// let mut z = vec![0.0; 9];
/// z[4] = 7.0; // the only core node
/// grid.add_field("topographic__elevation", z).unwrap();
///
/// let value = aggregate(&grid, "topographic__elevation", &AggregationMethod::Mean).unwrap();
/// assert_eq!(value, 7.0);
/// ```
pub fn aggregate<G: MetricGrid + ?Sized>(
    grid: &G,
    field: &str,
    method: &AggregationMethod,
) -> Result<f64> {
    method.validate()?;
    let values = core_values(grid, field)?;

    // core_values guarantees a non-empty sample, so the Option reductions
    // below cannot fail; the error arm keeps the invariant explicit.
    let empty = || ComputationError::EmptySample {
        field: field.to_string(),
    };

    let out = match method {
        AggregationMethod::Mean => stats::mean(&values).ok_or_else(empty)?,
        AggregationMethod::Median => stats::median(&values).ok_or_else(empty)?,
        AggregationMethod::Min => stats::min(&values).ok_or_else(empty)?,
        AggregationMethod::Max => stats::max(&values).ok_or_else(empty)?,
        AggregationMethod::Sum => stats::sum(&values),
        AggregationMethod::Std => stats::std_dev(&values).ok_or_else(empty)?,
        AggregationMethod::Var => stats::variance(&values).ok_or_else(empty)?,
        AggregationMethod::Percentile { percentile } => {
            stats::percentile(&values, *percentile).ok_or_else(empty)?
        }
    };
    Ok(out)
}
