//! # tm_core - Terrain Metric & Residual Calculations
//!
//! Scalar "metric" and "residual" statistics over spatial grid fields
//! produced by Earth-surface-dynamics simulations, for model calibration and
//! sensitivity analysis. Calculations are declared by name in a YAML
//! configuration, validated eagerly, and evaluated against one grid
//! ([`Metric`]) or a (model, data) grid pair ([`Residual`]).
//!
//! ## Features
//! - Discretized misfit: joint-percentile classification of grid cells and
//!   per-category sum-of-squared residuals with templated category names
//! - Aggregate reductions, chi-elevation fit parameters, exact-value counts,
//!   hypsometric integral
//! - Declarative, order-preserving configuration with load-time validation
//! - Deterministic and side-effect-free: identical inputs give identical
//!   results, so independent invocations parallelize at the caller's whim

pub mod calculations;
pub mod config;
pub mod error;
pub mod grid;
pub mod metric;
pub mod registry;
pub mod residual;
pub mod stats;

#[cfg(test)]
mod scenario_tests;

pub use calculations::{
    aggregate, chi_gradient, chi_intercept, count_equal, discretized_misfit,
    hypsometric_integral, AggregationMethod, CategoryEntry, DiscretizedMisfit, PercentileBinner,
};
pub use config::{parse_calculations, CalculationSpec, NamedCalculation};
pub use error::{CalcError, ComputationError, ConfigurationError, Result};
pub use grid::{check_compatible, MetricGrid, RasterGrid};
pub use metric::Metric;
pub use registry::CalcContext;
pub use residual::Residual;
