//! Calculation kinds evaluated against one grid (metric context) or a
//! (model, data) grid pair (residual context).
//!
//! This module provides:
//! - Aggregate reductions over a field's core nodes
//! - Chi-elevation fit slope and intercept
//! - Exact-value counting
//! - Hypsometric integral
//! - Discretized misfit (joint-percentile classification + per-category
//!   sum-of-squared residuals) — residual context only

pub mod aggregate;
pub mod chi_fit;
pub mod count_equal;
pub mod discretized_misfit;
pub mod hypsometric_integral;

pub use aggregate::{aggregate, AggregationMethod};
pub use chi_fit::{chi_gradient, chi_intercept};
pub use count_equal::count_equal;
pub use discretized_misfit::{
    assign_categories, discretized_misfit, CategoryEntry, DiscretizedMisfit, PercentileBinner,
};
pub use hypsometric_integral::hypsometric_integral;
