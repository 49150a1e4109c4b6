//! # Chi-Elevation Fit Calculations
//!
//! Slope and intercept of a least-squares linear fit of elevation against a
//! chi (integral drainage area) field over core nodes. In a steady-state
//! landscape the chi-elevation relation is linear, so the fit parameters are
//! compact calibration targets: the gradient tracks channel steepness, the
//! intercept the base-level elevation.
//!
//! Computing the chi field itself requires flow routing and belongs to the
//! upstream simulation stack; only the fit lives here.

use crate::error::{ComputationError, Result};
use crate::grid::{core_values, MetricGrid};
use crate::stats;

fn chi_elevation_fit<G: MetricGrid + ?Sized>(
    grid: &G,
    chi_field: &str,
    elevation_field: &str,
) -> Result<(f64, f64)> {
    let chi = core_values(grid, chi_field)?;
    let elevation = core_values(grid, elevation_field)?;

    stats::linear_fit(&chi, &elevation).ok_or_else(|| {
        ComputationError::DegenerateField {
            field: chi_field.to_string(),
            operation: "chi-elevation fit",
        }
        .into()
    })
}

/// Slope of the linear fit of `elevation_field` on `chi_field` over core
/// nodes.
///
/// Fails with [`ComputationError::DegenerateField`] when the chi field is
/// constant over core nodes.
pub fn chi_gradient<G: MetricGrid + ?Sized>(
    grid: &G,
    chi_field: &str,
    elevation_field: &str,
) -> Result<f64> {
    chi_elevation_fit(grid, chi_field, elevation_field).map(|(slope, _)| slope)
}

/// Intercept of the linear fit of `elevation_field` on `chi_field` over core
/// nodes.
pub fn chi_intercept<G: MetricGrid + ?Sized>(
    grid: &G,
    chi_field: &str,
    elevation_field: &str,
) -> Result<f64> {
    chi_elevation_fit(grid, chi_field, elevation_field).map(|(_, intercept)| intercept)
}
