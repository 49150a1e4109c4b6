//! # Metric Suite
//!
//! An ordered set of named calculations evaluated against a single grid.
//! Built from a declarative YAML configuration (see [`crate::config`]) or
//! programmatically from [`NamedCalculation`]s; either way every calculation
//! is validated at construction, and field presence is checked against the
//! grid before any value is computed.

use crate::calculations::{
    aggregate, chi_gradient, chi_intercept, count_equal, hypsometric_integral,
};
use crate::config::{parse_calculations, CalculationSpec, NamedCalculation};
use crate::error::{ConfigurationError, Result};
use crate::grid::{require_field, MetricGrid};
use crate::registry::{self, CalcContext};

/// Evaluate a scalar (single-grid) calculation.
///
/// `discretized_misfit` has no single-grid meaning; reaching it here is a
/// context mismatch reported as a `ConfigurationError`.
pub(crate) fn evaluate_scalar<G: MetricGrid + ?Sized>(
    name: &str,
    spec: &CalculationSpec,
    grid: &G,
) -> Result<f64> {
    match spec {
        CalculationSpec::Aggregate { field, method } => aggregate(grid, field, method),
        CalculationSpec::ChiGradient {
            chi_field,
            elevation_field,
        } => chi_gradient(grid, chi_field, elevation_field),
        CalculationSpec::ChiIntercept {
            chi_field,
            elevation_field,
        } => chi_intercept(grid, chi_field, elevation_field),
        CalculationSpec::CountEqual { field, value } => count_equal(grid, field, *value),
        CalculationSpec::HypsometricIntegral { field } => hypsometric_integral(grid, field),
        CalculationSpec::DiscretizedMisfit { .. } => Err(ConfigurationError::WrongContext {
            name: name.to_string(),
            tag: spec.tag().to_string(),
            context: CalcContext::Metric.as_str(),
        }
        .into()),
    }
}

/// Ordered metric calculations over one grid.
///
/// # Examples
/// ```
/// use tm_core::grid::RasterGrid;
/// use tm_core::metric::Metric;
///
/// let mut grid = RasterGrid::new(5, 5);
/// grid.add_field("topographic__elevation", (0..25).map(|i| i as f64).collect()).unwrap();
///
/// let mut metric = Metric::from_yaml("
/// me:
///   calc: aggregate
///   field: topographic__elevation
///   method: mean
/// ").unwrap();
/// metric.calculate(&grid).unwrap();
/// assert_eq!(metric.value("me"), Some(12.0));
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    calcs: Vec<NamedCalculation>,
    results: Vec<(String, f64)>,
}

impl Metric {
    /// Build from a YAML calculation file; fails on any configuration
    /// problem before a grid is involved.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, ConfigurationError> {
        let calcs = parse_calculations(yaml, CalcContext::Metric)?;
        Ok(Self {
            calcs,
            results: Vec::new(),
        })
    }

    /// Build from already-parsed calculations, applying the same context and
    /// parameter validation as [`Metric::from_yaml`].
    pub fn new(calcs: Vec<NamedCalculation>) -> std::result::Result<Self, ConfigurationError> {
        validate_for_context(&calcs, CalcContext::Metric)?;
        Ok(Self {
            calcs,
            results: Vec::new(),
        })
    }

    /// Declared calculation names, in order.
    pub fn calculation_names(&self) -> Vec<&str> {
        self.calcs.iter().map(|c| c.name.as_str()).collect()
    }

    /// Evaluate every calculation against the grid, in declaration order.
    ///
    /// All field presence is validated first; on any failure no results are
    /// published (previously computed results are cleared).
    pub fn calculate<G: MetricGrid + ?Sized>(&mut self, grid: &G) -> Result<()> {
        self.results.clear();

        for calc in &self.calcs {
            for field in calc.spec.model_fields() {
                require_field(grid, field)?;
            }
        }

        let mut results = Vec::with_capacity(self.calcs.len());
        for calc in &self.calcs {
            log::debug!("metric '{}' ({})", calc.name, calc.spec.tag());
            let value = evaluate_scalar(&calc.name, &calc.spec, grid)?;
            results.push((calc.name.clone(), value));
        }
        self.results = results;
        Ok(())
    }

    /// Result names in declaration order (empty before `calculate`).
    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Result values in declaration order (empty before `calculate`).
    pub fn values(&self) -> Vec<f64> {
        self.results.iter().map(|&(_, v)| v).collect()
    }

    /// Look up one result by name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.results
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }

    /// Ordered (name, value) pairs.
    pub fn results(&self) -> &[(String, f64)] {
        &self.results
    }
}

/// Shared construction-time validation for programmatic suites.
pub(crate) fn validate_for_context(
    calcs: &[NamedCalculation],
    context: CalcContext,
) -> std::result::Result<(), ConfigurationError> {
    let mut seen = std::collections::HashSet::new();
    for calc in calcs {
        if !seen.insert(calc.name.as_str()) {
            return Err(ConfigurationError::DuplicateCalculationName {
                name: calc.name.clone(),
            });
        }
        let info = registry::lookup(calc.spec.tag()).ok_or_else(|| {
            ConfigurationError::UnknownCalculation {
                tag: calc.spec.tag().to_string(),
            }
        })?;
        if !info.supports(context) {
            return Err(ConfigurationError::WrongContext {
                name: calc.name.clone(),
                tag: info.tag.to_string(),
                context: context.as_str(),
            });
        }
        calc.spec.validate()?;
    }
    Ok(())
}
