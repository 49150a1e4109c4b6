//! # Declarative Calculation Configuration
//!
//! Calculations are declared in a YAML mapping from result name to a tagged
//! calculation spec:
//!
//! ```yaml
//! me:
//!   calc: aggregate
//!   field: topographic__elevation
//!   method: mean
//! dm:
//!   calc: discretized_misfit
//!   name_template: "chi_{field_1_level}.z_{field_2_level}"
//!   misfit_field: topographic__elevation
//!   field_1: channel__chi_index
//!   field_2: topographic__elevation
//!   field_1_percentile_edges: [0, 30, 60, 100]
//!   field_2_percentile_edges: [0, 50, 100]
//! ```
//!
//! Declaration order is preserved and governs evaluation and result order.
//! Every tag is resolved against the static [`registry`](crate::registry)
//! and every parameter set validated at load time, so a bad configuration
//! fails before any grid is touched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::calculations::discretized_misfit::{validate_edges, validate_template};
use crate::calculations::AggregationMethod;
use crate::error::ConfigurationError;
use crate::registry::{self, CalcContext};

/// One calculation kind with its validated parameters.
///
/// Internally tagged on `calc`; variant tags match the
/// [`registry`](crate::registry) table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calc", rename_all = "snake_case")]
pub enum CalculationSpec {
    Aggregate {
        field: String,
        #[serde(flatten)]
        method: AggregationMethod,
    },
    ChiGradient {
        chi_field: String,
        elevation_field: String,
    },
    ChiIntercept {
        chi_field: String,
        elevation_field: String,
    },
    CountEqual {
        field: String,
        value: f64,
    },
    HypsometricIntegral {
        field: String,
    },
    DiscretizedMisfit {
        name_template: String,
        misfit_field: String,
        field_1: String,
        field_2: String,
        field_1_percentile_edges: Vec<f64>,
        field_2_percentile_edges: Vec<f64>,
    },
}

impl CalculationSpec {
    /// Registry tag of this calculation kind.
    pub fn tag(&self) -> &'static str {
        match self {
            CalculationSpec::Aggregate { .. } => "aggregate",
            CalculationSpec::ChiGradient { .. } => "chi_gradient",
            CalculationSpec::ChiIntercept { .. } => "chi_intercept",
            CalculationSpec::CountEqual { .. } => "count_equal",
            CalculationSpec::HypsometricIntegral { .. } => "hypsometric_integral",
            CalculationSpec::DiscretizedMisfit { .. } => "discretized_misfit",
        }
    }

    /// Eager parameter validation (edge lists, templates, percentile range).
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match self {
            CalculationSpec::Aggregate { method, .. } => method.validate(),
            CalculationSpec::ChiGradient { .. }
            | CalculationSpec::ChiIntercept { .. }
            | CalculationSpec::CountEqual { .. }
            | CalculationSpec::HypsometricIntegral { .. } => Ok(()),
            CalculationSpec::DiscretizedMisfit {
                name_template,
                field_1_percentile_edges,
                field_2_percentile_edges,
                ..
            } => {
                validate_edges(field_1_percentile_edges)?;
                validate_edges(field_2_percentile_edges)?;
                validate_template(name_template)
            }
        }
    }

    /// Fields this calculation reads from the model grid (the only grid, in
    /// metric context).
    pub(crate) fn model_fields(&self) -> Vec<&str> {
        match self {
            CalculationSpec::Aggregate { field, .. }
            | CalculationSpec::CountEqual { field, .. }
            | CalculationSpec::HypsometricIntegral { field } => vec![field],
            CalculationSpec::ChiGradient {
                chi_field,
                elevation_field,
            }
            | CalculationSpec::ChiIntercept {
                chi_field,
                elevation_field,
            } => vec![chi_field, elevation_field],
            CalculationSpec::DiscretizedMisfit { misfit_field, .. } => vec![misfit_field],
        }
    }

    /// Fields this calculation reads from the data grid in residual context.
    /// Classification fields live on the data grid only.
    pub(crate) fn data_fields(&self) -> Vec<&str> {
        match self {
            CalculationSpec::Aggregate { field, .. }
            | CalculationSpec::CountEqual { field, .. }
            | CalculationSpec::HypsometricIntegral { field } => vec![field],
            CalculationSpec::ChiGradient {
                chi_field,
                elevation_field,
            }
            | CalculationSpec::ChiIntercept {
                chi_field,
                elevation_field,
            } => vec![chi_field, elevation_field],
            CalculationSpec::DiscretizedMisfit {
                misfit_field,
                field_1,
                field_2,
                ..
            } => vec![misfit_field, field_1, field_2],
        }
    }
}

/// A named calculation, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCalculation {
    pub name: String,
    pub spec: CalculationSpec,
}

/// Parse and validate a calculation file for the given context.
///
/// Returns the calculations in declaration order. Fails on malformed YAML,
/// non-mapping documents, duplicate names, unknown tags, context mismatches,
/// and invalid parameters.
pub fn parse_calculations(
    yaml: &str,
    context: CalcContext,
) -> Result<Vec<NamedCalculation>, ConfigurationError> {
    let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let mapping = doc.as_mapping().ok_or(ConfigurationError::NotAMapping)?;

    let mut out = Vec::with_capacity(mapping.len());
    let mut seen = HashSet::with_capacity(mapping.len());
    for (key, value) in mapping {
        let name = key
            .as_str()
            .ok_or(ConfigurationError::NotAMapping)?
            .to_string();
        if !seen.insert(name.clone()) {
            return Err(ConfigurationError::DuplicateCalculationName { name });
        }

        let tag = value
            .get("calc")
            .and_then(serde_yaml::Value::as_str)
            .ok_or_else(|| ConfigurationError::InvalidParameters {
                name: name.clone(),
                message: "missing 'calc' tag".to_string(),
            })?;
        let info = registry::lookup(tag).ok_or_else(|| ConfigurationError::UnknownCalculation {
            tag: tag.to_string(),
        })?;
        if !info.supports(context) {
            return Err(ConfigurationError::WrongContext {
                name,
                tag: info.tag.to_string(),
                context: context.as_str(),
            });
        }

        let spec: CalculationSpec = serde_yaml::from_value(value.clone()).map_err(|e| {
            ConfigurationError::InvalidParameters {
                name: name.clone(),
                message: e.to_string(),
            }
        })?;
        spec.validate()?;
        out.push(NamedCalculation { name, spec });
    }
    Ok(out)
}
