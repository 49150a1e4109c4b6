//! # Residual Suite
//!
//! An ordered set of named calculations evaluated against a (model, data)
//! grid pair. Scalar calculations report `calc(model) - calc(data)`;
//! `discretized_misfit` reports one sum-of-squared-residuals value per
//! joint-percentile category, under names rendered from its template, and
//! keeps the per-node category array around for diagnostics.
//!
//! Grid compatibility (same node count, same core-node set) and field
//! presence on both grids are validated before anything is computed; the
//! whole result surface is published atomically or not at all.

use std::collections::{HashMap, HashSet};

use crate::calculations::discretized_misfit::{discretized_misfit, render_name};
use crate::config::{parse_calculations, CalculationSpec, NamedCalculation};
use crate::error::{ConfigurationError, Result};
use crate::grid::{check_compatible, require_field, MetricGrid};
use crate::metric::{evaluate_scalar, validate_for_context};
use crate::registry::CalcContext;

/// Ordered residual calculations over a (model, data) grid pair.
///
/// # Examples
/// ```
/// use tm_core::grid::RasterGrid;
/// use tm_core::residual::Residual;
///
/// let mut data = RasterGrid::new(4, 4);
/// data.add_field("topographic__elevation", (0..16).map(|i| i as f64).collect()).unwrap();
/// let model = data.clone();
///
/// let mut residual = Residual::from_yaml("
/// dm:
///   calc: discretized_misfit
///   name_template: \"z_{field_1_level}.z_{field_2_level}\"
///   misfit_field: topographic__elevation
///   field_1: topographic__elevation
///   field_2: topographic__elevation
///   field_1_percentile_edges: [0, 50, 100]
///   field_2_percentile_edges: [0, 100]
/// ").unwrap();
/// residual.calculate(&model, &data).unwrap();
///
/// assert_eq!(residual.names(), vec!["z_1.z_1", "z_2.z_1"]);
/// assert_eq!(residual.values(), vec![0.0, 0.0]); // identical grids
/// assert_eq!(residual.category("dm").unwrap().len(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct Residual {
    calcs: Vec<NamedCalculation>,
    results: Vec<(String, f64)>,
    categories: HashMap<String, Vec<u32>>,
}

impl Residual {
    /// Build from a YAML calculation file; fails on any configuration
    /// problem before a grid is involved.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, ConfigurationError> {
        let calcs = parse_calculations(yaml, CalcContext::Residual)?;
        Ok(Self {
            calcs,
            results: Vec::new(),
            categories: HashMap::new(),
        })
    }

    /// Build from already-parsed calculations with full validation.
    pub fn new(calcs: Vec<NamedCalculation>) -> std::result::Result<Self, ConfigurationError> {
        validate_for_context(&calcs, CalcContext::Residual)?;
        Ok(Self {
            calcs,
            results: Vec::new(),
            categories: HashMap::new(),
        })
    }

    /// Declared calculation names, in order. Note that `discretized_misfit`
    /// contributes its rendered category names to [`Residual::names`]
    /// instead of its calculation name.
    pub fn calculation_names(&self) -> Vec<&str> {
        self.calcs.iter().map(|c| c.name.as_str()).collect()
    }

    /// Evaluate every calculation against the grid pair.
    ///
    /// Validation order: grid compatibility, field presence on both grids,
    /// result-name uniqueness across the whole surface; only then are values
    /// computed. On failure no results are published.
    pub fn calculate<M, D>(&mut self, model: &M, data: &D) -> Result<()>
    where
        M: MetricGrid + ?Sized,
        D: MetricGrid + ?Sized,
    {
        self.results.clear();
        self.categories.clear();

        check_compatible(model, data)?;
        for calc in &self.calcs {
            for field in calc.spec.model_fields() {
                require_field(model, field)?;
            }
            for field in calc.spec.data_fields() {
                require_field(data, field)?;
            }
        }
        self.check_result_names()?;

        let mut results = Vec::with_capacity(self.calcs.len());
        let mut categories = HashMap::new();
        for calc in &self.calcs {
            log::debug!("residual '{}' ({})", calc.name, calc.spec.tag());
            match &calc.spec {
                CalculationSpec::DiscretizedMisfit {
                    name_template,
                    misfit_field,
                    field_1,
                    field_2,
                    field_1_percentile_edges,
                    field_2_percentile_edges,
                } => {
                    let misfit = discretized_misfit(
                        model,
                        data,
                        name_template,
                        misfit_field,
                        field_1,
                        field_2,
                        field_1_percentile_edges,
                        field_2_percentile_edges,
                    )?;
                    for entry in misfit.entries() {
                        results.push((entry.name.clone(), entry.value));
                    }
                    categories.insert(calc.name.clone(), misfit.category().to_vec());
                }
                spec => {
                    let model_value = evaluate_scalar(&calc.name, spec, model)?;
                    let data_value = evaluate_scalar(&calc.name, spec, data)?;
                    results.push((calc.name.clone(), model_value - data_value));
                }
            }
        }
        self.results = results;
        self.categories = categories;
        Ok(())
    }

    /// Result names in order (empty before `calculate`).
    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Result values in order (empty before `calculate`).
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

    /// Per-node category array of a `discretized_misfit` calculation, by its
    /// calculation name. `None` before `calculate` or for other kinds.
    pub fn category(&self, calc_name: &str) -> Option<&[u32]> {
        self.categories.get(calc_name).map(Vec::as_slice)
    }

    /// The full result surface must have unique names even when a
    /// `discretized_misfit` template renders names that collide with another
    /// calculation's name.
    fn check_result_names(&self) -> std::result::Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for calc in &self.calcs {
            match &calc.spec {
                CalculationSpec::DiscretizedMisfit {
                    name_template,
                    field_1_percentile_edges,
                    field_2_percentile_edges,
                    ..
                } => {
                    let field_1_bins = field_1_percentile_edges.len() - 1;
                    let field_2_bins = field_2_percentile_edges.len() - 1;
                    for level_1 in 1..=field_1_bins {
                        for level_2 in 1..=field_2_bins {
                            let name = render_name(name_template, level_1, level_2);
                            if !seen.insert(name.clone()) {
                                return Err(ConfigurationError::DuplicateResultName { name });
                            }
                        }
                    }
                }
                _ => {
                    if !seen.insert(calc.name.clone()) {
                        return Err(ConfigurationError::DuplicateResultName {
                            name: calc.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalcError;
    use crate::grid::RasterGrid;

    fn pair_with_offset(offset: f64) -> (RasterGrid, RasterGrid) {
        let z: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let mut data = RasterGrid::new(5, 5);
        data.add_field("topographic__elevation", z.clone()).unwrap();

        let model_z: Vec<f64> = z.iter().map(|v| v + offset).collect();
        let mut model = RasterGrid::new(5, 5);
        model.add_field("topographic__elevation", model_z).unwrap();
        (model, data)
    }

    #[test]
    fn scalar_residual_is_model_minus_data() {
        let (model, data) = pair_with_offset(3.0);
        let mut residual = Residual::from_yaml(
            "
me:
  calc: aggregate
  field: topographic__elevation
  method: mean
",
        )
        .unwrap();
        residual.calculate(&model, &data).unwrap();
        assert_eq!(residual.value("me"), Some(3.0));
    }

    #[test]
    fn misfit_entries_splice_into_result_surface() {
        let (model, data) = pair_with_offset(0.0);
        let mut residual = Residual::from_yaml(
            "
me:
  calc: aggregate
  field: topographic__elevation
  method: mean
dm:
  calc: discretized_misfit
  name_template: \"z_{field_1_level}.z_{field_2_level}\"
  misfit_field: topographic__elevation
  field_1: topographic__elevation
  field_2: topographic__elevation
  field_1_percentile_edges: [0, 30, 60, 100]
  field_2_percentile_edges: [0, 50, 100]
",
        )
        .unwrap();
        residual.calculate(&model, &data).unwrap();

        assert_eq!(
            residual.names(),
            vec!["me", "z_1.z_1", "z_1.z_2", "z_2.z_1", "z_2.z_2", "z_3.z_1", "z_3.z_2"]
        );
        assert!(residual.values().iter().all(|&v| v == 0.0));
        assert_eq!(residual.category("dm").unwrap().len(), 25);
        assert!(residual.category("me").is_none());
    }

    #[test]
    fn incompatible_grids_rejected() {
        let (model, _) = pair_with_offset(0.0);
        let mut data = RasterGrid::new(5, 6);
        data.add_field("topographic__elevation", vec![0.0; 30])
            .unwrap();

        let mut residual = Residual::from_yaml(
            "
me:
  calc: aggregate
  field: topographic__elevation
  method: mean
",
        )
        .unwrap();
        let err = residual.calculate(&model, &data).unwrap_err();
        assert!(matches!(
            err,
            CalcError::Configuration(ConfigurationError::NodeCountMismatch { .. })
        ));
        assert!(residual.names().is_empty());
    }

    #[test]
    fn colliding_result_names_rejected_before_computation() {
        let (model, data) = pair_with_offset(0.0);
        // Scalar calc named "z_1.z_1" collides with the misfit's first
        // rendered category name.
        let mut residual = Residual::from_yaml(
            "
z_1.z_1:
  calc: aggregate
  field: topographic__elevation
  method: mean
dm:
  calc: discretized_misfit
  name_template: \"z_{field_1_level}.z_{field_2_level}\"
  misfit_field: topographic__elevation
  field_1: topographic__elevation
  field_2: topographic__elevation
  field_1_percentile_edges: [0, 50, 100]
  field_2_percentile_edges: [0, 100]
",
        )
        .unwrap();
        let err = residual.calculate(&model, &data).unwrap_err();
        assert!(matches!(
            err,
            CalcError::Configuration(ConfigurationError::DuplicateResultName { .. })
        ));
        assert!(residual.names().is_empty(), "no partial results");
    }

    #[test]
    fn idempotent_for_identical_inputs() {
        let (model, data) = pair_with_offset(1.5);
        let mut residual = Residual::from_yaml(
            "
dm:
  calc: discretized_misfit
  name_template: \"c_{field_1_level}_{field_2_level}\"
  misfit_field: topographic__elevation
  field_1: topographic__elevation
  field_2: topographic__elevation
  field_1_percentile_edges: [0, 50, 100]
  field_2_percentile_edges: [0, 50, 100]
",
        )
        .unwrap();

        residual.calculate(&model, &data).unwrap();
        let first_names: Vec<String> =
            residual.names().iter().map(|s| s.to_string()).collect();
        let first_values = residual.values();
        let first_category = residual.category("dm").unwrap().to_vec();

        residual.calculate(&model, &data).unwrap();
        assert_eq!(residual.names(), first_names);
        assert_eq!(residual.values(), first_values, "exact equality required");
        assert_eq!(residual.category("dm").unwrap(), first_category.as_slice());
    }
}
