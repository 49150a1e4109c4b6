//! # Grid Collaborator Module
//!
//! The calculations do not build grids; they consume them through the narrow
//! [`MetricGrid`] trait (node count, named fields, core-node predicate).
//! [`RasterGrid`] is the bundled implementation: a rectangular node layout
//! with named f64 fields and a boolean core mask, perimeter nodes boundary by
//! default.
//!
//! Two grids being compared (model vs. data) must be compatible: same node
//! count and same core-node set. [`check_compatible`] validates that before
//! any values are reduced.
//!
//! No adjacency, flow routing, or grid construction beyond the rectangular
//! shape lives here; those belong to the upstream simulation stack.

use std::collections::HashMap;

use crate::error::{CalcError, ComputationError, ConfigurationError};

/// What a calculation needs from a spatial grid.
///
/// Node ordering is stable and shared across the grids being compared; the
/// node at index `i` on the model grid corresponds to the node at index `i`
/// on the data grid.
pub trait MetricGrid {
    /// Total number of nodes, core and boundary alike.
    fn node_count(&self) -> usize;

    /// Per-node values of a named field, or `None` if the grid lacks it.
    fn field_values(&self, name: &str) -> Option<&[f64]>;

    /// Whether the node at `node` is a core (interior) node, eligible for
    /// metric computation.
    fn is_core_node(&self, node: usize) -> bool;

    /// Number of core nodes.
    fn core_node_count(&self) -> usize {
        (0..self.node_count()).filter(|&i| self.is_core_node(i)).count()
    }
}

/// Rectangular grid of nodes with named scalar fields.
///
/// Nodes are numbered row-major, `rows * cols` in total. The perimeter is
/// boundary (non-core) by default, matching the usual fixed-boundary setup of
/// surface-process models; callers with a different boundary condition can
/// replace the mask wholesale via [`RasterGrid::set_core_mask`].
///
/// # Examples
/// ```
/// use tm_core::grid::{MetricGrid, RasterGrid};
///
/// let mut grid = RasterGrid::new(4, 5);
/// grid.add_field("topographic__elevation", vec![1.0; 20]).unwrap();
/// assert_eq!(grid.node_count(), 20);
/// assert_eq!(grid.core_node_count(), 6); // 2 x 3 interior
/// assert!(!grid.is_core_node(0));        // corner
/// assert!(grid.is_core_node(6));         // interior
/// ```
#[derive(Debug, Clone)]
pub struct RasterGrid {
    rows: usize,
    cols: usize,
    core: Vec<bool>,
    fields: HashMap<String, Vec<f64>>,
}

impl RasterGrid {
    /// Create a `rows x cols` grid with a 1-node boundary perimeter.
    pub fn new(rows: usize, cols: usize) -> Self {
        let mut core = vec![false; rows * cols];
        for r in 1..rows.saturating_sub(1) {
            for c in 1..cols.saturating_sub(1) {
                core[r * cols + c] = true;
            }
        }
        Self {
            rows,
            cols,
            core,
            fields: HashMap::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Attach (or replace) a named field.
    ///
    /// Fails with [`ConfigurationError::FieldLengthMismatch`] when the value
    /// count differs from the node count.
    pub fn add_field(
        &mut self,
        name: &str,
        values: Vec<f64>,
    ) -> Result<(), ConfigurationError> {
        if values.len() != self.node_count() {
            return Err(ConfigurationError::FieldLengthMismatch {
                field: name.to_string(),
                expected: self.node_count(),
                got: values.len(),
            });
        }
        self.fields.insert(name.to_string(), values);
        Ok(())
    }

    /// Replace the core-node mask.
    pub fn set_core_mask(&mut self, mask: Vec<bool>) -> Result<(), ConfigurationError> {
        if mask.len() != self.node_count() {
            return Err(ConfigurationError::MaskLengthMismatch {
                expected: self.node_count(),
                got: mask.len(),
            });
        }
        self.core = mask;
        Ok(())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl MetricGrid for RasterGrid {
    fn node_count(&self) -> usize {
        self.rows * self.cols
    }

    fn field_values(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    fn is_core_node(&self, node: usize) -> bool {
        self.core.get(node).copied().unwrap_or(false)
    }
}

/// Validate that two grids may be compared node-for-node.
///
/// Same node count and identical core-node sets; field values are allowed to
/// differ (that is the whole point).
pub fn check_compatible<M: MetricGrid + ?Sized, D: MetricGrid + ?Sized>(
    model: &M,
    data: &D,
) -> Result<(), ConfigurationError> {
    if model.node_count() != data.node_count() {
        return Err(ConfigurationError::NodeCountMismatch {
            model_nodes: model.node_count(),
            data_nodes: data.node_count(),
        });
    }
    for node in 0..model.node_count() {
        if model.is_core_node(node) != data.is_core_node(node) {
            return Err(ConfigurationError::CoreMaskMismatch { node });
        }
    }
    Ok(())
}

/// Fetch a required field or fail with [`ConfigurationError::MissingField`].
pub fn require_field<'g, G: MetricGrid + ?Sized>(
    grid: &'g G,
    field: &str,
) -> Result<&'g [f64], ConfigurationError> {
    grid.field_values(field)
        .ok_or_else(|| ConfigurationError::MissingField {
            field: field.to_string(),
        })
}

/// Gather a field's values over core nodes, validated for use in a reduction.
///
/// Fails when the field is missing, when any core-node value is non-finite
/// (reported with the node's original index), or when the grid has no core
/// nodes at all.
pub fn core_values<G: MetricGrid + ?Sized>(grid: &G, field: &str) -> Result<Vec<f64>, CalcError> {
    let values = require_field(grid, field)?;

    let mut out = Vec::with_capacity(values.len());
    for (node, &v) in values.iter().enumerate() {
        if !grid.is_core_node(node) {
            continue;
        }
        if !v.is_finite() {
            return Err(ComputationError::NonFinite {
                field: field.to_string(),
                node,
            }
            .into());
        }
        out.push(v);
    }

    if out.is_empty() {
        return Err(ComputationError::EmptySample {
            field: field.to_string(),
        }
        .into());
    }
    Ok(out)
}

/// Validate that every core-node value of a field is finite.
pub fn ensure_core_finite<G: MetricGrid + ?Sized>(
    grid: &G,
    field: &str,
) -> Result<(), CalcError> {
    let values = require_field(grid, field)?;
    for (node, &v) in values.iter().enumerate() {
        if grid.is_core_node(node) && !v.is_finite() {
            return Err(ComputationError::NonFinite {
                field: field.to_string(),
                node,
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perimeter_is_boundary_by_default() {
        let grid = RasterGrid::new(3, 4);
        assert_eq!(grid.node_count(), 12);
        assert_eq!(grid.core_node_count(), 2); // nodes 5 and 6

        for c in 0..4 {
            assert!(!grid.is_core_node(c), "top row must be boundary");
            assert!(!grid.is_core_node(8 + c), "bottom row must be boundary");
        }
        assert!(!grid.is_core_node(4), "left edge must be boundary");
        assert!(!grid.is_core_node(7), "right edge must be boundary");
        assert!(grid.is_core_node(5));
        assert!(grid.is_core_node(6));
    }

    #[test]
    fn ten_by_ten_has_64_core_nodes() {
        let grid = RasterGrid::new(10, 10);
        assert_eq!(grid.node_count(), 100);
        assert_eq!(grid.core_node_count(), 64);
    }

    #[test]
    fn add_field_rejects_wrong_length() {
        let mut grid = RasterGrid::new(3, 3);
        let err = grid.add_field("z", vec![0.0; 8]).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::FieldLengthMismatch { expected: 9, got: 8, .. }
        ));
    }

    #[test]
    fn set_core_mask_replaces_default() {
        let mut grid = RasterGrid::new(3, 3);
        grid.set_core_mask(vec![true; 9]).unwrap();
        assert_eq!(grid.core_node_count(), 9);

        let err = grid.set_core_mask(vec![true; 4]).unwrap_err();
        assert!(matches!(err, ConfigurationError::MaskLengthMismatch { .. }));
    }

    #[test]
    fn check_compatible_accepts_matching_grids() {
        let a = RasterGrid::new(5, 5);
        let b = RasterGrid::new(5, 5);
        assert!(check_compatible(&a, &b).is_ok());
    }

    #[test]
    fn check_compatible_rejects_node_count_mismatch() {
        let a = RasterGrid::new(5, 5);
        let b = RasterGrid::new(5, 6);
        let err = check_compatible(&a, &b).unwrap_err();
        assert!(matches!(err, ConfigurationError::NodeCountMismatch { .. }));
    }

    #[test]
    fn check_compatible_rejects_core_mask_mismatch() {
        let a = RasterGrid::new(3, 3);
        let mut b = RasterGrid::new(3, 3);
        b.set_core_mask(vec![true; 9]).unwrap();
        let err = check_compatible(&a, &b).unwrap_err();
        assert!(matches!(err, ConfigurationError::CoreMaskMismatch { node: 0 }));
    }

    #[test]
    fn core_values_gathers_interior_only() {
        let mut grid = RasterGrid::new(3, 3);
        let values: Vec<f64> = (0..9).map(|i| i as f64).collect();
        grid.add_field("z", values).unwrap();

        let core = core_values(&grid, "z").unwrap();
        assert_eq!(core, vec![4.0]); // only the center node
    }

    #[test]
    fn core_values_reports_missing_field() {
        let grid = RasterGrid::new(3, 3);
        let err = core_values(&grid, "nope").unwrap_err();
        assert!(matches!(
            err,
            CalcError::Configuration(ConfigurationError::MissingField { .. })
        ));
    }

    #[test]
    fn core_values_reports_non_finite_with_node_index() {
        let mut grid = RasterGrid::new(3, 3);
        let mut values = vec![0.0; 9];
        values[4] = f64::NAN;
        grid.add_field("z", values).unwrap();

        let err = core_values(&grid, "z").unwrap_err();
        match err {
            CalcError::Computation(ComputationError::NonFinite { node, .. }) => {
                assert_eq!(node, 4)
            }
            other => panic!("expected NonFinite, got {other:?}"),
        }
    }

    #[test]
    fn core_values_ignores_non_finite_boundary() {
        let mut grid = RasterGrid::new(3, 3);
        let mut values = vec![1.0; 9];
        values[0] = f64::NAN; // boundary corner, never reduced
        grid.add_field("z", values).unwrap();
        assert_eq!(core_values(&grid, "z").unwrap(), vec![1.0]);
    }
}
