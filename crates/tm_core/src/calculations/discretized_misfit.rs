//! # Discretized Misfit Calculation
//!
//! Joint-percentile classification of grid cells followed by per-category
//! sum-of-squared-residual aggregation.
//!
//! The calculation runs in three stages:
//! 1. **Percentile binning** — bin boundaries for two discretization fields
//!    are computed from the DATA grid's core-node values, so classification is
//!    fixed across every model evaluation compared against the same truth.
//! 2. **Joint category assignment** — each node gets one composite category
//!    id combining its two bin indices row-major, 1-indexed; non-core nodes
//!    get the sentinel 0.
//! 3. **Per-category aggregation** — for every possible category, the sum of
//!    squared differences between the model and data misfit fields over the
//!    member nodes, reported under a name rendered from a user template.
//!
//! Every possible category appears in the output, including empty ones.
//! An empty category reports 0.0 (the sum over an empty set), which is
//! numerically identical to a perfect fit; check [`CategoryEntry::is_empty`]
//! before reading the value that way.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{ComputationError, ConfigurationError, Result};
use crate::grid::{
    check_compatible, core_values, ensure_core_finite, require_field, MetricGrid,
};
use crate::stats;

/// Template placeholder for the 1-based field-1 level.
pub const FIELD_1_LEVEL: &str = "field_1_level";
/// Template placeholder for the 1-based field-2 level.
pub const FIELD_2_LEVEL: &str = "field_2_level";

/// Assigns values to percentile bins with fixed boundaries.
///
/// Bins are half-open `[edge_i, edge_{i+1})` with the last bin closed on the
/// right so the sample maximum lands in the top bin. Values below the first
/// boundary or above the last clamp to the nearest bin; extreme values are
/// classified, never rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileBinner {
    boundaries: Vec<f64>,
}

impl PercentileBinner {
    /// Build a binner from sample values and percentile edges.
    ///
    /// `field` is used only in error messages. The boundaries are the
    /// percentiles of `values` at each edge; `values` is normally the data
    /// grid's core-node sample for the discretization field.
    pub fn from_values(field: &str, values: &[f64], edges: &[f64]) -> Result<Self> {
        validate_edges(edges)?;

        let mut boundaries = Vec::with_capacity(edges.len());
        for &q in edges {
            let b = stats::percentile(values, q).ok_or_else(|| ComputationError::EmptySample {
                field: field.to_string(),
            })?;
            boundaries.push(b);
        }
        Ok(Self { boundaries })
    }

    /// Number of bins (one less than the number of boundaries).
    pub fn bin_count(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Computed bin boundaries, one per percentile edge.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Bin index for a value, in `[0, bin_count - 1]`.
    ///
    /// Out-of-range values clamp to the first or last bin. Non-finite values
    /// also land in the last bin; callers validate finiteness where it
    /// matters, and the sentinel masking in [`assign_categories`] keeps
    /// boundary-node garbage out of the result.
    pub fn bin_of(&self, value: f64) -> usize {
        let last = self.bin_count() - 1;
        if value < self.boundaries[0] {
            return 0;
        }
        for bin in 0..last {
            if value < self.boundaries[bin + 1] {
                return bin;
            }
        }
        last
    }
}

/// Validate a percentile edge list: at least 2 entries, each in [0, 100],
/// monotonically non-decreasing.
pub(crate) fn validate_edges(edges: &[f64]) -> std::result::Result<(), ConfigurationError> {
    if edges.len() < 2 {
        return Err(ConfigurationError::TooFewEdges { got: edges.len() });
    }
    for (i, &e) in edges.iter().enumerate() {
        if !(0.0..=100.0).contains(&e) {
            return Err(ConfigurationError::EdgeOutOfRange { value: e });
        }
        if i > 0 && e < edges[i - 1] {
            return Err(ConfigurationError::EdgesNotSorted {
                index: i,
                previous: edges[i - 1],
                value: e,
            });
        }
    }
    Ok(())
}

/// Validate that a name template only references the two known placeholders.
pub(crate) fn validate_template(template: &str) -> std::result::Result<(), ConfigurationError> {
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                let mut placeholder = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => {
                            return Err(ConfigurationError::UnbalancedTemplate {
                                template: template.to_string(),
                            });
                        }
                        Some(c) => placeholder.push(c),
                    }
                }
                if placeholder != FIELD_1_LEVEL && placeholder != FIELD_2_LEVEL {
                    return Err(ConfigurationError::UnknownPlaceholder {
                        template: template.to_string(),
                        placeholder,
                    });
                }
            }
            '}' => {
                return Err(ConfigurationError::UnbalancedTemplate {
                    template: template.to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

/// Render a category name by substituting 1-based levels into the template.
pub(crate) fn render_name(template: &str, field_1_level: usize, field_2_level: usize) -> String {
    template
        .replace("{field_1_level}", &field_1_level.to_string())
        .replace("{field_2_level}", &field_2_level.to_string())
}

/// Combine two per-node bin-index arrays into one composite category array.
///
/// Composite id for a core node is `1 + b1 * field_2_bins + b2` (row-major,
/// 1-indexed); non-core nodes get 0.
pub fn assign_categories(
    bins_1: &[usize],
    bins_2: &[usize],
    core_mask: &[bool],
    field_2_bins: usize,
) -> Vec<u32> {
    bins_1
        .iter()
        .zip(bins_2)
        .zip(core_mask)
        .map(|((&b1, &b2), &core)| {
            if core {
                (1 + b1 * field_2_bins + b2) as u32
            } else {
                0
            }
        })
        .collect()
}

/// One category of the discretized-misfit result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    /// Rendered category name.
    pub name: String,
    /// Sum of squared model-minus-data residuals over member nodes.
    /// 0.0 for an empty category; see [`CategoryEntry::is_empty`].
    pub value: f64,
    /// Number of member nodes.
    pub count: usize,
}

impl CategoryEntry {
    /// True when no node fell in this category. The `value` of an empty
    /// category is 0.0, indistinguishable from a perfect fit on its own.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Result of one discretized-misfit evaluation.
///
/// Entries are ordered row-major over (field-1 level, field-2 level) and the
/// per-node category array is retained for diagnostics and visualization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscretizedMisfit {
    entries: Vec<CategoryEntry>,
    category: Vec<u32>,
    field_1_bins: usize,
    field_2_bins: usize,
}

impl DiscretizedMisfit {
    /// Category entries in row-major (field-1 level, field-2 level) order.
    /// Always exactly `field_1_bins * field_2_bins` entries.
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    /// Value for a rendered category name.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    /// Per-node composite category ids, 0 for excluded nodes.
    pub fn category(&self) -> &[u32] {
        &self.category
    }

    pub fn field_1_bins(&self) -> usize {
        self.field_1_bins
    }

    pub fn field_2_bins(&self) -> usize {
        self.field_2_bins
    }
}

/// Compute the discretized misfit between a model grid and a data grid.
///
/// Percentile boundaries for both discretization fields come from the data
/// grid's core-node values only, and nodes are classified by the data grid's
/// field values, so the categories are identical for every model grid
/// evaluated against the same data grid.
///
/// All preconditions (edge lists, template, grid compatibility, field
/// presence, finiteness over core nodes) are validated before any
/// aggregation, so a failure never leaves partial results.
///
/// # Arguments
/// * `model`, `data` - The grid under evaluation and the reference grid
/// * `name_template` - Category name template; `{field_1_level}` and
///   `{field_2_level}` substitute the 1-based levels
/// * `misfit_field` - Field on which squared residuals are computed
/// * `field_1`, `field_2` - Discretization fields, classified on the data grid
/// * `field_1_percentile_edges`, `field_2_percentile_edges` - Percentile
///   edges in [0, 100], at least two each, non-decreasing
///
/// # Examples
/// ```
/// use tm_core::calculations::discretized_misfit;
/// use tm_core::grid::RasterGrid;
///
/// let mut data = RasterGrid::new(4, 4);
/// let z: Vec<f64> = (0..16).map(|i| i as f64).collect();
/// data.add_field("topographic__elevation", z).unwrap();
/// let model = data.clone();
///
/// let result = discretized_misfit(
///     &model,
///     &data,
///     "z_{field_1_level}.z_{field_2_level}",
///     "topographic__elevation",
///     "topographic__elevation",
///     "topographic__elevation",
///     &[0.0, 50.0, 100.0],
///     &[0.0, 100.0],
/// )
/// .unwrap();
///
/// assert_eq!(result.entries().len(), 2);
/// assert!(result.entries().iter().all(|e| e.value == 0.0));
/// ```
#[allow(clippy::too_many_arguments)]
pub fn discretized_misfit<M, D>(
    model: &M,
    data: &D,
    name_template: &str,
    misfit_field: &str,
    field_1: &str,
    field_2: &str,
    field_1_percentile_edges: &[f64],
    field_2_percentile_edges: &[f64],
) -> Result<DiscretizedMisfit>
where
    M: MetricGrid + ?Sized,
    D: MetricGrid + ?Sized,
{
    validate_edges(field_1_percentile_edges)?;
    validate_edges(field_2_percentile_edges)?;
    validate_template(name_template)?;
    check_compatible(model, data)?;

    let model_misfit = require_field(model, misfit_field)?;
    let data_misfit = require_field(data, misfit_field)?;
    let field_1_all = require_field(data, field_1)?;
    let field_2_all = require_field(data, field_2)?;

    ensure_core_finite(model, misfit_field)?;
    ensure_core_finite(data, misfit_field)?;

    let sample_1 = core_values(data, field_1)?;
    let sample_2 = core_values(data, field_2)?;
    let binner_1 = PercentileBinner::from_values(field_1, &sample_1, field_1_percentile_edges)?;
    let binner_2 = PercentileBinner::from_values(field_2, &sample_2, field_2_percentile_edges)?;

    let field_1_bins = binner_1.bin_count();
    let field_2_bins = binner_2.bin_count();
    log::debug!(
        "discretized_misfit: {field_1} boundaries {:?}, {field_2} boundaries {:?}",
        binner_1.boundaries(),
        binner_2.boundaries()
    );

    // Render every category name up front; a duplicate must fail before any
    // aggregation happens.
    let total = field_1_bins * field_2_bins;
    let mut names = Vec::with_capacity(total);
    let mut seen = HashSet::with_capacity(total);
    for level_1 in 1..=field_1_bins {
        for level_2 in 1..=field_2_bins {
            let name = render_name(name_template, level_1, level_2);
            if !seen.insert(name.clone()) {
                return Err(ConfigurationError::DuplicateCategoryName { name }.into());
            }
            names.push(name);
        }
    }

    let bins_1: Vec<usize> = field_1_all.iter().map(|&v| binner_1.bin_of(v)).collect();
    let bins_2: Vec<usize> = field_2_all.iter().map(|&v| binner_2.bin_of(v)).collect();
    let core_mask: Vec<bool> = (0..data.node_count()).map(|i| data.is_core_node(i)).collect();
    let category = assign_categories(&bins_1, &bins_2, &core_mask, field_2_bins);

    let mut values = vec![0.0; total];
    let mut counts = vec![0usize; total];
    for (node, &c) in category.iter().enumerate() {
        if c == 0 {
            continue;
        }
        let slot = (c - 1) as usize;
        let diff = model_misfit[node] - data_misfit[node];
        values[slot] += diff * diff;
        counts[slot] += 1;
    }

    let entries = names
        .into_iter()
        .zip(values)
        .zip(counts)
        .map(|((name, value), count)| CategoryEntry { name, value, count })
        .collect();

    Ok(DiscretizedMisfit {
        entries,
        category,
        field_1_bins,
        field_2_bins,
    })
}
