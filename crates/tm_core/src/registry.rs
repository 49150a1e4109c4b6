//! # Calculation Registry
//!
//! Static table of known calculation tags and the contexts they are valid in.
//! Configuration loading resolves every tag against this table up front, so
//! an unknown or misplaced calculation fails at load time, not halfway
//! through a parameter sweep.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

/// Where a calculation may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcContext {
    /// One grid.
    Metric,
    /// A (model, data) grid pair.
    Residual,
}

impl CalcContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalcContext::Metric => "metric",
            CalcContext::Residual => "residual",
        }
    }
}

/// Registry entry for one calculation kind.
#[derive(Debug, Clone, Copy)]
pub struct CalculationInfo {
    pub tag: &'static str,
    pub metric: bool,
    pub residual: bool,
}

impl CalculationInfo {
    pub fn supports(&self, context: CalcContext) -> bool {
        match context {
            CalcContext::Metric => self.metric,
            CalcContext::Residual => self.residual,
        }
    }
}

static REGISTRY: Lazy<BTreeMap<&'static str, CalculationInfo>> = Lazy::new(|| {
    let entries = [
        CalculationInfo {
            tag: "aggregate",
            metric: true,
            residual: true,
        },
        CalculationInfo {
            tag: "chi_gradient",
            metric: true,
            residual: true,
        },
        CalculationInfo {
            tag: "chi_intercept",
            metric: true,
            residual: true,
        },
        CalculationInfo {
            tag: "count_equal",
            metric: true,
            residual: true,
        },
        CalculationInfo {
            tag: "hypsometric_integral",
            metric: true,
            residual: true,
        },
        // Inherently two-grid: classification comes from the data grid.
        CalculationInfo {
            tag: "discretized_misfit",
            metric: false,
            residual: true,
        },
    ];
    entries.into_iter().map(|info| (info.tag, info)).collect()
});

/// Look up a calculation tag.
pub fn lookup(tag: &str) -> Option<&'static CalculationInfo> {
    REGISTRY.get(tag)
}

/// All known tags, sorted.
pub fn known_tags() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}
