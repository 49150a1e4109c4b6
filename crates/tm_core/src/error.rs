//! Error taxonomy for metric and residual calculations.
//!
//! Two failure classes, kept separate so callers can tell a bad configuration
//! (fixable by editing the calculation file) from a numeric failure in the
//! grid data itself:
//!
//! - [`ConfigurationError`] — malformed percentile edges, bad name templates,
//!   missing fields, incompatible grids, unknown calculation tags. Raised
//!   eagerly, before any computation begins, so partial results are never
//!   produced.
//! - [`ComputationError`] — numeric failure in otherwise valid inputs
//!   (non-finite values, degenerate fields). Surfaced immediately, never
//!   retried: the calculations are pure, so retrying identical inputs cannot
//!   change the outcome.

use thiserror::Error;

/// A calculation setup problem, detected before any grid data is reduced.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("percentile edge list needs at least 2 entries, got {got}")]
    TooFewEdges { got: usize },

    #[error("percentile edges must be non-decreasing: edge[{index}] = {value} is below its predecessor {previous}")]
    EdgesNotSorted {
        index: usize,
        previous: f64,
        value: f64,
    },

    #[error("percentile edge {value} is outside [0, 100]")]
    EdgeOutOfRange { value: f64 },

    #[error("percentile value {value} is outside [0, 100]")]
    PercentileOutOfRange { value: f64 },

    #[error("name template '{template}' references unknown placeholder '{{{placeholder}}}'")]
    UnknownPlaceholder {
        template: String,
        placeholder: String,
    },

    #[error("name template '{template}' has an unmatched brace")]
    UnbalancedTemplate { template: String },

    #[error("rendered category name '{name}' is not unique")]
    DuplicateCategoryName { name: String },

    #[error("grid is missing required field '{field}'")]
    MissingField { field: String },

    #[error("field '{field}' has {got} values but the grid has {expected} nodes")]
    FieldLengthMismatch {
        field: String,
        expected: usize,
        got: usize,
    },

    #[error("core mask has {got} entries but the grid has {expected} nodes")]
    MaskLengthMismatch { expected: usize, got: usize },

    #[error("grids are incompatible: model has {model_nodes} nodes, data has {data_nodes}")]
    NodeCountMismatch {
        model_nodes: usize,
        data_nodes: usize,
    },

    #[error("grids are incompatible: core-node status differs at node {node}")]
    CoreMaskMismatch { node: usize },

    #[error("unknown calculation '{tag}'")]
    UnknownCalculation { tag: String },

    #[error("calculation '{name}' ({tag}) is not valid in {context} context")]
    WrongContext {
        name: String,
        tag: String,
        context: &'static str,
    },

    #[error("calculation name '{name}' is declared more than once")]
    DuplicateCalculationName { name: String },

    #[error("result name '{name}' is produced by more than one calculation")]
    DuplicateResultName { name: String },

    #[error("calculation '{name}' has invalid parameters: {message}")]
    InvalidParameters { name: String, message: String },

    #[error("calculation file is not a mapping of name -> calculation")]
    NotAMapping,

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A numeric failure while reducing valid-looking inputs.
#[derive(Error, Debug)]
pub enum ComputationError {
    #[error("field '{field}' contains a non-finite value at node {node}")]
    NonFinite { field: String, node: usize },

    #[error("field '{field}' has no core-node values to reduce")]
    EmptySample { field: String },

    #[error("field '{field}' is constant over core nodes; {operation} is undefined")]
    DegenerateField {
        field: String,
        operation: &'static str,
    },
}

/// Umbrella error for the calculation surface.
#[derive(Error, Debug)]
pub enum CalcError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Computation(#[from] ComputationError),
}

pub type Result<T> = std::result::Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_display_mentions_offender() {
        let err = ConfigurationError::TooFewEdges { got: 1 };
        assert_eq!(
            err.to_string(),
            "percentile edge list needs at least 2 entries, got 1"
        );

        let err = ConfigurationError::UnknownPlaceholder {
            template: "chi_{field_3_level}".into(),
            placeholder: "field_3_level".into(),
        };
        assert!(err.to_string().contains("{field_3_level}"));
    }

    #[test]
    fn computation_display_names_field_and_node() {
        let err = ComputationError::NonFinite {
            field: "topographic__elevation".into(),
            node: 42,
        };
        assert!(err.to_string().contains("topographic__elevation"));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn umbrella_converts_both_classes() {
        let config: CalcError = ConfigurationError::TooFewEdges { got: 0 }.into();
        assert!(matches!(config, CalcError::Configuration(_)));

        let compute: CalcError = ComputationError::EmptySample {
            field: "z".into(),
        }
        .into();
        assert!(matches!(compute, CalcError::Computation(_)));
    }
}
