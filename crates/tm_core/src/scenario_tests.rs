//! End-to-end scenarios over realistic grid setups.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::calculations::{discretized_misfit, PercentileBinner};
use crate::grid::{MetricGrid, RasterGrid};
use crate::residual::Residual;

const Z: &str = "topographic__elevation";
const CHI: &str = "channel__chi_index";

/// 10x10 grid with node index as elevation and a seeded pseudo-random chi
/// field.
fn ten_by_ten_pair(seed: u64, model_offset: f64) -> (RasterGrid, RasterGrid) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let z: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let chi: Vec<f64> = (0..100).map(|_| rng.gen_range(0.0..50.0)).collect();

    let mut data = RasterGrid::new(10, 10);
    data.add_field(Z, z.clone()).unwrap();
    data.add_field(CHI, chi.clone()).unwrap();

    let mut model = RasterGrid::new(10, 10);
    model
        .add_field(Z, z.iter().map(|v| v + model_offset).collect())
        .unwrap();
    model.add_field(CHI, chi).unwrap();
    (model, data)
}

const MISFIT_YAML: &str = "
dm:
  calc: discretized_misfit
  name_template: \"chi_{field_1_level}.z_{field_2_level}\"
  misfit_field: topographic__elevation
  field_1: channel__chi_index
  field_2: topographic__elevation
  field_1_percentile_edges: [0, 30, 60, 100]
  field_2_percentile_edges: [0, 50, 100]
";

#[test]
fn identical_grids_give_zero_misfit_in_all_six_categories() {
    let (model, data) = ten_by_ten_pair(7, 0.0);
    assert_eq!(data.core_node_count(), 64);

    let mut residual = Residual::from_yaml(MISFIT_YAML).unwrap();
    residual.calculate(&model, &data).unwrap();

    assert_eq!(residual.names().len(), 6);
    for (name, value) in residual.results() {
        assert_eq!(*value, 0.0, "category {name} must have zero misfit");
    }
}

#[test]
fn monotone_field_splits_at_the_median_column() {
    // field_1 strictly increasing left-to-right: value = column index.
    let col_field: Vec<f64> = (0..100).map(|i| (i % 10) as f64).collect();
    let mut data = RasterGrid::new(10, 10);
    data.add_field(Z, col_field.clone()).unwrap();
    let model = data.clone();

    let result = discretized_misfit(
        &model,
        &data,
        "c_{field_1_level}_{field_2_level}",
        Z,
        Z,
        Z,
        &[0.0, 50.0, 100.0],
        &[0.0, 100.0],
    )
    .unwrap();

    // Core columns run 1..=8, so the median boundary is 4.5: columns 1-4 in
    // bin 0, columns 5-8 in bin 1.
    for row in 1..9 {
        for col in 1..9 {
            let node = row * 10 + col;
            let category = result.category()[node];
            if col <= 4 {
                assert_eq!(category, 1, "node {node} (col {col}) must be in bin 0");
            } else {
                assert_eq!(category, 2, "node {node} (col {col}) must be in bin 1");
            }
        }
    }
    // Boundary nodes are excluded regardless of value.
    assert_eq!(result.category()[0], 0);
    assert_eq!(result.category()[99], 0);
}

#[test]
fn perfectly_correlated_fields_leave_off_diagonal_categories_empty() {
    // field_1 == field_2 means bin indices always agree, so the (1,2) and
    // (2,1) combinations can have no members.
    let z: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let mut data = RasterGrid::new(10, 10);
    data.add_field(Z, z).unwrap();
    let model = data.clone();

    let result = discretized_misfit(
        &model,
        &data,
        "c_{field_1_level}_{field_2_level}",
        Z,
        Z,
        Z,
        &[0.0, 50.0, 100.0],
        &[0.0, 50.0, 100.0],
    )
    .unwrap();

    assert_eq!(result.entries().len(), 4, "empty categories are not omitted");
    let by_name: Vec<(&str, f64, usize)> = result
        .entries()
        .iter()
        .map(|e| (e.name.as_str(), e.value, e.count))
        .collect();
    assert_eq!(by_name[1], ("c_1_2", 0.0, 0));
    assert_eq!(by_name[2], ("c_2_1", 0.0, 0));
    assert!(result.entries()[1].is_empty());
    assert!(!result.entries()[0].is_empty());
    assert_eq!(result.entries()[0].count + result.entries()[3].count, 64);
}

#[test]
fn constant_offset_misfit_distributes_over_categories() {
    let (model, data) = ten_by_ten_pair(21, 2.0);
    let mut residual = Residual::from_yaml(MISFIT_YAML).unwrap();
    residual.calculate(&model, &data).unwrap();

    // Every core node contributes (2.0)^2; the six categories partition the
    // 64 core nodes, so the values sum to 256.
    let total: f64 = residual.values().iter().sum();
    assert!((total - 256.0).abs() < 1e-9, "total misfit was {total}");
}

#[test]
fn repeated_evaluation_is_exactly_identical() {
    let (model, data) = ten_by_ten_pair(3, 0.75);
    let mut residual = Residual::from_yaml(MISFIT_YAML).unwrap();

    residual.calculate(&model, &data).unwrap();
    let first: Vec<(String, f64)> = residual.results().to_vec();

    let mut again = Residual::from_yaml(MISFIT_YAML).unwrap();
    again.calculate(&model, &data).unwrap();

    assert_eq!(again.results(), first.as_slice());
}

#[test]
fn binner_covers_every_core_value_of_a_random_field() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let values: Vec<f64> = (0..500).map(|_| rng.gen_range(-1000.0..1000.0)).collect();

    let binner = PercentileBinner::from_values("z", &values, &[0.0, 20.0, 40.0, 60.0, 80.0, 100.0])
        .unwrap();
    for &v in &values {
        let bin = binner.bin_of(v);
        assert!(bin <= 4, "value {v} landed outside [0, 4]: bin {bin}");
    }
}
