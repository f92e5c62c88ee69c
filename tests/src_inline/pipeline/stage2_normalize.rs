use ndarray::{Array2, array};

use super::*;

fn log_softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let lse = max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
    values.iter().map(|v| v - lse).collect()
}

#[test]
fn test_log_odds_layout_and_values() {
    // 2 views, 2 classes + reject: each row holds 2 groups of 3 logits.
    let raw = array![
        [1.0f32, 2.0, 0.5, 0.0, -1.0, 3.0],
        [2.0, 2.0, 2.0, 4.0, 1.0, 0.0],
    ];
    let out = per_view_log_odds(raw.view(), 2, 2).unwrap();
    assert_eq!(out.dim(), (2, 2, 2));

    assert!((out[[0, 0, 0]] - 0.5).abs() < 1e-12);
    assert!((out[[0, 0, 1]] - 1.5).abs() < 1e-12);
    assert!((out[[0, 1, 0]] + 3.0).abs() < 1e-12);
    assert!((out[[0, 1, 1]] + 4.0).abs() < 1e-12);
    assert!((out[[1, 0, 0]] - 0.0).abs() < 1e-12);
    assert!((out[[1, 1, 0]] - 4.0).abs() < 1e-12);
    assert!((out[[1, 1, 1]] - 1.0).abs() < 1e-12);
}

#[test]
fn test_log_odds_match_log_softmax_difference() {
    let raw = array![
        [0.3f32, -2.0, 1.7, 0.9, 0.1, -0.4],
        [5.0, 4.0, -3.0, 0.0, 0.0, 0.0],
    ];
    let out = per_view_log_odds(raw.view(), 2, 2).unwrap();
    for i in 0..2 {
        for g in 0..2 {
            let group: Vec<f64> = (0..3).map(|c| raw[[i, g * 3 + c]] as f64).collect();
            let ls = log_softmax(&group);
            for c in 0..2 {
                assert!((out[[i, g, c]] - (ls[c] - ls[2])).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn test_log_odds_shape_error() {
    let raw = Array2::<f32>::zeros((2, 5));
    assert!(matches!(
        per_view_log_odds(raw.view(), 2, 2),
        Err(ConfigError::TensorShape { .. })
    ));
}

#[test]
fn test_batch_splits_objects() {
    let raw = Array2::<f32>::from_shape_fn((4, 6), |(r, c)| (r * 6 + c) as f32);
    let objects = batch_log_odds(raw.view(), 2, 2).unwrap();
    assert_eq!(objects.len(), 2);
    // second object starts at row 2: logits 12..18, first group [12, 13, 14]
    assert!((objects[1][[0, 0, 0]] - (12.0 - 14.0)).abs() < 1e-12);

    let odd = Array2::<f32>::zeros((3, 6));
    assert!(batch_log_odds(odd.view(), 2, 2).is_err());
}

#[test]
fn test_cross_entropy_uniform_row() {
    let raw = Array2::<f32>::zeros((2, 4));
    let loss = cross_entropy(raw.view(), &[0, 3]);
    assert!((loss - 4f64.ln()).abs() < 1e-12);
}

#[test]
fn test_cross_entropy_matches_log_softmax() {
    let raw = array![[1.0f32, 2.0, 3.0], [0.0, -1.0, 0.5]];
    let expected = -(log_softmax(&[1.0, 2.0, 3.0])[2] + log_softmax(&[0.0, -1.0, 0.5])[0]) / 2.0;
    let loss = cross_entropy(raw.view(), &[2, 0]);
    assert!((loss - expected).abs() < 1e-9);
    assert_eq!(cross_entropy(raw.view(), &[]), 0.0);
}
