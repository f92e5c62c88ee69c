use std::path::PathBuf;

use ndarray::Array2;

use super::*;
use crate::model::case::ViewpointCase;
use crate::model::rule::{PositiveClassSpec, default_exception_ids};

fn config(case: ViewpointCase, batch_size: usize) -> EvalConfig {
    EvalConfig {
        data_dir: PathBuf::from("data"),
        split: "test".to_string(),
        case,
        candidate_path: case.default_table_path(),
        batch_size,
        print_freq: 10,
        topk: vec![1, 5],
        id_suffix_len: 4,
        positive_class: PositiveClassSpec::Index(1),
        positive_label: "chair".to_string(),
        exception_ids: default_exception_ids(),
        csv_path: PathBuf::from("scores.csv"),
        summary_json: None,
        threads: 0,
    }
}

fn identity_table(n_candidates: usize, num_views: usize) -> Array2<i64> {
    Array2::from_shape_fn((n_candidates, num_views), |(j, k)| {
        ((j + k) % num_views) as i64
    })
}

#[test]
fn test_stage1_happy_path() {
    let cfg = config(ViewpointCase::Ring12, 24);
    let table = identity_table(12, 12);
    let out = run_stage1(&Stage1Inputs {
        config: &cfg,
        n_rows: 48,
        logit_width: 12 * 4,
        candidates_raw: table.view(),
        class_names: None,
    })
    .unwrap();
    assert_eq!(out.num_views, 12);
    assert_eq!(out.num_classes, 3);
    assert_eq!(out.candidates.num_candidates(), 12);
    assert_eq!(out.rule.positive_class, 1);
    assert_eq!(out.topk, vec![1, 3]);
}

#[test]
fn test_batch_size_must_be_multiple_of_views() {
    assert_eq!(
        check_batch_size(30, 20),
        Err(ConfigError::BatchSizeNotMultiple {
            batch_size: 30,
            num_views: 20
        })
    );
    assert_eq!(check_batch_size(0, 20), Err(ConfigError::ZeroBatchSize));
    assert!(check_batch_size(40, 20).is_ok());
}

#[test]
fn test_infer_num_classes() {
    assert_eq!(infer_num_classes(20 * 41, 20).unwrap(), 40);
    assert_eq!(infer_num_classes(20 * 2, 20).unwrap(), 1);
    assert!(infer_num_classes(20 * 41 + 1, 20).is_err());
    assert!(infer_num_classes(20, 20).is_err());
}

#[test]
fn test_rows_must_group_into_objects() {
    let cfg = config(ViewpointCase::Ring12, 12);
    let table = identity_table(2, 12);
    let err = run_stage1(&Stage1Inputs {
        config: &cfg,
        n_rows: 13,
        logit_width: 12 * 3,
        candidates_raw: table.view(),
        class_names: None,
    })
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::RowsNotMultiple {
            rows: 13,
            num_views: 12
        }
    );
}

#[test]
fn test_candidate_table_must_match_case() {
    let cfg = config(ViewpointCase::Dodecahedron20, 20);
    let table = identity_table(4, 12);
    let err = run_stage1(&Stage1Inputs {
        config: &cfg,
        n_rows: 20,
        logit_width: 20 * 3,
        candidates_raw: table.view(),
        class_names: None,
    })
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::CandidateViews {
            expected: 20,
            actual: 12
        }
    );
}

#[test]
fn test_class_names_must_match_output() {
    let cfg = config(ViewpointCase::Ring12, 12);
    let table = identity_table(1, 12);
    let names = vec!["bed".to_string(), "chair".to_string(), "desk".to_string()];
    let err = run_stage1(&Stage1Inputs {
        config: &cfg,
        n_rows: 12,
        logit_width: 12 * 3,
        candidates_raw: table.view(),
        class_names: Some(names.as_slice()),
    })
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::ClassCount {
            expected: 2,
            actual: 3
        }
    );
}

#[test]
fn test_positive_class_by_name() {
    let mut cfg = config(ViewpointCase::Ring12, 12);
    cfg.positive_class = PositiveClassSpec::Name("chair".to_string());
    let table = identity_table(1, 12);
    let names = vec!["bed".to_string(), "chair".to_string()];
    let out = run_stage1(&Stage1Inputs {
        config: &cfg,
        n_rows: 12,
        logit_width: 12 * 3,
        candidates_raw: table.view(),
        class_names: Some(names.as_slice()),
    })
    .unwrap();
    assert_eq!(out.rule.positive_class, 1);
}

#[test]
fn test_bad_candidate_entry_is_config_error() {
    let cfg = config(ViewpointCase::Ring12, 12);
    let mut table = identity_table(1, 12);
    table[[0, 3]] = 12;
    let err = run_stage1(&Stage1Inputs {
        config: &cfg,
        n_rows: 12,
        logit_width: 12 * 3,
        candidates_raw: table.view(),
        class_names: None,
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::CandidateIndex { row: 0, column: 3, .. }));
}

#[test]
fn test_clamp_topk() {
    assert_eq!(clamp_topk(&[1, 5], 40), vec![1, 5]);
    assert_eq!(clamp_topk(&[1, 5], 2), vec![1, 2]);
}
