use ndarray::array;

use super::*;

fn result(is_positive: bool, binary_correct: bool, topk_hits: Vec<bool>) -> ObjectResult {
    ObjectResult {
        object_id: "obj_0001".to_string(),
        target_class: 0,
        predicted_class: 0,
        best_candidate: 0,
        class_scores: array![1.0],
        positive_class_score: 1.0,
        is_positive,
        binary_correct,
        topk_hits,
    }
}

#[test]
fn test_unit_weights_give_arithmetic_mean() {
    let mut meter = AverageMeter::new();
    for v in [1.0, 2.0, 3.0] {
        meter.update(v, 1.0);
    }
    assert_eq!(meter.average(), 2.0);
    assert_eq!(meter.current(), 3.0);
}

#[test]
fn test_weighted_average() {
    let mut meter = AverageMeter::new();
    meter.update(10.0, 2.0);
    meter.update(20.0, 1.0);
    assert!((meter.average() - 40.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_fractional_weights() {
    let mut meter = AverageMeter::new();
    meter.update(100.0, 0.5);
    meter.update(0.0, 1.5);
    assert!((meter.average() - 25.0).abs() < 1e-12);
}

#[test]
fn test_reset_and_empty_meter() {
    let mut meter = AverageMeter::new();
    assert_eq!(meter.average(), 0.0);
    meter.update(5.0, 0.0);
    assert_eq!(meter.average(), 0.0);
    meter.update(4.0, 2.0);
    meter.reset();
    assert_eq!(meter, AverageMeter::new());
}

#[test]
fn test_binary_tally_ratios() {
    let mut tally = BinaryTally::default();
    tally.record(&result(true, true, vec![]));
    tally.record(&result(true, false, vec![]));
    tally.record(&result(false, true, vec![]));
    assert_eq!(tally.positive_accuracy("chair").unwrap(), 0.5);
    assert_eq!(tally.negative_accuracy("chair").unwrap(), 1.0);
    assert!((tally.overall_accuracy().unwrap() - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_zero_denominator_is_degenerate() {
    let mut tally = BinaryTally::default();
    tally.record(&result(true, true, vec![]));
    let err = tally.negative_accuracy("chair").unwrap_err();
    assert_eq!(
        err,
        MetricsError::Degenerate {
            metric: "negative-class accuracy",
            category: "non-chair".to_string()
        }
    );
    assert!(err.to_string().contains("undefined"));

    let empty = BinaryTally::default();
    assert!(empty.positive_accuracy("chair").is_err());
    assert!(empty.overall_accuracy().is_err());
}

#[test]
fn test_update_batch_weights_objects_by_views() {
    let mut metrics = EvalMetrics::new(&[1, 5]);
    let first = vec![
        result(true, true, vec![true, true]),
        result(false, true, vec![false, true]),
    ];
    metrics.update_batch(&BatchStats {
        rows: 40,
        num_views: 20,
        loss: 2.0,
        elapsed_secs: 0.5,
        results: &first,
    });
    let second = vec![result(false, false, vec![false, false])];
    metrics.update_batch(&BatchStats {
        rows: 20,
        num_views: 20,
        loss: 5.0,
        elapsed_secs: 1.5,
        results: &second,
    });

    // top-1: 50% over 2 objects, 0% over 1 object
    assert!((metrics.topk[0].1.average() - 100.0 / 3.0).abs() < 1e-9);
    // top-5: 100% over 2 objects, 0% over 1 object
    assert!((metrics.topk[1].1.average() - 200.0 / 3.0).abs() < 1e-9);
    // loss weighted by rows: (2*40 + 5*20) / 60
    assert!((metrics.loss.average() - 3.0).abs() < 1e-12);
    assert_eq!(metrics.batch_time.average(), 1.0);
    assert_eq!(metrics.objects, 3);
    assert_eq!(metrics.batches, 2);
    assert_eq!(metrics.binary.positive_total, 1);
    assert_eq!(metrics.binary.negative_total, 2);
    assert_eq!(metrics.binary.negative_correct, 1);

    metrics.reset();
    assert_eq!(metrics.objects, 0);
    assert_eq!(metrics.binary, BinaryTally::default());
    assert_eq!(metrics.topk[0].1.average(), 0.0);
}

#[test]
fn test_progress_schedule() {
    let every_ten = ProgressSchedule { every: 10 };
    assert!(every_ten.is_due(0));
    assert!(!every_ten.is_due(9));
    assert!(every_ten.is_due(20));
    let never = ProgressSchedule { every: 0 };
    assert!(!never.is_due(0));
}
