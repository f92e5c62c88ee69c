use serde::Serialize;
use thiserror::Error;

use crate::model::result::ObjectResult;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("{metric} is undefined: no ground-truth {category} objects were evaluated")]
    Degenerate {
        metric: &'static str,
        category: String,
    },
}

/// Streaming weighted mean with the most recent value kept alongside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AverageMeter {
    val: f64,
    sum: f64,
    count: f64,
    avg: f64,
}

impl AverageMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(&mut self, value: f64, weight: f64) {
        self.val = value;
        self.sum += value * weight;
        self.count += weight;
        if self.count > 0.0 {
            self.avg = self.sum / self.count;
        }
    }

    pub fn current(&self) -> f64 {
        self.val
    }

    pub fn average(&self) -> f64 {
        self.avg
    }
}

/// Positive-vs-rest counts for the binary rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BinaryTally {
    pub positive_total: usize,
    pub positive_correct: usize,
    pub negative_total: usize,
    pub negative_correct: usize,
}

impl BinaryTally {
    pub fn record(&mut self, result: &ObjectResult) {
        if result.is_positive {
            self.positive_total += 1;
            if result.binary_correct {
                self.positive_correct += 1;
            }
        } else {
            self.negative_total += 1;
            if result.binary_correct {
                self.negative_correct += 1;
            }
        }
    }

    pub fn positive_accuracy(&self, label: &str) -> Result<f64, MetricsError> {
        ratio(
            self.positive_correct,
            self.positive_total,
            "positive-class accuracy",
            label.to_string(),
        )
    }

    pub fn negative_accuracy(&self, label: &str) -> Result<f64, MetricsError> {
        ratio(
            self.negative_correct,
            self.negative_total,
            "negative-class accuracy",
            format!("non-{label}"),
        )
    }

    pub fn overall_accuracy(&self) -> Result<f64, MetricsError> {
        ratio(
            self.positive_correct + self.negative_correct,
            self.positive_total + self.negative_total,
            "overall binary accuracy",
            "evaluated".to_string(),
        )
    }
}

fn ratio(
    correct: usize,
    total: usize,
    metric: &'static str,
    category: String,
) -> Result<f64, MetricsError> {
    if total == 0 {
        return Err(MetricsError::Degenerate { metric, category });
    }
    Ok(correct as f64 / total as f64)
}

/// Per-batch quantities fed into the running metrics.
#[derive(Debug, Clone)]
pub struct BatchStats<'a> {
    pub rows: usize,
    pub num_views: usize,
    pub loss: f64,
    pub elapsed_secs: f64,
    pub results: &'a [ObjectResult],
}

/// Running state of one evaluation pass.
#[derive(Debug, Clone)]
pub struct EvalMetrics {
    pub batch_time: AverageMeter,
    pub loss: AverageMeter,
    pub topk: Vec<(usize, AverageMeter)>,
    pub binary: BinaryTally,
    pub objects: usize,
    pub batches: usize,
}

impl EvalMetrics {
    pub fn new(topk: &[usize]) -> Self {
        Self {
            batch_time: AverageMeter::new(),
            loss: AverageMeter::new(),
            topk: topk.iter().map(|&k| (k, AverageMeter::new())).collect(),
            binary: BinaryTally::default(),
            objects: 0,
            batches: 0,
        }
    }

    pub fn reset(&mut self) {
        self.batch_time.reset();
        self.loss.reset();
        for (_, meter) in &mut self.topk {
            meter.reset();
        }
        self.binary = BinaryTally::default();
        self.objects = 0;
        self.batches = 0;
    }

    /// Loss is weighted per view row, precision per object (rows / views).
    pub fn update_batch(&mut self, batch: &BatchStats<'_>) {
        let n_objects = batch.results.len();
        let object_weight = batch.rows as f64 / batch.num_views as f64;

        self.loss.update(batch.loss, batch.rows as f64);
        for (slot, (_, meter)) in self.topk.iter_mut().enumerate() {
            let hits = batch
                .results
                .iter()
                .filter(|r| r.topk_hits.get(slot).copied().unwrap_or(false))
                .count();
            let precision = if n_objects > 0 {
                100.0 * hits as f64 / n_objects as f64
            } else {
                0.0
            };
            meter.update(precision, object_weight);
        }
        for result in batch.results {
            self.binary.record(result);
        }
        self.batch_time.update(batch.elapsed_secs, 1.0);
        self.objects += n_objects;
        self.batches += 1;
    }
}

/// Emits progress every `every` batches, starting with the first; 0 disables.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSchedule {
    pub every: usize,
}

impl ProgressSchedule {
    pub fn is_due(&self, batch_index: usize) -> bool {
        self.every > 0 && batch_index % self.every == 0
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_metrics.rs"]
mod tests;
