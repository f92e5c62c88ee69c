use serde::Serialize;

use crate::pipeline::stage5_metrics::{BinaryTally, MetricsError};

pub mod json;
pub mod text;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopKSummary {
    pub k: usize,
    pub precision: f64,
}

/// Where the evaluated data came from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub data_dir: String,
    pub split: String,
    pub split_dir: String,
    pub samples: String,
    pub logits: String,
    pub logits_mapped: bool,
    pub candidate_table: String,
    pub csv: String,
}

/// Final evaluation results, rendered as text on stdout and optionally
/// as JSON. Undefined ratios are `None` and named in `degenerate`.
#[derive(Debug, Clone, Serialize)]
pub struct EvalSummary {
    pub tool: String,
    pub version: String,
    pub source: SourceSummary,

    pub case: u8,
    pub num_views: usize,
    pub num_classes: usize,
    pub num_candidates: usize,
    pub objects: usize,
    pub batches: usize,
    pub exported_scores: usize,

    pub loss: f64,
    pub mean_batch_secs: f64,
    pub topk: Vec<TopKSummary>,

    pub positive_class: usize,
    pub positive_label: String,
    pub exception_ids: Vec<String>,
    pub binary: BinaryTally,
    pub positive_accuracy: Option<f64>,
    pub negative_accuracy: Option<f64>,
    pub overall_accuracy: Option<f64>,
    pub degenerate: Vec<String>,
}

/// Splits a derived ratio into its value and, when undefined, the reason.
pub fn defined_ratio(
    ratio: Result<f64, MetricsError>,
    degenerate: &mut Vec<String>,
) -> Option<f64> {
    match ratio {
        Ok(value) => Some(value),
        Err(err) => {
            degenerate.push(err.to_string());
            None
        }
    }
}

pub fn format_precision(v: f64) -> String {
    format!("{:.3}", v)
}

pub fn format_accuracy(v: f64) -> String {
    format!("{:.5}", v)
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
