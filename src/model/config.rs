use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::case::ViewpointCase;
use crate::model::rule::{BinaryRule, PositiveClassSpec};

/// Preconditions that must hold before the first batch is evaluated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size {batch_size} must be a multiple of the number of views ({num_views})")]
    BatchSizeNotMultiple { batch_size: usize, num_views: usize },
    #[error("batch size must be positive")]
    ZeroBatchSize,
    #[error("dataset has {rows} view rows, which is not a multiple of the number of views ({num_views})")]
    RowsNotMultiple { rows: usize, num_views: usize },
    #[error(
        "network output width {width} does not split into {num_views} views of (num_classes + 1) logits"
    )]
    LogitWidth { width: usize, num_views: usize },
    #[error("candidate table has {actual} views per candidate, expected {expected}")]
    CandidateViews { expected: usize, actual: usize },
    #[error("candidate table is empty")]
    EmptyCandidateTable,
    #[error(
        "candidate table entry {value} at row {row}, column {column} is outside [0, {num_views})"
    )]
    CandidateIndex {
        row: usize,
        column: usize,
        value: i64,
        num_views: usize,
    },
    #[error("score tensor shape {actual:?} does not match expected {expected:?}")]
    TensorShape {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },
    #[error("class list has {actual} names but the network output has {expected} classes")]
    ClassCount { expected: usize, actual: usize },
    #[error("positive class {0:?} is not a known class index or name")]
    UnknownPositiveClass(String),
    #[error("positive class index {index} is outside [0, {num_classes})")]
    PositiveClassRange { index: usize, num_classes: usize },
    #[error("top-k list is empty or contains 0")]
    InvalidTopK,
}

/// Immutable evaluation context, built once in `main` and shared by
/// reference with every stage.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub data_dir: PathBuf,
    pub split: String,
    pub case: ViewpointCase,
    pub candidate_path: PathBuf,
    pub batch_size: usize,
    pub print_freq: usize,
    pub topk: Vec<usize>,
    pub id_suffix_len: usize,
    pub positive_class: PositiveClassSpec,
    pub positive_label: String,
    pub exception_ids: BTreeSet<String>,
    pub csv_path: PathBuf,
    pub summary_json: Option<PathBuf>,
    pub threads: usize,
}

impl EvalConfig {
    pub fn num_views(&self) -> usize {
        self.case.num_views()
    }

    pub fn split_dir(&self) -> PathBuf {
        self.data_dir.join(&self.split)
    }

    pub fn binary_rule(
        &self,
        class_names: Option<&[String]>,
        num_classes: usize,
    ) -> Result<BinaryRule, ConfigError> {
        let positive_class = self.positive_class.resolve(class_names, num_classes)?;
        Ok(BinaryRule {
            positive_class,
            positive_label: self.positive_label.clone(),
            exception_ids: self.exception_ids.clone(),
        })
    }
}

pub fn validate_topk(topk: &[usize]) -> Result<(), ConfigError> {
    if topk.is_empty() || topk.contains(&0) {
        return Err(ConfigError::InvalidTopK);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/config.rs"]
mod tests;
