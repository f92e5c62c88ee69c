use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Zip, s};
use rayon::prelude::*;
use thiserror::Error;

use crate::model::candidates::ViewpointCandidateTable;
use crate::model::config::ConfigError;

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error(transparent)]
    Shape(#[from] ConfigError),
    #[error("object {object}: every candidate score is NaN, no pose can be selected")]
    NoFiniteScore { object: usize },
}

/// Best pose assignment for one object and its class scores.
#[derive(Debug, Clone, PartialEq)]
pub struct BestCandidate {
    pub candidate: usize,
    pub class_scores: Array1<f64>,
}

/// Score of every (candidate, class) pair for one object:
/// `scores[j, :] = sum_k log_odds[candidates[j][k], k, :]`.
pub fn aggregate(
    log_odds: ArrayView3<'_, f64>,
    candidates: &ViewpointCandidateTable,
) -> Result<Array2<f64>, ConfigError> {
    let (n_first, n_second, num_classes) = log_odds.dim();
    let num_views = candidates.num_views();
    if n_first != num_views || n_second != num_views {
        return Err(ConfigError::TensorShape {
            expected: (num_views, num_views, num_classes),
            actual: (n_first, n_second, num_classes),
        });
    }

    let mut scores = Array2::<f64>::zeros((candidates.num_candidates(), num_classes));
    Zip::from(scores.rows_mut())
        .and(candidates.assignments().rows())
        .for_each(|mut out, assignment| {
            for (k, &view) in assignment.iter().enumerate() {
                out += &log_odds.slice(s![view, k, ..]);
            }
        });
    Ok(scores)
}

/// First maximum of the score matrix in candidate-major, then class order.
/// NaN entries are never selected; `None` when no entry is comparable.
pub fn argmax_first(scores: ArrayView2<'_, f64>) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (idx, &value) in scores.indexed_iter() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

pub fn select_best(
    scores: ArrayView2<'_, f64>,
    object: usize,
) -> Result<BestCandidate, ScoreError> {
    let (candidate, _class) = argmax_first(scores).ok_or(ScoreError::NoFiniteScore { object })?;
    Ok(BestCandidate {
        candidate,
        class_scores: scores.row(candidate).to_owned(),
    })
}

pub fn score_object(
    log_odds: ArrayView3<'_, f64>,
    candidates: &ViewpointCandidateTable,
    object: usize,
) -> Result<BestCandidate, ScoreError> {
    let scores = aggregate(log_odds, candidates)?;
    select_best(scores.view(), object)
}

/// Objects are independent; results come back in input order.
/// `first_object` is the dataset index of `objects[0]`, used in errors.
pub fn score_batch(
    objects: &[Array3<f64>],
    candidates: &ViewpointCandidateTable,
    first_object: usize,
) -> Result<Vec<BestCandidate>, ScoreError> {
    objects
        .par_iter()
        .enumerate()
        .map(|(n, log_odds)| score_object(log_odds.view(), candidates, first_object + n))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_aggregate.rs"]
mod tests;
