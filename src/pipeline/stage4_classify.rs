use ndarray::ArrayView1;
use thiserror::Error;

use crate::model::result::ObjectResult;
use crate::model::rule::BinaryRule;
use crate::pipeline::stage3_aggregate::BestCandidate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error(
        "object {object_id}: ground-truth label {label} is neither the positive class ({positive_class}) nor any other class in [0, {num_classes})"
    )]
    InvalidLabel {
        object_id: String,
        label: i64,
        num_classes: usize,
        positive_class: usize,
    },
}

/// Turns a best-pose class score vector into an object-level prediction,
/// binary verdict and top-k hits.
#[derive(Debug, Clone)]
pub struct ObjectClassifier<'a> {
    rule: &'a BinaryRule,
    num_classes: usize,
    topk: &'a [usize],
}

impl<'a> ObjectClassifier<'a> {
    pub fn new(rule: &'a BinaryRule, num_classes: usize, topk: &'a [usize]) -> Self {
        Self {
            rule,
            num_classes,
            topk,
        }
    }

    pub fn check_label(&self, object_id: &str, label: i64) -> Result<usize, ClassifyError> {
        if label < 0 || label as usize >= self.num_classes {
            return Err(ClassifyError::InvalidLabel {
                object_id: object_id.to_string(),
                label,
                num_classes: self.num_classes,
                positive_class: self.rule.positive_class,
            });
        }
        Ok(label as usize)
    }

    pub fn classify(
        &self,
        object_id: &str,
        label: i64,
        best: BestCandidate,
    ) -> Result<ObjectResult, ClassifyError> {
        let target_class = self.check_label(object_id, label)?;
        let ranked = rank_classes(best.class_scores.view());
        let predicted_class = ranked[0];

        let is_positive = self.rule.is_positive(target_class, object_id);
        let predicted_positive = predicted_class == self.rule.positive_class;
        let binary_correct = if is_positive {
            predicted_positive
        } else {
            !predicted_positive
        };

        let topk_hits = self
            .topk
            .iter()
            .map(|&k| ranked.iter().take(k).any(|&c| c == target_class))
            .collect();

        Ok(ObjectResult {
            object_id: object_id.to_string(),
            target_class,
            predicted_class,
            best_candidate: best.candidate,
            positive_class_score: best.class_scores[self.rule.positive_class],
            class_scores: best.class_scores,
            is_positive,
            binary_correct,
            topk_hits,
        })
    }
}

/// Class indices by descending score. Ties keep the lower index first and
/// NaN scores sink to the end.
pub fn rank_classes(scores: ArrayView1<'_, f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (scores[a], scores[b]);
        match (sa.is_nan(), sb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal),
        }
    });
    order
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_classify.rs"]
mod tests;
