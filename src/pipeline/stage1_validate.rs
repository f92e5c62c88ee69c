use ndarray::ArrayView2;

use crate::model::candidates::ViewpointCandidateTable;
use crate::model::config::{ConfigError, EvalConfig, validate_topk};
use crate::model::rule::BinaryRule;

#[derive(Debug, Clone)]
pub struct Stage1Inputs<'a> {
    pub config: &'a EvalConfig,
    pub n_rows: usize,
    pub logit_width: usize,
    pub candidates_raw: ArrayView2<'a, i64>,
    pub class_names: Option<&'a [String]>,
}

/// Shapes and policy fixed for the whole run.
#[derive(Debug, Clone)]
pub struct Stage1Output {
    pub num_views: usize,
    pub num_classes: usize,
    pub candidates: ViewpointCandidateTable,
    pub rule: BinaryRule,
    pub topk: Vec<usize>,
}

pub fn run_stage1(inputs: &Stage1Inputs<'_>) -> Result<Stage1Output, ConfigError> {
    let config = inputs.config;
    let num_views = config.num_views();

    check_batch_size(config.batch_size, num_views)?;
    if inputs.n_rows % num_views != 0 {
        return Err(ConfigError::RowsNotMultiple {
            rows: inputs.n_rows,
            num_views,
        });
    }
    let num_classes = infer_num_classes(inputs.logit_width, num_views)?;

    let candidates = ViewpointCandidateTable::from_raw(inputs.candidates_raw)?;
    candidates.expect_views(num_views)?;

    if let Some(names) = inputs.class_names {
        if names.len() != num_classes {
            return Err(ConfigError::ClassCount {
                expected: num_classes,
                actual: names.len(),
            });
        }
    }
    let rule = config.binary_rule(inputs.class_names, num_classes)?;

    validate_topk(&config.topk)?;
    let topk = clamp_topk(&config.topk, num_classes);

    tracing::info!(
        "viewpoint case {}: {} views, {} candidates, {} classes, positive class {} ({})",
        config.case.number(),
        num_views,
        candidates.num_candidates(),
        num_classes,
        rule.positive_class,
        rule.positive_label
    );

    Ok(Stage1Output {
        num_views,
        num_classes,
        candidates,
        rule,
        topk,
    })
}

pub fn check_batch_size(batch_size: usize, num_views: usize) -> Result<(), ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::ZeroBatchSize);
    }
    if batch_size % num_views != 0 {
        return Err(ConfigError::BatchSizeNotMultiple {
            batch_size,
            num_views,
        });
    }
    Ok(())
}

/// Each view row carries `num_views` groups of `num_classes + 1` logits,
/// the last of every group being the incorrect-pose class.
pub fn infer_num_classes(logit_width: usize, num_views: usize) -> Result<usize, ConfigError> {
    if num_views == 0 || logit_width % num_views != 0 || logit_width / num_views < 2 {
        return Err(ConfigError::LogitWidth {
            width: logit_width,
            num_views,
        });
    }
    Ok(logit_width / num_views - 1)
}

pub fn clamp_topk(topk: &[usize], num_classes: usize) -> Vec<usize> {
    topk.iter()
        .map(|&k| {
            if k > num_classes {
                tracing::warn!(
                    "top-{} requested but only {} classes exist; clamping to top-{}",
                    k,
                    num_classes,
                    num_classes
                );
                num_classes
            } else {
                k
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_validate.rs"]
mod tests;
