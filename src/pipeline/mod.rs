use std::time::Instant;

use ndarray::Axis;
use thiserror::Error;

use crate::input::object_id::object_id_from_path;
use crate::input::samples::Sample;
use crate::input::{InputBundle, InputError};
use crate::model::config::{ConfigError, EvalConfig};
use crate::pipeline::stage1_validate::{Stage1Inputs, Stage1Output, run_stage1};
use crate::pipeline::stage2_normalize::{batch_log_odds, cross_entropy};
use crate::pipeline::stage3_aggregate::{ScoreError, score_batch};
use crate::pipeline::stage4_classify::{ClassifyError, ObjectClassifier};
use crate::pipeline::stage5_metrics::{BatchStats, EvalMetrics, MetricsError, ProgressSchedule};
use crate::pipeline::stage6_export::{ExportError, ScoreExporter};
use crate::pipeline::stage7_report::log_progress;

pub mod stage1_validate;
pub mod stage2_normalize;
pub mod stage3_aggregate;
pub mod stage4_classify;
pub mod stage5_metrics;
pub mod stage6_export;
pub mod stage7_report;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// State left behind by one full pass over a split.
#[derive(Debug)]
pub struct EvalOutcome {
    pub setup: Stage1Output,
    pub metrics: EvalMetrics,
    pub exporter: ScoreExporter,
}

/// Identifier and label of one object, taken from its first view row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRows {
    pub object_id: String,
    pub label: i64,
}

pub fn group_objects(
    samples: &[Sample],
    num_views: usize,
    id_suffix_len: usize,
) -> Result<Vec<ObjectRows>, InputError> {
    let mut objects = Vec::with_capacity(samples.len() / num_views.max(1));
    for views in samples.chunks(num_views) {
        let first = &views[0];
        let object_id = object_id_from_path(&first.path, id_suffix_len)?;
        for other in &views[1..] {
            if other.label != first.label {
                tracing::warn!(
                    "object {}: view {} has label {} but the first view has {}; using {}",
                    object_id,
                    other.path,
                    other.label,
                    first.label,
                    first.label
                );
            } else if object_id_from_path(&other.path, id_suffix_len)? != object_id {
                tracing::warn!(
                    "view {} does not belong to object {} by name; grouping by row order",
                    other.path,
                    object_id
                );
            }
        }
        objects.push(ObjectRows {
            object_id,
            label: first.label,
        });
    }
    Ok(objects)
}

fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
    if threads == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => Some(pool),
        Err(err) => {
            tracing::warn!("cannot start a {threads}-thread pool ({err}); using the global pool");
            None
        }
    }
}

/// Runs the whole split: validation, then per batch normalisation,
/// candidate scoring, classification, metric updates and score export.
pub fn evaluate(config: &EvalConfig, bundle: &InputBundle) -> Result<EvalOutcome, EvalError> {
    let logits = bundle.logits.view()?;
    let setup = run_stage1(&Stage1Inputs {
        config,
        n_rows: logits.nrows(),
        logit_width: logits.ncols(),
        candidates_raw: bundle.candidates_raw.view(),
        class_names: bundle.class_names.as_deref(),
    })?;
    let num_views = setup.num_views;
    let num_classes = setup.num_classes;

    let pool = build_pool(config.threads);
    let classifier = ObjectClassifier::new(&setup.rule, num_classes, &setup.topk);
    let schedule = ProgressSchedule {
        every: config.print_freq,
    };
    let mut metrics = EvalMetrics::new(&setup.topk);
    let mut exporter = ScoreExporter::new();

    let total_batches = logits.nrows().div_ceil(config.batch_size);
    for (batch_index, raw_batch) in logits
        .axis_chunks_iter(Axis(0), config.batch_size)
        .enumerate()
    {
        let started = Instant::now();
        let first_row = batch_index * config.batch_size;
        let samples = &bundle.samples[first_row..first_row + raw_batch.nrows()];
        let objects = group_objects(samples, num_views, config.id_suffix_len)?;

        let mut row_labels = Vec::with_capacity(samples.len());
        for (object, views) in objects.iter().zip(samples.chunks(num_views)) {
            for view in views {
                row_labels.push(classifier.check_label(&object.object_id, view.label)?);
            }
        }
        let loss = cross_entropy(raw_batch, &row_labels);

        let log_odds = batch_log_odds(raw_batch, num_views, num_classes)?;
        let first_object = first_row / num_views;
        let selected = match &pool {
            Some(pool) => {
                pool.install(|| score_batch(&log_odds, &setup.candidates, first_object))?
            }
            None => score_batch(&log_odds, &setup.candidates, first_object)?,
        };

        let mut results = Vec::with_capacity(objects.len());
        for (object, best) in objects.iter().zip(selected) {
            let result = classifier.classify(&object.object_id, object.label, best)?;
            tracing::debug!(
                "object {}: predicted {} target {} candidate {} {} score {:?}",
                result.object_id,
                result.predicted_class,
                result.target_class,
                result.best_candidate,
                setup.rule.positive_label,
                result.positive_class_score
            );
            tracing::trace!("object {}: class scores {}", result.object_id, result.class_scores);
            exporter.record(&result.object_id, result.positive_class_score);
            results.push(result);
        }

        metrics.update_batch(&BatchStats {
            rows: raw_batch.nrows(),
            num_views,
            loss,
            elapsed_secs: started.elapsed().as_secs_f64(),
            results: &results,
        });
        if schedule.is_due(batch_index) {
            log_progress(batch_index, total_batches, &metrics);
        }
    }

    Ok(EvalOutcome {
        setup,
        metrics,
        exporter,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
