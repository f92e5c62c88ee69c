use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::input::InputBundle;
use crate::model::config::EvalConfig;
use crate::pipeline::EvalOutcome;
use crate::pipeline::stage5_metrics::EvalMetrics;
use crate::pipeline::stage6_export::ExportError;
use crate::report::json::render_summary_json;
use crate::report::text::{render_progress_line, render_summary_text};
use crate::report::{EvalSummary, SourceSummary, TopKSummary, defined_ratio};

#[derive(Debug, Clone, Copy)]
pub struct Stage7Input<'a> {
    pub config: &'a EvalConfig,
    pub bundle: &'a InputBundle,
    pub outcome: &'a EvalOutcome,
}

pub fn log_progress(batch: usize, total: usize, metrics: &EvalMetrics) {
    tracing::info!("{}", render_progress_line(batch, total, metrics));
}

pub fn build_summary(input: &Stage7Input<'_>) -> EvalSummary {
    let config = input.config;
    let bundle = input.bundle;
    let setup = &input.outcome.setup;
    let metrics = &input.outcome.metrics;
    let label = setup.rule.positive_label.as_str();

    let mut degenerate = Vec::new();
    let positive_accuracy = defined_ratio(metrics.binary.positive_accuracy(label), &mut degenerate);
    let negative_accuracy = defined_ratio(metrics.binary.negative_accuracy(label), &mut degenerate);
    let overall_accuracy = defined_ratio(metrics.binary.overall_accuracy(), &mut degenerate);

    EvalSummary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        source: SourceSummary {
            data_dir: config.data_dir.display().to_string(),
            split: config.split.clone(),
            split_dir: bundle.split_dir.display().to_string(),
            samples: bundle.samples_path.display().to_string(),
            logits: bundle.logits.path.display().to_string(),
            logits_mapped: bundle.logits.is_mapped(),
            candidate_table: config.candidate_path.display().to_string(),
            csv: config.csv_path.display().to_string(),
        },
        case: config.case.number(),
        num_views: setup.num_views,
        num_classes: setup.num_classes,
        num_candidates: setup.candidates.num_candidates(),
        objects: metrics.objects,
        batches: metrics.batches,
        exported_scores: input.outcome.exporter.len(),
        loss: metrics.loss.average(),
        mean_batch_secs: metrics.batch_time.average(),
        topk: metrics
            .topk
            .iter()
            .map(|(k, meter)| TopKSummary {
                k: *k,
                precision: meter.average(),
            })
            .collect(),
        positive_class: setup.rule.positive_class,
        positive_label: setup.rule.positive_label.clone(),
        exception_ids: setup.rule.exception_ids.iter().cloned().collect(),
        binary: metrics.binary,
        positive_accuracy,
        negative_accuracy,
        overall_accuracy,
        degenerate,
    }
}

/// Prints the summary to stdout and writes the JSON copy when one was
/// requested. Undefined ratios are also logged as warnings.
pub fn write_reports(input: &Stage7Input<'_>) -> Result<EvalSummary, ExportError> {
    let summary = build_summary(input);
    for reason in &summary.degenerate {
        tracing::warn!("{}", reason);
    }

    print!("{}", render_summary_text(&summary));

    if let Some(path) = &input.config.summary_json {
        let json = render_summary_json(&summary)?;
        write_text(path, &json)?;
        tracing::info!("wrote summary to {}", path.display());
    }
    Ok(summary)
}

fn write_text(path: &Path, contents: &str) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut w = BufWriter::new(file);
    w.write_all(contents.as_bytes())
        .and_then(|_| w.flush())
        .map_err(|e| ExportError::io(path, e))
}
