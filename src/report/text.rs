use crate::pipeline::stage5_metrics::EvalMetrics;
use crate::report::{EvalSummary, format_accuracy, format_precision};

/// One progress line, tab separated, each meter as `current (average)`.
pub fn render_progress_line(batch: usize, total: usize, metrics: &EvalMetrics) -> String {
    let mut out = format!(
        "Test: [{}/{}]\tTime {:.3} ({:.3})\tLoss {:.4} ({:.4})",
        batch,
        total,
        metrics.batch_time.current(),
        metrics.batch_time.average(),
        metrics.loss.current(),
        metrics.loss.average()
    );
    for (k, meter) in &metrics.topk {
        out.push_str(&format!(
            "\tPrec@{} {} ({})",
            k,
            format_precision(meter.current()),
            format_precision(meter.average())
        ));
    }
    out
}

pub fn render_summary_text(summary: &EvalSummary) -> String {
    let label = &summary.positive_label;
    let mut out = String::new();

    out.push_str(" *");
    for topk in &summary.topk {
        out.push_str(&format!(
            " Prec@{} {}",
            topk.k,
            format_precision(topk.precision)
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "Non-{} classification acc.: {}\n",
        label,
        ratio_or_undefined(
            summary.negative_accuracy,
            &format!("no ground-truth non-{label} objects")
        )
    ));
    out.push_str(&format!(
        "Classification {} correct: {}\n",
        label, summary.binary.positive_correct
    ));
    out.push_str(&format!(
        "Ground-truth {} count: {}\n",
        label, summary.binary.positive_total
    ));
    out.push_str(&format!(
        "{} classification acc.: {}\n",
        label,
        ratio_or_undefined(
            summary.positive_accuracy,
            &format!("no ground-truth {label} objects")
        )
    ));
    out.push_str(&format!(
        "Overall classification acc.: {}\n",
        ratio_or_undefined(summary.overall_accuracy, "no objects evaluated")
    ));
    out
}

fn ratio_or_undefined(value: Option<f64>, reason: &str) -> String {
    match value {
        Some(v) => format_accuracy(v),
        None => format!("undefined ({reason})"),
    }
}
