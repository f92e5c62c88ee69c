use ndarray::{Array3, ArrayView1, ArrayView2, Axis, s};

use crate::model::config::ConfigError;

/// Converts one object's raw network rows, `(num_views, num_views * (num_classes + 1))`,
/// into its per-view log-odds tensor `(num_views, num_views, num_classes)`.
///
/// Row `i`, group `g` holds the logits of image `i` under pose `g`; each
/// group is log-softmaxed and the incorrect-pose entry (last) is subtracted
/// from every class entry. The softmax normaliser is shared by the whole
/// group, so the difference reduces to `logit[c] - logit[num_classes]`.
pub fn per_view_log_odds(
    raw: ArrayView2<'_, f32>,
    num_views: usize,
    num_classes: usize,
) -> Result<Array3<f64>, ConfigError> {
    let group = num_classes + 1;
    let (rows, width) = raw.dim();
    if rows != num_views || width != num_views * group {
        return Err(ConfigError::TensorShape {
            expected: (num_views, num_views, group),
            actual: (rows, width / group.max(1), group),
        });
    }

    let grouped = raw
        .mapv(f64::from)
        .into_shape_with_order((num_views, num_views, group))
        .map_err(|_| ConfigError::LogitWidth { width, num_views })?;

    let classes = grouped.slice(s![.., .., ..num_classes]);
    let reject = grouped.slice(s![.., .., num_classes..group]);
    Ok(&classes - &reject)
}

/// Splits a batch into objects of `num_views` consecutive rows and
/// normalises each one.
pub fn batch_log_odds(
    raw_batch: ArrayView2<'_, f32>,
    num_views: usize,
    num_classes: usize,
) -> Result<Vec<Array3<f64>>, ConfigError> {
    if raw_batch.nrows() % num_views != 0 {
        return Err(ConfigError::RowsNotMultiple {
            rows: raw_batch.nrows(),
            num_views,
        });
    }
    raw_batch
        .axis_chunks_iter(Axis(0), num_views)
        .map(|object_rows| per_view_log_odds(object_rows, num_views, num_classes))
        .collect()
}

fn log_sum_exp(logits: ArrayView1<'_, f64>) -> f64 {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = logits.iter().map(|&v| (v - max).exp()).sum();
    max + sum.ln()
}

/// Mean cross-entropy of each full raw row against its label, the loss the
/// network criterion reports on un-reshaped output.
pub fn cross_entropy(raw_batch: ArrayView2<'_, f32>, labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let mut total = 0f64;
    for (row, &label) in raw_batch.outer_iter().zip(labels) {
        let row = row.mapv(f64::from);
        total += log_sum_exp(row.view()) - row[label];
    }
    total / labels.len() as f64
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_normalize.rs"]
mod tests;
