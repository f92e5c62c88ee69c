use ndarray::Array1;

/// Outcome for one object in one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectResult {
    pub object_id: String,
    pub target_class: usize,
    pub predicted_class: usize,
    pub best_candidate: usize,
    pub class_scores: Array1<f64>,
    /// Score of the binary rule's positive class; this is what gets exported.
    pub positive_class_score: f64,
    pub is_positive: bool,
    pub binary_correct: bool,
    /// One entry per configured k, true when the label is in the top k.
    pub topk_hits: Vec<bool>,
}
