//! Threshold Evaluator
//!
//! Recall (true positive rate) of a category at its externally supplied
//! threshold, measured on the data and read off the fitted curve.
use crate::calibration::Calibration;
use crate::data::{DetectionRecord, ThresholdSpec};
use crate::utils::is_missing;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ThresholdEvaluation {
    pub category: String,
    pub threshold: f64,
    /// Share of the true positives with a confidence at or above the threshold.
    pub empirical_tpr: f64,
    /// Fitted probability at the threshold; `None` when no model could be fitted.
    pub model_tpr: Option<f64>,
    /// Number of true positives among the filtered records.
    pub n_true: usize,
    /// Number of true positives retained at the threshold.
    pub n_retained: usize,
}

/// Evaluate `spec` on a category's filtered records.
///
/// Returns `None` when there are no true positives, since recall is undefined.
/// The threshold comparison is inclusive.
pub fn evaluate_threshold(
    records: &[&DetectionRecord],
    spec: &ThresholdSpec,
    calibration: &Calibration,
) -> Option<ThresholdEvaluation> {
    let positives = records
        .iter()
        .filter(|r| r.label.is_positive() && !is_missing(r.confidence));
    let (n_true, n_retained) = positives.fold((0usize, 0usize), |(n, kept), r| {
        (n + 1, kept + usize::from(r.confidence >= spec.threshold))
    });
    if n_true == 0 {
        return None;
    }
    Some(ThresholdEvaluation {
        category: spec.category.clone(),
        threshold: spec.threshold,
        empirical_tpr: n_retained as f64 / n_true as f64,
        model_tpr: calibration.predict(spec.threshold),
        n_true,
        n_retained,
    })
}

/// Order evaluations by descending empirical TPR, then by category.
pub fn sort_evaluations(evaluations: &mut [ThresholdEvaluation]) {
    evaluations.sort_by(|a, b| {
        b.empirical_tpr
            .partial_cmp(&a.empirical_tpr)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
}
