//! Dense sampling of a fitted calibration curve, used for plotting and export.
use crate::calibration::logistic::CalibrationModel;
use crate::utils::linspace;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    pub confidence: f64,
    pub probability: f64,
}

/// Evaluate `model` on `grid_points` evenly spaced confidences in `[min_conf, 1]`.
pub fn sample_curve(model: &CalibrationModel, min_conf: f64, grid_points: usize) -> Vec<CurvePoint> {
    linspace(min_conf, 1.0, grid_points)
        .into_iter()
        .map(|confidence| CurvePoint {
            confidence,
            probability: model.predict(confidence),
        })
        .collect()
}
