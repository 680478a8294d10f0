//! Calibration Module
//!
//! Fits the per-category logistic calibration curve mapping detector
//! confidence to the probability of a true positive.
//!
//! # Submodules
//!
//! * `log_loss`: Mean cross-entropy with its gradient and Hessian.
//! * `logistic`: The Newton-Raphson calibrator and the fitted model.
//! * `curve`: Sampling a fitted curve on a confidence grid.

pub mod curve;
pub mod log_loss;
pub mod logistic;

pub use curve::{sample_curve, CurvePoint};
pub use logistic::{Calibration, CalibrationModel, LogisticCalibrator, SkipReason};
