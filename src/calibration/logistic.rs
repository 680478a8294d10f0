//! Logistic Calibrator
//!
//! Unregularized maximum-likelihood fit of `p(c) = 1 / (1 + exp(-(a + b c)))`
//! by damped Newton-Raphson.
use crate::calibration::log_loss::{LogLoss, LossState};
use crate::config::CalibrationConfig;
use crate::constants::{ARMIJO_C, HESSIAN_EPS, LOSS_TOLERANCE, MAX_STEP_NORM, MIN_STEP_SCALE};
use crate::data::{DetectionRecord, Label};
use crate::utils::{is_missing, sigmoid};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Fitted parameters of the calibration curve of one category.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CalibrationModel {
    pub intercept: f64,
    pub slope: f64,
    /// False when the fit stopped at the iteration cap before meeting the
    /// tolerance. The parameters are still the best ones found.
    pub converged: bool,
    pub iterations: usize,
    /// Mean log loss on the training records.
    pub log_loss: f64,
    pub n_records: usize,
}

impl CalibrationModel {
    /// Probability of a true positive at confidence `c`. Defined for any `c`,
    /// including values outside of the training range.
    #[inline]
    pub fn predict(&self, c: f64) -> f64 {
        sigmoid(self.intercept + self.slope * c)
    }

    pub fn predict_many(&self, confidences: &[f64]) -> Vec<f64> {
        confidences.iter().map(|&c| self.predict(c)).collect()
    }
}

/// Why no model was fitted for a category.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than two usable records.
    TooFewRecords { n: usize },
    /// Every record carries the same label.
    SingleClass { label: Label, n: usize },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewRecords { n } => write!(f, "{} usable record(s), at least 2 are needed", n),
            SkipReason::SingleClass { label, n } => write!(f, "all {} record(s) have label {}", n, label),
        }
    }
}

/// Outcome of calibrating one category: a model, or the reason there is none.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Calibration {
    Fitted(CalibrationModel),
    Skipped(SkipReason),
}

impl Calibration {
    pub fn model(&self) -> Option<&CalibrationModel> {
        match self {
            Calibration::Fitted(model) => Some(model),
            Calibration::Skipped(_) => None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, Calibration::Fitted(_))
    }

    /// Model probability at `c`, `None` when no model could be fitted.
    pub fn predict(&self, c: f64) -> Option<f64> {
        self.model().map(|m| m.predict(c))
    }
}

/// Fits one logistic model per call; holds no state between fits.
#[derive(Debug, Clone, Copy)]
pub struct LogisticCalibrator {
    max_iter: usize,
    tolerance: f64,
}

impl LogisticCalibrator {
    pub fn new(cfg: &CalibrationConfig) -> Self {
        LogisticCalibrator {
            max_iter: cfg.max_iter,
            tolerance: cfg.tolerance,
        }
    }

    /// Fit the model to a category's filtered records.
    ///
    /// No fit is attempted unless there are at least two records and both
    /// labels are present. Records with a missing confidence are ignored.
    pub fn fit(&self, records: &[&DetectionRecord]) -> Calibration {
        let (x, y): (Vec<f64>, Vec<f64>) = records
            .iter()
            .filter(|r| !is_missing(r.confidence))
            .map(|r| (r.confidence, r.label.as_f64()))
            .unzip();

        let n = x.len();
        if n < 2 {
            return Calibration::Skipped(SkipReason::TooFewRecords { n });
        }
        let n_pos = y.iter().filter(|&&v| v > 0.5).count();
        if n_pos == 0 || n_pos == n {
            let label = Label::from(n_pos == n);
            return Calibration::Skipped(SkipReason::SingleClass { label, n });
        }

        let model = self.fit_xy(&x, &y);
        if let Some(r) = records.first() {
            debug!(
                "Fitted {}: intercept={:.4}, slope={:.4}, log_loss={:.6}, iterations={}, converged={}",
                r.category, model.intercept, model.slope, model.log_loss, model.iterations, model.converged
            );
            if !model.converged {
                warn!(
                    "Reached iteration limit ({}) before the logistic fit of {} converged, keeping the best parameters.",
                    self.max_iter, r.category
                );
            }
        }
        Calibration::Fitted(model)
    }

    /// Newton-Raphson on mean-centered confidences.
    ///
    /// Steps are clipped to `MAX_STEP_NORM` and shortened by backtracking until
    /// the loss decreases.
    fn fit_xy(&self, x: &[f64], y: &[f64]) -> CalibrationModel {
        let n = x.len() as f64;
        let mean = x.iter().sum::<f64>() / n;
        let xc: Vec<f64> = x.iter().map(|v| v - mean).collect();
        let objective = LogLoss::new(&xc, y);

        // Start from the base rate with a flat curve.
        let rate = y.iter().sum::<f64>() / n;
        let mut theta = [f64::ln(rate / (1.0 - rate)), 0.0];
        let mut state = objective.evaluate(theta);
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.max_iter {
            if state.gradient_norm() < self.tolerance {
                converged = true;
                break;
            }
            let (direction, slope) = descent_direction(&state);

            let mut step = 1.0;
            let mut candidate = None;
            while step >= MIN_STEP_SCALE {
                let trial = [theta[0] + step * direction[0], theta[1] + step * direction[1]];
                let trial_loss = objective.loss(trial);
                if trial_loss <= state.loss + ARMIJO_C * step * slope {
                    candidate = Some((trial, trial_loss));
                    break;
                }
                step *= 0.5;
            }
            // No step along the direction lowers the loss any further.
            let Some((trial, trial_loss)) = candidate else {
                converged = true;
                break;
            };

            iterations += 1;
            let improvement = state.loss - trial_loss;
            theta = trial;
            state = objective.evaluate(theta);
            if improvement < LOSS_TOLERANCE {
                converged = true;
                break;
            }
        }
        if !converged && state.gradient_norm() < self.tolerance {
            converged = true;
        }

        CalibrationModel {
            intercept: theta[0] - theta[1] * mean,
            slope: theta[1],
            converged,
            iterations,
            log_loss: state.loss,
            n_records: x.len(),
        }
    }
}

/// Newton direction, or steepest descent when the Hessian is close to
/// singular, clipped to `MAX_STEP_NORM`. Also returns the directional
/// derivative `g . d`.
fn descent_direction(state: &LossState) -> ([f64; 2], f64) {
    let g = state.gradient;
    let [h_aa, h_ab, h_bb] = state.hessian;
    let det = h_aa * h_bb - h_ab * h_ab;

    let mut d = if det > 0.0 && det > HESSIAN_EPS * h_aa * h_bb {
        [-(h_bb * g[0] - h_ab * g[1]) / det, -(h_aa * g[1] - h_ab * g[0]) / det]
    } else {
        [-g[0], -g[1]]
    };
    let mut slope = g[0] * d[0] + g[1] * d[1];
    if slope >= 0.0 {
        d = [-g[0], -g[1]];
        slope = -(g[0] * g[0] + g[1] * g[1]);
    }

    let norm = d[0].hypot(d[1]);
    if norm > MAX_STEP_NORM {
        let scale = MAX_STEP_NORM / norm;
        d = [d[0] * scale, d[1] * scale];
        slope *= scale;
    }
    (d, slope)
}
