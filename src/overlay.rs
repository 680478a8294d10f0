//! Universal-cutoff overlay
//!
//! Fits every category present in the detection table and reads each curve at
//! one shared cutoff, to compare a single cutoff against a reference
//! probability across categories. The cutoff is evaluated, never chosen.
use crate::calibration::{sample_curve, Calibration, CalibrationModel, CurvePoint, LogisticCalibrator};
use crate::config::{CalibrationConfig, JsonIO};
use crate::data::DetectionTable;
use crate::errors::CalibrationError;
use crate::partition::Partition;
use crate::utils::{thread_pool, validate_float_parameter};
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CutoffPoint {
    pub category: String,
    pub model: CalibrationModel,
    /// Fitted probability of a true positive at the cutoff.
    pub probability_at_cutoff: f64,
    pub meets_reference: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CutoffOverlay {
    pub cutoff: f64,
    pub reference: f64,
    pub config: CalibrationConfig,
    /// Fitted categories, sorted by name.
    pub points: Vec<CutoffPoint>,
}

impl JsonIO for CutoffOverlay {}

impl CutoffOverlay {
    /// Fit all categories of `table` and evaluate them at `cutoff`.
    ///
    /// * `cutoff` - Confidence cutoff shared by every category.
    /// * `reference` - Probability a category's curve should reach at the cutoff.
    /// * `parallel` - Fit categories on a thread pool.
    pub fn build(
        table: &DetectionTable,
        cfg: &CalibrationConfig,
        cutoff: f64,
        reference: f64,
        parallel: bool,
    ) -> Result<Self, CalibrationError> {
        cfg.validate()?;
        validate_float_parameter(cutoff, 0.0, 1.0, "cutoff")?;
        validate_float_parameter(reference, 0.0, 1.0, "reference")?;

        let partition = Partition::new(table, cfg.min_conf);
        let calibrator = LogisticCalibrator::new(cfg);
        let categories = partition.categories();

        let fit_one = |category: &&str| match calibrator.fit(partition.get(category)) {
            Calibration::Fitted(model) => {
                let probability_at_cutoff = model.predict(cutoff);
                Some(CutoffPoint {
                    category: category.to_string(),
                    model,
                    probability_at_cutoff,
                    meets_reference: probability_at_cutoff >= reference,
                })
            }
            Calibration::Skipped(reason) => {
                info!("Skipping {} in overlay: {}.", category, reason);
                None
            }
        };
        let points: Vec<CutoffPoint> = if parallel {
            let pool = thread_pool(cfg.num_threads)?;
            pool.install(|| categories.par_iter().filter_map(&fit_one).collect())
        } else {
            categories.iter().filter_map(&fit_one).collect()
        };

        info!(
            "{} of {} fitted categories reach {:.2} at cutoff {:.2}.",
            points.iter().filter(|p| p.meets_reference).count(),
            points.len(),
            reference,
            cutoff
        );
        Ok(CutoffOverlay {
            cutoff,
            reference,
            config: cfg.clone(),
            points,
        })
    }

    /// Sampled curves of all fitted categories, for drawing them on one figure.
    pub fn curves(&self) -> Vec<(&str, Vec<CurvePoint>)> {
        self.points
            .iter()
            .map(|p| {
                (
                    p.category.as_str(),
                    sample_curve(&p.model, self.config.min_conf, self.config.grid_points),
                )
            })
            .collect()
    }

    /// Categories whose curve stays below the reference at the cutoff.
    pub fn below_reference(&self) -> Vec<&str> {
        self.points
            .iter()
            .filter(|p| !p.meets_reference)
            .map(|p| p.category.as_str())
            .collect()
    }
}
