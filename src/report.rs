//! Calibration Report
//!
//! Composes the calibrator, the binner and the threshold evaluator into one
//! result per category of the threshold table.
use crate::binning::{bin_records, EmpiricalBin};
use crate::calibration::{sample_curve, Calibration, CurvePoint, LogisticCalibrator};
use crate::config::{CalibrationConfig, JsonIO};
use crate::data::{DetectionTable, ThresholdSpec};
use crate::errors::CalibrationError;
use crate::evaluation::{evaluate_threshold, sort_evaluations, ThresholdEvaluation};
use crate::partition::Partition;
use crate::utils::thread_pool;
use hashbrown::HashSet;
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Everything derived for one category.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CategoryReport {
    pub category: String,
    pub threshold: f64,
    /// Number of records at or above the minimum confidence.
    pub n_records: usize,
    pub calibration: Calibration,
    pub bins: Vec<EmpiricalBin>,
    pub evaluation: Option<ThresholdEvaluation>,
}

impl CategoryReport {
    /// Fitted curve sampled on `[min_conf, 1]`, `None` when no model was fitted.
    pub fn curve(&self, cfg: &CalibrationConfig) -> Option<Vec<CurvePoint>> {
        self.calibration
            .model()
            .map(|model| sample_curve(model, cfg.min_conf, cfg.grid_points))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CalibrationReport {
    pub config: CalibrationConfig,
    pub categories: Vec<CategoryReport>,
}

impl JsonIO for CalibrationReport {}

/// Validate the threshold table and keep the first threshold of every category.
pub fn unique_thresholds(thresholds: &[ThresholdSpec]) -> Result<Vec<ThresholdSpec>, CalibrationError> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(thresholds.len());
    for spec in thresholds {
        spec.validate()?;
        if seen.insert(spec.category.as_str()) {
            unique.push(spec.clone());
        } else {
            warn!(
                "Duplicate threshold {} for {}, keeping the first one.",
                spec.threshold, spec.category
            );
        }
    }
    Ok(unique)
}

fn build_category(
    partition: &Partition<'_>,
    calibrator: &LogisticCalibrator,
    spec: &ThresholdSpec,
    cfg: &CalibrationConfig,
) -> CategoryReport {
    let records = partition.get(&spec.category);
    if !partition.contains(&spec.category) {
        info!("No detections for {}.", spec.category);
    }

    let calibration = calibrator.fit(records);
    if let Calibration::Skipped(reason) = &calibration {
        info!(
            "Skipping fit of {}: {} at confidence >= {}.",
            spec.category, reason, cfg.min_conf
        );
    }
    let bins = bin_records(records, cfg.bin_width, cfg.min_conf);
    let evaluation = evaluate_threshold(records, spec, &calibration);
    if evaluation.is_none() {
        info!("No true positives for {}, recall is undefined.", spec.category);
    }

    CategoryReport {
        category: spec.category.clone(),
        threshold: spec.threshold,
        n_records: records.len(),
        calibration,
        bins,
        evaluation,
    }
}

impl CalibrationReport {
    /// Build the report for every category of the threshold table.
    ///
    /// Categories without a threshold are left out. The output follows the
    /// order of `thresholds` whether or not `parallel` is set.
    ///
    /// * `table` - Validated detections.
    /// * `thresholds` - One threshold per category; later duplicates are ignored.
    /// * `cfg` - Calibration settings.
    /// * `parallel` - Process categories on a thread pool.
    pub fn build(
        table: &DetectionTable,
        thresholds: &[ThresholdSpec],
        cfg: &CalibrationConfig,
        parallel: bool,
    ) -> Result<Self, CalibrationError> {
        cfg.validate()?;
        let specs = unique_thresholds(thresholds)?;
        let partition = Partition::new(table, cfg.min_conf);
        let calibrator = LogisticCalibrator::new(cfg);

        let build_one = |spec: &ThresholdSpec| build_category(&partition, &calibrator, spec, cfg);
        let categories: Vec<CategoryReport> = if parallel {
            let pool = thread_pool(cfg.num_threads)?;
            pool.install(|| specs.par_iter().map(&build_one).collect())
        } else {
            specs.iter().map(&build_one).collect()
        };

        let n_fitted = categories.iter().filter(|c| c.calibration.is_fitted()).count();
        info!(
            "Calibrated {} of {} categories from {} detections.",
            n_fitted,
            categories.len(),
            table.len()
        );
        Ok(CalibrationReport {
            config: cfg.clone(),
            categories,
        })
    }

    pub fn get(&self, category: &str) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }

    /// The threshold evaluations, highest empirical TPR first.
    pub fn evaluations(&self) -> Vec<ThresholdEvaluation> {
        let mut evaluations: Vec<ThresholdEvaluation> =
            self.categories.iter().filter_map(|c| c.evaluation.clone()).collect();
        sort_evaluations(&mut evaluations);
        evaluations
    }

    pub fn n_fitted(&self) -> usize {
        self.categories.iter().filter(|c| c.calibration.is_fitted()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::SkipReason;
    use crate::data::{DetectionRecord, Label};
    use tempfile::tempdir;

    fn table() -> DetectionTable {
        let mut records = Vec::new();
        // Fittable: both classes above the floor, recall defined.
        for (c, l) in [(0.55, false), (0.6, false), (0.65, true), (0.7, false), (0.8, true), (0.9, true)] {
            records.push(DetectionRecord::new("Parus major", c, Label::from(l)));
        }
        // Only positives: no model, evaluation still defined.
        for c in [0.6, 0.75, 0.9] {
            records.push(DetectionRecord::new("Sitta europaea", c, Label::TruePositive));
        }
        // Only negatives: neither a model nor an evaluation.
        for c in [0.6, 0.95] {
            records.push(DetectionRecord::new("Columba palumbus", c, Label::FalsePositive));
        }
        // Present in the table but not in the threshold table.
        for (c, l) in [(0.6, false), (0.9, true)] {
            records.push(DetectionRecord::new("Pica pica", c, Label::from(l)));
        }
        // Positive below the floor is ignored everywhere.
        records.push(DetectionRecord::new("Parus major", 0.3, Label::TruePositive));
        DetectionTable::new(records).unwrap()
    }

    fn thresholds() -> Vec<ThresholdSpec> {
        vec![
            ThresholdSpec::new("Sitta europaea", 0.7),
            ThresholdSpec::new("Parus major", 0.75),
            ThresholdSpec::new("Columba palumbus", 0.5),
            ThresholdSpec::new("Parus major", 0.1),
            ThresholdSpec::new("Aquila chrysaetos", 0.8),
        ]
    }

    #[test]
    fn test_build_report() {
        let cfg = CalibrationConfig::default();
        let report = CalibrationReport::build(&table(), &thresholds(), &cfg, false).unwrap();
        let names: Vec<&str> = report.categories.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(
            names,
            vec!["Sitta europaea", "Parus major", "Columba palumbus", "Aquila chrysaetos"]
        );
        assert!(report.get("Pica pica").is_none());

        let parus = report.get("Parus major").unwrap();
        assert_eq!(parus.threshold, 0.75);
        assert_eq!(parus.n_records, 6);
        assert!(parus.calibration.is_fitted());
        let eval = parus.evaluation.as_ref().unwrap();
        assert_eq!(eval.n_true, 3);
        assert!((eval.empirical_tpr - 2.0 / 3.0).abs() < 1e-12);
        assert!(eval.model_tpr.is_some());
        assert_eq!(parus.bins.iter().map(|b| b.count).sum::<usize>(), 6);
        assert_eq!(parus.curve(&cfg).unwrap().len(), cfg.grid_points);

        let sitta = report.get("Sitta europaea").unwrap();
        assert!(matches!(
            sitta.calibration,
            Calibration::Skipped(SkipReason::SingleClass { .. })
        ));
        let eval = sitta.evaluation.as_ref().unwrap();
        assert!((eval.empirical_tpr - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(eval.model_tpr, None);
        assert!(sitta.curve(&cfg).is_none());

        let columba = report.get("Columba palumbus").unwrap();
        assert!(!columba.calibration.is_fitted());
        assert!(columba.evaluation.is_none());

        let aquila = report.get("Aquila chrysaetos").unwrap();
        assert_eq!(aquila.n_records, 0);
        assert!(aquila.bins.is_empty());
        assert!(aquila.evaluation.is_none());
        assert_eq!(
            aquila.calibration,
            Calibration::Skipped(SkipReason::TooFewRecords { n: 0 })
        );

        assert_eq!(report.n_fitted(), 1);
        let evals = report.evaluations();
        assert_eq!(evals.len(), 2);
        // Equal TPR, ordered by name.
        assert_eq!(evals[0].category, "Parus major");
        assert_eq!(evals[1].category, "Sitta europaea");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let cfg = CalibrationConfig::default().set_num_threads(Some(2));
        let table = table();
        let sequential = CalibrationReport::build(&table, &thresholds(), &cfg, false).unwrap();
        let parallel = CalibrationReport::build(&table, &thresholds(), &cfg, true).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_build_is_deterministic() {
        let cfg = CalibrationConfig::default();
        let a = CalibrationReport::build(&table(), &thresholds(), &cfg, false).unwrap();
        let b = CalibrationReport::build(&table(), &thresholds(), &cfg, false).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_inputs() {
        let bad_threshold = vec![ThresholdSpec::new("Parus major", 1.5)];
        assert!(matches!(
            CalibrationReport::build(&table(), &bad_threshold, &CalibrationConfig::default(), false),
            Err(CalibrationError::InvalidParameter(..))
        ));
        let bad_cfg = CalibrationConfig::default().set_bin_width(-0.1);
        assert!(CalibrationReport::build(&table(), &thresholds(), &bad_cfg, false).is_err());
        let tiny_bins = CalibrationConfig::default().set_bin_width(1e-300);
        assert!(matches!(
            CalibrationReport::build(&table(), &thresholds(), &tiny_bins, false),
            Err(CalibrationError::InvalidParameter(..))
        ));
    }

    #[test]
    fn test_unique_thresholds_keeps_first() {
        let unique = unique_thresholds(&thresholds()).unwrap();
        assert_eq!(unique.len(), 4);
        assert_eq!(unique[1], ThresholdSpec::new("Parus major", 0.75));
    }

    #[test]
    fn test_report_io_json() {
        let cfg = CalibrationConfig::default();
        let report = CalibrationReport::build(&table(), &thresholds(), &cfg, false).unwrap();
        let json = report.json_dump().unwrap();
        let report2 = CalibrationReport::from_json(&json).unwrap();
        assert_eq!(report, report2);

        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save_json(&path).unwrap();
        assert_eq!(CalibrationReport::load_json(&path).unwrap(), report);
    }
}
