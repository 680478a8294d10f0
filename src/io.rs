//! Delimited-text input and output.
//!
//! Reads the validated detections and the threshold table, and writes the
//! threshold evaluation table, sampled curves and empirical bins.
use crate::binning::EmpiricalBin;
use crate::calibration::CurvePoint;
use crate::data::{DetectionTable, ThresholdSpec};
use crate::errors::CalibrationError;
use crate::evaluation::ThresholdEvaluation;
use crate::ingest::{ingest, IngestSummary, RawDetection};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Deserialize)]
struct DetectionRow {
    #[serde(alias = "species")]
    category: Option<String>,
    confidence: Option<String>,
    #[serde(alias = "status")]
    label: Option<String>,
}

#[derive(Deserialize)]
struct ThresholdRow {
    #[serde(alias = "species")]
    category: String,
    threshold: f64,
}

#[derive(Serialize)]
struct EvaluationRow<'a> {
    category: &'a str,
    threshold: f64,
    empirical_tpr: f64,
    model_tpr: Option<f64>,
    n_true: usize,
}

fn reader<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<csv::Reader<std::fs::File>, CalibrationError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CalibrationError::MissingInput(path.display().to_string()));
    }
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| CalibrationError::UnableToRead(e.to_string()))
}

fn writer<P: AsRef<Path>>(path: P) -> Result<csv::Writer<std::fs::File>, CalibrationError> {
    csv::Writer::from_path(path).map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
}

/// Read validated detections with a `category` (or `species`), `confidence`
/// and `label` column.
///
/// Confidences that do not parse as numbers are treated as missing. Rows are
/// normalized as described in `ingest::normalize`.
pub fn read_detections<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
) -> Result<(DetectionTable, IngestSummary), CalibrationError> {
    let mut rdr = reader(path, delimiter)?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: DetectionRow = result.map_err(|e| CalibrationError::UnableToRead(e.to_string()))?;
        rows.push(RawDetection {
            category: row.category,
            confidence: row.confidence.and_then(|c| c.parse::<f64>().ok()),
            status: row.label,
        });
    }
    let (table, summary) = ingest(rows)?;
    info!(
        "Read {} detections ({} rescaled, {} dropped).",
        summary.kept,
        summary.rescaled,
        summary.dropped()
    );
    Ok((table, summary))
}

/// Read a threshold table with a `category` (or `species`) and a `threshold`
/// column. Other columns are ignored.
pub fn read_thresholds<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Vec<ThresholdSpec>, CalibrationError> {
    let mut rdr = reader(path, delimiter)?;
    let mut thresholds = Vec::new();
    for result in rdr.deserialize() {
        let row: ThresholdRow = result.map_err(|e| CalibrationError::UnableToRead(e.to_string()))?;
        let spec = ThresholdSpec::new(row.category, row.threshold);
        spec.validate()?;
        thresholds.push(spec);
    }
    Ok(thresholds)
}

/// Write the threshold evaluation table. An absent model TPR is left empty.
pub fn write_evaluations<P: AsRef<Path>>(path: P, evaluations: &[ThresholdEvaluation]) -> Result<(), CalibrationError> {
    let mut wtr = writer(path)?;
    for e in evaluations {
        wtr.serialize(EvaluationRow {
            category: &e.category,
            threshold: e.threshold,
            empirical_tpr: e.empirical_tpr,
            model_tpr: e.model_tpr,
            n_true: e.n_true,
        })
        .map_err(|e| CalibrationError::UnableToWrite(e.to_string()))?;
    }
    wtr.flush().map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
}

/// Write a sampled curve as `confidence,probability` rows.
pub fn write_curve<P: AsRef<Path>>(path: P, points: &[CurvePoint]) -> Result<(), CalibrationError> {
    let mut wtr = writer(path)?;
    for p in points {
        wtr.serialize(p).map_err(|e| CalibrationError::UnableToWrite(e.to_string()))?;
    }
    wtr.flush().map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
}

/// Write empirical bins as `lower,upper,mean_label,count` rows.
pub fn write_bins<P: AsRef<Path>>(path: P, bins: &[EmpiricalBin]) -> Result<(), CalibrationError> {
    let mut wtr = writer(path)?;
    for b in bins {
        wtr.serialize(b).map_err(|e| CalibrationError::UnableToWrite(e.to_string()))?;
    }
    wtr.flush().map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Label;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_read_detections() {
        let (table, summary) = read_detections("resources/validated_detections.csv", b';').unwrap();
        assert_eq!(summary.kept, table.len());
        assert_eq!(summary.rescaled, 2);
        assert_eq!(summary.missing_confidence, 2);
        assert_eq!(summary.missing_label, 1);
        assert!(table.records().iter().all(|r| (0.0..=1.0).contains(&r.confidence)));
        let rescaled = table
            .records()
            .iter()
            .find(|r| r.category == "Turdus merula" && r.confidence == 0.765)
            .unwrap();
        assert_eq!(rescaled.label, Label::TruePositive);
    }

    #[test]
    fn test_read_thresholds() {
        let thresholds = read_thresholds("resources/thresholds.csv", b',').unwrap();
        assert_eq!(thresholds.len(), 3);
        assert_eq!(thresholds[0], ThresholdSpec::new("Turdus merula", 0.7));
    }

    #[test]
    fn test_missing_input() {
        assert!(matches!(
            read_thresholds("resources/does_not_exist.csv", b','),
            Err(CalibrationError::MissingInput(_))
        ));
        assert!(matches!(
            read_detections("resources/does_not_exist.csv", b';'),
            Err(CalibrationError::MissingInput(_))
        ));
    }

    #[test]
    fn test_write_evaluations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tpr_at_thresholds.csv");
        let evaluations = vec![
            ThresholdEvaluation {
                category: "a".to_string(),
                threshold: 0.7,
                empirical_tpr: 0.5,
                model_tpr: Some(0.25),
                n_true: 2,
                n_retained: 1,
            },
            ThresholdEvaluation {
                category: "b".to_string(),
                threshold: 0.8,
                empirical_tpr: 1.0,
                model_tpr: None,
                n_true: 3,
                n_retained: 3,
            },
        ];
        write_evaluations(&path, &evaluations).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "category,threshold,empirical_tpr,model_tpr,n_true");
        assert_eq!(lines[1], "a,0.7,0.5,0.25,2");
        assert_eq!(lines[2], "b,0.8,1.0,,3");
    }

    #[test]
    fn test_write_curve_and_bins() {
        let dir = tempdir().unwrap();
        let curve_path = dir.path().join("curve.csv");
        let points = vec![
            CurvePoint {
                confidence: 0.5,
                probability: 0.25,
            },
            CurvePoint {
                confidence: 1.0,
                probability: 0.75,
            },
        ];
        write_curve(&curve_path, &points).unwrap();
        let text = fs::read_to_string(&curve_path).unwrap();
        assert_eq!(text.lines().next().unwrap(), "confidence,probability");
        assert_eq!(text.lines().count(), 3);

        let bins_path = dir.path().join("bins.csv");
        let bins = vec![EmpiricalBin {
            lower: 0.5,
            upper: 0.55,
            mean_label: 0.5,
            count: 4,
        }];
        write_bins(&bins_path, &bins).unwrap();
        let text = fs::read_to_string(&bins_path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["lower,upper,mean_label,count", "0.5,0.55,0.5,4"]);
    }
}
