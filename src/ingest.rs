//! Ingestion
//!
//! Turns raw validation rows into `DetectionRecord`s: rows without a category,
//! a confidence or a determinate label are dropped, and per-mille confidences
//! are rescaled onto [0, 1].
use crate::constants::CONFIDENCE_SCALE;
use crate::data::{DetectionRecord, DetectionTable, Label};
use crate::errors::CalibrationError;
use log::debug;
use serde::{Deserialize, Serialize};

/// A row as it comes out of a validation export, before any cleaning.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct RawDetection {
    pub category: Option<String>,
    pub confidence: Option<f64>,
    /// Validation status, e.g. `p`, `nc`, `1` or `0`.
    pub status: Option<String>,
}

/// Counts of what happened to the rows during normalization.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub kept: usize,
    pub rescaled: usize,
    pub missing_category: usize,
    pub missing_confidence: usize,
    pub missing_label: usize,
}

impl IngestSummary {
    pub fn dropped(&self) -> usize {
        self.missing_category + self.missing_confidence + self.missing_label
    }
}

/// Map a raw confidence onto [0, 1]. Values above 1 (e.g. 765) were exported
/// as per-mille and are divided by 1000.
#[inline]
pub fn rescale_confidence(confidence: f64) -> f64 {
    if confidence > 1.0 {
        confidence / CONFIDENCE_SCALE
    } else {
        confidence
    }
}

/// Clean raw rows into detection records.
pub fn normalize(rows: Vec<RawDetection>) -> (Vec<DetectionRecord>, IngestSummary) {
    let mut summary = IngestSummary::default();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.into_iter().enumerate() {
        let category = match row.category.map(|c| c.trim().to_string()) {
            Some(c) if !c.is_empty() => c,
            _ => {
                debug!("Row {}: dropped, no category.", i);
                summary.missing_category += 1;
                continue;
            }
        };
        let confidence = match row.confidence {
            Some(c) if !c.is_nan() => c,
            _ => {
                debug!("Row {} ({}): dropped, no confidence.", i, category);
                summary.missing_confidence += 1;
                continue;
            }
        };
        let label = match row.status.as_deref().map(str::parse::<Label>) {
            Some(Ok(label)) => label,
            _ => {
                debug!("Row {} ({}): dropped, status {:?} is not a label.", i, category, row.status);
                summary.missing_label += 1;
                continue;
            }
        };
        if confidence > 1.0 {
            summary.rescaled += 1;
        }
        records.push(DetectionRecord::new(category, rescale_confidence(confidence), label));
    }
    summary.kept = records.len();
    (records, summary)
}

/// Normalize the rows and build the detection table from them.
pub fn ingest(rows: Vec<RawDetection>) -> Result<(DetectionTable, IngestSummary), CalibrationError> {
    let (records, summary) = normalize(rows);
    let table = DetectionTable::new(records)?;
    Ok((table, summary))
}
