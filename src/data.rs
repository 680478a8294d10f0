//! Data
//!
//! The in-memory detection table, the label type, and externally supplied
//! per-category thresholds.
use crate::errors::CalibrationError;
use crate::utils::{is_missing, items_to_strings, sigmoid, validate_float_parameter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Outcome of the manual validation of a detection.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Label {
    /// Confirmed false positive (0).
    FalsePositive,
    /// Confirmed true positive (1).
    TruePositive,
}

impl Label {
    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Label::TruePositive)
    }

    /// Numeric value of the label, 1.0 for a true positive and 0.0 otherwise.
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Label::TruePositive => 1.0,
            Label::FalsePositive => 0.0,
        }
    }
}

impl From<bool> for Label {
    fn from(positive: bool) -> Self {
        if positive {
            Label::TruePositive
        } else {
            Label::FalsePositive
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::TruePositive => write!(f, "1"),
            Label::FalsePositive => write!(f, "0"),
        }
    }
}

impl FromStr for Label {
    type Err = CalibrationError;

    /// Parse a validation status. Accepts the status codes `p` / `nc` as well
    /// as numeric and boolean spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "1" | "1.0" | "true" => Ok(Label::TruePositive),
            "nc" | "0" | "0.0" | "false" => Ok(Label::FalsePositive),
            _ => Err(CalibrationError::ParseString(
                s.to_string(),
                "Label".to_string(),
                items_to_strings(vec!["p", "nc", "1", "0", "true", "false"]),
            )),
        }
    }
}

/// A single validated detection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetectionRecord {
    pub category: String,
    /// Detector confidence, NaN when missing.
    pub confidence: f64,
    pub label: Label,
}

impl DetectionRecord {
    pub fn new(category: impl Into<String>, confidence: f64, label: Label) -> Self {
        DetectionRecord {
            category: category.into(),
            confidence,
            label,
        }
    }
}

/// An immutable collection of detection records whose confidences are known
/// to lie within [0, 1] (or be missing).
///
/// Deserialization goes through `DetectionTable::new`, so the range check also
/// applies to tables read from JSON.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(try_from = "UncheckedTable")]
pub struct DetectionTable {
    records: Vec<DetectionRecord>,
}

#[derive(Deserialize)]
struct UncheckedTable {
    records: Vec<DetectionRecord>,
}

impl TryFrom<UncheckedTable> for DetectionTable {
    type Error = CalibrationError;

    fn try_from(table: UncheckedTable) -> Result<Self, Self::Error> {
        DetectionTable::new(table.records)
    }
}

impl DetectionTable {
    /// Build a table, rejecting any record whose confidence falls outside [0, 1].
    ///
    /// Rescaling per-mille confidences is the job of ingestion; a value that
    /// still exceeds 1 here is an ingestion defect.
    pub fn new(records: Vec<DetectionRecord>) -> Result<Self, CalibrationError> {
        for (index, record) in records.iter().enumerate() {
            let c = record.confidence;
            if !is_missing(c) && !(0.0..=1.0).contains(&c) {
                return Err(CalibrationError::ConfidenceOutOfRange {
                    index,
                    category: record.category.clone(),
                    confidence: c,
                });
            }
        }
        Ok(DetectionTable { records })
    }

    pub fn records(&self) -> &[DetectionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.records.iter().map(|r| r.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }

    /// Draw `n` synthetic detections for `category` whose labels follow
    /// `sigmoid(intercept + slope * confidence)`, with confidences uniform on
    /// `[low, high]`.
    pub fn simulate(
        category: &str,
        intercept: f64,
        slope: f64,
        n: usize,
        (low, high): (f64, f64),
        seed: u64,
    ) -> Result<Self, CalibrationError> {
        validate_float_parameter(low, 0.0, 1.0, "low")?;
        validate_float_parameter(high, low, 1.0, "high")?;
        let mut rng = StdRng::seed_from_u64(seed);
        let records = (0..n)
            .map(|_| {
                let confidence = low + (high - low) * rng.gen::<f64>();
                let p = sigmoid(intercept + slope * confidence);
                DetectionRecord::new(category, confidence, Label::from(rng.gen::<f64>() < p))
            })
            .collect();
        DetectionTable::new(records)
    }
}

/// A decision threshold for one category, supplied from outside the crate.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ThresholdSpec {
    pub category: String,
    pub threshold: f64,
}

impl ThresholdSpec {
    pub fn new(category: impl Into<String>, threshold: f64) -> Self {
        ThresholdSpec {
            category: category.into(),
            threshold,
        }
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        validate_float_parameter(self.threshold, 0.0, 1.0, &format!("threshold ({})", self.category))
    }
}
