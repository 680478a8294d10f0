//! Errors
//!
//! Custom error types used throughout the `confcal` crate.
use thiserror::Error;

/// Errors that can occur while building or exporting a calibration.
///
/// Degenerate categories, undefined recall and a fit that hits its iteration
/// limit are not errors. They surface as `Calibration::Skipped`, a missing
/// `ThresholdEvaluation` and `CalibrationModel::converged == false`.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// A record reached the core with a confidence outside of [0, 1].
    #[error("Record {index} ({category}) has confidence {confidence}, expected a value within 0 and 1.")]
    ConfidenceOutOfRange {
        index: usize,
        category: String,
        confidence: f64,
    },
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// A required input file was not supplied.
    #[error("Required input {0} does not exist.")]
    MissingInput(String),
    /// Unable to read an input table or report.
    #[error("Unable to read from {0}")]
    UnableToRead(String),
    /// Unable to write an output table or report.
    #[error("Unable to write: {0}")]
    UnableToWrite(String),
    /// The worker pool used for per-category fan out could not be created.
    #[error("Unable to build thread pool: {0}")]
    ThreadPool(String),
}
