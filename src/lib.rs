// Modules
pub mod binning;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod data;
pub mod errors;
pub mod evaluation;
pub mod ingest;
pub mod io;
pub mod overlay;
pub mod partition;
pub mod report;
pub mod utils;

// Individual classes, and functions
pub use calibration::{Calibration, CalibrationModel, LogisticCalibrator};
pub use config::{CalibrationConfig, JsonIO};
pub use data::{DetectionRecord, DetectionTable, Label, ThresholdSpec};
pub use errors::CalibrationError;
pub use overlay::CutoffOverlay;
pub use report::{CalibrationReport, CategoryReport};
