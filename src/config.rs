//! Calibration Configuration
//!
//! Scalar settings shared by the partitioner, the calibrator, the binner and
//! curve sampling. The configuration is passed explicitly into every call.
use crate::constants::{BIN_WIDTH, GRADIENT_TOLERANCE, GRID_POINTS, ITERATION_LIMIT, MAX_BINS, MIN_CONF};
use crate::errors::CalibrationError;
use crate::utils::{validate_float_parameter, validate_positive_float_parameter};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_min_conf() -> f64 {
    MIN_CONF
}
fn default_bin_width() -> f64 {
    BIN_WIDTH
}
fn default_grid_points() -> usize {
    GRID_POINTS
}
fn default_max_iter() -> usize {
    ITERATION_LIMIT
}
fn default_tolerance() -> f64 {
    GRADIENT_TOLERANCE
}
fn default_num_threads() -> Option<usize> {
    None
}

/// Configuration for building a calibration report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Lower bound of the validated confidence range.
    #[serde(default = "default_min_conf")]
    pub min_conf: f64,
    /// Width of the empirical calibration bins.
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,
    /// Number of points used to sample a fitted curve on [min_conf, 1].
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
    /// Iteration cap of the logistic fit.
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Gradient tolerance of the logistic fit.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Number of threads for the per-category fan out.
    #[serde(default = "default_num_threads")]
    pub num_threads: Option<usize>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        CalibrationConfig {
            min_conf: MIN_CONF,
            bin_width: BIN_WIDTH,
            grid_points: GRID_POINTS,
            max_iter: ITERATION_LIMIT,
            tolerance: GRADIENT_TOLERANCE,
            num_threads: None,
        }
    }
}

impl CalibrationConfig {
    /// Set the minimum confidence.
    /// * `min_conf` - Records below this confidence are left out of every fit.
    pub fn set_min_conf(mut self, min_conf: f64) -> Self {
        self.min_conf = min_conf;
        self
    }

    /// Set the bin width of the empirical curve.
    pub fn set_bin_width(mut self, bin_width: f64) -> Self {
        self.bin_width = bin_width;
        self
    }

    /// Set the curve resolution.
    pub fn set_grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Set the iteration cap of the logistic fit.
    pub fn set_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance of the logistic fit.
    pub fn set_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the number of threads.
    /// * `num_threads` - Threads used when categories are processed in parallel,
    ///   `None` uses all available cores.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        validate_float_parameter(self.min_conf, 0.0, 1.0, "min_conf")?;
        validate_positive_float_parameter(self.bin_width, "bin_width")?;
        validate_float_parameter(self.bin_width, 0.0, 1.0, "bin_width")?;
        if (1.0 - self.min_conf) / self.bin_width > MAX_BINS as f64 {
            return Err(CalibrationError::InvalidParameter(
                "bin_width".to_string(),
                format!("at most {} bins over [{}, 1]", MAX_BINS, self.min_conf),
                self.bin_width.to_string(),
            ));
        }
        validate_positive_float_parameter(self.tolerance, "tolerance")?;
        if self.max_iter == 0 {
            return Err(CalibrationError::InvalidParameter(
                "max_iter".to_string(),
                "at least 1".to_string(),
                self.max_iter.to_string(),
            ));
        }
        if self.grid_points < 2 {
            return Err(CalibrationError::InvalidParameter(
                "grid_points".to_string(),
                "at least 2".to_string(),
                self.grid_points.to_string(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(CalibrationError::InvalidParameter(
                "num_threads".to_string(),
                "at least 1".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

/// JSON persistence for configurations, reports and cutoff overlays.
pub trait JsonIO: Serialize + DeserializeOwned + Sized {
    /// Write the JSON form to `path`, replacing any existing file.
    fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), CalibrationError> {
        fs::write(path, self.json_dump()?).map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
    }

    /// JSON string with every float written so that it reads back exactly.
    fn json_dump(&self) -> Result<String, CalibrationError> {
        serde_json::to_string(self).map_err(|e| CalibrationError::UnableToWrite(e.to_string()))
    }

    /// Parse a value written by `json_dump`. Missing configuration fields take
    /// their defaults.
    fn from_json(json_str: &str) -> Result<Self, CalibrationError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| CalibrationError::UnableToRead(e.to_string()))
    }

    /// Read a file written by `save_json`.
    fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        let json_str = fs::read_to_string(path).map_err(|e| CalibrationError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl JsonIO for CalibrationConfig {}
