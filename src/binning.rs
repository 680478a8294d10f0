//! Empirical Binner
//!
//! Aggregates a category's records into fixed-width confidence bins over
//! `[min_conf, 1]`, giving the observed share of true positives per bin.
//!
//! Bins are right-closed: a confidence sitting exactly on an interior edge
//! belongs to the lower bin, so the bins are `[min_conf, e1], (e1, e2], ...,
//! (e_k, 1]`. The lower edges are `min_conf + k * bin_width`; the last upper
//! edge is clipped to 1.
use crate::constants::BOUNDARY_EPS;
use crate::data::DetectionRecord;
use crate::utils::is_missing;
use serde::{Deserialize, Serialize};

/// One non-empty confidence bin.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct EmpiricalBin {
    pub lower: f64,
    pub upper: f64,
    /// Share of true positives among the records in the bin.
    pub mean_label: f64,
    pub count: usize,
}

impl EmpiricalBin {
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// Number of bins needed to cover `[min_conf, 1]`.
pub fn n_bins(bin_width: f64, min_conf: f64) -> usize {
    (((1.0 - min_conf) / bin_width) - BOUNDARY_EPS).ceil().max(1.0) as usize
}

/// Index of the bin holding confidence `c`, `None` when `c` is missing or
/// outside of `[min_conf, 1]`.
///
/// * `c` - The confidence to place.
/// * `bin_width` - Width of every bin.
/// * `min_conf` - Lower edge of the first bin.
/// * `nbins` - Total number of bins, see `n_bins`.
#[inline]
pub fn map_bin(c: f64, bin_width: f64, min_conf: f64, nbins: usize) -> Option<usize> {
    if is_missing(c) || c < min_conf || c > 1.0 {
        return None;
    }
    // ceil(pos) - 1 sends a value on an edge to the bin below it; the slack
    // absorbs the rounding of edges such as 0.5 + 0.05.
    let pos = (c - min_conf) / bin_width;
    let idx = (pos - BOUNDARY_EPS).ceil() as i64 - 1;
    Some(idx.clamp(0, nbins as i64 - 1) as usize)
}

/// Bin a category's filtered records.
///
/// `bin_width` is expected to have passed `CalibrationConfig::validate`.
/// Empty bins are left out. The output is ordered by `lower` and does not
/// depend on the order of `records`.
pub fn bin_records(records: &[&DetectionRecord], bin_width: f64, min_conf: f64) -> Vec<EmpiricalBin> {
    let nbins = n_bins(bin_width, min_conf);
    let mut positives = vec![0usize; nbins];
    let mut counts = vec![0usize; nbins];

    for record in records {
        if let Some(i) = map_bin(record.confidence, bin_width, min_conf, nbins) {
            counts[i] += 1;
            if record.label.is_positive() {
                positives[i] += 1;
            }
        }
    }

    counts
        .iter()
        .zip(positives.iter())
        .enumerate()
        .filter(|(_, (&count, _))| count > 0)
        .map(|(i, (&count, &pos))| EmpiricalBin {
            lower: min_conf + i as f64 * bin_width,
            upper: (min_conf + (i + 1) as f64 * bin_width).min(1.0),
            mean_label: pos as f64 / count as f64,
            count,
        })
        .collect()
}
