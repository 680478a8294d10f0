use crate::errors::CalibrationError;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

// Validation
pub fn validate_positive_float_parameter(value: f64, parameter: &str) -> Result<(), CalibrationError> {
    if value.is_nan() || value <= 0.0 {
        Err(CalibrationError::InvalidParameter(
            parameter.to_string(),
            "a positive real value".to_string(),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), CalibrationError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(CalibrationError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// A confidence is missing when it is NaN.
#[inline]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Logistic function, evaluated without overflowing for large |z|.
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + exp(z))`, stable on both tails.
#[inline]
pub fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// `n` evenly spaced values from `start` to `stop`, both ends included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            // Pin the last value so the grid ends exactly on `stop`.
            v[n - 1] = stop;
            v
        }
    }
}

/// Build the worker pool for per-category fan out.
/// * `num_threads` - Number of threads, `None` uses every available core.
pub fn thread_pool(num_threads: Option<usize>) -> Result<rayon::ThreadPool, CalibrationError> {
    let n_threads_available = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let num_threads = num_threads.unwrap_or(n_threads_available);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| CalibrationError::ThreadPool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool() {
        let pool = thread_pool(Some(2)).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert!(thread_pool(None).is_ok());
    }

    #[test]
    fn test_sigmoid_tails() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) == 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_softplus_matches_naive() {
        for z in [-5.0, -0.5, 0.0, 0.5, 5.0] {
            let naive = (1.0 + f64::exp(z)).ln();
            assert!((softplus(z) - naive).abs() < 1e-12);
        }
        assert_eq!(softplus(1000.0), 1000.0);
        assert!(softplus(-1000.0) >= 0.0);
    }

    #[test]
    fn test_linspace() {
        let v = linspace(0.5, 1.0, 6);
        assert_eq!(v.len(), 6);
        assert_eq!(v[0], 0.5);
        assert_eq!(v[5], 1.0);
        assert!((v[1] - 0.6).abs() < 1e-12);
        assert!(linspace(0.5, 1.0, 0).is_empty());
        assert_eq!(linspace(0.5, 1.0, 1), vec![0.5]);
    }

    #[test]
    fn test_validate_float_parameter() {
        assert!(validate_float_parameter(0.5, 0.0, 1.0, "min_conf").is_ok());
        assert!(validate_float_parameter(1.5, 0.0, 1.0, "min_conf").is_err());
        assert!(validate_float_parameter(f64::NAN, 0.0, 1.0, "min_conf").is_err());
        assert!(validate_positive_float_parameter(0.0, "bin_width").is_err());
        assert!(validate_positive_float_parameter(0.05, "bin_width").is_ok());
    }
}
