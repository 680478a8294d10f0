pub const MIN_CONF: f64 = 0.5;
pub const BIN_WIDTH: f64 = 0.05;
/// Upper bound on the number of empirical bins over [min_conf, 1].
pub const MAX_BINS: usize = 100_000;
pub const GRID_POINTS: usize = 200;
pub const ITERATION_LIMIT: usize = 1000;
pub const GRADIENT_TOLERANCE: f64 = 1e-8;
pub const LOSS_TOLERANCE: f64 = 1e-12;
pub const HESSIAN_EPS: f64 = 1e-12;
/// Largest Newton step (in parameter space) taken in a single iteration.
pub const MAX_STEP_NORM: f64 = 10.0;
pub const ARMIJO_C: f64 = 1e-4;
pub const MIN_STEP_SCALE: f64 = 1e-10;
/// Slack used when mapping a confidence onto a bin edge.
pub const BOUNDARY_EPS: f64 = 1e-9;
/// Confidences above 1 are read as per-mille values.
pub const CONFIDENCE_SCALE: f64 = 1000.0;
