//! Log Loss (negative log-likelihood) of a one-dimensional logistic model.
use crate::utils::{sigmoid, softplus};

/// Mean loss, gradient and Hessian at a point `(intercept, slope)`.
///
/// The Hessian is symmetric and stored as `[h_aa, h_ab, h_bb]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossState {
    pub loss: f64,
    pub gradient: [f64; 2],
    pub hessian: [f64; 3],
}

impl LossState {
    /// Largest absolute gradient component.
    #[inline]
    pub fn gradient_norm(&self) -> f64 {
        self.gradient[0].abs().max(self.gradient[1].abs())
    }
}

/// Binary cross-entropy of `sigmoid(a + b * x)` against targets in {0, 1},
/// averaged over the samples. No penalty term.
#[derive(Debug, Clone, Copy)]
pub struct LogLoss<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

impl<'a> LogLoss<'a> {
    pub fn new(x: &'a [f64], y: &'a [f64]) -> Self {
        debug_assert_eq!(x.len(), y.len());
        LogLoss { x, y }
    }

    /// Mean loss at `theta = [a, b]`.
    ///
    /// Each term is written as `ln(1 + e^z) - y z`, which stays finite for
    /// the large slopes of nearly separable data.
    pub fn loss(&self, theta: [f64; 2]) -> f64 {
        let total: f64 = self
            .x
            .iter()
            .zip(self.y)
            .map(|(x_, y_)| {
                let z = theta[0] + theta[1] * x_;
                softplus(z) - y_ * z
            })
            .sum();
        total / self.x.len() as f64
    }

    /// Mean loss, gradient and Hessian at `theta = [a, b]` in a single pass.
    pub fn evaluate(&self, theta: [f64; 2]) -> LossState {
        let mut loss = 0.0;
        let mut g = [0.0; 2];
        let mut h = [0.0; 3];
        for (x_, y_) in self.x.iter().zip(self.y) {
            let z = theta[0] + theta[1] * x_;
            let p = sigmoid(z);
            loss += softplus(z) - y_ * z;
            let e = p - y_;
            let w = p * (1.0 - p);
            g[0] += e;
            g[1] += e * x_;
            h[0] += w;
            h[1] += w * x_;
            h[2] += w * x_ * x_;
        }
        let n = self.x.len() as f64;
        LossState {
            loss: loss / n,
            gradient: [g[0] / n, g[1] / n],
            hessian: [h[0] / n, h[1] / n, h[2] / n],
        }
    }
}
