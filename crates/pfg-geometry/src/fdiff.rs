//! Forward-difference step matrices.
//!
//! Row `k` of a step matrix holds the `k`-th forward difference of the power
//! basis at parameter 0, so `E · C · Eᵀ` yields a table whose first row and
//! column can be advanced by repeated addition alone.

use log::warn;
use pfg_math::Matrix4;
use serde::{Deserialize, Serialize};

pub const MIN_PRECISION: usize = 1;
pub const MAX_PRECISION: usize = 10;
pub const DEFAULT_PRECISION: usize = 5;

/// Clamp a requested sample count into the supported range.
pub fn clamp_precision(requested: i64) -> usize {
    let clamped = requested.clamp(MIN_PRECISION as i64, MAX_PRECISION as i64) as usize;
    if clamped as i64 != requested {
        warn!("precision {requested} out of range, using {clamped}");
    }
    clamped
}

/// Step matrices for one `(s, t)` precision pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMatrices {
    pub s_precision: usize,
    pub t_precision: usize,
    /// Cubic differences for ε = 1/s_precision.
    pub e_epsilon: Matrix4,
    /// Cubic differences for σ = 1/t_precision.
    pub e_sigma: Matrix4,
    /// Derivative-basis differences for ε.
    pub t_e_epsilon: Matrix4,
    /// Derivative-basis differences for σ.
    pub t_e_sigma: Matrix4,
}

impl StepMatrices {
    /// Build the step matrices. Precisions must already be in range.
    pub fn new(s_precision: usize, t_precision: usize) -> Self {
        debug_assert!((MIN_PRECISION..=MAX_PRECISION).contains(&s_precision));
        debug_assert!((MIN_PRECISION..=MAX_PRECISION).contains(&t_precision));
        let epsilon = 1.0 / s_precision as f64;
        let sigma = 1.0 / t_precision as f64;
        Self {
            s_precision,
            t_precision,
            e_epsilon: cubic_steps(epsilon),
            e_sigma: cubic_steps(sigma),
            t_e_epsilon: tangent_steps(epsilon),
            t_e_sigma: tangent_steps(sigma),
        }
    }

    pub fn matches(&self, s_precision: usize, t_precision: usize) -> bool {
        self.s_precision == s_precision && self.t_precision == t_precision
    }
}

impl Default for StepMatrices {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION, DEFAULT_PRECISION)
    }
}

/// Differences of `[s³ s² s 1]` at step `d`.
fn cubic_steps(d: f64) -> Matrix4 {
    let d2 = d * d;
    let d3 = d2 * d;
    [
        [0.0, 0.0, 0.0, 1.0],
        [d3, d2, d, 0.0],
        [6.0 * d3, 2.0 * d2, 0.0, 0.0],
        [6.0 * d3, 0.0, 0.0, 0.0],
    ]
}

/// Differences of the derivative basis `[3s² 2s 1 0]` at step `d`.
fn tangent_steps(d: f64) -> Matrix4 {
    let d2 = d * d;
    [
        [0.0, 0.0, 1.0, 0.0],
        [3.0 * d2, 2.0 * d, 0.0, 0.0],
        [6.0 * d2, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Run the difference recurrence on a scalar polynomial with the given
    /// power-basis coefficients and compare against direct evaluation.
    fn march(coeffs: [f64; 4], steps: &Matrix4, n: usize, eval: impl Fn(f64) -> f64) {
        let mut d = [0.0; 4];
        for (k, dk) in d.iter_mut().enumerate() {
            *dk = (0..4).map(|j| steps[k][j] * coeffs[j]).sum();
        }
        for i in 0..=n {
            let s = i as f64 / n as f64;
            assert_relative_eq!(d[0], eval(s), epsilon = 1e-10);
            d[0] += d[1];
            d[1] += d[2];
            d[2] += d[3];
        }
    }

    #[test]
    fn test_cubic_steps_reproduce_polynomial() {
        let c = [2.0, -3.0, 0.5, 1.25];
        for n in 1..=10 {
            let e = cubic_steps(1.0 / n as f64);
            march(c, &e, n, |s| c[0] * s * s * s + c[1] * s * s + c[2] * s + c[3]);
        }
    }

    #[test]
    fn test_tangent_steps_reproduce_derivative() {
        let c = [2.0, -3.0, 0.5, 1.25];
        for n in 1..=10 {
            let e = tangent_steps(1.0 / n as f64);
            march(c, &e, n, |s| 3.0 * c[0] * s * s + 2.0 * c[1] * s + c[2]);
        }
    }

    #[test]
    fn test_clamp_precision() {
        assert_eq!(clamp_precision(0), 1);
        assert_eq!(clamp_precision(4), 4);
        assert_eq!(clamp_precision(25), 10);
    }

    #[test]
    fn test_matches() {
        let m = StepMatrices::new(4, 7);
        assert!(m.matches(4, 7));
        assert!(!m.matches(7, 4));
    }
}
