//! Bicubic tensor-product patch evaluated directly from its polynomial form.

use pfg_core::Tolerance;
use pfg_math::basis::{row_times, sandwich};
use pfg_math::{Basis, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::Surface;
use crate::evaluate::unit_or_degenerate;

/// 4x4 control points, `grid[row][col]` with rows along `s` and columns along `t`.
pub type ControlGrid = [[Point3; 4]; 4];

/// A bicubic patch: a basis plus a 4x4 grid of control points.
///
/// Evaluation multiplies out `S·M·P·Mᵀ·Tᵀ` per call; this is the slow path
/// used to check the forward-difference evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BicubicPatch {
    pub basis: Basis,
    pub control_points: ControlGrid,
    /// `M·P·Mᵀ` per axis.
    coefficients: [Matrix4; 3],
}

impl BicubicPatch {
    pub fn new(basis: Basis, control_points: ControlGrid) -> Self {
        let m = basis.matrix();
        let mut coefficients = [[[0.0; 4]; 4]; 3];
        for (axis, c) in coefficients.iter_mut().enumerate() {
            let mut p = [[0.0; 4]; 4];
            for i in 0..4 {
                for j in 0..4 {
                    p[i][j] = control_points[i][j][axis];
                }
            }
            *c = sandwich(&m, &p, &m);
        }
        Self {
            basis,
            control_points,
            coefficients,
        }
    }

    fn combine(&self, s_row: [f64; 4], t_row: [f64; 4]) -> Vector3 {
        let mut out = Vector3::ZERO;
        for axis in 0..3 {
            let sc = row_times(s_row, &self.coefficients[axis]);
            out[axis] = sc.iter().zip(t_row.iter()).map(|(a, b)| a * b).sum();
        }
        out
    }

    /// Partial derivatives `(∂/∂s, ∂/∂t)` at `(s, t)`.
    pub fn tangents_at(&self, s: f64, t: f64) -> (Vector3, Vector3) {
        let ds = self.combine(power_derivative(s), power(t));
        let dt = self.combine(power(s), power_derivative(t));
        (ds, dt)
    }
}

fn power(x: f64) -> [f64; 4] {
    [x * x * x, x * x, x, 1.0]
}

fn power_derivative(x: f64) -> [f64; 4] {
    [3.0 * x * x, 2.0 * x, 1.0, 0.0]
}

impl Surface for BicubicPatch {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.combine(power(u), power(v))
    }

    fn normal_at(&self, u: f64, v: f64) -> Vector3 {
        let (ds, dt) = self.tangents_at(u, v);
        unit_or_degenerate(ds.cross(dt), Tolerance::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfg_math::dvec3;

    fn bilinear_like() -> ControlGrid {
        let mut g = [[Point3::ZERO; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                g[i][j] = dvec3(j as f64, i as f64, 0.0);
            }
        }
        g
    }

    #[test]
    fn test_bezier_corners() {
        let patch = BicubicPatch::new(Basis::Bezier, bilinear_like());
        assert!((patch.point_at(0.0, 0.0) - dvec3(0.0, 0.0, 0.0)).length() < 1e-10);
        assert!((patch.point_at(1.0, 0.0) - dvec3(0.0, 3.0, 0.0)).length() < 1e-10);
        assert!((patch.point_at(0.0, 1.0) - dvec3(3.0, 0.0, 0.0)).length() < 1e-10);
        assert!((patch.point_at(1.0, 1.0) - dvec3(3.0, 3.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_bezier_center() {
        let patch = BicubicPatch::new(Basis::Bezier, bilinear_like());
        assert!((patch.point_at(0.5, 0.5) - dvec3(1.5, 1.5, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_flat_normal() {
        let patch = BicubicPatch::new(Basis::BSpline, bilinear_like());
        let n = patch.normal_at(0.3, 0.7);
        assert!(
            (n - Vector3::Z).length() < 1e-10 || (n + Vector3::Z).length() < 1e-10,
            "Normal of flat surface should be +/-Z, got {:?}",
            n
        );
    }

    #[test]
    fn test_tangents_of_linear_grid() {
        let patch = BicubicPatch::new(Basis::Bezier, bilinear_like());
        let (ds, dt) = patch.tangents_at(0.25, 0.75);
        assert!((ds - dvec3(0.0, 3.0, 0.0)).length() < 1e-10);
        assert!((dt - dvec3(3.0, 0.0, 0.0)).length() < 1e-10);
    }
}
