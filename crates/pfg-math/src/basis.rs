//! Constant bicubic basis matrices.
//!
//! Matrices are row-major and act on the power basis `S = [s³ s² s 1]`, so a
//! patch coordinate is `x(s,t) = S · M · P · Mᵀ · Tᵀ`.

use serde::{Deserialize, Serialize};

/// Row-major 4x4 matrix.
pub type Matrix4 = [[f64; 4]; 4];

pub const IDENTITY: Matrix4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Tension used by the Cardinal basis (Catmull-Rom).
pub const CARDINAL_TENSION: f64 = 0.5;

/// Tensor-product basis of a bicubic patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Basis {
    #[default]
    Bezier,
    BSpline,
    Cardinal,
    Hermite,
}

impl Basis {
    pub const ALL: [Basis; 4] = [Basis::Bezier, Basis::BSpline, Basis::Cardinal, Basis::Hermite];

    pub fn matrix(self) -> Matrix4 {
        match self {
            Basis::Bezier => [
                [-1.0, 3.0, -3.0, 1.0],
                [3.0, -6.0, 3.0, 0.0],
                [-3.0, 3.0, 0.0, 0.0],
                [1.0, 0.0, 0.0, 0.0],
            ],
            Basis::BSpline => {
                let k = 1.0 / 6.0;
                [
                    [-k, 3.0 * k, -3.0 * k, k],
                    [3.0 * k, -6.0 * k, 3.0 * k, 0.0],
                    [-3.0 * k, 0.0, 3.0 * k, 0.0],
                    [k, 4.0 * k, k, 0.0],
                ]
            }
            Basis::Cardinal => {
                let a = CARDINAL_TENSION;
                [
                    [-a, 2.0 - a, a - 2.0, a],
                    [2.0 * a, a - 3.0, 3.0 - 2.0 * a, -a],
                    [-a, 0.0, a, 0.0],
                    [0.0, 1.0, 0.0, 0.0],
                ]
            }
            Basis::Hermite => [
                [2.0, -2.0, 1.0, 1.0],
                [-3.0, 3.0, -2.0, -1.0],
                [0.0, 0.0, 1.0, 0.0],
                [1.0, 0.0, 0.0, 0.0],
            ],
        }
    }

    /// Whether the patch passes through the four corner control points.
    ///
    /// Hermite patches interpolate `P[0][0]` and `P[1][1]` instead; the other
    /// rows hold tangents.
    pub fn interpolates_corners(self) -> bool {
        matches!(self, Basis::Bezier)
    }
}

/// Multiply two 4x4 matrices (row-major).
pub fn multiply(a: &Matrix4, b: &Matrix4) -> Matrix4 {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            result[i][j] =
                a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j] + a[i][3] * b[3][j];
        }
    }
    result
}

pub fn transpose(a: &Matrix4) -> Matrix4 {
    let mut result = [[0.0; 4]; 4];
    for (i, row) in a.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            result[j][i] = v;
        }
    }
    result
}

/// `a · b · cᵀ`, the shape of every patch convolution.
pub fn sandwich(a: &Matrix4, b: &Matrix4, c: &Matrix4) -> Matrix4 {
    multiply(&multiply(a, b), &transpose(c))
}

/// Row vector times matrix.
pub fn row_times(v: [f64; 4], m: &Matrix4) -> [f64; 4] {
    let mut out = [0.0; 4];
    for (j, o) in out.iter_mut().enumerate() {
        *o = v[0] * m[0][j] + v[1] * m[1][j] + v[2] * m[2][j] + v[3] * m[3][j];
    }
    out
}
