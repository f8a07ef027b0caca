/// Numeric thresholds used by patch evaluation and the render backends.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Tolerance {
    /// Cross products shorter than this are treated as degenerate normals.
    pub zero_length: f64,
    /// Relative tolerance when comparing evaluated samples.
    pub relative: f64,
    /// Smallest homogeneous `w` accepted by a perspective projection.
    pub min_w: f64,
}

impl Tolerance {
    pub const DEFAULT_ZERO_LENGTH: f64 = 1e-12;
    pub const DEFAULT_RELATIVE: f64 = 1e-4;
    pub const DEFAULT_MIN_W: f64 = 1e-9;

    pub fn new(zero_length: f64, relative: f64, min_w: f64) -> Self {
        Self {
            zero_length,
            relative,
            min_w,
        }
    }

    pub fn default_precision() -> Self {
        Self {
            zero_length: Self::DEFAULT_ZERO_LENGTH,
            relative: Self::DEFAULT_RELATIVE,
            min_w: Self::DEFAULT_MIN_W,
        }
    }

    /// Check if a length is degenerate
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.zero_length
    }

    /// Relative comparison, absolute near zero.
    pub fn relative_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.relative * a.abs().max(b.abs()).max(1.0)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::default_precision()
    }
}
