use crate::{Point3, Vector3};
use pfg_core::{PfgError, Result};
use serde::{Deserialize, Serialize};

/// Orthonormal heading/left/up frame with an origin and uniform scale.
///
/// Local coordinates are `(heading, left, up)` components, the convention a
/// turtle uses for its own orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point3,
    pub heading: Vector3,
    pub left: Vector3,
    pub up: Vector3,
    pub scale: f64,
}

impl Frame {
    pub fn identity() -> Self {
        Self {
            origin: Point3::ZERO,
            heading: Vector3::X,
            left: Vector3::Y,
            up: Vector3::Z,
            scale: 1.0,
        }
    }

    /// Build a frame from a heading and an approximate up vector.
    ///
    /// `up` is re-orthogonalized against `heading`; `left = up × heading`.
    pub fn from_heading_up(origin: Point3, heading: Vector3, up: Vector3, scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale.abs() < 1e-15 {
            return Err(PfgError::Geometry(format!("invalid frame scale {scale}")));
        }
        let heading = heading
            .try_normalize()
            .ok_or_else(|| PfgError::Geometry("zero-length heading vector".into()))?;
        let left = up
            .cross(heading)
            .try_normalize()
            .ok_or_else(|| PfgError::Geometry("heading and up vectors are parallel".into()))?;
        let up = heading.cross(left);
        Ok(Self {
            origin,
            heading,
            left,
            up,
            scale,
        })
    }

    /// Express a world point in local `(heading, left, up)` coordinates.
    pub fn to_local(&self, p: Point3) -> Point3 {
        let d = (p - self.origin) / self.scale;
        Point3::new(d.dot(self.heading), d.dot(self.left), d.dot(self.up))
    }

    /// Map local coordinates back into world space.
    pub fn to_world(&self, q: Point3) -> Point3 {
        self.origin + self.rotate(q) * self.scale
    }

    /// Rotate a local direction into world space (no translation or scale).
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        self.heading * v.x + self.left * v.y + self.up * v.z
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}
