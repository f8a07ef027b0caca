pub mod aabb;
pub mod basis;
pub mod transform;

pub use glam::{dvec2, dvec3, DMat4, DVec2, DVec3, DVec4};
pub use aabb::Aabb3;
pub use basis::{Basis, Matrix4};
pub use transform::Frame;

pub type Point2 = DVec2;
pub type Point3 = DVec3;
pub type Vector2 = DVec2;
pub type Vector3 = DVec3;
