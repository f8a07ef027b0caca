pub mod mesh;
pub mod obj;

pub use mesh::TriangleMesh;
pub use obj::write_obj;
