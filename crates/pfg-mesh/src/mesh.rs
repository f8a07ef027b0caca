use pfg_core::{PfgError, Result};
use pfg_math::{Point2, Point3, Vector3};

/// Indexed triangle mesh with per-vertex normals and optional texture coordinates.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub positions: Vec<Point3>,
    pub normals: Vec<Vector3>,
    pub indices: Vec<u32>,
    pub uvs: Vec<Point2>,
}

impl TriangleMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, position: Point3, normal: Vector3, uv: Option<Point2>) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        if let Some(uv) = uv {
            self.uvs.push(uv);
        }
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append a triangle strip given as vertex indices.
    ///
    /// Odd triangles are flipped so the whole strip keeps one winding.
    /// Triangles with a repeated index are dropped.
    pub fn push_strip(&mut self, strip: &[u32]) {
        for (k, w) in strip.windows(3).enumerate() {
            let (a, b, c) = if k % 2 == 0 { (w[0], w[1], w[2]) } else { (w[1], w[0], w[2]) };
            if a != b && b != c && a != c {
                self.push_triangle(a, b, c);
            }
        }
    }

    /// Fan-triangulate a planar polygon and append it with a flat normal.
    pub fn push_polygon(&mut self, vertices: &[Point3]) -> Result<()> {
        if vertices.len() < 3 {
            return Err(PfgError::Geometry(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        let normal = polygon_normal(vertices);
        let first = self.vertex_count() as u32;
        for &p in vertices {
            self.push_vertex(p, normal, None);
        }
        for i in 1..vertices.len() as u32 - 1 {
            self.push_triangle(first, first + i, first + i + 1);
        }
        Ok(())
    }

    /// True when every vertex carries a texture coordinate.
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty() && self.uvs.len() == self.positions.len()
    }
}

/// Newell normal of a polygon, `+Z` when degenerate.
pub fn polygon_normal(vertices: &[Point3]) -> Vector3 {
    let mut n = Vector3::ZERO;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n.try_normalize().unwrap_or(Vector3::Z)
}
