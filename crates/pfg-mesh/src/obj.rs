//! Wavefront OBJ output.

use std::io::Write;

use pfg_core::Result;

use crate::TriangleMesh;

/// Write a mesh as one OBJ group. Indices are 1-based; normals and texture
/// coordinates are emitted when every vertex has one.
pub fn write_obj<W: Write>(mesh: &TriangleMesh, name: &str, out: &mut W) -> Result<()> {
    writeln!(out, "g {name}")?;
    for p in &mesh.positions {
        writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
    }
    let with_normals = mesh.normals.len() == mesh.positions.len() && !mesh.normals.is_empty();
    if with_normals {
        for n in &mesh.normals {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }
    let with_uvs = mesh.has_uvs();
    if with_uvs {
        for uv in &mesh.uvs {
            writeln!(out, "vt {} {}", uv.x, uv.y)?;
        }
    }
    for tri in mesh.indices.chunks_exact(3) {
        write!(out, "f")?;
        for &i in tri {
            let i = i + 1;
            match (with_uvs, with_normals) {
                (true, true) => write!(out, " {i}/{i}/{i}")?,
                (false, true) => write!(out, " {i}//{i}")?,
                (true, false) => write!(out, " {i}/{i}")?,
                (false, false) => write!(out, " {i}")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfg_math::dvec3;

    fn triangle() -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        mesh.push_polygon(&[dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0)])
            .unwrap();
        mesh
    }

    #[test]
    fn test_obj_text() {
        let mut buf = Vec::new();
        write_obj(&triangle(), "leaf", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "g leaf");
        assert_eq!(lines[1], "v 0 0 0");
        assert_eq!(lines.iter().filter(|l| l.starts_with("vn ")).count(), 3);
        assert_eq!(*lines.last().unwrap(), "f 1//1 2//2 3//3");
    }

    #[test]
    fn test_positions_only() {
        let mut mesh = triangle();
        mesh.normals.clear();
        let mut buf = Vec::new();
        write_obj(&mesh, "bare", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("f 1 2 3\n"));
        assert!(!text.contains("vn"));
    }
}
