//! Wavefront OBJ export of a drawing pass.
//!
//! Surfaces, polygons and solid primitives collect into one `TriangleMesh`;
//! connected nodes become `l` polylines. Colours are not exported.

use std::io::Write;

use log::debug;
use pfg_core::Result;
use pfg_math::{Frame, Point3, Vector3};
use pfg_mesh::{write_obj, TriangleMesh};
use pfg_surface::{Patch, SurfaceLibrary};

use crate::config::RenderConfig;
use crate::connector::NodeConnector;
use crate::dispatch::{DrawDispatcher, TmeshVertex};
use crate::primitives::{box_faces, circle_points, sphere_triangles};
use crate::tmesh::{draw_grid_tmesh, draw_surface_tmesh};
use crate::turtle::Turtle;

pub struct ObjRoutines<W: Write> {
    out: W,
    name: String,
    mesh: TriangleMesh,
    lines: Vec<Vec<Point3>>,
    connector: NodeConnector,
    strip: Vec<u32>,
}

impl<W: Write> ObjRoutines<W> {
    pub fn new(out: W, name: impl Into<String>) -> Self {
        Self {
            out,
            name: name.into(),
            mesh: TriangleMesh::default(),
            lines: Vec::new(),
            connector: NodeConnector::default(),
            strip: Vec::new(),
        }
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// Polylines recorded from connected nodes.
    pub fn lines(&self) -> &[Vec<Point3>] {
        &self.lines
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn polygon(&mut self, points: &[Point3]) {
        if let Err(e) = self.mesh.push_polygon(points) {
            debug!("{}: polygon skipped: {e}", self.name);
        }
    }

    fn write_lines(&mut self) -> Result<()> {
        let mut next = self.mesh.vertex_count() + 1;
        if !self.lines.is_empty() {
            writeln!(self.out, "g {}_lines", self.name)?;
        }
        for line in &self.lines {
            for p in line {
                writeln!(self.out, "v {} {} {}", p.x, p.y, p.z)?;
            }
            write!(self.out, "l")?;
            for i in next..next + line.len() {
                write!(self.out, " {i}")?;
            }
            writeln!(self.out)?;
            next += line.len();
        }
        Ok(())
    }
}

impl<W: Write> DrawDispatcher for ObjRoutines<W> {
    fn setup(&mut self, _cfg: &RenderConfig) -> Result<()> {
        self.mesh = TriangleMesh::default();
        self.lines.clear();
        self.strip.clear();
        self.connector.reset();
        Ok(())
    }

    fn start_node(&mut self, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.connector.start_node();
        let continues = self.lines.last().and_then(|l| l.last()) == Some(&turtle.position);
        if !continues {
            self.lines.push(vec![turtle.position]);
        }
        Ok(())
    }

    fn end_node(&mut self, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        if let Some(line) = self.lines.last_mut() {
            line.push(turtle.position);
        }
        self.connector.end_node();
        Ok(())
    }

    fn start_branch(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        Ok(())
    }

    fn end_branch(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        Ok(())
    }

    fn start_polygon(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        Ok(())
    }

    fn end_polygon(&mut self, vertices: &[Point3], _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.polygon(vertices);
        Ok(())
    }

    fn set_colour(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.connector.request_colour();
        Ok(())
    }

    fn set_line_width(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.connector.request_line_width();
        Ok(())
    }

    fn circle_2d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()> {
        let camera = cfg.view.camera();
        let right = camera.right();
        let up = right.cross(camera.forward());
        let pts = circle_points(turtle.position, right, up, diameter * 0.5, cfg.draw.circle_segments);
        self.polygon(&pts);
        Ok(())
    }

    fn circle_3d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()> {
        let pts = circle_points(turtle.position, turtle.left, turtle.up, diameter * 0.5, cfg.draw.circle_segments);
        self.polygon(&pts);
        Ok(())
    }

    fn circle_banded(&mut self, turtle: &Turtle, diameter: f64, band: f64, cfg: &RenderConfig) -> Result<()> {
        let outer_r = diameter * 0.5;
        let inner_r = (outer_r - band).max(0.0);
        let n = cfg.draw.circle_segments;
        let outer = circle_points(turtle.position, turtle.left, turtle.up, outer_r, n);
        let inner = circle_points(turtle.position, turtle.left, turtle.up, inner_r, n);
        let mut strip = Vec::with_capacity(2 * (outer.len() + 1));
        for k in (0..=outer.len()).map(|i| i % outer.len()) {
            strip.push(self.mesh.push_vertex(outer[k], turtle.heading, None));
            strip.push(self.mesh.push_vertex(inner[k], turtle.heading, None));
        }
        self.mesh.push_strip(&strip);
        Ok(())
    }

    fn sphere(&mut self, turtle: &Turtle, radius: f64, cfg: &RenderConfig) -> Result<()> {
        for tri in sphere_triangles(turtle.position, radius, cfg.draw.circle_segments) {
            let [a, b, c] = tri.map(|(p, n)| self.mesh.push_vertex(p, n, None));
            self.mesh.push_triangle(a, b, c);
        }
        Ok(())
    }

    fn blackbox(&mut self, turtle: &Turtle, size: f64, _cfg: &RenderConfig) -> Result<()> {
        for (corners, _) in box_faces(turtle, size) {
            self.polygon(&corners);
        }
        Ok(())
    }

    fn predef_surface(
        &mut self,
        library: &mut SurfaceLibrary,
        id: u8,
        scale: f64,
        texture: Option<u32>,
        turtle: &Turtle,
        cfg: &RenderConfig,
    ) -> Result<()> {
        draw_surface_tmesh(self, library, id, &turtle.frame(scale), texture, cfg)
    }

    fn ldefined_surface(&mut self, patch: &Patch, _turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        match patch.grid() {
            Some(grid) => draw_grid_tmesh(self, grid, &patch.colours, &Frame::identity(), false, cfg),
            None => Ok(()),
        }
    }

    fn label(&mut self, _text: &str, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        Ok(())
    }

    fn finish_up(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.connector.reset();
        write_obj(&self.mesh, &self.name, &mut self.out)?;
        self.write_lines()?;
        self.out.flush()?;
        Ok(())
    }

    fn render_triangle(&mut self, triangle: &[Point3; 3], _colour: i32, _cfg: &RenderConfig) -> Result<()> {
        let normal = (triangle[1] - triangle[0])
            .cross(triangle[2] - triangle[0])
            .try_normalize()
            .unwrap_or(Vector3::Z);
        let [a, b, c] = (*triangle).map(|p| self.mesh.push_vertex(p, normal, None));
        self.mesh.push_triangle(a, b, c);
        Ok(())
    }

    fn start_tmesh(&mut self) -> Result<()> {
        self.strip.clear();
        Ok(())
    }

    fn end_tmesh(&mut self) -> Result<()> {
        let strip = std::mem::take(&mut self.strip);
        self.mesh.push_strip(&strip);
        Ok(())
    }

    fn tmesh_vertex(&mut self, vertex: &TmeshVertex, _cfg: &RenderConfig) -> Result<()> {
        let index = self.mesh.push_vertex(vertex.position, vertex.normal, vertex.texel);
        self.strip.push(index);
        Ok(())
    }
}
