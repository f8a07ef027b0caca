//! Immediate-mode interactive backend.
//!
//! [`GlRoutines`] talks to any [`GlContext`]. [`CommandRecorder`] is a context
//! that stores the calls, used for tracing and tests.

use pfg_core::Result;
use pfg_math::{DVec2, Frame, Point3, Vector3};
use pfg_surface::{Patch, SurfaceLibrary};

use crate::config::{LineStyle, RenderConfig, Rgb};
use crate::connector::NodeConnector;
use crate::dispatch::{DrawDispatcher, TmeshVertex};
use crate::primitives::{box_faces, circle_points, cylinder_strip, sphere_triangles};
use crate::tmesh::{draw_grid_tmesh, draw_surface_tmesh};
use crate::turtle::Turtle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    LineStrip,
    Triangles,
    TriangleStrip,
    Polygon,
}

/// The subset of an immediate-mode graphics API the backend needs.
pub trait GlContext {
    fn clear(&mut self, background: Rgb);
    fn set_light(&mut self, direction: Vector3, ambient: f64);
    fn begin(&mut self, primitive: Primitive);
    fn end(&mut self);
    fn vertex(&mut self, p: Point3);
    fn normal(&mut self, n: Vector3);
    fn colour(&mut self, rgb: Rgb);
    fn tex_coord(&mut self, uv: DVec2);
    fn line_width(&mut self, width: f64);
    fn bind_texture(&mut self, texture: Option<u32>);
    fn raster_text(&mut self, at: Point3, text: &str);
    fn flush(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlCommand {
    Clear(Rgb),
    Light(Vector3, f64),
    Begin(Primitive),
    End,
    Vertex(Point3),
    Normal(Vector3),
    Colour(Rgb),
    TexCoord(DVec2),
    LineWidth(f64),
    BindTexture(Option<u32>),
    Text(Point3, String),
    Flush,
}

#[derive(Debug, Clone, Default)]
pub struct CommandRecorder {
    pub commands: Vec<GlCommand>,
}

impl CommandRecorder {
    pub fn count(&self, pred: impl Fn(&GlCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl GlContext for CommandRecorder {
    fn clear(&mut self, background: Rgb) {
        self.commands.push(GlCommand::Clear(background));
    }
    fn set_light(&mut self, direction: Vector3, ambient: f64) {
        self.commands.push(GlCommand::Light(direction, ambient));
    }
    fn begin(&mut self, primitive: Primitive) {
        self.commands.push(GlCommand::Begin(primitive));
    }
    fn end(&mut self) {
        self.commands.push(GlCommand::End);
    }
    fn vertex(&mut self, p: Point3) {
        self.commands.push(GlCommand::Vertex(p));
    }
    fn normal(&mut self, n: Vector3) {
        self.commands.push(GlCommand::Normal(n));
    }
    fn colour(&mut self, rgb: Rgb) {
        self.commands.push(GlCommand::Colour(rgb));
    }
    fn tex_coord(&mut self, uv: DVec2) {
        self.commands.push(GlCommand::TexCoord(uv));
    }
    fn line_width(&mut self, width: f64) {
        self.commands.push(GlCommand::LineWidth(width));
    }
    fn bind_texture(&mut self, texture: Option<u32>) {
        self.commands.push(GlCommand::BindTexture(texture));
    }
    fn raster_text(&mut self, at: Point3, text: &str) {
        self.commands.push(GlCommand::Text(at, text.to_string()));
    }
    fn flush(&mut self) {
        self.commands.push(GlCommand::Flush);
    }
}

/// Interactive backend. Consecutive connected nodes share one line strip in
/// pixel mode; in cylinder mode every node becomes a cylinder.
pub struct GlRoutines<C: GlContext> {
    ctx: C,
    connector: NodeConnector,
    strip_open: bool,
    strip_end: Point3,
    node_start: Point3,
}

impl<C: GlContext> GlRoutines<C> {
    pub fn new(ctx: C) -> Self {
        Self {
            ctx,
            connector: NodeConnector::default(),
            strip_open: false,
            strip_end: Point3::ZERO,
            node_start: Point3::ZERO,
        }
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn into_context(self) -> C {
        self.ctx
    }

    fn close_strip(&mut self) {
        if self.strip_open {
            self.ctx.end();
            self.strip_open = false;
        }
    }

    fn apply_colour(&mut self, turtle: &Turtle, cfg: &RenderConfig) {
        self.close_strip();
        self.ctx.colour(cfg.palette.colour(turtle.colour));
    }

    fn apply_line_width(&mut self, turtle: &Turtle) {
        self.close_strip();
        self.ctx.line_width(turtle.line_width);
    }

    fn polygon(&mut self, points: &[Point3], normal: Vector3) {
        self.ctx.begin(Primitive::Polygon);
        self.ctx.normal(normal);
        for &p in points {
            self.ctx.vertex(p);
        }
        self.ctx.end();
    }
}

impl<C: GlContext> DrawDispatcher for GlRoutines<C> {
    fn setup(&mut self, cfg: &RenderConfig) -> Result<()> {
        self.connector.reset();
        self.strip_open = false;
        self.ctx.clear(cfg.palette.colour(0));
        self.ctx.set_light(cfg.draw.light, cfg.draw.ambient);
        self.ctx.line_width(cfg.draw.line_width);
        self.ctx.colour(cfg.palette.colour(cfg.draw.initial_colour));
        Ok(())
    }

    fn start_node(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        self.connector.start_node();
        self.node_start = turtle.position;
        // a move without drawing breaks the strip
        if self.strip_open && self.strip_end != turtle.position {
            self.close_strip();
        }
        if cfg.draw.line_style == LineStyle::Pixel && !self.strip_open {
            self.ctx.begin(Primitive::LineStrip);
            self.ctx.vertex(turtle.position);
            self.strip_open = true;
        }
        Ok(())
    }

    fn end_node(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        match cfg.draw.line_style {
            LineStyle::Pixel => {
                self.ctx.vertex(turtle.position);
                self.strip_end = turtle.position;
            }
            LineStyle::Cylinder => {
                let strip = cylinder_strip(self.node_start, turtle.position, turtle.line_width * 0.5, cfg.draw.cylinder_sides);
                self.ctx.begin(Primitive::TriangleStrip);
                for (p, n) in strip {
                    self.ctx.normal(n);
                    self.ctx.vertex(p);
                }
                self.ctx.end();
            }
        }
        let deferred = self.connector.end_node();
        if deferred.colour {
            self.apply_colour(turtle, cfg);
        }
        if deferred.line_width {
            self.apply_line_width(turtle);
        }
        Ok(())
    }

    fn start_branch(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        Ok(())
    }

    fn end_branch(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        // the restored turtle may carry a different colour and width
        self.ctx.colour(cfg.palette.colour(turtle.colour));
        self.ctx.line_width(turtle.line_width);
        Ok(())
    }

    fn start_polygon(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        Ok(())
    }

    fn end_polygon(&mut self, vertices: &[Point3], _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        if vertices.len() >= 3 {
            let normal = pfg_mesh::mesh::polygon_normal(vertices);
            self.polygon(vertices, normal);
        }
        Ok(())
    }

    fn set_colour(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        if self.connector.request_colour() {
            self.apply_colour(turtle, cfg);
        }
        Ok(())
    }

    fn set_line_width(&mut self, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        if self.connector.request_line_width() {
            self.apply_line_width(turtle);
        }
        Ok(())
    }

    fn circle_2d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        let camera = cfg.view.camera();
        let right = camera.right();
        let up = right.cross(camera.forward());
        let pts = circle_points(turtle.position, right, up, diameter * 0.5, cfg.draw.circle_segments);
        self.polygon(&pts, -camera.forward());
        Ok(())
    }

    fn circle_3d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        let pts = circle_points(turtle.position, turtle.left, turtle.up, diameter * 0.5, cfg.draw.circle_segments);
        self.polygon(&pts, turtle.heading);
        Ok(())
    }

    fn circle_banded(&mut self, turtle: &Turtle, diameter: f64, band: f64, cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        let outer_r = diameter * 0.5;
        let inner_r = (outer_r - band).max(0.0);
        let outer = circle_points(turtle.position, turtle.left, turtle.up, outer_r, cfg.draw.circle_segments);
        let inner = circle_points(turtle.position, turtle.left, turtle.up, inner_r, cfg.draw.circle_segments);
        self.ctx.begin(Primitive::TriangleStrip);
        self.ctx.normal(turtle.heading);
        for i in 0..=outer.len() {
            let k = i % outer.len();
            self.ctx.vertex(outer[k]);
            self.ctx.vertex(inner[k]);
        }
        self.ctx.end();
        Ok(())
    }

    fn sphere(&mut self, turtle: &Turtle, radius: f64, cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        self.ctx.begin(Primitive::Triangles);
        for tri in sphere_triangles(turtle.position, radius, cfg.draw.circle_segments) {
            for (p, n) in tri {
                self.ctx.normal(n);
                self.ctx.vertex(p);
            }
        }
        self.ctx.end();
        Ok(())
    }

    fn blackbox(&mut self, turtle: &Turtle, size: f64, _cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        for (corners, n) in box_faces(turtle, size) {
            self.polygon(&corners, n);
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
        self.close_strip();
        draw_surface_tmesh(self, library, id, &turtle.frame(scale), texture, cfg)?;
        // strips carry their own colours
        self.ctx.colour(cfg.palette.colour(turtle.colour));
        Ok(())
    }

    fn ldefined_surface(&mut self, patch: &Patch, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        if let Some(grid) = patch.grid() {
            draw_grid_tmesh(self, grid, &patch.colours, &Frame::identity(), false, cfg)?;
        }
        self.ctx.colour(cfg.palette.colour(turtle.colour));
        Ok(())
    }

    fn label(&mut self, text: &str, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        self.ctx.raster_text(turtle.position, text);
        Ok(())
    }

    fn finish_up(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        self.connector.reset();
        self.ctx.flush();
        Ok(())
    }

    fn render_triangle(&mut self, triangle: &[Point3; 3], colour: i32, cfg: &RenderConfig) -> Result<()> {
        self.close_strip();
        let normal = (triangle[1] - triangle[0])
            .cross(triangle[2] - triangle[0])
            .try_normalize()
            .unwrap_or(Vector3::Z);
        self.ctx.colour(cfg.palette.colour(colour));
        self.ctx.begin(Primitive::Triangles);
        self.ctx.normal(normal);
        for &p in triangle {
            self.ctx.vertex(p);
        }
        self.ctx.end();
        Ok(())
    }

    fn start_texture(&mut self, texture: u32) -> Result<()> {
        self.ctx.bind_texture(Some(texture));
        Ok(())
    }

    fn end_texture(&mut self) -> Result<()> {
        self.ctx.bind_texture(None);
        Ok(())
    }

    fn start_tmesh(&mut self) -> Result<()> {
        self.close_strip();
        self.ctx.begin(Primitive::TriangleStrip);
        Ok(())
    }

    fn end_tmesh(&mut self) -> Result<()> {
        self.ctx.end();
        Ok(())
    }

    fn tmesh_vertex(&mut self, vertex: &TmeshVertex, _cfg: &RenderConfig) -> Result<()> {
        self.ctx.colour(vertex.colour);
        self.ctx.normal(vertex.normal);
        if let Some(uv) = vertex.texel {
            self.ctx.tex_coord(uv);
        }
        self.ctx.vertex(vertex.position);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfg_math::dvec3;

    fn gl() -> GlRoutines<CommandRecorder> {
        GlRoutines::new(CommandRecorder::default())
    }

    fn segment(gl: &mut GlRoutines<CommandRecorder>, turtle: &mut Turtle, cfg: &RenderConfig) {
        gl.start_node(turtle, cfg).unwrap();
        turtle.forward(1.0);
        gl.end_node(turtle, cfg).unwrap();
    }

    #[test]
    fn test_consecutive_nodes_share_strip() {
        let cfg = RenderConfig::default();
        let mut gl = gl();
        let mut t = Turtle::new(1.0, 1);
        gl.setup(&cfg).unwrap();
        for _ in 0..3 {
            segment(&mut gl, &mut t, &cfg);
        }
        gl.finish_up(&t, &cfg).unwrap();
        let rec = gl.into_context();
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::LineStrip)), 1);
        assert_eq!(rec.count(|c| matches!(c, GlCommand::Vertex(_))), 4);
        assert_eq!(rec.count(|c| *c == GlCommand::End), 1);
    }

    #[test]
    fn test_move_breaks_strip() {
        let cfg = RenderConfig::default();
        let mut gl = gl();
        let mut t = Turtle::new(1.0, 1);
        gl.setup(&cfg).unwrap();
        segment(&mut gl, &mut t, &cfg);
        t.forward(1.0);
        segment(&mut gl, &mut t, &cfg);
        let rec = gl.into_context();
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::LineStrip)), 2);
    }

    #[test]
    fn test_colour_change_breaks_strip() {
        let cfg = RenderConfig::default();
        let mut gl = gl();
        let mut t = Turtle::new(1.0, 1);
        gl.setup(&cfg).unwrap();
        segment(&mut gl, &mut t, &cfg);
        t.colour = 2;
        gl.set_colour(&t, &cfg).unwrap();
        segment(&mut gl, &mut t, &cfg);
        gl.finish_up(&t, &cfg).unwrap();
        let rec = gl.into_context();
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::LineStrip)), 2);
        assert!(rec.commands.contains(&GlCommand::Colour(cfg.palette.colour(2))));
    }

    #[test]
    fn test_colour_deferred_inside_node() {
        let cfg = RenderConfig::default();
        let mut gl = gl();
        let mut t = Turtle::new(1.0, 1);
        gl.setup(&cfg).unwrap();
        gl.start_node(&t, &cfg).unwrap();
        t.colour = 3;
        gl.set_colour(&t, &cfg).unwrap();
        assert!(!gl.context().commands.contains(&GlCommand::Colour(cfg.palette.colour(3))));
        t.forward(1.0);
        gl.end_node(&t, &cfg).unwrap();
        let rec = gl.into_context();
        let vertex_at = rec.commands.iter().rposition(|c| matches!(c, GlCommand::Vertex(_))).unwrap();
        let colour_at = rec.commands.iter().position(|c| *c == GlCommand::Colour(cfg.palette.colour(3))).unwrap();
        assert!(colour_at > vertex_at);
    }

    #[test]
    fn test_cylinder_style() {
        let mut cfg = RenderConfig::default();
        cfg.draw.line_style = LineStyle::Cylinder;
        let mut gl = gl();
        let mut t = Turtle::new(0.2, 1);
        gl.setup(&cfg).unwrap();
        segment(&mut gl, &mut t, &cfg);
        let rec = gl.into_context();
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::LineStrip)), 0);
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::TriangleStrip)), 1);
        assert_eq!(
            rec.count(|c| matches!(c, GlCommand::Vertex(_))),
            2 * (cfg.draw.cylinder_sides + 1)
        );
    }

    #[test]
    fn test_texture_binding() {
        let mut gl = gl();
        gl.start_texture(4).unwrap();
        gl.end_texture().unwrap();
        assert_eq!(
            gl.into_context().commands,
            vec![GlCommand::BindTexture(Some(4)), GlCommand::BindTexture(None)]
        );
    }

    #[test]
    fn test_render_triangle() {
        let cfg = RenderConfig::default();
        let mut gl = gl();
        gl.render_triangle(&[dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0)], 2, &cfg)
            .unwrap();
        let rec = gl.into_context();
        assert!(rec.commands.contains(&GlCommand::Normal(Vector3::Z)));
        assert_eq!(rec.count(|c| matches!(c, GlCommand::Vertex(_))), 3);
    }
}
