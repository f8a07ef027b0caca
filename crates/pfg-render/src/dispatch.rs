//! The draw dispatcher: one set of drawing operations, one implementation per
//! output backend.

use pfg_core::Result;
use pfg_math::{DVec2, Point3, Vector3};
use pfg_surface::{Patch, SurfaceLibrary};

use crate::config::{RenderConfig, Rgb};
use crate::turtle::Turtle;

/// One shaded triangle-strip vertex in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TmeshVertex {
    pub position: Point3,
    /// Normal on the visible side.
    pub normal: Vector3,
    pub colour: Rgb,
    pub texel: Option<DVec2>,
}

/// Drawing operations issued by the turtle interpreter and the surface code.
///
/// Exactly one dispatcher is active during a pass; callers never ask which
/// backend they are driving. Texture and triangle-mesh operations default to
/// doing nothing for backends that have no use for them.
pub trait DrawDispatcher {
    /// Start of a pass. Backends reset their per-pass state here.
    fn setup(&mut self, cfg: &RenderConfig) -> Result<()>;

    /// A connected segment starts at the turtle position.
    fn start_node(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    /// The segment started by `start_node` ends at the turtle position.
    fn end_node(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    fn start_branch(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    fn end_branch(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    fn start_polygon(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    /// `vertices` are the world positions recorded since `start_polygon`.
    fn end_polygon(&mut self, vertices: &[Point3], turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    /// The turtle colour index changed.
    fn set_colour(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    /// The turtle line width changed.
    fn set_line_width(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    /// Disc facing the viewer.
    fn circle_2d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()>;

    /// Disc in the turtle's left/up plane.
    fn circle_3d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()>;

    /// Ring of width `band` in the turtle's left/up plane.
    fn circle_banded(&mut self, turtle: &Turtle, diameter: f64, band: f64, cfg: &RenderConfig) -> Result<()>;

    fn sphere(&mut self, turtle: &Turtle, radius: f64, cfg: &RenderConfig) -> Result<()>;

    /// Placeholder cube of edge `size` centred on the turtle.
    fn blackbox(&mut self, turtle: &Turtle, size: f64, cfg: &RenderConfig) -> Result<()>;

    /// Draw a loaded bicubic surface at the turtle, scaled by `scale`.
    /// `texture` overrides the surface's own texture for this draw.
    fn predef_surface(
        &mut self,
        library: &mut SurfaceLibrary,
        id: u8,
        scale: f64,
        texture: Option<u32>,
        turtle: &Turtle,
        cfg: &RenderConfig,
    ) -> Result<()>;

    /// Draw an evaluated dynamic patch. Its samples are already in world space.
    fn ldefined_surface(&mut self, patch: &Patch, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    fn label(&mut self, text: &str, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    /// End of a pass.
    fn finish_up(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()>;

    /// Flat triangle in world space.
    fn render_triangle(&mut self, triangle: &[Point3; 3], colour: i32, cfg: &RenderConfig) -> Result<()>;

    fn start_texture(&mut self, _texture: u32) -> Result<()> {
        Ok(())
    }

    fn end_texture(&mut self) -> Result<()> {
        Ok(())
    }

    fn start_tmesh(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_tmesh(&mut self) -> Result<()> {
        Ok(())
    }

    fn tmesh_vertex(&mut self, _vertex: &TmeshVertex, _cfg: &RenderConfig) -> Result<()> {
        Ok(())
    }
}
