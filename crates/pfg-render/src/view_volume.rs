//! Bounding-volume pass: draws nothing, records the extent of everything that
//! would have been drawn so the camera can be fitted before the real pass.

use pfg_core::Result;
use pfg_math::{Aabb3, Frame, Point3, Vector3};
use pfg_surface::{Patch, SurfaceLibrary};

use crate::config::RenderConfig;
use crate::connector::NodeConnector;
use crate::dispatch::{DrawDispatcher, TmeshVertex};
use crate::primitives::{box_faces, circle_points};
use crate::tmesh::{draw_grid_tmesh, draw_surface_tmesh};
use crate::turtle::Turtle;

#[derive(Debug, Default)]
pub struct ViewVolumeRoutines {
    volume: Option<Aabb3>,
    connector: NodeConnector,
}

impl ViewVolumeRoutines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Box around every point fed since the last `setup`.
    pub fn volume(&self) -> Option<Aabb3> {
        self.volume
    }

    fn include(&mut self, p: Point3) {
        if !p.is_finite() {
            return;
        }
        match &mut self.volume {
            Some(aabb) => aabb.include(p),
            None => self.volume = Some(Aabb3::from_point(p)),
        }
    }

    fn include_all(&mut self, points: impl IntoIterator<Item = Point3>) {
        for p in points {
            self.include(p);
        }
    }
}

impl DrawDispatcher for ViewVolumeRoutines {
    fn setup(&mut self, _cfg: &RenderConfig) -> Result<()> {
        self.volume = None;
        self.connector.reset();
        Ok(())
    }

    fn start_node(&mut self, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.connector.start_node();
        self.include(turtle.position);
        Ok(())
    }

    fn end_node(&mut self, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.include(turtle.position);
        // colour and width do not change the volume
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
        self.include_all(vertices.iter().copied());
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

    fn circle_2d(&mut self, turtle: &Turtle, diameter: f64, _cfg: &RenderConfig) -> Result<()> {
        // the disc turns with the view, so take its bounding sphere
        let r = Vector3::splat(diameter * 0.5);
        self.include(turtle.position - r);
        self.include(turtle.position + r);
        Ok(())
    }

    fn circle_3d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()> {
        let pts = circle_points(turtle.position, turtle.left, turtle.up, diameter * 0.5, cfg.draw.circle_segments);
        self.include_all(pts);
        Ok(())
    }

    fn circle_banded(&mut self, turtle: &Turtle, diameter: f64, _band: f64, cfg: &RenderConfig) -> Result<()> {
        self.circle_3d(turtle, diameter, cfg)
    }

    fn sphere(&mut self, turtle: &Turtle, radius: f64, _cfg: &RenderConfig) -> Result<()> {
        let r = Vector3::splat(radius);
        self.include(turtle.position - r);
        self.include(turtle.position + r);
        Ok(())
    }

    fn blackbox(&mut self, turtle: &Turtle, size: f64, _cfg: &RenderConfig) -> Result<()> {
        for (corners, _) in box_faces(turtle, size) {
            self.include_all(corners);
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

    fn label(&mut self, _text: &str, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.include(turtle.position);
        Ok(())
    }

    fn finish_up(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.connector.reset();
        Ok(())
    }

    fn render_triangle(&mut self, triangle: &[Point3; 3], _colour: i32, _cfg: &RenderConfig) -> Result<()> {
        self.include_all(triangle.iter().copied());
        Ok(())
    }

    fn tmesh_vertex(&mut self, vertex: &TmeshVertex, _cfg: &RenderConfig) -> Result<()> {
        self.include(vertex.position);
        Ok(())
    }
}
