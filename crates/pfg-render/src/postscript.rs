//! PostScript Level 2 output.
//!
//! Every world point goes through the camera view-projection and is mapped to
//! device space `[0, width] x [0, height]`. Points that project behind the eye
//! or to non-finite coordinates are dropped one at a time: a line is broken at
//! the dropped point and a filled shape touching it is left out.

use std::io::Write;

use log::debug;
use pfg_core::Result;
use pfg_math::{Frame, Point3};
use pfg_surface::{Patch, SurfaceLibrary};

use crate::camera::Camera;
use crate::config::{RenderConfig, Rgb};
use crate::connector::NodeConnector;
use crate::dispatch::{DrawDispatcher, TmeshVertex};
use crate::primitives::{box_faces, circle_points};
use crate::tmesh::{draw_grid_tmesh, draw_surface_tmesh};
use crate::turtle::Turtle;

type DevicePoint = (f64, f64);

pub struct PostscriptRoutines<W: Write> {
    out: W,
    camera: Camera,
    size: (f64, f64),
    connector: NodeConnector,
    /// Open polyline of connected nodes; `None` marks a dropped point.
    path: Vec<Option<DevicePoint>>,
    path_end: Option<Point3>,
    colour: Rgb,
    strip: Vec<(Option<DevicePoint>, Rgb)>,
    skipped: usize,
}

impl<W: Write> PostscriptRoutines<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            camera: Camera::default(),
            size: (1.0, 1.0),
            connector: NodeConnector::default(),
            path: Vec::new(),
            path_end: None,
            colour: [0.0; 3],
            strip: Vec::new(),
            skipped: 0,
        }
    }

    /// Points dropped during the current pass.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn to_device(&mut self, p: Point3) -> Option<DevicePoint> {
        let projected = self.camera.project(p).map(|ndc| {
            (
                (ndc.x + 1.0) * 0.5 * self.size.0,
                (ndc.y + 1.0) * 0.5 * self.size.1,
            )
        });
        if projected.is_none() {
            self.skipped += 1;
        }
        projected
    }

    fn flush_path(&mut self) -> Result<()> {
        let path = std::mem::take(&mut self.path);
        self.path_end = None;
        for run in path.split(|p| p.is_none()) {
            if run.len() < 2 {
                continue;
            }
            let mut points = run.iter().flatten();
            if let Some((x, y)) = points.next() {
                writeln!(self.out, "newpath {x:.2} {y:.2} moveto")?;
            }
            for (x, y) in points {
                writeln!(self.out, "{x:.2} {y:.2} lineto")?;
            }
            writeln!(self.out, "stroke")?;
        }
        Ok(())
    }

    fn write_colour(&mut self, rgb: Rgb) -> Result<()> {
        writeln!(self.out, "{:.3} {:.3} {:.3} setrgbcolor", rgb[0], rgb[1], rgb[2])?;
        Ok(())
    }

    fn apply_colour(&mut self, rgb: Rgb) -> Result<()> {
        self.flush_path()?;
        self.colour = rgb;
        self.write_colour(rgb)
    }

    fn apply_line_width(&mut self, width: f64) -> Result<()> {
        self.flush_path()?;
        writeln!(self.out, "{width:.3} setlinewidth")?;
        Ok(())
    }

    /// Fill a closed shape; left out entirely if any corner was dropped.
    fn fill(&mut self, points: &[Point3], op: &str) -> Result<()> {
        let mut device = Vec::with_capacity(points.len());
        for &p in points {
            match self.to_device(p) {
                Some(d) => device.push(d),
                None => return Ok(()),
            }
        }
        self.fill_device(&device, op)
    }

    fn fill_device(&mut self, device: &[DevicePoint], op: &str) -> Result<()> {
        if device.is_empty() {
            return Ok(());
        }
        write!(self.out, "newpath")?;
        self.subpath(device)?;
        writeln!(self.out, " {op}")?;
        Ok(())
    }

    fn subpath(&mut self, device: &[DevicePoint]) -> Result<()> {
        for (i, (x, y)) in device.iter().enumerate() {
            let op = if i == 0 { "moveto" } else { "lineto" };
            write!(self.out, " {x:.2} {y:.2} {op}")?;
        }
        write!(self.out, " closepath")?;
        Ok(())
    }

    /// Screen-space radius of a world-space radius at `center`.
    fn device_radius(&mut self, center: Point3, radius: f64) -> Option<(DevicePoint, f64)> {
        let c = self.to_device(center)?;
        let edge = self.to_device(center + self.camera.right() * radius)?;
        Some((c, (edge.0 - c.0).hypot(edge.1 - c.1)))
    }
}

fn escape(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            '(' | ')' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}

impl<W: Write> DrawDispatcher for PostscriptRoutines<W> {
    fn setup(&mut self, cfg: &RenderConfig) -> Result<()> {
        self.camera = cfg.view.camera();
        self.size = cfg.view.resolution();
        self.connector.reset();
        self.path.clear();
        self.path_end = None;
        self.strip.clear();
        self.skipped = 0;
        writeln!(self.out, "%!PS-Adobe-3.0")?;
        writeln!(self.out, "%%Creator: pfg")?;
        writeln!(self.out, "%%BoundingBox: 0 0 {} {}", cfg.view.width, cfg.view.height)?;
        writeln!(self.out, "%%LanguageLevel: 2")?;
        writeln!(self.out, "%%Pages: 1")?;
        writeln!(self.out, "%%EndComments")?;
        writeln!(self.out, "%%Page: 1 1")?;
        writeln!(self.out, "/Helvetica findfont 10 scalefont setfont")?;
        writeln!(self.out, "1 setlinejoin 1 setlinecap")?;
        let background = cfg.palette.colour(0);
        self.write_colour(background)?;
        writeln!(self.out, "0 0 {} {} rectfill", cfg.view.width, cfg.view.height)?;
        writeln!(self.out, "{:.3} setlinewidth", cfg.draw.line_width)?;
        self.colour = cfg.palette.colour(cfg.draw.initial_colour);
        self.write_colour(self.colour)
    }

    fn start_node(&mut self, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.connector.start_node();
        if self.path_end != Some(turtle.position) {
            self.flush_path()?;
        }
        if self.path.is_empty() {
            let p = self.to_device(turtle.position);
            self.path.push(p);
        }
        Ok(())
    }

    fn end_node(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        let p = self.to_device(turtle.position);
        self.path.push(p);
        self.path_end = Some(turtle.position);
        let deferred = self.connector.end_node();
        if deferred.colour {
            self.apply_colour(cfg.palette.colour(turtle.colour))?;
        }
        if deferred.line_width {
            self.apply_line_width(turtle.line_width)?;
        }
        Ok(())
    }

    fn start_branch(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.flush_path()
    }

    fn end_branch(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        self.apply_colour(cfg.palette.colour(turtle.colour))?;
        self.apply_line_width(turtle.line_width)
    }

    fn start_polygon(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.flush_path()
    }

    fn end_polygon(&mut self, vertices: &[Point3], _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        if vertices.len() >= 3 {
            self.fill(vertices, "fill")?;
        }
        Ok(())
    }

    fn set_colour(&mut self, turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        if self.connector.request_colour() {
            self.apply_colour(cfg.palette.colour(turtle.colour))?;
        }
        Ok(())
    }

    fn set_line_width(&mut self, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        if self.connector.request_line_width() {
            self.apply_line_width(turtle.line_width)?;
        }
        Ok(())
    }

    fn circle_2d(&mut self, turtle: &Turtle, diameter: f64, _cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        if let Some(((x, y), r)) = self.device_radius(turtle.position, diameter * 0.5) {
            writeln!(self.out, "newpath {x:.2} {y:.2} {r:.2} 0 360 arc fill")?;
        }
        Ok(())
    }

    fn circle_3d(&mut self, turtle: &Turtle, diameter: f64, cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        let pts = circle_points(turtle.position, turtle.left, turtle.up, diameter * 0.5, cfg.draw.circle_segments);
        self.fill(&pts, "fill")
    }

    fn circle_banded(&mut self, turtle: &Turtle, diameter: f64, band: f64, cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        let outer_r = diameter * 0.5;
        let inner_r = (outer_r - band).max(0.0);
        let n = cfg.draw.circle_segments;
        let mut ring = circle_points(turtle.position, turtle.left, turtle.up, outer_r, n);
        let mut inner = circle_points(turtle.position, turtle.left, turtle.up, inner_r, n);
        inner.reverse();
        let outer_len = ring.len();
        ring.extend(inner);
        let mut device = Vec::with_capacity(ring.len());
        for p in ring {
            match self.to_device(p) {
                Some(d) => device.push(d),
                None => return Ok(()),
            }
        }
        let (outer, inner) = device.split_at(outer_len);
        // even-odd fill of the two rings leaves the hole open
        write!(self.out, "newpath")?;
        self.subpath(outer)?;
        self.subpath(inner)?;
        writeln!(self.out, " eofill")?;
        Ok(())
    }

    fn sphere(&mut self, turtle: &Turtle, radius: f64, _cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        if let Some(((x, y), r)) = self.device_radius(turtle.position, radius) {
            writeln!(self.out, "newpath {x:.2} {y:.2} {r:.2} 0 360 arc fill")?;
        }
        Ok(())
    }

    fn blackbox(&mut self, turtle: &Turtle, size: f64, _cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        for (corners, n) in box_faces(turtle, size) {
            let centre = corners.iter().copied().sum::<Point3>() / 4.0;
            if self.camera.is_facing(centre, n) {
                self.fill(&corners, "fill")?;
            }
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
        self.flush_path()?;
        draw_surface_tmesh(self, library, id, &turtle.frame(scale), texture, cfg)?;
        self.write_colour(self.colour)
    }

    fn ldefined_surface(&mut self, patch: &Patch, _turtle: &Turtle, cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        if let Some(grid) = patch.grid() {
            draw_grid_tmesh(self, grid, &patch.colours, &Frame::identity(), false, cfg)?;
        }
        self.write_colour(self.colour)
    }

    fn label(&mut self, text: &str, turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        if let Some((x, y)) = self.to_device(turtle.position) {
            writeln!(self.out, "{x:.2} {y:.2} moveto ({}) show", escape(text))?;
        }
        Ok(())
    }

    fn finish_up(&mut self, _turtle: &Turtle, _cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        self.connector.reset();
        writeln!(self.out, "showpage")?;
        writeln!(self.out, "%%Trailer")?;
        writeln!(self.out, "%%EOF")?;
        self.out.flush()?;
        if self.skipped > 0 {
            debug!("PostScript: {} points outside the view dropped", self.skipped);
        }
        Ok(())
    }

    fn render_triangle(&mut self, triangle: &[Point3; 3], colour: i32, cfg: &RenderConfig) -> Result<()> {
        self.flush_path()?;
        self.write_colour(cfg.palette.colour(colour))?;
        self.fill(triangle, "fill")?;
        self.write_colour(self.colour)
    }

    fn start_tmesh(&mut self) -> Result<()> {
        self.flush_path()?;
        self.strip.clear();
        Ok(())
    }

    fn end_tmesh(&mut self) -> Result<()> {
        let strip = std::mem::take(&mut self.strip);
        for tri in strip.windows(3) {
            let (Some(a), Some(b), Some(c)) = (tri[0].0, tri[1].0, tri[2].0) else {
                continue;
            };
            let mut rgb = [0.0; 3];
            for (_, colour) in tri {
                for (acc, c) in rgb.iter_mut().zip(colour) {
                    *acc += c / 3.0;
                }
            }
            self.write_colour(rgb)?;
            self.fill_device(&[a, b, c], "fill")?;
        }
        Ok(())
    }

    fn tmesh_vertex(&mut self, vertex: &TmeshVertex, _cfg: &RenderConfig) -> Result<()> {
        let p = self.to_device(vertex.position);
        self.strip.push((p, vertex.colour));
        Ok(())
    }
}
