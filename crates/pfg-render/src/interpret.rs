//! Turtle interpreter for bracketed module strings.
//!
//! A program is a sequence of modules, each a symbol with an optional
//! parenthesised argument list, e.g. `F(2) +(30) [ ;(3) @o(0.5) ] ~a(1.5)`.
//! Symbols of more than one character start with `@` (`@o`, `@PC`) or `~`
//! (`~a` draws the surface with identifier `a`).

use log::{debug, warn};
use pfg_core::{PfgError, Result};
use pfg_math::Point3;
use pfg_surface::{DynamicPatchSettings, SurfaceLibrary};

use crate::config::RenderConfig;
use crate::dispatch::DrawDispatcher;
use crate::tmesh::draw_grid_tmesh;
use crate::turtle::Turtle;

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub symbol: String,
    pub args: Vec<String>,
    pub line: usize,
}

impl Module {
    fn number(&self, index: usize) -> Result<Option<f64>> {
        self.args
            .get(index)
            .map(|a| {
                a.parse::<f64>()
                    .map_err(|_| PfgError::parse(self.line, format!("{}: bad argument '{a}'", self.symbol)))
            })
            .transpose()
    }

    fn required(&self, index: usize) -> Result<f64> {
        self.number(index)?
            .ok_or_else(|| PfgError::parse(self.line, format!("{}: missing argument {}", self.symbol, index + 1)))
    }

    fn texture(&self, index: usize) -> Result<u32> {
        let v = self.index(index)?;
        u32::try_from(v).map_err(|_| PfgError::parse(self.line, format!("{}: texture {v} out of range", self.symbol)))
    }

    fn index(&self, index: usize) -> Result<usize> {
        let v = self.required(index)?;
        if v < 0.0 || v.fract() != 0.0 {
            return Err(PfgError::parse(self.line, format!("{}: '{v}' is not an index", self.symbol)));
        }
        Ok(v as usize)
    }
}

/// Split a program into modules.
pub fn parse_program(text: &str) -> Result<Vec<Module>> {
    let mut modules = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1;
    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            continue;
        }
        if c.is_whitespace() {
            continue;
        }
        let mut symbol = String::from(c);
        match c {
            '@' => {
                let first = chars
                    .next()
                    .ok_or_else(|| PfgError::parse(line, "'@' at end of program"))?;
                symbol.push(first);
                if first == 'P' {
                    let second = chars
                        .next()
                        .ok_or_else(|| PfgError::parse(line, "'@P' at end of program"))?;
                    symbol.push(second);
                }
            }
            '~' => {
                let id = chars
                    .next()
                    .ok_or_else(|| PfgError::parse(line, "'~' without a surface identifier"))?;
                symbol.push(id);
            }
            _ => {}
        }
        let start_line = line;
        let mut args = Vec::new();
        if chars.peek() == Some(&'(') {
            chars.next();
            let mut raw = String::new();
            loop {
                match chars.next() {
                    Some(')') => break,
                    Some(ch) => {
                        if ch == '\n' {
                            line += 1;
                        }
                        raw.push(ch);
                    }
                    None => return Err(PfgError::parse(start_line, format!("{symbol}: unterminated argument list"))),
                }
            }
            if symbol == "@L" {
                args.push(raw);
            } else {
                args.extend(raw.split(',').map(|a| a.trim().to_string()));
            }
        }
        modules.push(Module {
            symbol,
            args,
            line: start_line,
        });
    }
    Ok(modules)
}

/// Executes modules against a dispatcher, one pass per `run`.
pub struct Interpreter<'a> {
    library: &'a mut SurfaceLibrary,
    cfg: &'a RenderConfig,
    /// Settings applied by `@PS`.
    pub dynamic: DynamicPatchSettings,
}

struct PassState {
    turtle: Turtle,
    stack: Vec<Turtle>,
    polygons: Vec<Vec<Point3>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(library: &'a mut SurfaceLibrary, cfg: &'a RenderConfig) -> Self {
        Self {
            library,
            cfg,
            dynamic: DynamicPatchSettings::default(),
        }
    }

    pub fn library(&self) -> &SurfaceLibrary {
        self.library
    }

    /// Run one full pass: `setup`, every module, `finish_up`.
    /// Returns the final turtle.
    pub fn run(&mut self, modules: &[Module], dispatcher: &mut dyn DrawDispatcher) -> Result<Turtle> {
        let cfg = self.cfg;
        dispatcher.setup(cfg)?;
        let mut state = PassState {
            turtle: Turtle::new(cfg.draw.line_width, cfg.draw.initial_colour),
            stack: Vec::new(),
            polygons: Vec::new(),
        };
        for module in modules {
            self.execute(module, &mut state, dispatcher)?;
        }
        if !state.stack.is_empty() {
            warn!("{} unclosed branches at end of program", state.stack.len());
        }
        dispatcher.finish_up(&state.turtle, cfg)?;
        Ok(state.turtle)
    }

    fn execute(&mut self, m: &Module, state: &mut PassState, d: &mut dyn DrawDispatcher) -> Result<()> {
        let cfg = self.cfg;
        let angle = || m.number(0).map(|a| a.unwrap_or(cfg.draw.angle));
        let turtle = &mut state.turtle;
        match m.symbol.as_str() {
            "F" => {
                let step = m.number(0)?.unwrap_or(cfg.draw.step);
                if state.polygons.is_empty() {
                    d.start_node(turtle, cfg)?;
                    turtle.forward(step);
                    d.end_node(turtle, cfg)?;
                } else {
                    turtle.forward(step);
                }
            }
            "f" => turtle.forward(m.number(0)?.unwrap_or(cfg.draw.step)),
            "+" => turtle.turn(angle()?),
            "-" => turtle.turn(-angle()?),
            "&" => turtle.pitch(angle()?),
            "^" => turtle.pitch(-angle()?),
            "\\" => turtle.roll(angle()?),
            "/" => turtle.roll(-angle()?),
            "|" => turtle.turn_around(),
            "[" => {
                d.start_branch(turtle, cfg)?;
                state.stack.push(*turtle);
            }
            "]" => match state.stack.pop() {
                Some(saved) => {
                    *turtle = saved;
                    d.end_branch(turtle, cfg)?;
                }
                None => warn!("line {}: ']' without a matching '['", m.line),
            },
            "{" => {
                d.start_polygon(turtle, cfg)?;
                state.polygons.push(Vec::new());
            }
            "." => match state.polygons.last_mut() {
                Some(polygon) => polygon.push(turtle.position),
                None => debug!("line {}: '.' outside a polygon", m.line),
            },
            "}" => match state.polygons.pop() {
                Some(polygon) => d.end_polygon(&polygon, turtle, cfg)?,
                None => warn!("line {}: '}}' without a matching '{{'", m.line),
            },
            ";" => {
                turtle.colour = match m.number(0)? {
                    Some(c) => c as i32,
                    None => turtle.colour + 1,
                };
                d.set_colour(turtle, cfg)?;
            }
            "," => {
                turtle.colour -= 1;
                d.set_colour(turtle, cfg)?;
            }
            "#" => {
                turtle.line_width = m.number(0)?.unwrap_or(turtle.line_width + cfg.draw.width_increment);
                d.set_line_width(turtle, cfg)?;
            }
            "!" => {
                turtle.line_width = (turtle.line_width - cfg.draw.width_increment).max(0.0);
                d.set_line_width(turtle, cfg)?;
            }
            "@o" => d.sphere(turtle, m.number(0)?.unwrap_or(turtle.line_width * 0.5), cfg)?,
            "@c" => d.circle_2d(turtle, m.number(0)?.unwrap_or(turtle.line_width), cfg)?,
            "@C" => d.circle_3d(turtle, m.number(0)?.unwrap_or(turtle.line_width), cfg)?,
            "@b" => d.circle_banded(turtle, m.required(0)?, m.required(1)?, cfg)?,
            "@B" => d.blackbox(turtle, m.number(0)?.unwrap_or(cfg.draw.step), cfg)?,
            "@L" => d.label(m.args.first().map(String::as_str).unwrap_or(""), turtle, cfg)?,
            "@PS" => {
                let mut settings = self.dynamic;
                if let Some(s) = m.number(1)? {
                    settings.s_precision = s as i64;
                }
                if let Some(t) = m.number(2)? {
                    settings.t_precision = t as i64;
                }
                self.library.surface_patch_init(m.required(0)?, settings);
            }
            "@PC" => {
                let id = m.required(0)?;
                if let Err(e) = self
                    .library
                    .surface_patch_control_point(id, m.index(1)?, m.index(2)?, turtle.position)
                {
                    warn!("line {}: {e}", m.line);
                }
            }
            "@PD" | "@PT" => self.draw_dynamic(m, turtle, d)?,
            symbol if symbol.starts_with('~') => self.draw_surface(m, turtle, d)?,
            _ => debug!("line {}: ignoring '{}'", m.line, m.symbol),
        }
        Ok(())
    }

    /// `~c(scale, texture)`. After a bicubic surface the turtle jumps to the
    /// surface's end point.
    fn draw_surface(&mut self, m: &Module, turtle: &mut Turtle, d: &mut dyn DrawDispatcher) -> Result<()> {
        let cfg = self.cfg;
        let id = match m.symbol.as_bytes() {
            [b'~', id] => *id,
            _ => return Err(PfgError::parse(m.line, format!("'{}' is not a surface identifier", m.symbol))),
        };
        let scale = m.number(0)?.unwrap_or(1.0);
        if let Some(surface) = self.library.surface(id) {
            let end_point = surface.header.end_point;
            let texture = match m.args.get(1) {
                Some(_) => Some(m.texture(1)?),
                None => None,
            };
            d.predef_surface(self.library, id, scale, texture, turtle, cfg)?;
            turtle.position = turtle.frame(scale).to_world(end_point);
            return Ok(());
        }
        if let Some(tsurface) = self.library.tsurface(id) {
            let frame = turtle.frame(scale);
            for tri in &tsurface.triangles {
                d.render_triangle(&(*tri).map(|p| frame.to_world(p)), tsurface.colour, cfg)?;
            }
            return Ok(());
        }
        warn!("line {}: surface '{}' is not loaded", m.line, id as char);
        Ok(())
    }

    fn draw_dynamic(&mut self, m: &Module, turtle: &Turtle, d: &mut dyn DrawDispatcher) -> Result<()> {
        let cfg = self.cfg;
        let id = m.required(0)?;
        match self.library.evaluate_dynamic_patch(id) {
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            // incomplete patches have been reported already
            Err(PfgError::Geometry(_)) => return Ok(()),
            Err(e) => {
                warn!("line {}: {e}", m.line);
                return Ok(());
            }
        }
        let pid = self.library.find_surface_patch(id);
        let Some(patch) = self.library.patch(pid) else {
            return Ok(());
        };
        if m.symbol == "@PD" {
            d.ldefined_surface(patch, turtle, cfg)
        } else {
            match patch.grid() {
                Some(grid) => draw_grid_tmesh(d, grid, &patch.colours, &pfg_math::Frame::identity(), false, cfg),
                None => Ok(()),
            }
        }
    }
}

/// Parse and run `program` in one pass.
pub fn interpret(
    program: &str,
    dispatcher: &mut dyn DrawDispatcher,
    library: &mut SurfaceLibrary,
    cfg: &RenderConfig,
) -> Result<Turtle> {
    let modules = parse_program(program)?;
    Interpreter::new(library, cfg).run(&modules, dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{CommandRecorder, GlCommand, GlRoutines, Primitive};
    use crate::view_volume::ViewVolumeRoutines;
    use approx::assert_relative_eq;
    use pfg_math::dvec3;
    use pfg_surface::TSurface;

    #[test]
    fn test_parse_modules() {
        let m = parse_program("F(2.5) +\n[ @PC(1, 0,3) ] ~a(0.5) @L(hello, world)").unwrap();
        let symbols: Vec<&str> = m.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(symbols, ["F", "+", "[", "@PC", "]", "~a", "@L"]);
        assert_eq!(m[0].args, ["2.5"]);
        assert_eq!(m[3].args, ["1", "0", "3"]);
        assert_eq!(m[3].line, 2);
        assert_eq!(m[6].args, ["hello, world"]);
    }

    #[test]
    fn test_parse_unterminated() {
        let err = parse_program("F\nF(1").unwrap_err();
        assert!(matches!(err, PfgError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_bad_number_is_parse_error() {
        let mut lib = SurfaceLibrary::new();
        let mut vv = ViewVolumeRoutines::new();
        let err = interpret("F(x)", &mut vv, &mut lib, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, PfgError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_branches_restore_turtle() {
        let mut lib = SurfaceLibrary::new();
        let mut vv = ViewVolumeRoutines::new();
        let cfg = RenderConfig::default();
        let t = interpret("F [ +(90) F(3) ] F", &mut vv, &mut lib, &cfg).unwrap();
        assert!(t.position.abs_diff_eq(dvec3(0.0, 2.0, 0.0), 1e-12));
        let aabb = vv.volume().unwrap();
        // the branch turned towards -X
        assert_relative_eq!(aabb.min.x, -3.0, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_move_does_not_draw() {
        let mut lib = SurfaceLibrary::new();
        let mut vv = ViewVolumeRoutines::new();
        interpret("f(5) F", &mut vv, &mut lib, &RenderConfig::default()).unwrap();
        let aabb = vv.volume().unwrap();
        assert_relative_eq!(aabb.min.y, 5.0);
        assert_relative_eq!(aabb.max.y, 6.0);
    }

    #[test]
    fn test_polygon_vertices() {
        let mut lib = SurfaceLibrary::new();
        let mut gl = GlRoutines::new(CommandRecorder::default());
        interpret("{ . F . +(90) F . }", &mut gl, &mut lib, &RenderConfig::default()).unwrap();
        let rec = gl.into_context();
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::Polygon)), 1);
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::LineStrip)), 0);
        assert_eq!(rec.count(|c| matches!(c, GlCommand::Vertex(_))), 3);
    }

    #[test]
    fn test_colour_and_width() {
        let mut lib = SurfaceLibrary::new();
        let mut gl = GlRoutines::new(CommandRecorder::default());
        let cfg = RenderConfig::default();
        let t = interpret("; ; , #(3) ! ;(7)", &mut gl, &mut lib, &cfg).unwrap();
        assert_eq!(t.colour, 7);
        assert_relative_eq!(t.line_width, 3.0 - cfg.draw.width_increment);
        let rec = gl.into_context();
        assert!(rec.commands.contains(&GlCommand::Colour(cfg.palette.colour(7))));
        assert!(rec.commands.contains(&GlCommand::LineWidth(3.0)));
    }

    #[test]
    fn test_dynamic_patch_drawn_when_complete() {
        let mut lib = SurfaceLibrary::new();
        let mut program = String::from("@PS(2.5)");
        for row in 0..4 {
            program.push_str(" [");
            for col in 0..4 {
                program.push_str(&format!(" @PC(2.5,{row},{col}) F"));
            }
            program.push_str(" ] +(90) F -(90)");
        }
        program.push_str(" @PD(2.5)");
        let mut gl = GlRoutines::new(CommandRecorder::default());
        interpret(&program, &mut gl, &mut lib, &RenderConfig::default()).unwrap();
        let rec = gl.into_context();
        let strips = rec.count(|c| *c == GlCommand::Begin(Primitive::TriangleStrip));
        assert_eq!(strips, DynamicPatchSettings::default().s_precision as usize);
    }

    #[test]
    fn test_incomplete_dynamic_patch_skipped() {
        let mut lib = SurfaceLibrary::new();
        let mut gl = GlRoutines::new(CommandRecorder::default());
        interpret("@PS(1) @PC(1,0,0) @PD(1) @PT(1)", &mut gl, &mut lib, &RenderConfig::default()).unwrap();
        let rec = gl.into_context();
        assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::TriangleStrip)), 0);
    }

    #[test]
    fn test_control_point_out_of_range_is_not_fatal() {
        let mut lib = SurfaceLibrary::new();
        let mut vv = ViewVolumeRoutines::new();
        assert!(interpret("@PS(1) @PC(1,4,0)", &mut vv, &mut lib, &RenderConfig::default()).is_ok());
    }

    #[test]
    fn test_tsurface_rendered_as_triangles() {
        let mut lib = SurfaceLibrary::new();
        lib.add_tsurface(TSurface {
            id: b't',
            triangles: vec![[dvec3(0.0, 0.0, 0.0), dvec3(1.0, 0.0, 0.0), dvec3(0.0, 1.0, 0.0)]],
            colour: 4,
        })
        .unwrap();
        let mut vv = ViewVolumeRoutines::new();
        interpret("f(2) ~t(2)", &mut vv, &mut lib, &RenderConfig::default()).unwrap();
        let aabb = vv.volume().unwrap();
        // the turtle frame maps local x to heading (+Y), y to left (-X)
        assert_relative_eq!(aabb.max.y, 4.0, epsilon = 1e-12);
        assert_relative_eq!(aabb.min.x, -2.0, epsilon = 1e-12);
    }

    /// Surface 'S': contact at the origin, heading +Y, size 3, end point three
    /// units along the heading.
    fn headed_library() -> SurfaceLibrary {
        let mut src = String::from(
            "0 3 0 3 0 0\n\
             CONTACT POINT X: 0 Y: 0 Z: 0\n\
             END POINT X: 0 Y: 3 Z: 0\n\
             HEADING X: 0 Y: 1 Z: 0\n\
             UP X: 0 Y: 0 Z: 1\n\
             SIZE: 3\n\
             p\n\
             TOP COLOR: 1 DIFFUSE: 1 BOTTOM COLOR: 2 DIFFUSE: 1\n\
             AL: ~ A: ~ AR: ~\n\
             L: ~ R: ~\n\
             BL: ~ B: ~ BR: ~\n",
        );
        for i in 0..4 {
            for j in 0..4 {
                src.push_str(&format!("{j} {i} 0\n"));
            }
        }
        let mut lib = SurfaceLibrary::new();
        assert!(pfg_io::read_surface(&src, b'S', &mut lib).unwrap().is_loaded());
        lib
    }

    #[test]
    fn test_surface_moves_turtle_to_end_point() {
        let mut lib = headed_library();
        assert!(lib
            .surface(b'S')
            .unwrap()
            .header
            .end_point
            .abs_diff_eq(dvec3(1.0, 0.0, 0.0), 1e-12));
        let mut vv = ViewVolumeRoutines::new();
        let t = interpret("~S(2)", &mut vv, &mut lib, &RenderConfig::default()).unwrap();
        assert!(t.position.abs_diff_eq(dvec3(0.0, 2.0, 0.0), 1e-12));

        let t = interpret("f ~S(2) F", &mut vv, &mut lib, &RenderConfig::default()).unwrap();
        assert!(t.position.abs_diff_eq(dvec3(0.0, 4.0, 0.0), 1e-12));
        // the node after the surface starts at the end point
        assert_relative_eq!(vv.volume().unwrap().max.y, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_surface_texture_argument() {
        let mut lib = headed_library();
        let mut gl = GlRoutines::new(CommandRecorder::default());
        interpret("~S(1, 4)", &mut gl, &mut lib, &RenderConfig::default()).unwrap();
        let rec = gl.into_context();
        assert!(rec.commands.contains(&GlCommand::BindTexture(Some(4))));
        assert!(rec.count(|c| matches!(c, GlCommand::TexCoord(_))) > 0);

        let mut vv = ViewVolumeRoutines::new();
        let err = interpret("~S(1, -4)", &mut vv, &mut lib, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, PfgError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_unknown_surface_warns_only() {
        let mut lib = SurfaceLibrary::new();
        let mut vv = ViewVolumeRoutines::new();
        interpret("~z", &mut vv, &mut lib, &RenderConfig::default()).unwrap();
        assert!(vv.volume().is_none());
    }
}
