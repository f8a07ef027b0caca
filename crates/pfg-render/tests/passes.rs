use std::fmt::Write as _;

use pfg_io::read_surface;
use pfg_render::{
    interpret, CommandRecorder, GlCommand, GlRoutines, ObjRoutines, PostscriptRoutines, Primitive, RenderConfig,
    ViewVolumeRoutines,
};
use pfg_surface::SurfaceLibrary;

const PROGRAM: &str = "F ~a(1) F";

/// One flat 3x3 patch in the z = 0 plane, evaluated 4x4.
fn library() -> SurfaceLibrary {
    let mut src = String::from(
        "0 3 0 3 0 0\n\
         PRECISION S: 4 T: 4\n\
         CONTACT POINT X: 0 Y: 0 Z: 0\n\
         END POINT X: 0 Y: 0 Z: 1\n\
         HEADING X: 1 Y: 0 Z: 0\n\
         UP X: 0 Y: 0 Z: 1\n\
         SIZE: 1\n\
         leaf\n\
         TOP COLOR: 3 DIFFUSE: 0.8 BOTTOM COLOR: 9 DIFFUSE: 0.6\n\
         AL: ~ A: ~ AR: ~\n\
         L: ~ R: ~\n\
         BL: ~ B: ~ BR: ~\n",
    );
    for i in 0..4 {
        for j in 0..4 {
            writeln!(src, "{j} {i} 0").unwrap();
        }
    }
    let mut lib = SurfaceLibrary::new();
    assert!(read_surface(&src, b'a', &mut lib).unwrap().is_loaded());
    lib
}

fn fitted_config(lib: &mut SurfaceLibrary) -> RenderConfig {
    let mut cfg = RenderConfig::default();
    let mut vv = ViewVolumeRoutines::new();
    interpret(PROGRAM, &mut vv, lib, &cfg).unwrap();
    cfg.view.fit_to(&vv.volume().unwrap());
    cfg
}

#[test]
fn view_volume_covers_surface_and_lines() {
    let mut lib = library();
    let mut vv = ViewVolumeRoutines::new();
    interpret(PROGRAM, &mut vv, &mut lib, &RenderConfig::default()).unwrap();
    let aabb = vv.volume().unwrap();
    // surface x runs along the turtle heading (+Y), surface y along left (-X)
    assert!((aabb.min.x + 3.0).abs() < 1e-9);
    assert!((aabb.max.y - 4.0).abs() < 1e-9);
    assert!(aabb.min.y.abs() < 1e-9);
    // the second node starts at the surface end point, one unit up
    assert!((aabb.max.z - 1.0).abs() < 1e-9);
}

#[test]
fn surface_leaves_turtle_at_end_point() {
    let mut lib = library();
    let mut vv = ViewVolumeRoutines::new();
    let turtle = interpret(PROGRAM, &mut vv, &mut lib, &RenderConfig::default()).unwrap();
    assert!(turtle.position.abs_diff_eq(pfg_math::dvec3(0.0, 2.0, 1.0), 1e-12));
}

#[test]
fn gl_pass_emits_one_strip_per_row() {
    let mut lib = library();
    let cfg = RenderConfig::default();
    let mut gl = GlRoutines::new(CommandRecorder::default());
    interpret(PROGRAM, &mut gl, &mut lib, &cfg).unwrap();
    let rec = gl.into_context();
    assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::TriangleStrip)), 4);
    // the surface interrupts the line
    assert_eq!(rec.count(|c| *c == GlCommand::Begin(Primitive::LineStrip)), 2);
    assert_eq!(rec.commands.last(), Some(&GlCommand::Flush));
}

#[test]
fn postscript_pass_fills_every_triangle() {
    let mut lib = library();
    let cfg = fitted_config(&mut lib);
    let mut ps = PostscriptRoutines::new(Vec::new());
    interpret(PROGRAM, &mut ps, &mut lib, &cfg).unwrap();
    assert_eq!(ps.skipped(), 0);
    let text = String::from_utf8(ps.into_inner()).unwrap();
    assert!(text.contains(&format!("%%BoundingBox: 0 0 {} {}", cfg.view.width, cfg.view.height)));
    assert_eq!(text.matches("closepath fill").count(), 4 * 4 * 2);
    assert_eq!(text.matches("stroke").count(), 2);
}

#[test]
fn obj_pass_writes_mesh_and_lines() {
    let mut lib = library();
    let cfg = RenderConfig::default();
    let mut obj = ObjRoutines::new(Vec::new(), "tree");
    interpret(PROGRAM, &mut obj, &mut lib, &cfg).unwrap();
    assert_eq!(obj.mesh().triangle_count(), 32);
    // the jump to the end point separates the two nodes
    assert_eq!(obj.lines().len(), 2);
    assert!(obj.lines()[1][0].abs_diff_eq(pfg_math::dvec3(0.0, 1.0, 1.0), 1e-12));
    let text = String::from_utf8(obj.into_inner()).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 32);
    assert!(text.contains("\nl 41 42\n"));
    assert!(text.contains("\nl 43 44\n"));
}

#[test]
fn obj_file_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.obj");
    let mut lib = library();
    let cfg = RenderConfig::default();
    {
        let mut d = pfg_render::create_file_dispatcher(pfg_render::OutputKind::Obj, &path).unwrap();
        interpret(PROGRAM, d.as_mut(), &mut lib, &cfg).unwrap();
    }
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("g tree\n"));
    assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 40);
}
