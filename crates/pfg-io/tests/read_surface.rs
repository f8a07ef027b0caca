use std::fmt::Write as _;
use std::fs;

use approx::assert_relative_eq;
use pfg_io::{read_surface, read_surface_file, read_surface_with, LoadOutcome, ReadOptions};
use pfg_math::dvec3;
use pfg_surface::{Direction, LoadLimits, SurfaceLibrary, TexelMode};

fn header(precision: usize) -> String {
    format!(
        "0 6 0 3 0 0\n\
         PRECISION S: {precision} T: {precision}\n\
         CONTACT POINT X: 0 Y: 0 Z: 0\n\
         END POINT X: 0 Y: 0 Z: 1\n\
         HEADING X: 1 Y: 0 Z: 0\n\
         UP X: 0 Y: 0 Z: 1\n\
         SIZE: 1\n"
    )
}

/// A flat patch covering `x0..x0+3`, `0..3` with the given neighbour names.
fn patch_block(name: &str, x0: f64, left: &str, right: &str) -> String {
    let mut s = String::new();
    writeln!(s, "{name}").unwrap();
    writeln!(s, "TOP COLOR: 2 DIFFUSE: 0.9 BOTTOM COLOR: 3 DIFFUSE: 0.7").unwrap();
    writeln!(s, "AL: ~ A: ~ AR: ~").unwrap();
    writeln!(s, "L: {left} R: {right}").unwrap();
    writeln!(s, "BL: ~ B: ~ BR: ~").unwrap();
    for i in 0..4 {
        for j in 0..4 {
            writeln!(s, "{} {} 0", x0 + j as f64, i as f64).unwrap();
        }
    }
    s
}

#[test]
fn flat_patch_scenario() {
    let src = header(4) + &patch_block("flat", 0.0, "~", "~");
    let mut lib = SurfaceLibrary::new();
    assert_eq!(read_surface(&src, b'F', &mut lib).unwrap(), LoadOutcome::Loaded(b'F'));

    let id = lib.find_patch(b'F', "flat").unwrap();
    let patch = lib.patch(id).unwrap();
    let grid = patch.grid().unwrap();
    assert_eq!((grid.s_precision(), grid.t_precision()), (4, 4));
    for sample in grid.samples() {
        assert_relative_eq!(sample.normal.z.abs(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(sample.normal.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(sample.normal.y, 0.0, epsilon = 1e-12);
    }
    let last = grid.sample(4, 4).position;
    assert_relative_eq!(last.x, patch.control[3][3].x, epsilon = 1e-12);
    assert_relative_eq!(last.y, patch.control[3][3].y, epsilon = 1e-12);
    assert_relative_eq!(last.x, 3.0, epsilon = 1e-12);
    assert_relative_eq!(last.y, 3.0, epsilon = 1e-12);
    assert_eq!(patch.colours.top_colour, 2);
}

#[test]
fn scaled_and_rotated_frame() {
    let src = header(4)
        .replace("HEADING X: 1 Y: 0 Z: 0", "HEADING X: 0 Y: 1 Z: 0")
        .replace("SIZE: 1", "SIZE: 3")
        + &patch_block("flat", 0.0, "~", "~");
    let mut lib = SurfaceLibrary::new();
    assert!(read_surface(&src, b'R', &mut lib).unwrap().is_loaded());
    let id = lib.find_patch(b'R', "flat").unwrap();
    let patch = lib.patch(id).unwrap();
    // raw (3, 3, 0) scaled by 1/3: heading component y, left component -x
    assert!((patch.control[3][3] - dvec3(1.0, -1.0, 0.0)).length() < 1e-12);
    let last = patch.grid().unwrap().sample(4, 4).position;
    assert!((last - patch.control[3][3]).length() < 1e-12);
}

#[test]
fn neighbours_share_boundary_normals() {
    let src = header(5) + &patch_block("a", 0.0, "~", "b") + &patch_block("b", 3.0, "a", "~");
    let mut lib = SurfaceLibrary::new();
    assert!(read_surface(&src, b'N', &mut lib).unwrap().is_loaded());
    let a = lib.find_patch(b'N', "a").unwrap();
    let b = lib.find_patch(b'N', "b").unwrap();
    let pa = lib.patch(a).unwrap();
    assert_eq!(pa.neighbor(Direction::Right).target, Some(b));
    assert!(pa.neighbor(Direction::Right).averaged);
    let (ga, gb) = (pa.grid().unwrap(), lib.patch(b).unwrap().grid().unwrap());
    for s in 0..=5 {
        assert_eq!(ga.sample(s, 5).normal, gb.sample(s, 0).normal);
    }
}

#[test]
fn asymmetric_neighbours_skip_surface() {
    let src = header(3) + &patch_block("a", 0.0, "~", "b") + &patch_block("b", 3.0, "~", "~");
    let mut lib = SurfaceLibrary::new();
    let outcome = read_surface(&src, b'X', &mut lib).unwrap();
    assert!(matches!(outcome, LoadOutcome::Skipped(_)));
    assert!(!lib.is_identifier_used(b'X'));
    // the identifier stays free for a good file
    let good = header(3) + &patch_block("a", 0.0, "~", "~");
    assert!(read_surface(&good, b'X', &mut lib).unwrap().is_loaded());
}

#[test]
fn duplicate_identifier_skipped() {
    let src = header(3) + &patch_block("a", 0.0, "~", "~");
    let mut lib = SurfaceLibrary::new();
    assert!(read_surface(&src, b'D', &mut lib).unwrap().is_loaded());
    assert!(!read_surface(&src, b'D', &mut lib).unwrap().is_loaded());
    assert_eq!(lib.surface_count(), 1);
}

#[test]
fn truncated_patch_keeps_earlier_ones() {
    let second = patch_block("b", 3.0, "~", "~");
    let cut = &second[..second.len() / 2];
    let src = header(3) + &patch_block("a", 0.0, "~", "~") + cut;
    let mut lib = SurfaceLibrary::new();
    assert!(read_surface(&src, b'T', &mut lib).unwrap().is_loaded());
    assert_eq!(lib.surface_patches(b'T').count(), 1);
}

#[test]
fn patch_limit_is_fatal() {
    let limits = LoadLimits {
        max_surfaces: None,
        max_patches: Some(1),
    };
    let two = header(3) + &patch_block("a", 0.0, "~", "~") + &patch_block("b", 3.0, "~", "~");
    let mut lib = SurfaceLibrary::with_limits(limits);
    let err = read_surface(&two, b'P', &mut lib).unwrap_err();
    assert!(err.is_fatal());

    let one = header(3) + &patch_block("a", 0.0, "~", "~");
    let mut lib = SurfaceLibrary::with_limits(limits);
    assert!(read_surface(&one, b'P', &mut lib).unwrap().is_loaded());
}

#[test]
fn legacy_surface_limit_skips() {
    let src = header(2) + &patch_block("a", 0.0, "~", "~");
    let mut lib = SurfaceLibrary::with_limits(LoadLimits::legacy());
    for id in 0..LoadLimits::LEGACY_SURFACES as u8 {
        assert!(read_surface(&src, b'a' + id, &mut lib).unwrap().is_loaded());
    }
    let outcome = read_surface(&src, b'Z', &mut lib).unwrap();
    assert!(matches!(outcome, LoadOutcome::Skipped(_)));
}

#[test]
fn reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leaf.s");
    fs::write(&path, header(4) + &patch_block("leaf", 0.0, "~", "~")).unwrap();
    let mut lib = SurfaceLibrary::new();
    assert!(read_surface_file(&path, b'l', &mut lib).unwrap().is_loaded());
    assert!(read_surface_file(dir.path().join("missing.s"), b'm', &mut lib).is_err());
}

#[test]
fn texture_option_sets_surface_texture() {
    let src = header(2) + &patch_block("flat", 0.0, "~", "~");
    let mut lib = SurfaceLibrary::new();
    let options = ReadOptions {
        texture: Some(3),
        ..ReadOptions::default()
    };
    assert!(read_surface_with(&src, b't', &mut lib, options).unwrap().is_loaded());
    assert_eq!(lib.surface(b't').unwrap().texture, Some(3));
    assert_eq!(lib.texture_mode(b't', None), TexelMode::PerSurface);
}
