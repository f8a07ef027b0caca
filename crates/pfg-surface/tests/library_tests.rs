use pfg_core::traits::Validate;
use pfg_geometry::StepMatrices;
use pfg_math::{dvec3, Aabb3, Basis, Frame, Point3};
use pfg_surface::{Direction, Patch, Surface, SurfaceHeader, SurfaceLibrary, SurfacePatches};

fn header(precision: usize) -> SurfaceHeader {
    SurfaceHeader {
        bounds: Aabb3::new(Point3::ZERO, dvec3(6.0, 6.0, 1.0)),
        s_precision: precision,
        t_precision: precision,
        frame: Frame::identity(),
        end_point: dvec3(0.0, 0.0, 1.0),
    }
}

/// A gently curved patch occupying cell `(row, col)` of a 2x2 layout.
fn cell(name: &str, row: usize, col: usize, precision: usize) -> Patch {
    let mut g = [[Point3::ZERO; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            let x = (col * 3 + j) as f64;
            let y = (row * 3 + i) as f64;
            g[i][j] = dvec3(x, y, 0.05 * x * y);
        }
    }
    let mut p = Patch::new(name, Basis::Bezier, g).unwrap();
    p.evaluate(&StepMatrices::new(precision, precision));
    p
}

fn quad(precision: usize) -> Vec<Patch> {
    let mut ll = cell("ll", 0, 0, precision);
    let mut lr = cell("lr", 0, 1, precision);
    let mut ul = cell("ul", 1, 0, precision);
    let mut ur = cell("ur", 1, 1, precision);
    ll.set_neighbor(Direction::Right, "lr");
    ll.set_neighbor(Direction::Above, "ul");
    ll.set_neighbor(Direction::AboveRight, "ur");
    lr.set_neighbor(Direction::Left, "ll");
    lr.set_neighbor(Direction::Above, "ur");
    lr.set_neighbor(Direction::AboveLeft, "ul");
    ul.set_neighbor(Direction::Below, "ll");
    ul.set_neighbor(Direction::Right, "ur");
    ul.set_neighbor(Direction::BelowRight, "lr");
    ur.set_neighbor(Direction::Below, "lr");
    ur.set_neighbor(Direction::Left, "ul");
    ur.set_neighbor(Direction::BelowLeft, "ll");
    vec![ll, lr, ul, ur]
}

#[test]
fn test_quad_links_validate() {
    let mut lib = SurfaceLibrary::new();
    lib.insert_surface(Surface::new(b'Q', header(4)), quad(4)).unwrap();
    let surface = lib.surface(b'Q').unwrap();
    assert_eq!(surface.patches.len(), 4);
    let mut arena = slotmap::SlotMap::with_key();
    let mut ids = Vec::new();
    for (_, p) in lib.surface_patches(b'Q') {
        ids.push(arena.insert(p.clone()));
    }
    // links in the clones still point at library keys, so re-resolve them
    pfg_surface::connections::resolve_links(&mut arena, &ids);
    SurfacePatches { arena: &arena, ids: &ids }.validate().unwrap();
}

#[test]
fn test_quad_boundaries_bit_identical() {
    let mut lib = SurfaceLibrary::new();
    lib.insert_surface(Surface::new(b'Q', header(5)), quad(5)).unwrap();
    for (id, p) in lib.surface_patches(b'Q') {
        let grid = p.grid().unwrap();
        for dir in Direction::ALL {
            let Some(other) = p.neighbor(dir).target else { continue };
            assert!(p.neighbor(dir).averaged, "{} {dir}", p.name);
            let og = lib.patch(other).unwrap().grid().unwrap();
            for ((s, t), (os, ot)) in dir.shared_samples(5, 5) {
                assert_eq!(grid.sample(s, t).normal, og.sample(os, ot).normal, "{} {dir} ({s},{t})", p.name);
                assert!((grid.sample(s, t).normal.length() - 1.0).abs() < 1e-9);
            }
        }
        assert_eq!(lib.patch(id).unwrap().name, p.name);
    }
}

#[test]
fn test_quad_survives_precision_change() {
    let mut lib = SurfaceLibrary::new();
    lib.insert_surface(Surface::new(b'Q', header(5)), quad(5)).unwrap();
    lib.set_precision(b'Q', 3, 3).unwrap();
    let ll = lib.find_patch(b'Q', "ll").unwrap();
    let ur = lib.find_patch(b'Q', "ur").unwrap();
    let a = lib.patch(ll).unwrap().grid().unwrap().sample(3, 3).normal;
    let b = lib.patch(ur).unwrap().grid().unwrap().sample(0, 0).normal;
    assert_eq!(a, b);
}

#[test]
fn test_broken_quad_rejected() {
    let mut patches = quad(4);
    patches[3].set_neighbor(Direction::BelowLeft, "~");
    let mut lib = SurfaceLibrary::new();
    assert!(lib.insert_surface(Surface::new(b'Q', header(4)), patches).is_err());
    assert!(!lib.is_identifier_used(b'Q'));
}
