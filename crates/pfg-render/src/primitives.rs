//! Geometry of the built-in turtle primitives, shared by the backends.

use std::f64::consts::{PI, TAU};

use pfg_math::{Point3, Vector3};

use crate::turtle::Turtle;

/// Points of a circle in the plane spanned by `u` and `v`.
pub fn circle_points(center: Point3, u: Vector3, v: Vector3, radius: f64, segments: usize) -> Vec<Point3> {
    let n = segments.max(3);
    (0..n)
        .map(|i| {
            let (s, c) = (TAU * i as f64 / n as f64).sin_cos();
            center + (u * c + v * s) * radius
        })
        .collect()
}

/// Latitude/longitude tessellation of a sphere as `(position, normal)` triangles.
pub fn sphere_triangles(center: Point3, radius: f64, segments: usize) -> Vec<[(Point3, Vector3); 3]> {
    let slices = segments.max(3);
    let stacks = (segments / 2).max(2);
    let at = |i: usize, j: usize| {
        let theta = PI * i as f64 / stacks as f64;
        let phi = TAU * j as f64 / slices as f64;
        let n = Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
        (center + n * radius, n)
    };
    let mut tris = Vec::with_capacity(stacks * slices * 2);
    for i in 0..stacks {
        for j in 0..slices {
            let (a, b, c, d) = (at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1));
            if i > 0 {
                tris.push([a, b, d]);
            }
            if i + 1 < stacks {
                tris.push([b, c, d]);
            }
        }
    }
    tris
}

/// The six faces of a cube of edge `size` centred on the turtle, aligned
/// with its frame, each with its outward normal.
pub fn box_faces(turtle: &Turtle, size: f64) -> [([Point3; 4], Vector3); 6] {
    let h = size * 0.5;
    let (x, y, z) = (turtle.heading * h, turtle.left * h, turtle.up * h);
    let c = turtle.position;
    let face = |n: Vector3, a: Vector3, b: Vector3| {
        // corners wind counter-clockwise seen from outside: n = a × b
        ([c + n - a - b, c + n + a - b, c + n + a + b, c + n - a + b], n.normalize_or_zero())
    };
    [
        face(x, y, z),
        face(-x, z, y),
        face(y, z, x),
        face(-y, x, z),
        face(z, x, y),
        face(-z, y, x),
    ]
}

/// Triangle-strip vertices of an open cylinder from `a` to `b`.
pub fn cylinder_strip(a: Point3, b: Point3, radius: f64, sides: usize) -> Vec<(Point3, Vector3)> {
    let axis = b - a;
    let Some(dir) = axis.try_normalize() else {
        return Vec::new();
    };
    let helper = if dir.x.abs() < 0.9 { Vector3::X } else { Vector3::Y };
    let u = dir.cross(helper).normalize();
    let v = dir.cross(u);
    let n = sides.max(3);
    let mut strip = Vec::with_capacity(2 * (n + 1));
    for i in 0..=n {
        let (s, c) = (TAU * i as f64 / n as f64).sin_cos();
        let normal = u * c + v * s;
        strip.push((a + normal * radius, normal));
        strip.push((b + normal * radius, normal));
    }
    strip
}
