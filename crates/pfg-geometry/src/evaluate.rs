//! Forward-difference evaluation of a bicubic patch on a regular `(s, t)` grid.

use pfg_core::Tolerance;
use pfg_math::basis::sandwich;
use pfg_math::{Basis, DVec2, Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::fdiff::StepMatrices;
use crate::surface::ControlGrid;

/// Weight of a corner's own normal in the corner blend.
const CORNER_BASIC: f64 = 0.5;
/// Weight of each adjacent edge sample in the corner blend.
const CORNER_PARTS: f64 = 1.0;

/// Normal used when the tangent cross product vanishes.
pub const DEGENERATE_NORMAL: Vector3 = Vector3::Y;

/// The nine difference tables of one patch: point, s-tangent and t-tangent,
/// each for x, y and z.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceTables {
    pub point: [Matrix4; 3],
    pub tangent_s: [Matrix4; 3],
    pub tangent_t: [Matrix4; 3],
}

/// One evaluated grid sample.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub position: Point3,
    pub tangent_s: Vector3,
    pub tangent_t: Vector3,
    pub normal: Vector3,
    pub texel: Option<DVec2>,
}

/// Dense `(s_precision+1) × (t_precision+1)` grid of samples, row-major in `s`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedGrid {
    s_precision: usize,
    t_precision: usize,
    samples: Vec<Sample>,
}

impl EvaluatedGrid {
    pub fn new(s_precision: usize, t_precision: usize) -> Self {
        Self {
            s_precision,
            t_precision,
            samples: vec![Sample::default(); (s_precision + 1) * (t_precision + 1)],
        }
    }

    pub fn s_precision(&self) -> usize {
        self.s_precision
    }

    pub fn t_precision(&self) -> usize {
        self.t_precision
    }

    fn index(&self, s: usize, t: usize) -> usize {
        debug_assert!(s <= self.s_precision && t <= self.t_precision);
        s * (self.t_precision + 1) + t
    }

    pub fn sample(&self, s: usize, t: usize) -> &Sample {
        &self.samples[self.index(s, t)]
    }

    pub fn sample_mut(&mut self, s: usize, t: usize) -> &mut Sample {
        let i = self.index(s, t);
        &mut self.samples[i]
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    pub fn has_texels(&self) -> bool {
        self.samples.iter().all(|s| s.texel.is_some())
    }

    pub fn clear_texels(&mut self) {
        for s in &mut self.samples {
            s.texel = None;
        }
    }
}

fn axis_grid(control: &ControlGrid, axis: usize) -> Matrix4 {
    let mut p = [[0.0; 4]; 4];
    for (i, row) in control.iter().enumerate() {
        for (j, point) in row.iter().enumerate() {
            p[i][j] = point[axis];
        }
    }
    p
}

/// Build the difference tables `E·(M·P·Mᵀ)·Eᵀ` and their tangent variants.
pub fn calculate_d00(control: &ControlGrid, basis: Basis, steps: &StepMatrices) -> DifferenceTables {
    let m = basis.matrix();
    let mut tables = DifferenceTables {
        point: [[[0.0; 4]; 4]; 3],
        tangent_s: [[[0.0; 4]; 4]; 3],
        tangent_t: [[[0.0; 4]; 4]; 3],
    };
    for axis in 0..3 {
        let c = sandwich(&m, &axis_grid(control, axis), &m);
        tables.point[axis] = sandwich(&steps.e_epsilon, &c, &steps.e_sigma);
        tables.tangent_s[axis] = sandwich(&steps.t_e_epsilon, &c, &steps.e_sigma);
        tables.tangent_t[axis] = sandwich(&steps.e_epsilon, &c, &steps.t_e_sigma);
    }
    tables
}

/// March one difference table across the grid, handing each value to `store`.
fn march(table: &Matrix4, s_precision: usize, t_precision: usize, mut store: impl FnMut(usize, usize, f64)) {
    let mut d = *table;
    for i in 0..=s_precision {
        let [mut f, mut d1, mut d2, d3] = d[0];
        for j in 0..=t_precision {
            store(i, j, f);
            f += d1;
            d1 += d2;
            d2 += d3;
        }
        // advance s: each row accumulates the one below it
        for k in 0..3 {
            for c in 0..4 {
                d[k][c] += d[k + 1][c];
            }
        }
    }
}

/// Evaluate positions, tangents and normals from precomputed difference tables.
pub fn calculate_surface(tables: &DifferenceTables, s_precision: usize, t_precision: usize) -> EvaluatedGrid {
    let mut grid = EvaluatedGrid::new(s_precision, t_precision);
    for axis in 0..3 {
        march(&tables.point[axis], s_precision, t_precision, |i, j, v| {
            grid.sample_mut(i, j).position[axis] = v;
        });
        march(&tables.tangent_s[axis], s_precision, t_precision, |i, j, v| {
            grid.sample_mut(i, j).tangent_s[axis] = v;
        });
        march(&tables.tangent_t[axis], s_precision, t_precision, |i, j, v| {
            grid.sample_mut(i, j).tangent_t[axis] = v;
        });
    }

    let tol = Tolerance::default();
    for sample in grid.samples_mut() {
        sample.normal = unit_or_degenerate(sample.tangent_s.cross(sample.tangent_t), tol);
    }
    blend_corners(&mut grid, tol);
    grid
}

/// Forward-difference evaluation of one patch.
pub fn evaluate_patch(control: &ControlGrid, basis: Basis, steps: &StepMatrices) -> EvaluatedGrid {
    let tables = calculate_d00(control, basis, steps);
    calculate_surface(&tables, steps.s_precision, steps.t_precision)
}

pub fn unit_or_degenerate(v: Vector3, tol: Tolerance) -> Vector3 {
    let len = v.length();
    if tol.is_zero(len) || !len.is_finite() {
        DEGENERATE_NORMAL
    } else {
        v / len
    }
}

fn blend_corners(grid: &mut EvaluatedGrid, tol: Tolerance) {
    let (sp, tp) = (grid.s_precision, grid.t_precision);
    let corners = [
        ((0, 0), (1, 0), (0, 1)),
        ((0, tp), (1, tp), (0, tp - 1)),
        ((sp, 0), (sp - 1, 0), (sp, 1)),
        ((sp, tp), (sp - 1, tp), (sp, tp - 1)),
    ];
    let blended: Vec<_> = corners
        .iter()
        .map(|&(c, a, b)| {
            let n = grid.sample(c.0, c.1).normal * CORNER_BASIC
                + grid.sample(a.0, a.1).normal * CORNER_PARTS
                + grid.sample(b.0, b.1).normal * CORNER_PARTS;
            (c, unit_or_degenerate(n, tol))
        })
        .collect();
    for ((s, t), n) in blended {
        grid.sample_mut(s, t).normal = n;
    }
}
