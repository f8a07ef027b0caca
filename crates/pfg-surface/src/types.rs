use pfg_core::{PfgError, Result};
use pfg_geometry::{evaluate_patch, ControlGrid, EvaluatedGrid, StepMatrices};
use pfg_math::{Aabb3, Basis, Frame, Point3};
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

// --- SlotMap key types ---

new_key_type! {
    pub struct PatchId;
}

/// Longest accepted patch name.
pub const MAX_PATCH_NAME: usize = 30;

/// Marker used in patch files for "no neighbour".
pub const NO_NEIGHBOR: &str = "~";

// --- Neighbour directions ---

/// Position of a neighbouring patch. Rows of the evaluated grid run along `s`
/// from `Below` (row 0) to `Above`; columns run along `t` from `Left`
/// (column 0) to `Right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    AboveLeft,
    Above,
    AboveRight,
    Left,
    Right,
    BelowLeft,
    Below,
    BelowRight,
}

impl Direction {
    /// File order of the neighbour records.
    pub const ALL: [Direction; 8] = [
        Direction::AboveLeft,
        Direction::Above,
        Direction::AboveRight,
        Direction::Left,
        Direction::Right,
        Direction::BelowLeft,
        Direction::Below,
        Direction::BelowRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::AboveLeft => Direction::BelowRight,
            Direction::Above => Direction::Below,
            Direction::AboveRight => Direction::BelowLeft,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::BelowLeft => Direction::AboveRight,
            Direction::Below => Direction::Above,
            Direction::BelowRight => Direction::AboveLeft,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::AboveLeft | Direction::AboveRight | Direction::BelowLeft | Direction::BelowRight
        )
    }

    /// Label used in patch files (`AL`, `A`, ...).
    pub fn label(self) -> &'static str {
        match self {
            Direction::AboveLeft => "AL",
            Direction::Above => "A",
            Direction::AboveRight => "AR",
            Direction::Left => "L",
            Direction::Right => "R",
            Direction::BelowLeft => "BL",
            Direction::Below => "B",
            Direction::BelowRight => "BR",
        }
    }

    pub fn from_label(label: &str) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.label() == label)
    }

    /// Grid samples shared with the neighbour in this direction, as
    /// `((s, t) here, (s, t) on the neighbour)`.
    pub fn shared_samples(self, s_precision: usize, t_precision: usize) -> Vec<((usize, usize), (usize, usize))> {
        let (sp, tp) = (s_precision, t_precision);
        match self {
            Direction::Above => (0..=tp).map(|t| ((sp, t), (0, t))).collect(),
            Direction::Below => (0..=tp).map(|t| ((0, t), (sp, t))).collect(),
            Direction::Left => (0..=sp).map(|s| ((s, 0), (s, tp))).collect(),
            Direction::Right => (0..=sp).map(|s| ((s, tp), (s, 0))).collect(),
            Direction::AboveLeft => vec![((sp, 0), (0, tp))],
            Direction::AboveRight => vec![((sp, tp), (0, 0))],
            Direction::BelowLeft => vec![((0, 0), (sp, tp))],
            Direction::BelowRight => vec![((0, tp), (sp, 0))],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Entity structs ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborLink {
    /// Declared neighbour name, `None` for `~`.
    pub name: Option<String>,
    /// Resolved neighbour once the surface is assembled.
    pub target: Option<PatchId>,
    /// Set once the shared boundary normals have been averaged.
    pub averaged: bool,
}

impl NeighborLink {
    pub fn named(name: &str) -> Self {
        Self {
            name: (name != NO_NEIGHBOR).then(|| name.to_string()),
            target: None,
            averaged: false,
        }
    }
}

/// Colour indices and diffuse coefficients of the two patch sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchColours {
    pub top_colour: i32,
    pub top_diffuse: f64,
    pub bottom_colour: i32,
    pub bottom_diffuse: f64,
}

impl Default for PatchColours {
    fn default() -> Self {
        Self {
            top_colour: 1,
            top_diffuse: 1.0,
            bottom_colour: 1,
            bottom_diffuse: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    pub basis: Basis,
    pub control: ControlGrid,
    pub assigned: [[bool; 4]; 4],
    pub colours: PatchColours,
    pub neighbors: [NeighborLink; 8],
    pub texture: Option<u32>,
    pub s_precision: usize,
    pub t_precision: usize,
    pub grid: Option<EvaluatedGrid>,
}

impl Patch {
    /// A fully assigned patch, as read from a patch file.
    pub fn new(name: &str, basis: Basis, control: ControlGrid) -> Result<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            basis,
            control,
            assigned: [[true; 4]; 4],
            colours: PatchColours::default(),
            neighbors: Default::default(),
            texture: None,
            s_precision: pfg_geometry::DEFAULT_PRECISION,
            t_precision: pfg_geometry::DEFAULT_PRECISION,
            grid: None,
        })
    }

    /// A patch whose control points have not been assigned yet.
    pub fn unassigned(name: &str, basis: Basis) -> Self {
        Self {
            name: name.to_string(),
            basis,
            control: [[Point3::ZERO; 4]; 4],
            assigned: [[false; 4]; 4],
            colours: PatchColours::default(),
            neighbors: Default::default(),
            texture: None,
            s_precision: pfg_geometry::DEFAULT_PRECISION,
            t_precision: pfg_geometry::DEFAULT_PRECISION,
            grid: None,
        }
    }

    pub fn neighbor(&self, dir: Direction) -> &NeighborLink {
        &self.neighbors[dir.index()]
    }

    pub fn neighbor_mut(&mut self, dir: Direction) -> &mut NeighborLink {
        &mut self.neighbors[dir.index()]
    }

    pub fn set_neighbor(&mut self, dir: Direction, name: &str) {
        self.neighbors[dir.index()] = NeighborLink::named(name);
    }

    pub fn is_complete(&self) -> bool {
        self.assigned.iter().flatten().all(|&a| a)
    }

    /// Run the forward-difference evaluator and replace the sample grid.
    pub fn evaluate(&mut self, steps: &StepMatrices) {
        self.s_precision = steps.s_precision;
        self.t_precision = steps.t_precision;
        self.grid = Some(evaluate_patch(&self.control, self.basis, steps));
    }

    pub fn grid(&self) -> Option<&EvaluatedGrid> {
        self.grid.as_ref()
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == NO_NEIGHBOR {
        return Err(PfgError::InvalidOperation(format!("invalid patch name '{name}'")));
    }
    if name.len() > MAX_PATCH_NAME {
        return Err(PfgError::InvalidOperation(format!(
            "patch name '{name}' longer than {MAX_PATCH_NAME} characters"
        )));
    }
    Ok(())
}

/// Texture-coordinate mode currently stored in a surface's sample grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TexelMode {
    #[default]
    Unset,
    PerPatch,
    PerSurface,
}

/// Header values of a patch file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceHeader {
    /// Raw file-space bounding box.
    pub bounds: Aabb3,
    pub s_precision: usize,
    pub t_precision: usize,
    /// Contact point, heading, up and size as a frame from file space to
    /// turtle-local space.
    pub frame: Frame,
    /// End point in turtle-local space.
    pub end_point: Point3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surface {
    pub id: u8,
    pub header: SurfaceHeader,
    pub steps: StepMatrices,
    pub patches: Vec<PatchId>,
    pub texture: Option<u32>,
    pub texel_mode: TexelMode,
}

impl Surface {
    pub fn new(id: u8, header: SurfaceHeader) -> Self {
        let steps = StepMatrices::new(header.s_precision, header.t_precision);
        Self {
            id,
            header,
            steps,
            patches: Vec::new(),
            texture: None,
            texel_mode: TexelMode::Unset,
        }
    }

    pub fn name(&self) -> char {
        self.id as char
    }
}

/// A surface given directly as triangles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TSurface {
    pub id: u8,
    pub triangles: Vec<[Point3; 3]>,
    pub colour: i32,
}
