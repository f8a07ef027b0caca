//! Patches whose control points arrive one at a time from the turtle
//! interpreter, keyed by a floating-point id.

use log::{debug, warn};
use ordered_float::OrderedFloat;
use pfg_core::{PfgError, Result};
use pfg_geometry::{clamp_precision, EvaluatedGrid, StepMatrices, DEFAULT_PRECISION};
use pfg_math::{Basis, Point3};
use serde::{Deserialize, Serialize};

use crate::library::SurfaceLibrary;
use crate::types::{Patch, PatchColours, PatchId};

/// Evaluation settings of a dynamic patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynamicPatchSettings {
    pub basis: Basis,
    pub s_precision: i64,
    pub t_precision: i64,
    pub colours: PatchColours,
}

impl Default for DynamicPatchSettings {
    fn default() -> Self {
        Self {
            basis: Basis::Bezier,
            s_precision: DEFAULT_PRECISION as i64,
            t_precision: DEFAULT_PRECISION as i64,
            colours: PatchColours::default(),
        }
    }
}

fn dynamic_name(id: f64) -> String {
    let name = format!("@{id}");
    name.chars().take(crate::types::MAX_PATCH_NAME).collect()
}

impl SurfaceLibrary {
    /// Look up a dynamic patch, allocating an empty one on first reference.
    pub fn find_surface_patch(&mut self, id: f64) -> PatchId {
        let key = OrderedFloat(id);
        if let Some((k, pid)) = self.recent {
            if k == key {
                return pid;
            }
        }
        let pid = match self.dynamic.get(&key) {
            Some(&pid) => pid,
            None => {
                let pid = self.patches.insert(Patch::unassigned(&dynamic_name(id), Basis::Bezier));
                debug!("allocated dynamic patch {id}");
                self.dynamic.insert(key, pid);
                pid
            }
        };
        self.recent = Some((key, pid));
        pid
    }

    /// Reset a dynamic patch: new settings, every control point unassigned.
    pub fn surface_patch_init(&mut self, id: f64, settings: DynamicPatchSettings) -> PatchId {
        let pid = self.find_surface_patch(id);
        let patch = &mut self.patches[pid];
        patch.basis = settings.basis;
        patch.s_precision = clamp_precision(settings.s_precision);
        patch.t_precision = clamp_precision(settings.t_precision);
        patch.colours = settings.colours;
        patch.assigned = [[false; 4]; 4];
        patch.grid = None;
        pid
    }

    /// Assign one control point. `row` and `col` are in 0..4.
    pub fn surface_patch_control_point(&mut self, id: f64, row: usize, col: usize, point: Point3) -> Result<()> {
        if row > 3 || col > 3 {
            return Err(PfgError::InvalidOperation(format!(
                "control point ({row}, {col}) of patch {id} out of range"
            )));
        }
        let pid = self.find_surface_patch(id);
        let patch = &mut self.patches[pid];
        patch.control[row][col] = point;
        patch.assigned[row][col] = true;
        patch.grid = None;
        Ok(())
    }

    /// Evaluate a dynamic patch for drawing.
    ///
    /// Patches with unassigned control points are reported and not evaluated.
    pub fn evaluate_dynamic_patch(&mut self, id: f64) -> Result<&EvaluatedGrid> {
        let pid = self
            .dynamic
            .get(&OrderedFloat(id))
            .copied()
            .ok_or_else(|| PfgError::NotFound(format!("dynamic patch {id}")))?;
        let patch = &mut self.patches[pid];
        if !patch.is_complete() {
            let missing = patch.assigned.iter().flatten().filter(|&&a| !a).count();
            warn!("patch {id} has {missing} unassigned control points, not drawn");
            return Err(PfgError::Geometry(format!(
                "patch {id} has {missing} unassigned control points"
            )));
        }
        if patch.grid.is_none() {
            let steps = StepMatrices::new(patch.s_precision, patch.t_precision);
            patch.evaluate(&steps);
        }
        patch
            .grid
            .as_ref()
            .ok_or_else(|| PfgError::Geometry(format!("patch {id} not evaluated")))
    }
}
