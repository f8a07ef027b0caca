use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use ordered_float::OrderedFloat;
use pfg_core::traits::Validate;
use pfg_core::{PfgError, Result};
use pfg_geometry::{clamp_precision, StepMatrices};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::connections::{resolve_links, SurfacePatches};
use crate::normals::calculate_neighbouring_vertex_normals;
use crate::types::{Patch, PatchId, Surface, TSurface, TexelMode};

/// Optional caps on library size. Unbounded by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadLimits {
    pub max_surfaces: Option<usize>,
    pub max_patches: Option<usize>,
}

impl LoadLimits {
    pub const LEGACY_SURFACES: usize = 20;
    pub const LEGACY_PATCHES: usize = 40;

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The fixed table sizes of older releases.
    pub fn legacy() -> Self {
        Self {
            max_surfaces: Some(Self::LEGACY_SURFACES),
            max_patches: Some(Self::LEGACY_PATCHES),
        }
    }
}

/// Every loaded surface and patch of one model.
#[derive(Debug, Default)]
pub struct SurfaceLibrary {
    pub(crate) patches: SlotMap<PatchId, Patch>,
    pub(crate) surfaces: BTreeMap<u8, Surface>,
    pub(crate) tsurfaces: BTreeMap<u8, TSurface>,
    pub(crate) dynamic: HashMap<OrderedFloat<f64>, PatchId>,
    pub(crate) recent: Option<(OrderedFloat<f64>, PatchId)>,
    limits: LoadLimits,
}

impl SurfaceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: LoadLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn limits(&self) -> LoadLimits {
        self.limits
    }

    /// True when a bicubic surface or a t-surface already uses `id`.
    pub fn is_identifier_used(&self, id: u8) -> bool {
        self.surfaces.contains_key(&id) || self.tsurfaces.contains_key(&id)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether one more surface fits under `max_surfaces`.
    pub fn has_surface_capacity(&self) -> bool {
        self.limits
            .max_surfaces
            .map_or(true, |max| self.surfaces.len() + self.tsurfaces.len() < max)
    }

    pub fn surface(&self, id: u8) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.values()
    }

    pub fn patch(&self, id: PatchId) -> Option<&Patch> {
        self.patches.get(id)
    }

    pub fn patch_mut(&mut self, id: PatchId) -> Option<&mut Patch> {
        self.patches.get_mut(id)
    }

    /// Patches of a surface in file order.
    pub fn surface_patches(&self, id: u8) -> impl Iterator<Item = (PatchId, &Patch)> {
        self.surfaces
            .get(&id)
            .into_iter()
            .flat_map(|s| s.patches.iter())
            .filter_map(|&pid| self.patches.get(pid).map(|p| (pid, p)))
    }

    pub fn find_patch(&self, surface: u8, name: &str) -> Option<PatchId> {
        self.surface_patches(surface)
            .find(|(_, p)| p.name == name)
            .map(|(id, _)| id)
    }

    /// Add an evaluated surface.
    ///
    /// Links are resolved and checked; on an inconsistency every patch is
    /// discarded and the surface is not added. Otherwise boundary normals are
    /// averaged across neighbours.
    pub fn insert_surface(&mut self, mut surface: Surface, patches: Vec<Patch>) -> Result<u8> {
        let id = surface.id;
        if self.is_identifier_used(id) {
            return Err(PfgError::InvalidOperation(format!(
                "surface identifier '{}' already in use",
                id as char
            )));
        }
        if !self.has_surface_capacity() {
            return Err(PfgError::InvalidOperation(format!(
                "surface table full, '{}' not loaded",
                id as char
            )));
        }
        if let Some(max) = self.limits.max_patches {
            if patches.len() > max {
                return Err(PfgError::Capacity(format!(
                    "surface '{}' has {} patches, limit is {max}",
                    id as char,
                    patches.len()
                )));
            }
        }
        let mut seen = HashSet::new();
        for p in &patches {
            if !seen.insert(p.name.as_str()) {
                return Err(PfgError::Topology(format!(
                    "patch name '{}' repeated in surface '{}'",
                    p.name, id as char
                )));
            }
        }

        let ids: Vec<PatchId> = patches.into_iter().map(|p| self.patches.insert(p)).collect();
        resolve_links(&mut self.patches, &ids);
        let checked = SurfacePatches {
            arena: &self.patches,
            ids: &ids,
        }
        .validate();
        if let Err(e) = checked {
            for pid in ids {
                self.patches.remove(pid);
            }
            return Err(e);
        }

        calculate_neighbouring_vertex_normals(&mut self.patches, &ids);
        info!("surface '{}' loaded with {} patches", id as char, ids.len());
        surface.patches = ids;
        surface.texel_mode = TexelMode::Unset;
        self.surfaces.insert(id, surface);
        Ok(id)
    }

    /// Change a surface's sampling density.
    ///
    /// Rebuilds the step matrices, re-evaluates every patch in parallel and
    /// redoes the neighbour averaging. Cached texels are dropped.
    pub fn set_precision(&mut self, id: u8, s_precision: i64, t_precision: i64) -> Result<()> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or_else(|| PfgError::NotFound(format!("surface '{}'", id as char)))?;
        let (sp, tp) = (clamp_precision(s_precision), clamp_precision(t_precision));
        if surface.steps.matches(sp, tp) {
            return Ok(());
        }
        surface.header.s_precision = sp;
        surface.header.t_precision = tp;
        surface.steps = StepMatrices::new(sp, tp);
        surface.texel_mode = TexelMode::Unset;

        let members: HashSet<PatchId> = surface.patches.iter().copied().collect();
        let steps = &surface.steps;
        let mut targets: Vec<&mut Patch> = self
            .patches
            .iter_mut()
            .filter(|(pid, _)| members.contains(pid))
            .map(|(_, p)| p)
            .collect();
        targets.par_iter_mut().for_each(|p| {
            p.evaluate(steps);
            for link in &mut p.neighbors {
                link.averaged = false;
            }
        });

        calculate_neighbouring_vertex_normals(&mut self.patches, &surface.patches);
        debug!("surface '{}' re-evaluated at {sp}x{tp}", id as char);
        Ok(())
    }

    pub fn add_tsurface(&mut self, tsurface: TSurface) -> Result<()> {
        let id = tsurface.id;
        if self.is_identifier_used(id) {
            return Err(PfgError::InvalidOperation(format!(
                "surface identifier '{}' already in use",
                id as char
            )));
        }
        if !self.has_surface_capacity() {
            return Err(PfgError::InvalidOperation(format!(
                "surface table full, '{}' not loaded",
                id as char
            )));
        }
        self.tsurfaces.insert(id, tsurface);
        Ok(())
    }

    pub fn tsurface(&self, id: u8) -> Option<&TSurface> {
        self.tsurfaces.get(&id)
    }
}
