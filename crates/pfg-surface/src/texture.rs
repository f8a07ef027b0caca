use log::debug;
use pfg_core::{PfgError, Result};
use pfg_math::{dvec2, Aabb3, DVec2, Point3};

use crate::library::SurfaceLibrary;
use crate::types::{SurfaceHeader, TexelMode};

fn surface_texel(header: &SurfaceHeader, local: Point3) -> DVec2 {
    let Aabb3 { min, max } = header.bounds;
    let p = header.frame.to_world(local);
    let span = |lo: f64, hi: f64, v: f64| if hi - lo > 0.0 { (v - lo) / (hi - lo) } else { 0.0 };
    dvec2(span(min.x, max.x, p.x), span(min.y, max.y, p.y))
}

impl SurfaceLibrary {
    /// Texture drawn over the whole surface; `None` removes it.
    pub fn set_surface_texture(&mut self, id: u8, texture: Option<u32>) -> Result<()> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or_else(|| PfgError::NotFound(format!("surface '{}'", id as char)))?;
        surface.texture = texture;
        Ok(())
    }

    /// Texture of a single patch. It takes precedence over the surface texture.
    pub fn set_patch_texture(&mut self, id: u8, patch: &str, texture: Option<u32>) -> Result<()> {
        let pid = self
            .find_patch(id, patch)
            .ok_or_else(|| PfgError::NotFound(format!("patch '{patch}' of surface '{}'", id as char)))?;
        self.patches[pid].texture = texture;
        Ok(())
    }

    /// Texel mode a surface is drawn with. `fallback` stands in for a missing
    /// surface texture.
    ///
    /// Any patch with a texture of its own makes the texels per patch; a
    /// surface texture alone makes them span the whole surface.
    pub fn texture_mode(&self, id: u8, fallback: Option<u32>) -> TexelMode {
        let Some(surface) = self.surfaces.get(&id) else {
            return TexelMode::Unset;
        };
        if self.surface_patches(id).any(|(_, p)| p.texture.is_some()) {
            TexelMode::PerPatch
        } else if surface.texture.or(fallback).is_some() {
            TexelMode::PerSurface
        } else {
            TexelMode::Unset
        }
    }

    /// Make sure every patch of a surface carries texels for `mode`.
    ///
    /// Returns `true` when the texels had to be recomputed.
    pub fn ensure_texture_mode(&mut self, id: u8, mode: TexelMode) -> Result<bool> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or_else(|| PfgError::NotFound(format!("surface '{}'", id as char)))?;
        if surface.texel_mode == mode {
            return Ok(false);
        }
        for &pid in &surface.patches {
            let Some(grid) = self.patches.get_mut(pid).and_then(|p| p.grid.as_mut()) else {
                continue;
            };
            if mode == TexelMode::Unset {
                grid.clear_texels();
                continue;
            }
            let (sp, tp) = (grid.s_precision(), grid.t_precision());
            for s in 0..=sp {
                for t in 0..=tp {
                    let sample = grid.sample_mut(s, t);
                    sample.texel = Some(match mode {
                        TexelMode::PerPatch => dvec2(s as f64 / sp as f64, t as f64 / tp as f64),
                        _ => surface_texel(&surface.header, sample.position),
                    });
                }
            }
        }
        debug!("surface '{}' texels {:?} -> {:?}", id as char, surface.texel_mode, mode);
        surface.texel_mode = mode;
        Ok(true)
    }
}
