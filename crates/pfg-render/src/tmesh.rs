//! Triangle-strip emission of evaluated patches with per-vertex shading.

use pfg_core::{PfgError, Result};
use pfg_geometry::EvaluatedGrid;
use pfg_math::{Frame, Point3, Vector3};
use pfg_surface::{PatchColours, SurfaceLibrary, TexelMode};
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::dispatch::{DrawDispatcher, TmeshVertex};

/// When vertex colours are computed during strip emission.
///
/// Lighting and eye are fixed for a whole pass, so both policies emit the
/// same colours. `ReuseRows` shades each grid row once; `PerVertex` shades
/// the shared row again for every strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingPolicy {
    /// Shade both rows of the first strip of a patch, then only the far row
    /// of each later strip; the near row reuses the previous strip's colours.
    #[default]
    ReuseRows,
    /// Shade every vertex of every strip.
    PerVertex,
}

/// Colour of one vertex: the top or bottom colour depending on which side
/// faces the eye, scaled by ambient plus Lambert diffuse light.
pub fn determine_vertex_shading(
    position: Point3,
    normal: Vector3,
    colours: &PatchColours,
    eye: Point3,
    cfg: &RenderConfig,
) -> TmeshVertex {
    let facing = normal.dot(eye - position) >= 0.0;
    let (index, diffuse, normal) = if facing {
        (colours.top_colour, colours.top_diffuse, normal)
    } else {
        (colours.bottom_colour, colours.bottom_diffuse, -normal)
    };
    let light = cfg.draw.light.try_normalize().unwrap_or(Vector3::Z);
    let intensity = (cfg.draw.ambient + diffuse * normal.dot(light).max(0.0)).clamp(0.0, 1.0);
    TmeshVertex {
        position,
        normal,
        colour: cfg.palette.colour(index).map(|c| c * intensity),
        texel: None,
    }
}

fn shade_row(
    grid: &EvaluatedGrid,
    s: usize,
    colours: &PatchColours,
    frame: &Frame,
    eye: Point3,
    textured: bool,
    cfg: &RenderConfig,
) -> Vec<TmeshVertex> {
    (0..=grid.t_precision())
        .map(|t| {
            let sample = grid.sample(s, t);
            let normal = frame.rotate(sample.normal).try_normalize().unwrap_or(Vector3::Y);
            let mut v = determine_vertex_shading(frame.to_world(sample.position), normal, colours, eye, cfg);
            if textured {
                v.texel = sample.texel;
            }
            v
        })
        .collect()
}

/// Emit one patch grid as `s_precision` triangle strips.
///
/// Strip `s` alternates samples `[s][t]` and `[s+1][t]` for every `t`.
pub fn draw_grid_tmesh<D: DrawDispatcher + ?Sized>(
    dispatcher: &mut D,
    grid: &EvaluatedGrid,
    colours: &PatchColours,
    frame: &Frame,
    textured: bool,
    cfg: &RenderConfig,
) -> Result<()> {
    let eye = cfg.view.camera().eye;
    let mut near = shade_row(grid, 0, colours, frame, eye, textured, cfg);
    for s in 0..grid.s_precision() {
        if cfg.draw.shading == ShadingPolicy::PerVertex && s > 0 {
            near = shade_row(grid, s, colours, frame, eye, textured, cfg);
        }
        let far = shade_row(grid, s + 1, colours, frame, eye, textured, cfg);
        dispatcher.start_tmesh()?;
        for (a, b) in near.iter().zip(&far) {
            dispatcher.tmesh_vertex(a, cfg)?;
            dispatcher.tmesh_vertex(b, cfg)?;
        }
        dispatcher.end_tmesh()?;
        near = far;
    }
    Ok(())
}

/// Emit every patch of a loaded surface through the dispatcher.
///
/// `texture` stands in for the surface texture. Patches with a texture of
/// their own switch the surface to per-patch texels, see
/// [`SurfaceLibrary::texture_mode`]. Each textured patch is bracketed by
/// `start_texture`/`end_texture`.
pub fn draw_surface_tmesh<D: DrawDispatcher + ?Sized>(
    dispatcher: &mut D,
    library: &mut SurfaceLibrary,
    id: u8,
    frame: &Frame,
    texture: Option<u32>,
    cfg: &RenderConfig,
) -> Result<()> {
    let surface = library
        .surface(id)
        .ok_or_else(|| PfgError::NotFound(format!("surface '{}'", id as char)))?;
    let surface_texture = texture.or(surface.texture);
    let mode = library.texture_mode(id, texture);
    if mode != TexelMode::Unset {
        library.ensure_texture_mode(id, mode)?;
    }
    for (_, patch) in library.surface_patches(id) {
        let Some(grid) = patch.grid() else { continue };
        match patch.texture.or(surface_texture) {
            Some(t) => {
                dispatcher.start_texture(t)?;
                draw_grid_tmesh(dispatcher, grid, &patch.colours, frame, true, cfg)?;
                dispatcher.end_texture()?;
            }
            None => draw_grid_tmesh(dispatcher, grid, &patch.colours, frame, false, cfg)?,
        }
    }
    Ok(())
}
