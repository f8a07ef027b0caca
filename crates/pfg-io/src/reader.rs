//! Surface loader: reads a patch description file into a [`SurfaceLibrary`].

use std::fs;
use std::path::Path;

use log::{debug, warn};
use pfg_core::{PfgError, Result};
use pfg_geometry::{clamp_precision, DEFAULT_PRECISION};
use pfg_math::{dvec3, Aabb3, Basis, Frame, Point3};
use pfg_surface::{Direction, Patch, PatchColours, Surface, SurfaceHeader, SurfaceLibrary};

use crate::patch_lexer::TokenCursor;

/// Result of a surface load that did not hit a fatal limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(u8),
    /// The surface was dropped; the model keeps loading.
    Skipped(String),
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Basis applied to every patch of the file.
    pub basis: Basis,
    /// Texture drawn over the whole surface.
    pub texture: Option<u32>,
}

fn skipped(id: u8, reason: impl Into<String>) -> LoadOutcome {
    let reason = reason.into();
    warn!("surface '{}' not loaded: {reason}", id as char);
    LoadOutcome::Skipped(reason)
}

fn colour_index(cursor: &mut TokenCursor) -> Result<i32> {
    let line = cursor.line();
    let v = cursor.integer()?;
    i32::try_from(v).map_err(|_| PfgError::parse(line, format!("colour index {v} out of range")))
}

fn point(xyz: [f64; 3]) -> Point3 {
    dvec3(xyz[0], xyz[1], xyz[2])
}

/// Parse the header block up to and including `SIZE:`.
pub fn parse_header(cursor: &mut TokenCursor) -> Result<SurfaceHeader> {
    let mut b = [0.0; 6];
    for v in &mut b {
        *v = cursor.number()?;
    }
    let bounds = Aabb3::new(dvec3(b[0], b[2], b[4]), dvec3(b[1], b[3], b[5]));

    let (mut s_precision, mut t_precision) = (DEFAULT_PRECISION, DEFAULT_PRECISION);
    if cursor.at_word("PRECISION") {
        cursor.expect_word("PRECISION")?;
        cursor.expect_label("S")?;
        s_precision = clamp_precision(cursor.integer()?);
        cursor.expect_label("T")?;
        t_precision = clamp_precision(cursor.integer()?);
    }

    cursor.expect_word("CONTACT")?;
    cursor.expect_word("POINT")?;
    let contact = point(cursor.labelled_xyz()?);
    cursor.expect_word("END")?;
    cursor.expect_word("POINT")?;
    let end = point(cursor.labelled_xyz()?);
    cursor.expect_word("HEADING")?;
    let heading = point(cursor.labelled_xyz()?);
    cursor.expect_word("UP")?;
    let up = point(cursor.labelled_xyz()?);
    cursor.expect_label("SIZE")?;
    let size = cursor.number()?;

    let frame = Frame::from_heading_up(contact, heading, up, size)?;
    Ok(SurfaceHeader {
        bounds,
        s_precision,
        t_precision,
        frame,
        end_point: frame.to_local(end),
    })
}

/// Parse one patch block. Control points are mapped into the surface frame.
pub fn get_patch(cursor: &mut TokenCursor, frame: &Frame, basis: Basis) -> Result<Patch> {
    let line = cursor.line();
    let name = cursor.word("a patch name")?;

    cursor.expect_word("TOP")?;
    cursor.expect_label("COLOR")?;
    let top_colour = colour_index(cursor)?;
    cursor.expect_label("DIFFUSE")?;
    let top_diffuse = cursor.number()?;
    cursor.expect_word("BOTTOM")?;
    cursor.expect_label("COLOR")?;
    let bottom_colour = colour_index(cursor)?;
    cursor.expect_label("DIFFUSE")?;
    let bottom_diffuse = cursor.number()?;

    let mut neighbours = Vec::with_capacity(8);
    for dir in Direction::ALL {
        cursor.expect_label(dir.label())?;
        neighbours.push((dir, cursor.word("a neighbour name")?));
    }

    let mut control = [[Point3::ZERO; 4]; 4];
    for row in &mut control {
        for p in row.iter_mut() {
            let raw = dvec3(cursor.number()?, cursor.number()?, cursor.number()?);
            *p = frame.to_local(raw);
        }
    }

    let mut patch = Patch::new(&name, basis, control).map_err(|e| PfgError::parse(line, e.to_string()))?;
    patch.colours = PatchColours {
        top_colour,
        top_diffuse,
        bottom_colour,
        bottom_diffuse,
    };
    for (dir, n) in neighbours {
        patch.set_neighbor(dir, &n);
    }
    Ok(patch)
}

pub fn read_surface(source: &str, id: u8, library: &mut SurfaceLibrary) -> Result<LoadOutcome> {
    read_surface_with(source, id, library, ReadOptions::default())
}

/// Load one surface.
///
/// Recoverable problems yield [`LoadOutcome::Skipped`]. More patches than the
/// library's `max_patches` is a [`PfgError::Capacity`] error.
pub fn read_surface_with(
    source: &str,
    id: u8,
    library: &mut SurfaceLibrary,
    options: ReadOptions,
) -> Result<LoadOutcome> {
    if !library.has_surface_capacity() {
        return Ok(skipped(id, "too many surfaces"));
    }
    if library.is_identifier_used(id) {
        return Ok(skipped(id, format!("identifier '{}' already used", id as char)));
    }

    let mut cursor = TokenCursor::new(source);
    let header = match parse_header(&mut cursor) {
        Ok(h) => h,
        Err(e) => return Ok(skipped(id, format!("bad header: {e}"))),
    };
    let mut surface = Surface::new(id, header);
    surface.texture = options.texture;
    debug!(
        "surface '{}' precision {}x{}",
        id as char, surface.header.s_precision, surface.header.t_precision
    );

    let max_patches = library.limits().max_patches;
    let mut patches: Vec<Patch> = Vec::new();
    while !cursor.is_at_end() {
        if let Some(max) = max_patches {
            if patches.len() >= max {
                return Err(PfgError::Capacity(format!(
                    "surface '{}' declares more than {max} patches",
                    id as char
                )));
            }
        }
        match get_patch(&mut cursor, &surface.header.frame, options.basis) {
            Ok(mut patch) => {
                // evaluated before the neighbour check; a rejected surface discards this work
                patch.evaluate(&surface.steps);
                patches.push(patch);
            }
            Err(e) => {
                warn!("surface '{}': patch dropped: {e}", id as char);
                break;
            }
        }
    }
    if patches.is_empty() {
        return Ok(skipped(id, "no patches"));
    }

    match library.insert_surface(surface, patches) {
        Ok(id) => Ok(LoadOutcome::Loaded(id)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => Ok(skipped(id, e.to_string())),
    }
}

/// Read a patch file from disk.
pub fn read_surface_file(path: impl AsRef<Path>, id: u8, library: &mut SurfaceLibrary) -> Result<LoadOutcome> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let outcome = read_surface(&source, id, library)?;
    if outcome.is_loaded() {
        debug!("read {} as surface '{}'", path.display(), id as char);
    }
    Ok(outcome)
}
