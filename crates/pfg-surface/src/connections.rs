use pfg_core::traits::Validate;
use pfg_core::{PfgError, Result};
use slotmap::SlotMap;

use crate::types::{Direction, Patch, PatchId};

/// The patches of one surface, borrowed from the library arena.
pub struct SurfacePatches<'a> {
    pub arena: &'a SlotMap<PatchId, Patch>,
    pub ids: &'a [PatchId],
}

impl Validate for SurfacePatches<'_> {
    fn validate(&self) -> Result<()> {
        check_connections(self.arena, self.ids)
    }
}

/// Resolve neighbour names to patch ids within one surface.
///
/// Names that match no patch stay unresolved; [`check_connections`] reports them.
pub fn resolve_links(arena: &mut SlotMap<PatchId, Patch>, ids: &[PatchId]) {
    let by_name: Vec<(String, PatchId)> = ids
        .iter()
        .filter_map(|&id| arena.get(id).map(|p| (p.name.clone(), id)))
        .collect();
    for &id in ids {
        let Some(patch) = arena.get_mut(id) else { continue };
        for link in &mut patch.neighbors {
            link.target = link
                .name
                .as_deref()
                .and_then(|n| by_name.iter().find(|(name, _)| name == n).map(|&(_, pid)| pid));
        }
    }
}

/// Every declared neighbour must exist and must name this patch back in the
/// opposite direction.
pub fn check_connections(arena: &SlotMap<PatchId, Patch>, ids: &[PatchId]) -> Result<()> {
    for &id in ids {
        let patch = arena
            .get(id)
            .ok_or_else(|| PfgError::Topology(format!("patch {id:?} does not exist")))?;

        for dir in Direction::ALL {
            let link = patch.neighbor(dir);
            let Some(name) = link.name.as_deref() else { continue };

            let neighbor = link.target.and_then(|t| arena.get(t)).ok_or_else(|| {
                PfgError::Topology(format!(
                    "patch '{}': {} neighbour '{}' does not exist",
                    patch.name, dir, name
                ))
            })?;

            let back = neighbor.neighbor(dir.opposite());
            if back.name.as_deref() != Some(patch.name.as_str()) {
                return Err(PfgError::Topology(format!(
                    "patch '{}' names '{}' as {} neighbour, but '{}' has {} = '{}'",
                    patch.name,
                    name,
                    dir,
                    neighbor.name,
                    dir.opposite(),
                    back.name.as_deref().unwrap_or("~")
                )));
            }
        }
    }
    Ok(())
}
