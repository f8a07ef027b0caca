//! Shared-boundary normal averaging between neighbouring patches.

use std::collections::{HashMap, HashSet};

use pfg_core::Tolerance;
use pfg_geometry::evaluate::unit_or_degenerate;
use pfg_math::Vector3;
use slotmap::SlotMap;

use crate::types::{Direction, Patch, PatchId};

type SampleRef = (PatchId, (usize, usize));

fn normal_of(arena: &SlotMap<PatchId, Patch>, (id, (s, t)): SampleRef) -> Option<Vector3> {
    arena.get(id)?.grid().map(|g| g.sample(s, t).normal)
}

fn set_normal(arena: &mut SlotMap<PatchId, Patch>, (id, (s, t)): SampleRef, n: Vector3) {
    if let Some(grid) = arena.get_mut(id).and_then(|p| p.grid.as_mut()) {
        grid.sample_mut(s, t).normal = n;
    }
}

fn precision(arena: &SlotMap<PatchId, Patch>, id: PatchId) -> Option<(usize, usize)> {
    let g = arena.get(id)?.grid()?;
    Some((g.s_precision(), g.t_precision()))
}

/// Average the normals along every resolved, not yet averaged neighbour link
/// so both patches hold the same value on their common boundary.
///
/// Edge links average the whole shared row or column; diagonal links average
/// the single shared corner. Corners touched by more than two patches are
/// reconciled afterwards so every copy is identical.
pub fn calculate_neighbouring_vertex_normals(arena: &mut SlotMap<PatchId, Patch>, ids: &[PatchId]) {
    let tol = Tolerance::default();

    for &id in ids {
        for dir in Direction::ALL {
            let Some(link) = arena.get(id).map(|p| p.neighbor(dir).clone()) else { continue };
            if link.averaged {
                continue;
            }
            let Some(other) = link.target else { continue };
            let (Some(here), Some(there)) = (precision(arena, id), precision(arena, other)) else {
                continue;
            };
            if here != there {
                log::warn!("neighbouring patches with different precision are not averaged");
                continue;
            }

            let pairs = dir.shared_samples(here.0, here.1);
            let averaged: Vec<_> = pairs
                .iter()
                .filter_map(|&(a, b)| {
                    let na = normal_of(arena, (id, a))?;
                    let nb = normal_of(arena, (other, b))?;
                    Some((a, b, unit_or_degenerate(na + nb, tol)))
                })
                .collect();
            for (a, b, n) in averaged {
                set_normal(arena, (id, a), n);
                set_normal(arena, (other, b), n);
            }

            arena[id].neighbor_mut(dir).averaged = true;
            arena[other].neighbor_mut(dir.opposite()).averaged = true;
        }
    }

    reconcile_corners(arena, ids, tol);
}

fn is_corner((s, t): (usize, usize), (sp, tp): (usize, usize)) -> bool {
    (s == 0 || s == sp) && (t == 0 || t == tp)
}

/// Group corner samples connected through any neighbour link and give every
/// member of a group the normalized sum of the group's normals.
fn reconcile_corners(arena: &mut SlotMap<PatchId, Patch>, ids: &[PatchId], tol: Tolerance) {
    let mut adjacency: HashMap<SampleRef, Vec<SampleRef>> = HashMap::new();
    for &id in ids {
        let Some(prec) = precision(arena, id) else { continue };
        for dir in Direction::ALL {
            let Some(other) = arena[id].neighbor(dir).target else { continue };
            if precision(arena, other) != Some(prec) {
                continue;
            }
            for (a, b) in dir.shared_samples(prec.0, prec.1) {
                if is_corner(a, prec) {
                    adjacency.entry((id, a)).or_default().push((other, b));
                    adjacency.entry((other, b)).or_default().push((id, a));
                }
            }
        }
    }

    let mut visited: HashSet<SampleRef> = HashSet::new();
    let mut starts: Vec<SampleRef> = adjacency.keys().copied().collect();
    starts.sort_by_key(|&(id, st)| (ids.iter().position(|&p| p == id), st));

    for start in starts {
        if !visited.insert(start) {
            continue;
        }
        let mut group = vec![start];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for &next in adjacency.get(&node).into_iter().flatten() {
                if visited.insert(next) {
                    group.push(next);
                    stack.push(next);
                }
            }
        }
        if group.len() < 3 {
            continue;
        }
        let sum: Vector3 = group.iter().filter_map(|&r| normal_of(arena, r)).sum();
        let n = unit_or_degenerate(sum, tol);
        for r in group {
            set_normal(arena, r, n);
        }
    }
}
