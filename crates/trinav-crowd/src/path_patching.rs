//! Local corridor repair
//!
//! When an agent loses sight of its next corner (it was pushed aside, cut a
//! corner or slid along a wall) the corridor usually only needs a local fix.
//! Two repairs are tried before the caller falls back to a full corridor
//! search:
//!
//! 1. **Miter repair** for obstacles: the blocking edge endpoint nearest to
//!    the planned segment is pushed out along its bisector and spliced in as
//!    a new corner, provided the agent sees it and it sees the old corner.
//! 2. **Intersection repair**: the line from the last point the corner was
//!    visible from to the corner is intersected with the line through the
//!    agent parallel to the blocking edge; the intersection becomes the new
//!    corner when both legs are clear.
//!
//! Either way the triangles walked by the verifying raycasts are turned into
//! polygons and spliced onto the corridor where it reaches the old corner.

use glam::Vec2;
use trinav::{NavMesh, PolyId, RaycastHit, TriId};
use trinav_common::{cross_2d, distance_point_segment_squared};

use crate::agent::Agent;

/// Maximum |cos| between the planned segment and the blocking edge for the
/// intersection repair
const MAX_EDGE_ALIGNMENT: f32 = 0.8;

/// Reroute points further than this factor times the corner distance are rejected
const MAX_REROUTE_DISTANCE_FACTOR: f32 = 1.5;

/// Intersection of the line `last_visible -> corner` with the line through
/// `position` along `edge_dir`.
///
/// `None` when the lines are (nearly) parallel, the segment runs along the
/// edge, or the point is more than 1.5x the corner distance away.
pub fn path_patch_intersection(
    last_visible: Vec2,
    corner: Vec2,
    position: Vec2,
    edge_dir: Vec2,
) -> Option<Vec2> {
    let dir = (corner - last_visible).normalize_or_zero();
    let edge_dir = edge_dir.normalize_or_zero();
    if dir.dot(edge_dir).abs() > MAX_EDGE_ALIGNMENT {
        return None;
    }
    let denom = cross_2d(dir, edge_dir);
    if denom.abs() <= 1e-6 {
        return None;
    }
    let t = cross_2d(position - last_visible, edge_dir) / denom;
    let reroute = last_visible + dir * t;

    let max_dist_sq = position.distance_squared(corner)
        * MAX_REROUTE_DISTANCE_FACTOR
        * MAX_REROUTE_DISTANCE_FACTOR;
    (position.distance_squared(reroute) <= max_dist_sq).then_some(reroute)
}

/// Appends the polygons of `tris` to `out`, skipping consecutive repeats
fn push_tri_polys(mesh: &NavMesh, tris: &[TriId], out: &mut Vec<PolyId>) {
    for poly in tris.iter().filter_map(|&t| mesh.triangle_to_polygon(t)) {
        if out.last() != Some(&poly) {
            out.push(poly);
        }
    }
}

/// Builds `agent_leg ++ second_leg ++ corridor[join..]` as polygons into
/// `out`, where `join` is the first corridor entry equal to the polygon the
/// second leg ends in.
///
/// Returns `false`, leaving `out` unspecified, when the second leg is empty
/// or its last polygon is not part of `corridor`.
pub fn merge_corridors(
    mesh: &NavMesh,
    agent_leg: &[TriId],
    second_leg: &[TriId],
    corridor: &[PolyId],
    out: &mut Vec<PolyId>,
) -> bool {
    let Some(join_poly) = second_leg
        .last()
        .and_then(|&t| mesh.triangle_to_polygon(t))
    else {
        return false;
    };
    let Some(join) = corridor.iter().position(|&p| p == join_poly) else {
        log::debug!("merge_corridors: join polygon {join_poly} not in corridor");
        return false;
    };

    out.clear();
    push_tri_polys(mesh, agent_leg, out);
    push_tri_polys(mesh, second_leg, out);
    for &poly in &corridor[join..] {
        if out.last() != Some(&poly) {
            out.push(poly);
        }
    }
    true
}

/// Raycast-driven corridor shortcuts and repairs with reusable scratch
#[derive(Debug, Default)]
pub struct PathPatcher {
    agent_leg: Vec<TriId>,
    second_leg: Vec<TriId>,
    merged: Vec<PolyId>,
}

impl PathPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raycasts from the agent to `target`.
    ///
    /// A clear ray replaces the corridor up to the target polygon with the
    /// walked polygons and marks the agent's position as the last point the
    /// corner was visible from. A blocked ray tries [`Self::patch`].
    /// Returns whether the corridor now leads to `target`.
    pub fn raycast_and_patch_corridor(
        &mut self,
        mesh: &NavMesh,
        agent: &mut Agent,
        target: Vec2,
        target_tri: Option<TriId>,
        corner_offset: f32,
    ) -> bool {
        let result = mesh.raycast_corridor(
            agent.position,
            target,
            agent.current_tri,
            target_tri,
            &mut self.agent_leg,
        );
        if let Some(hit) = result.hit {
            return self.patch(mesh, agent, &hit, corner_offset);
        }
        if result.partial {
            log::debug!(
                "agent {}: raycast to ({:.2}, {:.2}) stopped early, corridor left as is",
                agent.id,
                target.x,
                target.y
            );
            return false;
        }

        self.merged.clear();
        push_tri_polys(mesh, &self.agent_leg, &mut self.merged);
        if self.merged.is_empty() {
            return false;
        }
        agent.last_visible_point = agent.position;

        let target_poly = target_tri
            .and_then(|t| mesh.triangle_to_polygon(t))
            .or_else(|| self.merged.last().copied());
        if let Some(idx) = target_poly.and_then(|p| agent.corridor.iter().position(|&c| c == p)) {
            for &poly in &agent.corridor[idx + 1..] {
                if self.merged.last() != Some(&poly) {
                    self.merged.push(poly);
                }
            }
        }
        std::mem::swap(&mut agent.corridor, &mut self.merged);
        true
    }

    /// Repairs the agent's corners and corridor around `hit`, the wall that
    /// blocked the view of its next corner.
    ///
    /// Returns `false` when no local repair works; the agent is then left
    /// untouched and needs a full corridor search.
    pub fn patch(
        &mut self,
        mesh: &NavMesh,
        agent: &mut Agent,
        hit: &RaycastHit,
        corner_offset: f32,
    ) -> bool {
        let Some(edge_verts) = hit.edge_verts else {
            return false;
        };
        if self.try_miter(mesh, agent, hit, edge_verts, corner_offset) {
            log::debug!("agent {}: corridor repaired around obstacle corner", agent.id);
            return true;
        }
        if self.try_intersection(mesh, agent, hit) {
            log::debug!("agent {}: corridor repaired through reroute point", agent.id);
            return true;
        }
        false
    }

    fn try_miter(
        &mut self,
        mesh: &NavMesh,
        agent: &mut Agent,
        hit: &RaycastHit,
        edge_verts: [u32; 2],
        corner_offset: f32,
    ) -> bool {
        let Some(blob) = hit
            .blocking_tri
            .and_then(|t| mesh.triangle_to_polygon(t))
            .filter(|&p| !mesh.is_walkable_polygon(p))
        else {
            return false;
        };

        let d1 = distance_point_segment_squared(hit.edge_start, agent.last_visible_point, agent.next_corner);
        let d2 = distance_point_segment_squared(hit.edge_end, agent.last_visible_point, agent.next_corner);
        let (point, vertex) = if d1 < d2 {
            (hit.edge_start, edge_verts[0])
        } else {
            (hit.edge_end, edge_verts[1])
        };

        let Some(offset) = mesh.compute_corner_miter_offset(blob, vertex, point, corner_offset) else {
            return false;
        };
        let Some(offset_tri) = mesh.get_triangle_from_point(offset) else {
            return false;
        };
        let to_offset = mesh.raycast_corridor(
            agent.position,
            offset,
            agent.current_tri,
            Some(offset_tri),
            &mut self.agent_leg,
        );
        if !to_offset.is_clear() {
            return false;
        }

        if agent.num_valid_corners >= 2 {
            let to_corner2 = mesh.raycast_corridor(
                offset,
                agent.next_corner2,
                Some(offset_tri),
                agent.next_corner2_tri,
                &mut self.second_leg,
            );
            if to_corner2.is_clear() && self.merge_into(mesh, agent) {
                agent.next_corner = offset;
                agent.next_corner_tri = Some(offset_tri);
                return true;
            }
        }

        let to_corner = mesh.raycast_corridor(
            offset,
            agent.next_corner,
            Some(offset_tri),
            agent.next_corner_tri,
            &mut self.second_leg,
        );
        if to_corner.is_clear() && self.merge_into(mesh, agent) {
            self.push_corner(agent, offset, offset_tri);
            return true;
        }
        false
    }

    fn try_intersection(&mut self, mesh: &NavMesh, agent: &mut Agent, hit: &RaycastHit) -> bool {
        let Some(reroute) = path_patch_intersection(
            agent.last_visible_point,
            agent.next_corner,
            agent.position,
            hit.edge_dir(),
        ) else {
            return false;
        };
        let Some(reroute_tri) = mesh.get_triangle_from_point(reroute) else {
            return false;
        };

        let to_reroute = mesh.raycast_corridor(
            agent.position,
            reroute,
            agent.current_tri,
            Some(reroute_tri),
            &mut self.agent_leg,
        );
        if !to_reroute.is_clear() {
            return false;
        }
        let to_corner = mesh.raycast_corridor(
            reroute,
            agent.next_corner,
            Some(reroute_tri),
            agent.next_corner_tri,
            &mut self.second_leg,
        );
        if !to_corner.is_clear() || !self.merge_into(mesh, agent) {
            return false;
        }
        self.push_corner(agent, reroute, reroute_tri);
        true
    }

    /// Splices both raycast legs into the agent's corridor
    fn merge_into(&mut self, mesh: &NavMesh, agent: &mut Agent) -> bool {
        if !merge_corridors(mesh, &self.agent_leg, &self.second_leg, &agent.corridor, &mut self.merged) {
            return false;
        }
        std::mem::swap(&mut agent.corridor, &mut self.merged);
        true
    }

    /// Inserts `corner` in front of the current next corner
    fn push_corner(&self, agent: &mut Agent, corner: Vec2, tri: TriId) {
        agent.next_corner2 = agent.next_corner;
        agent.next_corner2_tri = agent.next_corner_tri;
        agent.next_corner = corner;
        agent.next_corner_tri = Some(tri);
        agent.num_valid_corners = 2;
    }
}
