//! Navigation mesh query
//!
//! [`NavMeshQuery`] owns the scratch buffers of the corridor search and the
//! funnel so repeated per-agent queries do not allocate. One query object is
//! meant to be reused for every agent of a frame.

use glam::Vec2;

use crate::nav_mesh::{NavMesh, PolyId, TriId};
use crate::path_corners::{DualCorner, Portal};
use crate::priority_queue::PriorityQueue;
use crate::raycast_hit::RaycastResult;
use crate::status::{Result, Status};

/// Maximum polygons expanded by one corridor search
pub const MAX_CORRIDOR_EXPANSIONS: usize = 100_000;

/// Default lateral distance from the straight line that is not penalized
pub const DEFAULT_PATH_FREE_WIDTH: f32 = 6.0;

/// Default multiplier of the straying penalty
pub const DEFAULT_PATH_STRAY_MULTIPLIER: f32 = 6.0;

const UNKNOWN: f32 = f32::MIN;

/// Heuristic shaping of the corridor search
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct CorridorSearchParams {
    /// Distance from the start-end line inside which no penalty applies
    pub free_width: f32,
    /// Weight of the penalty for straying further; 0 disables the bias
    pub stray_multiplier: f32,
}

impl Default for CorridorSearchParams {
    fn default() -> Self {
        Self {
            free_width: DEFAULT_PATH_FREE_WIDTH,
            stray_multiplier: DEFAULT_PATH_STRAY_MULTIPLIER,
        }
    }
}

/// Query object over a navigation mesh with reusable scratch space
#[derive(Debug)]
pub struct NavMeshQuery<'a> {
    nav_mesh: &'a NavMesh,
    open_list: PriorityQueue,
    came_from: Vec<i32>,
    g_score: Vec<f32>,
    heuristic: Vec<f32>,
    portals: Vec<Portal>,
    tri_corridor: Vec<TriId>,
    last_expansions: usize,
}

impl<'a> NavMeshQuery<'a> {
    /// Creates a query sized for the mesh
    pub fn new(nav_mesh: &'a NavMesh) -> Self {
        let walkable = nav_mesh.walkable_polygon_count() as usize;
        Self {
            nav_mesh,
            open_list: PriorityQueue::with_capacity(256),
            came_from: vec![-1; walkable],
            g_score: vec![UNKNOWN; walkable],
            heuristic: vec![UNKNOWN; walkable],
            portals: Vec::new(),
            tri_corridor: Vec::new(),
            last_expansions: 0,
        }
    }

    /// The mesh this query runs on
    pub fn nav_mesh(&self) -> &'a NavMesh {
        self.nav_mesh
    }

    /// Polygons expanded by the most recent corridor search
    pub fn last_expansions(&self) -> usize {
        self.last_expansions
    }

    /// Finds a polygon corridor from `start` to `end`, current polygon first.
    ///
    /// Missing polygon ids are resolved from the points. The heuristic is
    /// the centroid distance to the goal; for long searches it also
    /// penalizes straying from the straight start-end line and overshooting
    /// the destination, which favours natural-looking routes over the strict
    /// shortest centroid path.
    pub fn find_corridor(
        &mut self,
        start: Vec2,
        end: Vec2,
        start_poly: Option<PolyId>,
        end_poly: Option<PolyId>,
        params: &CorridorSearchParams,
    ) -> Result<Vec<PolyId>> {
        let mut corridor = Vec::new();
        self.find_corridor_into(start, end, start_poly, end_poly, params, &mut corridor)?;
        Ok(corridor)
    }

    /// [`Self::find_corridor`] writing into a caller-owned corridor.
    ///
    /// On failure `corridor` is left untouched.
    pub fn find_corridor_into(
        &mut self,
        start: Vec2,
        end: Vec2,
        start_poly: Option<PolyId>,
        end_poly: Option<PolyId>,
        params: &CorridorSearchParams,
        corridor: &mut Vec<PolyId>,
    ) -> Result<()> {
        let mesh = self.nav_mesh;
        self.last_expansions = 0;

        let start_poly = start_poly.or_else(|| mesh.get_polygon_from_point(start));
        let end_poly = end_poly.or_else(|| mesh.get_polygon_from_point(end));
        let (Some(start_poly), Some(end_poly)) = (start_poly, end_poly) else {
            log::error!("find_corridor: start or end is not on a polygon");
            return Err(Status::PathNotFound);
        };
        if !mesh.is_walkable_polygon(start_poly) || !mesh.is_walkable_polygon(end_poly) {
            log::error!("find_corridor: polygon {start_poly} or {end_poly} is not walkable");
            return Err(Status::PathNotFound);
        }

        if start_poly == end_poly {
            corridor.clear();
            corridor.push(start_poly);
            return Ok(());
        }

        self.open_list.clear();
        self.came_from.fill(-1);
        self.g_score.fill(UNKNOWN);
        self.heuristic.fill(UNKNOWN);

        let start_to_end = end - start;
        let line_len = start_to_end.length() + 1.0;
        let stray_mult = if line_len > params.free_width * 3.0 {
            params.stray_multiplier
        } else {
            0.0
        };
        let end_centroid = mesh.poly_centroid(end_poly);

        self.open_list.put(start_poly, start.distance(end));
        self.g_score[start_poly as usize] = 0.0;
        self.heuristic[start_poly as usize] = 0.0;

        while let Some(current) = self.open_list.get() {
            self.last_expansions += 1;
            if self.last_expansions > MAX_CORRIDOR_EXPANSIONS {
                log::error!(
                    "find_corridor: gave up after {MAX_CORRIDOR_EXPANSIONS} expansions"
                );
                return Err(Status::PathNotFound);
            }

            if current == end_poly {
                corridor.clear();
                let mut node = current as i32;
                while node >= 0 {
                    corridor.push(node as PolyId);
                    node = self.came_from[node as usize];
                }
                corridor.reverse();
                return Ok(());
            }

            let my_score = self.g_score[current as usize];
            let current_centroid = mesh.poly_centroid(current);

            for &neighbor in mesh.poly_neighbors(current) {
                if neighbor < 0 || !mesh.is_walkable_polygon(neighbor as PolyId) {
                    continue;
                }
                let n = neighbor as usize;
                let neighbor_centroid = mesh.poly_centroid(neighbor as PolyId);
                let tentative = my_score + current_centroid.distance(neighbor_centroid);

                let known = self.g_score[n] != UNKNOWN;
                if known && tentative >= self.g_score[n] {
                    continue;
                }
                self.came_from[n] = current as i32;
                self.g_score[n] = tentative;

                if self.heuristic[n] == UNKNOWN {
                    let mut h = neighbor_centroid.distance(end_centroid);
                    if stray_mult > 0.0 {
                        let to_neighbor = neighbor_centroid - start;
                        let dist_to_line = start_to_end.perp_dot(to_neighbor).abs() / line_len;
                        let along = to_neighbor.normalize_or_zero().dot(start_to_end) / line_len;
                        let stray = (dist_to_line - params.free_width).max(0.0)
                            * stray_mult
                            * (2.0 - along);
                        let backtrack = (end.distance(neighbor_centroid) - line_len).max(0.0);
                        h += stray + backtrack;
                    }
                    self.heuristic[n] = h;
                }

                let f = tentative + self.heuristic[n];
                if known {
                    self.open_list.update_priority(neighbor as PolyId, f);
                } else {
                    self.open_list.put(neighbor as PolyId, f);
                }
            }
        }

        log::error!(
            "find_corridor: no path from polygon {start_poly} to {end_poly} after {} expansions",
            self.last_expansions
        );
        Err(Status::PathNotFound)
    }

    /// [`NavMesh::find_next_corner`] using the query's portal scratch
    pub fn find_next_corner(
        &mut self,
        pos: Vec2,
        corridor: &[PolyId],
        end: Vec2,
        offset: f32,
    ) -> Result<DualCorner> {
        self.nav_mesh
            .find_next_corner(pos, corridor, end, offset, &mut self.portals)
    }

    /// [`NavMesh::raycast_corridor`] into the query's triangle scratch.
    ///
    /// The visited triangles stay readable through [`Self::raycast_triangles`]
    /// until the next call.
    pub fn raycast_corridor(
        &mut self,
        start: Vec2,
        end: Vec2,
        start_tri: Option<TriId>,
        end_tri: Option<TriId>,
    ) -> RaycastResult {
        self.nav_mesh
            .raycast_corridor(start, end, start_tri, end_tri, &mut self.tri_corridor)
    }

    /// Triangles visited by the last [`Self::raycast_corridor`]
    pub fn raycast_triangles(&self) -> &[TriId] {
        &self.tri_corridor
    }
}
