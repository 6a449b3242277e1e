//! Corner extraction from polygon corridors
//!
//! A corridor is turned into a list of portals: a zero-width portal at the
//! start point, the shared edge of every consecutive polygon pair (oriented
//! left/right for the direction of travel) and a zero-width portal at the
//! end point. The funnel sweep keeps an apex and two bounds that only ever
//! tighten. When one bound would cross the other, the crossed bound becomes
//! a corner and the sweep restarts from it.
//!
//! Corners lying on navmesh vertices can be pushed away from the obstacle
//! along the vertex bisector so agents do not graze wall corners.

use std::ops::ControlFlow;

use glam::Vec2;
use trinav_common::{cross_2d, points_equal, tri_area2};

use crate::nav_mesh::{NavMesh, PolyId, TriId, VertId};
use crate::status::{Result, Status};

/// Shared edge between two corridor polygons
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Portal {
    pub left: Vec2,
    pub right: Vec2,
    /// Navmesh vertex under `left`, if any
    pub left_vertex: Option<VertId>,
    /// Navmesh vertex under `right`, if any
    pub right_vertex: Option<VertId>,
}

impl Portal {
    /// Zero-width portal at a free point
    pub fn point(p: Vec2) -> Self {
        Self {
            left: p,
            right: p,
            left_vertex: None,
            right_vertex: None,
        }
    }
}

/// Corner of a full path preview
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub point: Vec2,
    pub poly: Option<PolyId>,
}

/// Up to two lookahead corners
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DualCorner {
    pub corner1: Vec2,
    pub tri1: Option<TriId>,
    pub vertex1: Option<VertId>,
    pub corner2: Vec2,
    pub tri2: Option<TriId>,
    pub vertex2: Option<VertId>,
    /// Number of valid corners (0, 1 or 2)
    pub num_valid: u8,
}

impl DualCorner {
    fn destination(end: Vec2, tri: Option<TriId>) -> Self {
        Self {
            corner1: end,
            tri1: tri,
            vertex1: None,
            corner2: end,
            tri2: tri,
            vertex2: None,
            num_valid: 1,
        }
    }
}

/// Runs the funnel over `portals`, calling `emit(point, portal_index, vertex)`
/// for every corner until it returns `Break`.
fn funnel<F>(portals: &[Portal], mut emit: F)
where
    F: FnMut(Vec2, usize, Option<VertId>) -> ControlFlow<()>,
{
    let Some(first) = portals.first() else {
        return;
    };
    let mut apex = first.left;
    let mut left = apex;
    let mut right = apex;
    let (mut left_index, mut right_index) = (0usize, 0usize);

    // Every restart moves the apex forward, so this bound is never reached on
    // well-formed corridors
    let max_steps = portals.len() * portals.len() + portals.len();
    let mut steps = 0;
    let mut i = 1;
    while i < portals.len() && steps < max_steps {
        steps += 1;
        let portal = &portals[i];

        if tri_area2(apex, right, portal.right) <= 0.0 {
            if points_equal(apex, right) || tri_area2(apex, left, portal.right) > 0.0 {
                right = portal.right;
                right_index = i;
            } else {
                if emit(left, left_index, portals[left_index].left_vertex).is_break() {
                    return;
                }
                apex = left;
                right = apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        if tri_area2(apex, left, portal.left) >= 0.0 {
            if points_equal(apex, left) || tri_area2(apex, right, portal.left) < 0.0 {
                left = portal.left;
                left_index = i;
            } else {
                if emit(right, right_index, portals[right_index].right_vertex).is_break() {
                    return;
                }
                apex = right;
                left = apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }

        i += 1;
    }
}

impl NavMesh {
    /// Portal from polygon `from` into its neighbor `to`
    pub fn polygon_portal(&self, from: PolyId, to: PolyId) -> Option<Portal> {
        let edge = self.shared_edge(from, to)?;
        let verts = self.poly_verts(from);
        let v1 = verts[edge];
        let v2 = verts[(edge + 1) % verts.len()];
        let (p1, p2) = (self.vertex(v1), self.vertex(v2));

        let travel = self.poly_centroid(to) - self.poly_centroid(from);
        if cross_2d(travel, p2 - p1) > 0.0 {
            Some(Portal {
                left: p2,
                right: p1,
                left_vertex: Some(v2),
                right_vertex: Some(v1),
            })
        } else {
            Some(Portal {
                left: p1,
                right: p2,
                left_vertex: Some(v1),
                right_vertex: Some(v2),
            })
        }
    }

    /// Fills `portals` for a current-first corridor from `start` to `end`
    pub fn build_portals(
        &self,
        corridor: &[PolyId],
        start: Vec2,
        end: Vec2,
        portals: &mut Vec<Portal>,
    ) -> Result<()> {
        portals.clear();
        portals.push(Portal::point(start));
        for pair in corridor.windows(2) {
            let Some(portal) = self.polygon_portal(pair[0], pair[1]) else {
                log::warn!("Corridor polygons {} and {} are not adjacent", pair[0], pair[1]);
                return Err(Status::InvalidParam);
            };
            portals.push(portal);
        }
        portals.push(Portal::point(end));
        Ok(())
    }

    /// Polygon that owns the corner found at `portal_index`
    fn corner_poly(corridor: &[PolyId], portal_index: usize) -> Option<PolyId> {
        match portal_index {
            0 => corridor.first().copied(),
            i => corridor.get(i - 1).copied(),
        }
    }

    /// Full taut path from `start` to `end`: start point, every corner, end point.
    ///
    /// Allocates; meant for path previews rather than per-tick steering.
    pub fn find_corners(&self, corridor: &[PolyId], start: Vec2, end: Vec2) -> Result<Vec<Corner>> {
        let Some(&first) = corridor.first() else {
            return Ok(vec![Corner {
                point: end,
                poly: None,
            }]);
        };
        let mut portals = Vec::with_capacity(corridor.len() + 1);
        self.build_portals(corridor, start, end, &mut portals)?;

        let mut path = vec![Corner {
            point: start,
            poly: Some(first),
        }];
        funnel(&portals, |point, index, _| {
            if points_equal(point, end) {
                return ControlFlow::Break(());
            }
            if path.last().is_some_and(|c| !points_equal(c.point, point)) {
                path.push(Corner {
                    point,
                    poly: Self::corner_poly(corridor, index),
                });
            }
            ControlFlow::Continue(())
        });
        if path.last().is_some_and(|c| !points_equal(c.point, end)) {
            path.push(Corner {
                point: end,
                poly: corridor.last().copied(),
            });
        }
        Ok(path)
    }

    /// Next one or two corners along a current-first corridor.
    ///
    /// With no turn left the destination is the only corner. A single real
    /// corner is followed by the destination as second corner. Corners on
    /// navmesh vertices are pushed out by `offset` (when positive).
    /// `portals` is scratch space reused between calls.
    pub fn find_next_corner(
        &self,
        pos: Vec2,
        corridor: &[PolyId],
        end: Vec2,
        offset: f32,
        portals: &mut Vec<Portal>,
    ) -> Result<DualCorner> {
        let last = match corridor {
            [] => return Ok(DualCorner::destination(end, None)),
            [only] => {
                let tri = self.get_triangle_from_poly_point(end, *only);
                return Ok(DualCorner::destination(end, tri));
            }
            [.., last] => *last,
        };

        self.build_portals(corridor, pos, end, portals)
            .map_err(|_| Status::CornerNotFound)?;

        let mut result = DualCorner::default();
        funnel(portals, |point, index, vertex| {
            // The end portal can surface as a crossed bound; it is not a turn
            if points_equal(point, end) {
                return ControlFlow::Break(());
            }
            if result.num_valid == 0 {
                if !points_equal(point, pos) {
                    result.corner1 = point;
                    result.vertex1 = vertex;
                    result.tri1 = Self::corner_poly(corridor, index)
                        .and_then(|poly| self.get_triangle_from_poly_point(point, poly));
                    result.num_valid = 1;
                }
            } else if !points_equal(point, result.corner1) {
                result.corner2 = point;
                result.vertex2 = vertex;
                result.tri2 = Self::corner_poly(corridor, index)
                    .and_then(|poly| self.get_triangle_from_poly_point(point, poly));
                result.num_valid = 2;
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });

        let end_tri = self.get_triangle_from_poly_point(end, last);
        match result.num_valid {
            0 => return Ok(DualCorner::destination(end, end_tri)),
            1 => {
                result.corner2 = end;
                result.tri2 = end_tri;
                result.vertex2 = None;
                result.num_valid = 2;
            }
            _ => {}
        }

        if offset > 0.0 {
            (result.corner1, result.tri1) =
                self.apply_corner_offset(result.corner1, result.vertex1, result.tri1, end, offset);
            (result.corner2, result.tri2) =
                self.apply_corner_offset(result.corner2, result.vertex2, result.tri2, end, offset);
        }
        Ok(result)
    }

    /// Pushes `point` (sitting on `vertex` of polygon `poly`) outwards along
    /// the vertex bisector by `offset`.
    ///
    /// The bisector is `normalize(B - A) + normalize(B - C)` for the polygon
    /// edges `A -> B -> C`, which points away from the polygon interior.
    pub fn compute_corner_miter_offset(
        &self,
        poly: PolyId,
        vertex: VertId,
        point: Vec2,
        offset: f32,
    ) -> Option<Vec2> {
        if poly >= self.polygon_count() {
            return None;
        }
        let verts = self.poly_verts(poly);
        let i = verts.iter().position(|&v| v == vertex)?;
        let a = self.vertex(verts[(i + verts.len() - 1) % verts.len()]);
        let c = self.vertex(verts[(i + 1) % verts.len()]);

        let miter = (point - a).normalize_or_zero() + (point - c).normalize_or_zero();
        if miter.length_squared() <= 1e-12 {
            return None;
        }
        Some(point + miter.normalize() * offset)
    }

    /// Blob polygon having `vertex` on its outline, searched near `point`
    pub fn blob_with_vertex(&self, vertex: VertId, point: Vec2) -> Option<PolyId> {
        self.blob_index()
            .query(point)
            .iter()
            .copied()
            .find(|&blob| self.poly_verts(blob).contains(&vertex))
    }

    /// Applies the miter offset to a lookahead corner and re-resolves its
    /// triangle. Corners off navmesh vertices and the destination itself are
    /// returned unchanged, as is a nudge that would leave the walkable mesh.
    pub fn apply_corner_offset(
        &self,
        point: Vec2,
        vertex: Option<VertId>,
        tri: Option<TriId>,
        end: Vec2,
        offset: f32,
    ) -> (Vec2, Option<TriId>) {
        let (Some(vertex), Some(tri)) = (vertex, tri) else {
            return (point, tri);
        };
        if offset <= 0.0 || points_equal(point, end) {
            return (point, Some(tri));
        }

        let Some(blob) = self.blob_with_vertex(vertex, point) else {
            log::trace!(
                "No blob owns corner vertex {} at ({:.3}, {:.3}); offset not applied",
                vertex,
                point.x,
                point.y
            );
            return (point, Some(tri));
        };
        let Some(moved) = self.compute_corner_miter_offset(blob, vertex, point, offset) else {
            return (point, Some(tri));
        };

        match self.is_point_in_navmesh(moved, Some(tri)) {
            Some(new_tri) => (moved, Some(new_tri)),
            None => {
                log::debug!(
                    "Offset corner ({:.3}, {:.3}) left the navmesh; keeping the vertex",
                    moved.x,
                    moved.y
                );
                (point, Some(tri))
            }
        }
    }
}
