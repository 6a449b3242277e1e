//! Line-of-sight tracing by walking triangle adjacency
//!
//! The walk starts in the triangle containing the start point and follows
//! the neighbor link across whichever edge the segment leaves through. In the
//! first triangle the exit edge is the one opposite the vertex lying alone on
//! its side of the ray. Afterwards the entry edge is known, so one side test
//! on the remaining apex vertex picks the exit. Crossing into a boundary or a
//! blob triangle is a wall hit.

use glam::Vec2;
use trinav_common::{cross_2d, is_to_right};

use crate::nav_mesh::{NavMesh, TriId};
use crate::raycast_hit::{RaycastHit, RaycastResult};

/// Maximum triangles visited by one raycast
pub const MAX_RAYCAST_STEPS: usize = 5000;

enum TraceEnd {
    Reached(TriId),
    Hit { tri: TriId, edge: usize },
    Capped(TriId),
    Stalled(TriId),
}

impl NavMesh {
    /// Picks the exit edge of the first triangle of a walk
    fn first_exit_edge(&self, t: TriId, start: Vec2, end: Vec2) -> usize {
        let [a, b, c] = self.triangle_points(t);
        // Side tests assume counter-clockwise triangles; flip for clockwise ones
        let flip = cross_2d(b - a, c - a) < 0.0;
        let c0 = is_to_right(start, end, a) != flip;
        let c1 = is_to_right(start, end, b) != flip;
        let c2 = is_to_right(start, end, c) != flip;

        if c0 != c1 && c0 != c2 {
            if c0 { 0 } else { 2 }
        } else if c1 != c0 && c1 != c2 {
            if c1 { 1 } else { 0 }
        } else if c2 {
            2
        } else {
            1
        }
    }

    fn trace<F>(
        &self,
        start: Vec2,
        end: Vec2,
        start_tri: TriId,
        end_tri: Option<TriId>,
        mut visit: F,
    ) -> TraceEnd
    where
        F: FnMut(TriId),
    {
        let mut current = start_tri;
        let mut previous: Option<TriId> = None;
        visit(current);

        for _ in 0..MAX_RAYCAST_STEPS {
            match end_tri {
                Some(e) if e == current => return TraceEnd::Reached(current),
                None if self.point_in_triangle(end, current) => return TraceEnd::Reached(current),
                _ => {}
            }

            let exit = match previous {
                None => Some(self.first_exit_edge(current, start, end)),
                Some(prev) => {
                    let entry = self
                        .triangle_neighbors(current)
                        .iter()
                        .position(|&n| n == prev as i32);
                    entry.map(|i| {
                        let pts = self.triangle_points(current);
                        let entry2 = pts[(i + 1) % 3];
                        let apex = pts[(i + 2) % 3];
                        if is_to_right(start, end, apex) != is_to_right(start, end, entry2) {
                            (i + 1) % 3
                        } else {
                            (i + 2) % 3
                        }
                    })
                }
            };
            let Some(exit) = exit else {
                return TraceEnd::Stalled(current);
            };

            match self.triangle_neighbor(current, exit) {
                Some(next) if self.is_walkable_triangle(next) => {
                    previous = Some(current);
                    current = next;
                    visit(current);
                }
                _ => return TraceEnd::Hit { tri: current, edge: exit },
            }
        }

        log::warn!(
            "Raycast from ({:.1}, {:.1}) to ({:.1}, {:.1}) exceeded {} steps",
            start.x,
            start.y,
            end.x,
            end.y,
            MAX_RAYCAST_STEPS
        );
        TraceEnd::Capped(current)
    }

    fn resolve_trace(&self, start: Vec2, outcome: TraceEnd) -> RaycastResult {
        match outcome {
            TraceEnd::Reached(tri) => RaycastResult {
                hit: None,
                last_tri: Some(tri),
                partial: false,
            },
            TraceEnd::Hit { tri, edge } => {
                let verts = self.triangle(tri);
                let (va, vb) = (verts[edge], verts[(edge + 1) % 3]);
                RaycastResult {
                    hit: Some(RaycastHit {
                        edge_start: self.vertex(va),
                        edge_end: self.vertex(vb),
                        edge_verts: Some([va, vb]),
                        triangle: Some(tri),
                        blocking_tri: self.triangle_neighbor(tri, edge),
                    }),
                    last_tri: Some(tri),
                    partial: false,
                }
            }
            TraceEnd::Capped(tri) => RaycastResult {
                hit: None,
                last_tri: Some(tri),
                partial: true,
            },
            TraceEnd::Stalled(tri) => {
                log::debug!(
                    "Raycast from ({:.1}, {:.1}) lost its entry edge in triangle {}",
                    start.x,
                    start.y,
                    tri
                );
                RaycastResult {
                    hit: None,
                    last_tri: Some(tri),
                    partial: true,
                }
            }
        }
    }

    fn raycast_start(&self, start: Vec2, start_tri: Option<TriId>) -> Option<TriId> {
        let tri = match start_tri {
            Some(t) => t,
            None => self.get_triangle_from_point(start)?,
        };
        self.is_walkable_triangle(tri).then_some(tri)
    }

    /// Traces `start -> end`, appending every visited triangle to `corridor`.
    ///
    /// `corridor` is cleared first and stays empty when the start point is
    /// off the walkable mesh, which is reported as a hit at `start`.
    pub fn raycast_corridor(
        &self,
        start: Vec2,
        end: Vec2,
        start_tri: Option<TriId>,
        end_tri: Option<TriId>,
        corridor: &mut Vec<TriId>,
    ) -> RaycastResult {
        corridor.clear();
        let Some(first) = self.raycast_start(start, start_tri) else {
            return RaycastResult {
                hit: Some(RaycastHit::off_mesh(start)),
                last_tri: None,
                partial: false,
            };
        };
        let outcome = self.trace(start, end, first, end_tri, |t| corridor.push(t));
        self.resolve_trace(start, outcome)
    }

    /// Traces `start -> end` and reports only the hit
    pub fn raycast_point(
        &self,
        start: Vec2,
        end: Vec2,
        start_tri: Option<TriId>,
        end_tri: Option<TriId>,
    ) -> RaycastResult {
        let Some(first) = self.raycast_start(start, start_tri) else {
            return RaycastResult {
                hit: Some(RaycastHit::off_mesh(start)),
                last_tri: None,
                partial: false,
            };
        };
        let outcome = self.trace(start, end, first, end_tri, |_| {});
        self.resolve_trace(start, outcome)
    }
}
