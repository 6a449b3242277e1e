//! Point location and random sampling over the navmesh
//!
//! All lookups go through the spatial indices built in [`NavMesh::new`]
//! and then confirm candidates with an exact point-in-triangle test.

use glam::Vec2;
use trinav_common::{point_in_convex_polygon, random_point_in_triangle};

use crate::nav_mesh::{NavMesh, PolyId, TriId};

/// Random probes tried by [`NavMesh::get_random_triangle`] before falling back
pub const RANDOM_TRIANGLE_ATTEMPTS: usize = 10;

/// Random probes tried by [`NavMesh::get_random_triangle_in_area`]
pub const RANDOM_AREA_ATTEMPTS: usize = 20;

impl NavMesh {
    fn check_walkable_triangle(&self, t: TriId, p: Vec2) -> bool {
        self.is_walkable_triangle(t) && self.point_in_triangle(p, t)
    }

    /// Returns the walkable triangle containing `p`, trying `hint` first
    pub fn is_point_in_navmesh(&self, p: Vec2, hint: Option<TriId>) -> Option<TriId> {
        if let Some(h) = hint.filter(|&h| self.is_walkable_triangle(h)) {
            if self.point_in_triangle(p, h) {
                return Some(h);
            }
            // Agents rarely move further than one triangle per tick
            for e in 0..3 {
                if let Some(n) = self.triangle_neighbor(h, e) {
                    if self.check_walkable_triangle(n, p) {
                        return Some(n);
                    }
                }
            }
        }
        self.triangle_index()
            .query(p)
            .iter()
            .copied()
            .find(|&t| self.check_walkable_triangle(t, p))
    }

    /// Walkable triangle containing `p`
    pub fn get_triangle_from_point(&self, p: Vec2) -> Option<TriId> {
        self.triangle_index()
            .query(p)
            .iter()
            .copied()
            .find(|&t| self.point_in_triangle(p, t))
    }

    /// Polygon (walkable or blob) containing `p`
    pub fn get_polygon_from_point(&self, p: Vec2) -> Option<PolyId> {
        self.polygon_index()
            .query(p)
            .iter()
            .copied()
            .find(|&poly| self.point_in_polygon(p, poly))
    }

    /// Blob polygon containing `p`
    pub fn get_blob_from_point(&self, p: Vec2) -> Option<PolyId> {
        self.blob_index()
            .query(p)
            .iter()
            .copied()
            .find(|&blob| self.point_in_polygon(p, blob))
    }

    /// Triangle of `poly` containing `p`
    pub fn get_triangle_from_poly_point(&self, p: Vec2, poly: PolyId) -> Option<TriId> {
        if poly >= self.polygon_count() {
            return None;
        }
        self.poly_tris(poly).find(|&t| self.point_in_triangle(p, t))
    }

    /// Checks `p` against the polygon outline with the convex winding test
    pub fn is_point_in_polygon(&self, p: Vec2, poly: PolyId) -> bool {
        poly < self.polygon_count() && point_in_convex_polygon(p, &self.poly_points(poly))
    }

    /// Picks a random walkable triangle.
    ///
    /// Probes random points over the triangle index bounds, which favours
    /// large triangles, then falls back to a uniform pick by id.
    pub fn get_random_triangle(&self, rng: &mut fastrand::Rng) -> Option<TriId> {
        let (min, max) = (self.triangle_index().min(), self.triangle_index().max());
        for _ in 0..RANDOM_TRIANGLE_ATTEMPTS {
            let p = min + Vec2::new(rng.f32(), rng.f32()) * (max - min);
            if let Some(t) = self.is_point_in_navmesh(p, None) {
                return Some(t);
            }
        }
        let count = self.walkable_triangle_count();
        (count > 0).then(|| rng.u32(0..count))
    }

    /// Picks a random walkable triangle within `cell_extents` index cells
    /// of `center`, falling back to the whole mesh.
    pub fn get_random_triangle_in_area(
        &self,
        rng: &mut fastrand::Rng,
        center: Vec2,
        cell_extents: u32,
    ) -> Option<TriId> {
        let index = self.triangle_index();
        let half_extent = Vec2::splat(cell_extents as f32 * index.cell_size());
        let min = (center - half_extent).max(index.min());
        let max = (center + half_extent).min(index.max());

        if min.x <= max.x && min.y <= max.y {
            for _ in 0..RANDOM_AREA_ATTEMPTS {
                let p = min + Vec2::new(rng.f32(), rng.f32()) * (max - min);
                if let Some(t) = self.is_point_in_navmesh(p, None) {
                    return Some(t);
                }
            }
            let candidates = index.query_area(min, max);
            if !candidates.is_empty() {
                return Some(candidates[rng.usize(0..candidates.len())]);
            }
        }

        self.get_random_triangle(rng)
    }

    /// Uniformly distributed point inside triangle `t`
    pub fn random_point_in_triangle(&self, rng: &mut fastrand::Rng, t: TriId) -> Vec2 {
        let [a, b, c] = self.triangle_points(t);
        random_point_in_triangle(a, b, c, rng.f32(), rng.f32())
    }
}
