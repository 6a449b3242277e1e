//! 2D geometry operations
//!
//! Point containment, distances and overlap tests used by the navmesh
//! indices, the raycaster and the agent steering code. All functions work in
//! the navigation plane (x, y).

use glam::Vec2;

use crate::cross_2d;

/// Barycentric tolerance for point-in-triangle tests
pub const BARYCENTRIC_EPSILON: f32 = 1e-6;

/// Checks if a point is inside (or on the boundary of) a triangle.
///
/// Works for either winding. Degenerate triangles contain nothing.
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let det = cross_2d(v0, v1);
    if det.abs() < f32::EPSILON {
        return false;
    }
    let inv_det = 1.0 / det;
    let s = cross_2d(v2, v1) * inv_det;
    let t = cross_2d(v0, v2) * inv_det;
    s >= -BARYCENTRIC_EPSILON && t >= -BARYCENTRIC_EPSILON && s + t <= 1.0 + BARYCENTRIC_EPSILON
}

/// Unsigned area of a triangle
#[inline]
pub fn triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (cross_2d(b - a, c - a) * 0.5).abs()
}

/// Checks if a point is inside a convex polygon of either winding
pub fn point_in_convex_polygon(p: Vec2, points: &[Vec2]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let c = cross_2d(b - a, p - a);
        if c.abs() <= BARYCENTRIC_EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    true
}

/// Even-odd point in polygon test for arbitrary simple polygons
pub fn point_in_polygon(p: Vec2, points: &[Vec2]) -> bool {
    let mut inside = false;
    let n = points.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let pi = points[i];
        let pj = points[j];
        if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Squared distance from a point to the segment a-b
pub fn distance_point_segment_squared(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance_squared(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance_squared(a + ab * t)
}

/// Distance from a point to the segment a-b
#[inline]
pub fn distance_point_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    distance_point_segment_squared(p, a, b).sqrt()
}

/// Distance from a point to the infinite line through a and b
pub fn distance_point_line(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len = ab.length();
    if len <= f32::EPSILON {
        return p.distance(a);
    }
    cross_2d(ab, p - a).abs() / len
}

/// Checks whether segments p1-p2 and q1-q2 intersect (touching counts)
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = cross_2d(q2 - q1, p1 - q1);
    let d2 = cross_2d(q2 - q1, p2 - q1);
    let d3 = cross_2d(p2 - p1, q1 - p1);
    let d4 = cross_2d(p2 - p1, q2 - p1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |a: Vec2, b: Vec2, p: Vec2| {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    };

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Check if two axis-aligned rectangles overlap
#[inline]
pub fn overlap_rect(amin: Vec2, amax: Vec2, bmin: Vec2, bmax: Vec2) -> bool {
    amin.x <= bmax.x && amax.x >= bmin.x && amin.y <= bmax.y && amax.y >= bmin.y
}

/// Tests a closed polygon (any winding, may be concave) against an
/// axis-aligned rectangle.
pub fn polygon_rect_overlap(points: &[Vec2], rmin: Vec2, rmax: Vec2) -> bool {
    if points.is_empty() {
        return false;
    }
    let (pmin, pmax) = points.iter().fold(
        (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    if !overlap_rect(pmin, pmax, rmin, rmax) {
        return false;
    }

    // A polygon vertex inside the rectangle
    if points
        .iter()
        .any(|p| p.x >= rmin.x && p.x <= rmax.x && p.y >= rmin.y && p.y <= rmax.y)
    {
        return true;
    }

    // The rectangle fully inside the polygon
    if point_in_polygon((rmin + rmax) * 0.5, points) {
        return true;
    }

    let corners = [
        rmin,
        Vec2::new(rmax.x, rmin.y),
        rmax,
        Vec2::new(rmin.x, rmax.y),
    ];
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        for j in 0..4 {
            if segments_intersect(a, b, corners[j], corners[(j + 1) % 4]) {
                return true;
            }
        }
    }

    false
}

/// Tests a triangle against an axis-aligned rectangle
#[inline]
pub fn triangle_rect_overlap(a: Vec2, b: Vec2, c: Vec2, rmin: Vec2, rmax: Vec2) -> bool {
    polygon_rect_overlap(&[a, b, c], rmin, rmax)
}

/// Uniformly distributed point inside a triangle from two unit samples
pub fn random_point_in_triangle(a: Vec2, b: Vec2, c: Vec2, u: f32, v: f32) -> Vec2 {
    let (mut u, mut v) = (u, v);
    if u + v > 1.0 {
        u = 1.0 - u;
        v = 1.0 - v;
    }
    a + (b - a) * u + (c - a) * v
}
