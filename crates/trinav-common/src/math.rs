//! Scalar and 2D vector helpers

use glam::Vec2;

/// Tolerance used when comparing two points for equality
pub const POINT_EPSILON: f32 = 1e-6;

/// Calculates the cross product of two 2D vectors
#[inline]
pub fn cross_2d(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Twice the signed area of the triangle (p1, p2, p3).
///
/// Positive when p3 lies clockwise of p1->p2 in a y-down frame. The funnel
/// uses the sign only, so the scale does not matter.
#[inline]
pub fn tri_area2(p1: Vec2, p2: Vec2, p3: Vec2) -> f32 {
    let a = p2 - p1;
    let b = p3 - p1;
    b.x * a.y - a.x * b.y
}

/// Returns true if `p` lies strictly to the right of the directed line s->e
#[inline]
pub fn is_to_right(s: Vec2, e: Vec2, p: Vec2) -> bool {
    cross_2d(e - s, p - s) < 0.0
}

/// Checks whether two points coincide within [`POINT_EPSILON`]
#[inline]
pub fn points_equal(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() < POINT_EPSILON && (a.y - b.y).abs() < POINT_EPSILON
}

/// Square a value (x²)
#[inline]
pub fn sqr<T: std::ops::Mul<Output = T> + Copy>(x: T) -> T {
    x * x
}

/// Linear interpolation between two values
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Remaps `v` from [in_min, in_max] to [out_min, out_max], clamping the input
#[inline]
pub fn cvt(v: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let (lo, hi) = if in_min <= in_max {
        (in_min, in_max)
    } else {
        (in_max, in_min)
    };
    let v = v.clamp(lo, hi);
    if (in_max - in_min).abs() < f32::EPSILON {
        return out_min;
    }
    out_min + (v - in_min) * (out_max - out_min) / (in_max - in_min)
}

/// Element `index` of the Halton low-discrepancy sequence in `base`
pub fn halton(mut index: u32, base: u32) -> f32 {
    let mut f = 1.0f32;
    let mut r = 0.0f32;
    let b = base as f32;
    while index > 0 {
        f /= b;
        r += f * (index % base) as f32;
        index /= base;
    }
    r
}

/// Rotates `current` toward `target` by at most `max_step` radians.
///
/// Both directions are expected to be unit length; a zero target leaves the
/// current direction unchanged.
pub fn rotate_towards(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    if target.length_squared() < POINT_EPSILON {
        return current;
    }
    let from = current.y.atan2(current.x);
    let to = target.y.atan2(target.x);
    let mut delta = to - from;
    while delta > std::f32::consts::PI {
        delta -= std::f32::consts::TAU;
    }
    while delta < -std::f32::consts::PI {
        delta += std::f32::consts::TAU;
    }
    let angle = from + delta.clamp(-max_step, max_step);
    Vec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_and_side() {
        let s = Vec2::new(0.0, 0.0);
        let e = Vec2::new(1.0, 0.0);
        assert!(is_to_right(s, e, Vec2::new(0.5, -1.0)));
        assert!(!is_to_right(s, e, Vec2::new(0.5, 1.0)));
        assert!(!is_to_right(s, e, Vec2::new(2.0, 0.0)));
        assert_eq!(cross_2d(Vec2::X, Vec2::Y), 1.0);
    }

    #[test]
    fn test_tri_area2_sign() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        assert!(tri_area2(a, b, Vec2::new(0.0, 1.0)) < 0.0);
        assert!(tri_area2(a, b, Vec2::new(0.0, -1.0)) > 0.0);
        assert_eq!(tri_area2(a, b, Vec2::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn test_cvt_clamps() {
        assert_eq!(cvt(0.5, 0.0, 1.0, 1.0, 0.5), 0.75);
        assert_eq!(cvt(4.0, 0.0, 1.0, 1.0, 0.5), 0.5);
        assert_eq!(cvt(-1.0, 0.0, 1.0, 1.0, 0.5), 1.0);
    }

    #[test]
    fn test_halton() {
        assert_eq!(halton(1, 2), 0.5);
        assert_eq!(halton(2, 2), 0.25);
        assert!((halton(1, 3) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotate_towards_is_bounded() {
        let r = rotate_towards(Vec2::X, Vec2::Y, 0.1);
        let angle = r.y.atan2(r.x);
        assert!((angle - 0.1).abs() < 1e-5);

        let r = rotate_towards(Vec2::X, Vec2::Y, 10.0);
        assert!((r - Vec2::Y).length() < 1e-5);
    }
}
