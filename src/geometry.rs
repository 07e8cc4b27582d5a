//! Planar joint geometry.
//!
//! [`try_angle`] returns `None` when a limb segment has zero length or an
//! input is non-finite. Exercise classifiers use it so a collapsed skeleton
//! moves no counter. The total [`angle`] falls back to [`DEGENERATE_ANGLE`]
//! instead. The axis-relative variants fall back to `0.0` (no deviation),
//! which never raises a posture issue.

use crate::landmark::Point2D;

/// Returned by [`angle`] when a limb segment has zero length.
pub const DEGENERATE_ANGLE: f32 = 180.0;

fn finite(points: &[Point2D]) -> bool {
    points.iter().all(|p| p.x.is_finite() && p.y.is_finite())
}

/// Interior angle at vertex `b` in degrees, always within `[0, 180]`.
pub fn angle(a: Point2D, b: Point2D, c: Point2D) -> f32 {
    try_angle(a, b, c).unwrap_or(DEGENERATE_ANGLE)
}

/// Like [`angle`], but `None` when the angle is undefined.
pub fn try_angle(a: Point2D, b: Point2D, c: Point2D) -> Option<f32> {
    if !finite(&[a, b, c]) || a == b || c == b {
        return None;
    }

    let to_c = (c.y as f64 - b.y as f64).atan2(c.x as f64 - b.x as f64);
    let to_a = (a.y as f64 - b.y as f64).atan2(a.x as f64 - b.x as f64);
    let mut degrees = (to_c - to_a).abs().to_degrees();
    if degrees > 180.0 {
        degrees = 360.0 - degrees;
    }
    Some(degrees.clamp(0.0, 180.0) as f32)
}

/// Deviation of the segment `from -> to` from the vertical axis, in `[0, 90]`.
///
/// The reference vector is "up" in image space, `(0, -1)`.
pub fn find_angle(from: Point2D, to: Point2D) -> f32 {
    if !finite(&[from, to]) {
        return 0.0;
    }
    let vx = to.x as f64 - from.x as f64;
    let vy = to.y as f64 - from.y as f64;
    let magnitude = (vx * vx + vy * vy).sqrt();
    if magnitude == 0.0 {
        return 0.0;
    }

    let cosine = (-vy / magnitude).clamp(-1.0, 1.0);
    let mut degrees = cosine.acos().to_degrees();
    if degrees > 90.0 {
        degrees = 180.0 - degrees;
    }
    degrees as f32
}

/// Deviation of the line through a symmetric pair from horizontal, in `[0, 90]`.
pub fn calculate_tilt(p1: Point2D, p2: Point2D) -> f32 {
    if !finite(&[p1, p2]) || p1 == p2 {
        return 0.0;
    }
    let dy = p2.y as f64 - p1.y as f64;
    let dx = p2.x as f64 - p1.x as f64;
    let mut degrees = dy.atan2(dx).to_degrees().abs();
    if degrees > 90.0 {
        degrees = 180.0 - degrees;
    }
    degrees.clamp(0.0, 90.0) as f32
}
