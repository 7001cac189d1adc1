//! Joint-angle geometry

use formcoach_core::{FormError, FormResult};
use serde::{Deserialize, Serialize};

use crate::Point2;

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point2 {
        Point2::new(self.x as f64, self.y as f64)
    }
}

/// Angle in degrees between `p1 - reference` and `p2 - reference`
///
/// Uses the arc-cosine of the normalized dot product, clamped to `[-1, 1]` so
/// floating-point overshoot never leaves the domain. The result is rounded to
/// the nearest whole degree and always lies in `[0, 180]`.
///
/// Fails with [`FormError::InvalidGeometry`] when either vector has zero
/// length (coincident landmarks) or is not finite.
pub fn angle_between(p1: Point2, p2: Point2, reference: Point2) -> FormResult<i32> {
    let v1 = p1.relative_to(&reference);
    let v2 = p2.relative_to(&reference);

    if !v1.is_finite() || !v2.is_finite() {
        return Err(FormError::InvalidGeometry);
    }

    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 <= f64::EPSILON || n2 <= f64::EPSILON {
        return Err(FormError::InvalidGeometry);
    }

    let cos_theta = (v1.dot(&v2) / (n1 * n2)).clamp(-1.0, 1.0);
    let degrees = cos_theta.acos().to_degrees().round();

    Ok(degrees as i32)
}

/// [`angle_between`] anchored at the origin
pub fn angle_from_origin(p1: Point2, p2: Point2) -> FormResult<i32> {
    angle_between(p1, p2, Point2::ORIGIN)
}

/// Map a normalized `[0,1] x [0,1]` coordinate into frame pixels
///
/// Truncates toward zero. Total: out-of-range input maps outside the frame
/// rather than failing.
pub fn denormalize(coord: Point2, frame_width: u32, frame_height: u32) -> PixelPoint {
    PixelPoint {
        x: (coord.x * frame_width as f64) as i32,
        y: (coord.y * frame_height as f64) as i32,
    }
}

/// Point straight above `p` on the top edge of the frame
///
/// Image y grows downward, so `(p.x, 0)` marks the upward vertical through `p`.
#[inline]
pub fn vertical_above(p: Point2) -> Point2 {
    Point2::new(p.x, 0.0)
}
