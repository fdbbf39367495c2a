//! Frame-rate independent smoothing.
//!
//! Both the capsule repositioning and the physics blend decay approach their
//! target exponentially: each tick covers `1 - exp(-speed * dt)` of the
//! remaining distance, so splitting a tick in two lands on the same value.

use bevy::prelude::*;

/// Distance below which interpolation snaps onto the target.
pub const SNAP_TOLERANCE: f32 = 1.0e-4;

/// Fraction of the remaining distance covered in `dt` seconds at `speed`.
#[inline]
pub fn smoothing_factor(dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return 1.0;
    }
    1.0 - (-speed * dt.max(0.0)).exp()
}

/// Move a scalar toward `target`.
///
/// A non-positive `speed` jumps straight to the target.
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    let remaining = target - current;
    if speed <= 0.0 || remaining.abs() <= SNAP_TOLERANCE {
        return target;
    }
    current + remaining * smoothing_factor(dt, speed)
}

/// Move a point toward `target`.
///
/// A non-positive `speed` jumps straight to the target.
pub fn vinterp_to(current: Vec3, target: Vec3, dt: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 || current.distance_squared(target) <= SNAP_TOLERANCE * SNAP_TOLERANCE {
        return target;
    }
    current.lerp(target, smoothing_factor(dt, speed))
}
