//! Raycast result structures.
//!
//! These structures hold the results of physics queries issued by the
//! spatial probe while the character is ragdolled.

use bevy::prelude::*;

/// Information about a raycast collision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }

    /// Build a hit from a ray and the distance along it.
    ///
    /// The normal is approximated as the reversed ray direction, which is all a
    /// plain raycast can tell us.
    pub fn along_ray(origin: Vec3, direction: Vec3, distance: f32, entity: Option<Entity>) -> Self {
        Self::new(distance, -direction, origin + direction * distance, entity)
    }
}
