//! Spatial probe.
//!
//! While the character is ragdolled, two short raycasts from the reference
//! bone decide where the capsule should sit and which way the character is
//! lying. The result is a [`SensedPose`].

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::config::{RagdollConfig, WORLD_UP};

/// Which recovery animation fits the way the character is lying.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecoverySection {
    /// Lying face down: the forward probe hit the ground.
    StandUpForward,
    /// Lying on the back or side.
    #[default]
    Default,
}

/// Capsule pose sensed from the ragdolled body.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SensedPose {
    /// Target capsule location.
    pub location: Vec3,
    /// Target capsule yaw in radians, about [`WORLD_UP`].
    pub yaw: f32,
    /// Recovery section matching the lying orientation.
    pub section: RecoverySection,
}

impl SensedPose {
    /// Yaw-only capsule rotation.
    pub fn rotation(&self) -> Quat {
        Quat::from_axis_angle(WORLD_UP, self.yaw)
    }
}

/// Yaw of a world-space direction, in radians about [`WORLD_UP`].
pub fn yaw_of(direction: Vec3) -> f32 {
    direction.y.atan2(direction.x)
}

/// Wrap an angle into `[-PI, PI)`.
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Probe the ground around the reference bone.
///
/// `cast` performs a raycast `(origin, direction, max_distance)` and must
/// already exclude the character's own bodies.
///
/// - Downward probe: hit point (or the bone itself on a miss) plus the
///   capsule offset gives the target location.
/// - Forward probe along the bone's local +Z: a hit means the character lies
///   face down, so the capsule turns around (+180 degrees) and the forward
///   stand-up section is chosen.
pub fn probe_pose(
    bone: &Transform,
    config: &RagdollConfig,
    mut cast: impl FnMut(Vec3, Vec3, f32) -> Option<CollisionData>,
) -> SensedPose {
    let origin = bone.translation;
    let offset = config.capsule_offset_vector();

    let location = match cast(origin, -WORLD_UP, config.probe_distance) {
        Some(ground) => ground.point + offset,
        None => origin + offset,
    };

    let facing = (bone.rotation * Vec3::Z).normalize_or_zero();
    let lateral_yaw = yaw_of(bone.rotation * Vec3::Y);

    let (section, yaw) = match cast(origin, facing, config.probe_distance) {
        Some(_) => {
            trace!("ragdoll probe: lying face down");
            (RecoverySection::StandUpForward, wrap_angle(lateral_yaw + PI))
        }
        None => {
            trace!("ragdoll probe: lying on the back");
            (RecoverySection::Default, wrap_angle(lateral_yaw))
        }
    };

    SensedPose {
        location,
        yaw,
        section,
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn angle_eq(a: f32, b: f32) -> bool {
        wrap_angle(a - b).abs() < 1e-4
    }

    // ==================== Angle Helpers ====================

    #[test]
    fn yaw_of_axes() {
        assert!(angle_eq(yaw_of(Vec3::X), 0.0));
        assert!(angle_eq(yaw_of(Vec3::Y), FRAC_PI_2));
        assert!(angle_eq(yaw_of(Vec3::NEG_X), PI));
        // Vertical component is ignored
        assert!(angle_eq(yaw_of(Vec3::new(0.0, 1.0, 5.0)), FRAC_PI_2));
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(0.0)).abs() < 1e-6);
        assert!((wrap_angle(3.0 * FRAC_PI_2) + FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_angle(-3.0 * FRAC_PI_2) - FRAC_PI_2).abs() < 1e-5);
        let wrapped = wrap_angle(PI);
        assert!((-PI..PI).contains(&wrapped));
    }

    // ==================== Probe ====================

    #[test]
    fn ground_hit_and_forward_miss() {
        let config = RagdollConfig::default();
        let bone = Transform::from_translation(Vec3::new(10.0, 20.0, 30.0));
        let ground = Vec3::new(10.0, 20.0, 0.0);

        let pose = probe_pose(&bone, &config, |origin, direction, max| {
            if direction == Vec3::NEG_Z {
                assert_eq!(origin, bone.translation);
                assert_eq!(max, 50.0);
                Some(CollisionData::new(30.0, Vec3::Z, ground, None))
            } else {
                None
            }
        });

        assert_eq!(pose.location, ground + Vec3::new(0.0, 0.0, 90.0));
        assert_eq!(pose.section, RecoverySection::Default);
        // Identity bone: lateral axis is +Y
        assert!(angle_eq(pose.yaw, FRAC_PI_2));
    }

    #[test]
    fn ground_miss_falls_back_to_bone() {
        let config = RagdollConfig::default();
        let bone = Transform::from_translation(Vec3::new(1.0, 2.0, 300.0));

        let pose = probe_pose(&bone, &config, |_, _, _| None);

        assert_eq!(pose.location, Vec3::new(1.0, 2.0, 390.0));
        assert_eq!(pose.section, RecoverySection::Default);
    }

    #[test]
    fn forward_hit_turns_capsule_around() {
        let config = RagdollConfig::default();
        let bone = Transform::from_translation(Vec3::new(0.0, 0.0, 10.0))
            .with_rotation(Quat::from_rotation_z(FRAC_PI_2));

        let pose = probe_pose(&bone, &config, |_, direction, _| {
            if direction == Vec3::NEG_Z {
                None
            } else {
                Some(CollisionData::default())
            }
        });

        // Rotated bone: lateral axis points along -X (yaw PI), plus 180 degrees
        assert_eq!(pose.section, RecoverySection::StandUpForward);
        assert!(angle_eq(pose.yaw, 0.0));
    }

    #[test]
    fn forward_probe_follows_bone_facing() {
        let config = RagdollConfig::default();
        // Face down: local +Z points at the floor
        let bone = Transform::from_rotation(Quat::from_rotation_x(PI));
        let mut directions = Vec::new();

        probe_pose(&bone, &config, |_, direction, _| {
            directions.push(direction);
            None
        });

        assert_eq!(directions.len(), 2);
        assert!((directions[1] - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn pose_rotation_is_yaw_only() {
        let pose = SensedPose {
            location: Vec3::ZERO,
            yaw: FRAC_PI_2,
            section: RecoverySection::Default,
        };

        let rotated = pose.rotation() * Vec3::X;
        assert!((rotated - Vec3::Y).length() < 1e-5);
        assert!((pose.rotation() * Vec3::Z - Vec3::Z).length() < 1e-5);
    }
}
