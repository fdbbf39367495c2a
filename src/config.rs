//! Ragdoll controller configuration.
//!
//! This module defines the tuning for the ragdoll controller: which bone
//! anchors the body, how far the probes reach, interpolation rates, and the
//! montage sections used for recovery and knockdown.

use bevy::prelude::*;

use crate::detection::RecoverySection;

/// World "up" used by the probes and the capsule offset.
///
/// The controller follows the skeleton convention of a Z-up world; yaw is
/// measured about this axis from +X.
pub const WORLD_UP: Vec3 = Vec3::Z;

/// Configuration parameters for the ragdoll controller.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct RagdollConfig {
    // === Skeleton ===
    /// Bone used as the anchor for probing, repositioning and physics toggles.
    /// Everything below this bone is simulated while ragdolled.
    pub reference_bone: String,

    // === Probe Settings ===
    /// Length of both the downward and the forward probe.
    pub probe_distance: f32,

    /// Vertical offset from the sensed ground to the capsule center.
    /// Roughly the capsule half height.
    pub capsule_offset: f32,

    /// Collision groups (memberships, filters) used by the probes.
    /// None probes against everything.
    pub probe_groups: Option<(u32, u32)>,

    // === Interpolation ===
    /// Rate at which the capsule follows the sensed lying location.
    pub location_interp_speed: f32,

    /// Rate at which the physics blend weight decays during recovery.
    pub blend_interp_speed: f32,

    // === Montage ===
    /// Playback rate of the recovery montage.
    pub recovery_play_rate: f32,

    /// Section played when the character lies face down.
    pub forward_section: String,

    /// Section played in every other case, and the fallback when a section
    /// cannot be found.
    pub default_section: String,

    /// Section played by the ground-contact knockdown sequence.
    pub knockdown_section: String,
}

impl Default for RagdollConfig {
    fn default() -> Self {
        Self {
            reference_bone: "Hips".to_string(),

            probe_distance: 50.0,
            capsule_offset: 90.0,
            probe_groups: None,

            location_interp_speed: 30.0,
            blend_interp_speed: 5.0,

            recovery_play_rate: 1.0,
            forward_section: "StandUp_Forward".to_string(),
            default_section: "Default".to_string(),
            knockdown_section: "KnockDown".to_string(),
        }
    }
}

impl RagdollConfig {
    /// Config for a standard humanoid skeleton (hip-anchored, 90 unit capsule).
    pub fn humanoid() -> Self {
        Self::default()
    }

    /// Config for a humanoid measured in meters instead of centimeters.
    pub fn humanoid_meters() -> Self {
        Self {
            probe_distance: 0.5,
            capsule_offset: 0.9,
            ..default()
        }
    }

    /// Name of the montage section used for a recovery section.
    pub fn section_name(&self, section: RecoverySection) -> &str {
        match section {
            RecoverySection::StandUpForward => &self.forward_section,
            RecoverySection::Default => &self.default_section,
        }
    }

    /// Offset from the sensed ground point to the capsule center.
    #[inline]
    pub fn capsule_offset_vector(&self) -> Vec3 {
        WORLD_UP * self.capsule_offset
    }

    /// Builder: set the reference bone.
    pub fn with_reference_bone(mut self, bone: impl Into<String>) -> Self {
        self.reference_bone = bone.into();
        self
    }

    /// Builder: set the probe length.
    pub fn with_probe_distance(mut self, distance: f32) -> Self {
        self.probe_distance = distance;
        self
    }

    /// Builder: set the capsule offset.
    pub fn with_capsule_offset(mut self, offset: f32) -> Self {
        self.capsule_offset = offset;
        self
    }

    /// Builder: set the probe collision groups.
    pub fn with_probe_groups(mut self, memberships: u32, filters: u32) -> Self {
        self.probe_groups = Some((memberships, filters));
        self
    }

    /// Builder: set both interpolation rates.
    pub fn with_interp_speeds(mut self, location: f32, blend: f32) -> Self {
        self.location_interp_speed = location;
        self.blend_interp_speed = blend;
        self
    }

    /// Builder: set the recovery playback rate.
    pub fn with_recovery_play_rate(mut self, rate: f32) -> Self {
        self.recovery_play_rate = rate;
        self
    }

    /// Builder: set the recovery section names.
    pub fn with_recovery_sections(
        mut self,
        forward: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        self.forward_section = forward.into();
        self.default_section = default.into();
        self
    }

    /// Builder: set the knockdown section name.
    pub fn with_knockdown_section(mut self, section: impl Into<String>) -> Self {
        self.knockdown_section = section.into();
        self
    }
}
