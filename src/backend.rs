//! Host backend abstraction.
//!
//! This module defines the trait a host must implement to run the ragdoll
//! controller: raycasts, bone transforms, physics toggles, montage control and
//! movement mode. Everything except raycasting has a default implementation
//! built on the crate's own components ([`SkeletonRig`], [`MontagePlayer`],
//! [`PhysicsBlend`](crate::rig::PhysicsBlend), [`MovementMode`] and the
//! character `Transform`), so a backend for a new physics engine usually only
//! provides [`MotionHost::raycast`].

use bevy::prelude::*;

use crate::collision::CollisionData;
use crate::montage::MontagePlayer;
use crate::rig::{self, SkeletonRig};
use crate::state::MovementMode;

/// Trait for host backend implementations.
///
/// All functions are static and operate on the ECS world, so the controller
/// systems can stay generic over the backend.
///
/// For an example implementation, see the `rapier` module's `Rapier3dBackend`.
pub trait MotionHost: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Perform a raycast against solid geometry.
    ///
    /// # Arguments
    /// * `world` - The ECS world
    /// * `origin` - Ray origin in world space
    /// * `direction` - Ray direction (normalized)
    /// * `max_distance` - Maximum cast distance
    /// * `exclude_entity` - Character whose own bodies must be ignored
    /// * `collision_groups` - Optional collision groups (memberships, filters)
    fn raycast(
        world: &mut World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude_entity: Entity,
        collision_groups: Option<(u32, u32)>,
    ) -> Option<CollisionData>;

    /// Get the world transform of a bone.
    fn bone_world_transform(world: &World, entity: Entity, bone: &str) -> Option<Transform> {
        rig::bone_world_transform(world, entity, bone)
    }

    /// Enable or disable physics simulation of every body below `bone`.
    fn set_physics_simulation_below(world: &mut World, entity: Entity, bone: &str, enabled: bool) {
        rig::record_simulation(world, entity, bone, enabled);
    }

    /// Set the physics blend weight of every body below `bone`.
    fn set_physics_blend_weight_below(world: &mut World, entity: Entity, bone: &str, weight: f32) {
        rig::record_blend_weight(world, entity, bone, weight);
    }

    /// Play the character's montage from the start.
    ///
    /// Returns false if the character has no montage.
    fn play_montage(world: &mut World, entity: Entity, play_rate: f32) -> bool {
        match world.get_mut::<MontagePlayer>(entity) {
            Some(mut player) => {
                player.play(play_rate);
                true
            }
            None => false,
        }
    }

    /// Jump montage playback to a named section.
    ///
    /// Returns false if the section does not exist.
    fn jump_to_section(world: &mut World, entity: Entity, section: &str) -> bool {
        world
            .get_mut::<MontagePlayer>(entity)
            .is_some_and(|mut player| player.jump_to_section(section).is_ok())
    }

    /// Index of a named montage section.
    fn section_index(world: &World, entity: Entity, section: &str) -> Option<usize> {
        world
            .get::<MontagePlayer>(entity)?
            .montage()
            .section_index(section)
    }

    /// Authored length of a montage section, in seconds.
    fn section_duration(world: &World, entity: Entity, index: usize) -> Option<f32> {
        world
            .get::<MontagePlayer>(entity)?
            .montage()
            .section_length(index)
    }

    /// Set the locomotion movement mode.
    fn set_movement_mode(world: &mut World, entity: Entity, mode: MovementMode) {
        if let Some(mut current) = world.get_mut::<MovementMode>(entity) {
            *current = mode;
        }
    }

    /// Place the character capsule.
    fn set_capsule_transform(world: &mut World, entity: Entity, location: Vec3, rotation: Quat) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = location;
            transform.rotation = rotation;
        }
    }

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}

/// Every entity that belongs to a character: the capsule, its rig bones and
/// everything parented below either of them.
///
/// Backends use this to keep probes from hitting the character itself.
pub fn own_bodies(world: &World, entity: Entity) -> Vec<Entity> {
    let mut bodies = rig::descendants(world, entity);
    if let Some(skeleton) = world.get::<SkeletonRig>(entity) {
        for bone in skeleton.bone_entities() {
            bodies.extend(rig::descendants(world, bone));
        }
    }
    bodies.sort_unstable();
    bodies.dedup();
    bodies
}

/// Helper struct for building raycasts.
#[derive(Debug, Clone, Copy)]
pub struct RaycastRequest {
    /// Origin point of the ray.
    pub origin: Vec3,
    /// Direction of the ray (normalized).
    pub direction: Vec3,
    /// Maximum distance to cast.
    pub max_distance: f32,
    /// Character to exclude from results.
    pub exclude: Option<Entity>,
}

impl RaycastRequest {
    /// Create a new raycast request.
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            max_distance,
            exclude: None,
        }
    }

    /// Exclude a character from the raycast.
    pub fn excluding(mut self, entity: Entity) -> Self {
        self.exclude = Some(entity);
        self
    }

    /// End point of the ray.
    pub fn end(&self) -> Vec3 {
        self.origin + self.direction * self.max_distance
    }

    /// Distance along the ray to `point`, if it lies on the segment within
    /// `tolerance`.
    ///
    /// Used by scripted backends to answer raycasts without a physics engine.
    pub fn contains(&self, point: Vec3, tolerance: f32) -> Option<f32> {
        let along = (point - self.origin).dot(self.direction);
        if along < 0.0 || along > self.max_distance {
            return None;
        }
        let closest = self.origin + self.direction * along;
        (closest.distance(point) <= tolerance).then_some(along)
    }
}
