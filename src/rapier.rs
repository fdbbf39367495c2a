//! Rapier3D backend implementation.
//!
//! This module provides the host backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.
//!
//! Bones are entities with their own rigid bodies, registered in the
//! character's [`SkeletonRig`]. Simulating a bone switches its body and the
//! bodies of all descendant bones to `Dynamic`; handing it back to animation
//! switches them to `KinematicPositionBased`. Blend weights are written to
//! [`BoneBlendWeight`] on every affected bone for the animation layer to read.

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy_rapier3d::geometry::Group;
use bevy_rapier3d::prelude::*;

use crate::backend::{self, MotionHost};
use crate::collision::CollisionData;
use crate::rig::{self, SkeletonRig};

/// Rapier3D host backend for the ragdoll controller.
///
/// Raycasts go through the default `RapierContext`. The probing character,
/// its rig bones and every collider parented below them are excluded so the
/// ragdoll never hits itself. Without a default context, raycasts miss.
pub struct Rapier3dBackend;

impl MotionHost for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn raycast(
        world: &mut World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude_entity: Entity,
        collision_groups: Option<(u32, u32)>,
    ) -> Option<CollisionData> {
        let own = backend::own_bodies(world, exclude_entity);
        let groups = collision_groups
            .map(|(memberships, filters)| (Group::from_bits_truncate(memberships), Group::from_bits_truncate(filters)));

        let mut state: SystemState<ReadRapierContext> = SystemState::new(world);
        let rapier_context = state.get_mut(world);
        // `single()` panics unless exactly one default context exists
        if rapier_context.rapier_context.get_single().is_err() {
            return None;
        }
        let context = rapier_context.single();

        rapier_raycast(&context, origin, direction, max_distance, &own, groups)
    }

    fn set_physics_simulation_below(world: &mut World, entity: Entity, bone: &str, enabled: bool) {
        let body = if enabled {
            RigidBody::Dynamic
        } else {
            RigidBody::KinematicPositionBased
        };
        for bone_entity in bones_below(world, entity, bone) {
            if let Some(mut rigid_body) = world.get_mut::<RigidBody>(bone_entity) {
                *rigid_body = body;
            }
        }
        rig::record_simulation(world, entity, bone, enabled);
    }

    fn set_physics_blend_weight_below(world: &mut World, entity: Entity, bone: &str, weight: f32) {
        let weight = weight.clamp(0.0, 1.0);
        for bone_entity in bones_below(world, entity, bone) {
            world.entity_mut(bone_entity).insert(BoneBlendWeight(weight));
        }
        rig::record_blend_weight(world, entity, bone, weight);
    }
}

/// Plugin that sets up Rapier3D-specific types for the ragdoll controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<BoneBlendWeight>();
    }
}

/// Physics blend weight applied to a single bone.
///
/// 0 = the bone follows animation, 1 = the bone follows its rigid body.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct BoneBlendWeight(pub f32);

/// The named bone and all its descendants.
fn bones_below(world: &World, entity: Entity, bone: &str) -> Vec<Entity> {
    world
        .get::<SkeletonRig>(entity)
        .and_then(|skeleton| skeleton.bone(bone))
        .map(|root| rig::descendants(world, root))
        .unwrap_or_default()
}

/// Perform a raycast using RapierContext.
fn rapier_raycast(
    context: &RapierContext,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    exclude: &[Entity],
    collision_groups: Option<(Group, Group)>,
) -> Option<CollisionData> {
    let not_own = |hit: Entity| !exclude.contains(&hit);

    // Create filter to exclude the character's own bodies
    let mut filter = QueryFilter::default().exclude_sensors().predicate(&not_own);

    // Apply collision groups if provided
    if let Some((memberships, filters)) = collision_groups {
        filter = filter.groups(CollisionGroups::new(memberships, filters));
    }

    context
        .cast_ray(
            origin,
            direction,
            max_distance,
            true, // solid = true for solid hits
            filter,
        )
        .map(|(hit_entity, toi)| CollisionData::along_ray(origin, direction, toi, Some(hit_entity)))
}
