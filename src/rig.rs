//! Skeleton rig and physics blend bookkeeping.
//!
//! [`SkeletonRig`] maps bone names to the entities carrying their transforms
//! and rigid bodies. [`PhysicsBlend`] records the last simulation toggle and
//! blend weight applied below a bone, which the animation layer reads to mix
//! the physics pose with the animated pose.

use bevy::prelude::*;
use bevy::utils::HashMap;

/// Bone name to bone entity lookup for a character.
#[derive(Component, Debug, Clone, Default)]
pub struct SkeletonRig {
    bones: HashMap<String, Entity>,
}

impl SkeletonRig {
    /// Create an empty rig.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a bone.
    pub fn with_bone(mut self, name: impl Into<String>, entity: Entity) -> Self {
        self.insert(name, entity);
        self
    }

    /// Register or replace a bone.
    pub fn insert(&mut self, name: impl Into<String>, entity: Entity) {
        self.bones.insert(name.into(), entity);
    }

    /// Entity of the bone called `name`.
    pub fn bone(&self, name: &str) -> Option<Entity> {
        self.bones.get(name).copied()
    }

    /// Every registered bone entity.
    pub fn bone_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.bones.values().copied()
    }
}

/// Physics simulation state below a bone.
#[derive(Component, Reflect, Debug, Clone, PartialEq, Default)]
#[reflect(Component)]
pub struct PhysicsBlend {
    /// Bone the last toggle or weight was applied below.
    pub bone: Option<String>,
    /// Whether bodies below the bone are simulated.
    pub simulating: bool,
    /// 0 = fully animation-driven, 1 = fully physics-driven.
    pub weight: f32,
}

/// World transform of a rig bone.
pub fn bone_world_transform(world: &World, entity: Entity, bone: &str) -> Option<Transform> {
    let bone_entity = world.get::<SkeletonRig>(entity)?.bone(bone)?;
    world
        .get::<GlobalTransform>(bone_entity)
        .map(GlobalTransform::compute_transform)
}

/// `root` and every entity below it in the hierarchy.
pub fn descendants(world: &World, root: Entity) -> Vec<Entity> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        found.push(current);
        if let Some(children) = world.get::<Children>(current) {
            stack.extend(children.iter().copied());
        }
    }
    found
}

/// Record a simulation toggle on the character.
pub fn record_simulation(world: &mut World, entity: Entity, bone: &str, enabled: bool) {
    if let Some(mut blend) = world.get_mut::<PhysicsBlend>(entity) {
        blend.bone = Some(bone.to_string());
        blend.simulating = enabled;
    }
}

/// Record a blend weight on the character.
pub fn record_blend_weight(world: &mut World, entity: Entity, bone: &str, weight: f32) {
    if let Some(mut blend) = world.get_mut::<PhysicsBlend>(entity) {
        blend.bone = Some(bone.to_string());
        blend.weight = weight.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rig_lookup() {
        let hips = Entity::from_raw(1);
        let spine = Entity::from_raw(2);
        let rig = SkeletonRig::new().with_bone("Hips", hips).with_bone("Spine", spine);

        assert_eq!(rig.bone("Hips"), Some(hips));
        assert_eq!(rig.bone("Head"), None);
        assert_eq!(rig.bone_entities().count(), 2);
    }

    #[test]
    fn bone_transform_from_world() {
        let mut world = World::new();
        let location = Vec3::new(1.0, 2.0, 3.0);
        let hips = world
            .spawn(GlobalTransform::from(Transform::from_translation(location)))
            .id();
        let character = world.spawn(SkeletonRig::new().with_bone("Hips", hips)).id();

        let transform = bone_world_transform(&world, character, "Hips");
        assert_eq!(transform.map(|t| t.translation), Some(location));
        assert!(bone_world_transform(&world, character, "Head").is_none());
    }

    #[test]
    fn records_toggle_and_clamped_weight() {
        let mut world = World::new();
        let character = world.spawn(PhysicsBlend::default()).id();

        record_simulation(&mut world, character, "Hips", true);
        record_blend_weight(&mut world, character, "Hips", 1.5);

        let blend = world.get::<PhysicsBlend>(character).cloned().unwrap_or_default();
        assert_eq!(blend.bone.as_deref(), Some("Hips"));
        assert!(blend.simulating);
        assert_eq!(blend.weight, 1.0);
    }
}
