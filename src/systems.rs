//! Core controller systems.
//!
//! These systems run the ragdoll controller every fixed tick. They are
//! exclusive systems generic over the host backend so the backend's static
//! functions can be called with the whole world.

use std::time::Duration;

use bevy::prelude::*;

use crate::backend::MotionHost;
use crate::config::RagdollConfig;
use crate::detection;
use crate::intent::RagdollIntent;
use crate::interp;
use crate::montage::MontagePlayer;
use crate::scheduler::RagdollTimers;
use crate::state::{KnockedDown, RagdollController, RagdollState, Ragdolled, Recovering};
use crate::transitions;

/// Host timestep for this tick. Negative or non-finite steps count as zero.
fn tick_delta<B: MotionHost>(world: &World) -> f32 {
    let dt = B::get_fixed_timestep(world);
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

/// Advance the deferred timers and run the completions that fired.
///
/// Runs first in the tick, so a timer armed during a tick fires at the start
/// of a later one.
pub fn tick_ragdoll_timers<B: MotionHost>(world: &mut World) {
    let delta = Duration::try_from_secs_f32(tick_delta::<B>(world)).unwrap_or_default();

    let fired: Vec<_> = world
        .query::<(Entity, &mut RagdollTimers)>()
        .iter_mut(world)
        .map(|(entity, mut timers)| (entity, timers.tick(delta)))
        .filter(|(_, fired)| fired.any())
        .collect();

    for (entity, fired) in fired {
        if fired.recovery {
            if let Err(err) = transitions::finish_recovery::<B>(world, entity) {
                warn!("recovery completion failed: {err}");
            }
        }
        if fired.knockdown {
            transitions::finish_knockdown(world, entity);
        }
    }
}

/// Consume pending [`RagdollIntent`] requests and run the state machine.
pub fn apply_ragdoll_intents<B: MotionHost>(world: &mut World) {
    let requests: Vec<(Entity, bool, bool)> = world
        .query::<(Entity, &mut RagdollIntent)>()
        .iter_mut(world)
        .filter(|(_, intent)| intent.has_pending())
        .map(|(entity, mut intent)| (entity, intent.take_toggle(), intent.take_ground_contact()))
        .collect();

    for (entity, toggle, ground_contact) in requests {
        if ground_contact {
            if let Err(err) = transitions::ground_contact::<B>(world, entity) {
                warn!("ground contact failed: {err}");
            }
        }
        if toggle {
            if let Err(err) = transitions::toggle_physics::<B>(world, entity) {
                warn!("ragdoll toggle failed: {err}");
            }
        }
    }
}

/// Probe the ground and reposition the capsule of ragdolled characters.
///
/// While standing, the lying location is re-synced to the reference bone so
/// the capsule does not jump when the next ragdoll starts.
pub fn update_ragdoll_sensors<B: MotionHost>(world: &mut World) {
    let dt = tick_delta::<B>(world);

    let entities: Vec<(Entity, RagdollConfig, RagdollState, Vec3)> = world
        .query::<(Entity, &RagdollConfig, &RagdollController)>()
        .iter(world)
        .filter(|(_, _, controller)| !controller.is_recovering())
        .map(|(e, config, controller)| (e, config.clone(), controller.state(), controller.lying_location))
        .collect();

    for (entity, config, state, lying_location) in entities {
        let Some(bone) = B::bone_world_transform(world, entity, &config.reference_bone) else {
            debug!("{entity:?} has no `{}` bone, skipping probe", config.reference_bone);
            continue;
        };

        if state == RagdollState::Standing {
            if let Some(mut controller) = world.get_mut::<RagdollController>(entity) {
                controller.lying_location = bone.translation + config.capsule_offset_vector();
            }
            continue;
        }

        let pose = detection::probe_pose(&bone, &config, |origin, direction, max_distance| {
            B::raycast(world, origin, direction, max_distance, entity, config.probe_groups)
        });

        let location = interp::vinterp_to(
            lying_location,
            pose.location,
            dt,
            config.location_interp_speed,
        );
        B::set_capsule_transform(world, entity, location, pose.rotation());

        if let Some(mut controller) = world.get_mut::<RagdollController>(entity) {
            controller.lying_location = location;
            controller.sensed_pose = Some(pose);
        }
    }
}

/// Fade the physics blend out while recovering.
pub fn decay_physics_blend<B: MotionHost>(world: &mut World) {
    let dt = tick_delta::<B>(world);

    let entities: Vec<(Entity, RagdollConfig, f32)> = world
        .query::<(Entity, &RagdollConfig, &RagdollController)>()
        .iter(world)
        .filter(|(_, _, controller)| controller.is_recovering())
        .map(|(e, config, controller)| (e, config.clone(), controller.physics_alpha))
        .collect();

    for (entity, config, alpha) in entities {
        let alpha = interp::interp_to(alpha, 0.0, dt, config.blend_interp_speed);
        B::set_physics_blend_weight_below(world, entity, &config.reference_bone, alpha);

        if let Some(mut controller) = world.get_mut::<RagdollController>(entity) {
            controller.physics_alpha = alpha;
        }
    }
}

/// Advance montage playback.
pub fn advance_montages<B: MotionHost>(world: &mut World) {
    let dt = tick_delta::<B>(world);
    for mut player in world.query::<&mut MontagePlayer>().iter_mut(world) {
        player.advance(dt);
    }
}

/// Sync marker components with the controller state.
pub fn sync_state_markers(world: &mut World) {
    let entities: Vec<(Entity, RagdollState, bool)> = world
        .query::<(Entity, &RagdollController)>()
        .iter(world)
        .map(|(e, controller)| (e, controller.state(), controller.is_knocked()))
        .collect();

    for (entity, state, knocked) in entities {
        let mut entity_mut = world.entity_mut(entity);

        if state.is_ragdolled() {
            entity_mut.insert(Ragdolled);
        } else {
            entity_mut.remove::<Ragdolled>();
        }

        if state.is_recovering() {
            entity_mut.insert(Recovering);
        } else {
            entity_mut.remove::<Recovering>();
        }

        if knocked {
            entity_mut.insert(KnockedDown);
        }
    }
}
