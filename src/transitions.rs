//! Ragdoll state machine transitions.
//!
//! ```text
//! Standing --toggle--> Ragdolled --toggle--> Recovering --recovery timer--> Standing
//! ```
//!
//! Toggling while recovering is ignored. The ground-contact knockdown is a
//! separate one-shot path guarded by the knocked latch.
//!
//! These functions are the controller's entry points. The trigger system calls
//! them for [`RagdollIntent`](crate::intent::RagdollIntent) requests, and code
//! holding `&mut World` may call them directly.

use bevy::prelude::*;

use crate::backend::MotionHost;
use crate::config::RagdollConfig;
use crate::error::RagdollError;
use crate::scheduler::RagdollTimers;
use crate::state::{
    MovementMode, RagdollController, RagdollState, RagdollTransition, TransitionKind,
};

fn controller(world: &World, entity: Entity) -> Result<&RagdollController, RagdollError> {
    world
        .get::<RagdollController>(entity)
        .ok_or(RagdollError::MissingController(entity))
}

fn controller_mut(world: &mut World, entity: Entity) -> Result<Mut<'_, RagdollController>, RagdollError> {
    world
        .get_mut::<RagdollController>(entity)
        .ok_or(RagdollError::MissingController(entity))
}

fn config(world: &World, entity: Entity) -> Result<RagdollConfig, RagdollError> {
    world
        .get::<RagdollConfig>(entity)
        .cloned()
        .ok_or(RagdollError::MissingConfig(entity))
}

fn with_timers(world: &mut World, entity: Entity, f: impl FnOnce(&mut RagdollTimers)) {
    if let Some(mut timers) = world.get_mut::<RagdollTimers>(entity) {
        f(&mut timers);
    }
}

fn announce(world: &mut World, entity: Entity, kind: TransitionKind) {
    world.send_event(RagdollTransition { entity, kind });
}

/// Look up a montage section's index and authored length.
pub fn resolve_section<B: MotionHost>(
    world: &World,
    entity: Entity,
    section: &str,
) -> Result<(usize, f32), RagdollError> {
    B::section_index(world, entity, section)
        .and_then(|index| B::section_duration(world, entity, index).map(|length| (index, length)))
        .ok_or_else(|| RagdollError::MissingSection(section.to_string()))
}

/// Handle the "toggle physics" action.
///
/// Returns the state after the toggle.
pub fn toggle_physics<B: MotionHost>(
    world: &mut World,
    entity: Entity,
) -> Result<RagdollState, RagdollError> {
    let state = controller(world, entity)?.state();
    match state {
        RagdollState::Standing => enter_ragdoll::<B>(world, entity)?,
        RagdollState::Ragdolled => begin_recovery::<B>(world, entity)?,
        RagdollState::Recovering => {
            debug!("ragdoll toggle ignored for {entity:?}: recovery in progress");
        }
    }
    Ok(controller(world, entity)?.state())
}

/// Standing → Ragdolled.
///
/// Hands the body below the reference bone to physics and stops locomotion.
pub fn enter_ragdoll<B: MotionHost>(world: &mut World, entity: Entity) -> Result<(), RagdollError> {
    let config = config(world, entity)?;
    {
        let mut controller = controller_mut(world, entity)?;
        controller.state = RagdollState::Ragdolled;
        controller.physics_alpha = 1.0;
    }

    B::set_physics_simulation_below(world, entity, &config.reference_bone, true);
    B::set_physics_blend_weight_below(world, entity, &config.reference_bone, 1.0);
    B::set_movement_mode(world, entity, MovementMode::None);

    info!("{entity:?} entered ragdoll");
    announce(world, entity, TransitionKind::Ragdolled);
    Ok(())
}

/// Ragdolled → Recovering.
///
/// Plays the stand-up section picked by the latest probe and arms the
/// recovery timer with that section's authored length. The physics blend
/// restarts from 1.0 and is faded out by the blend system.
pub fn begin_recovery<B: MotionHost>(world: &mut World, entity: Entity) -> Result<(), RagdollError> {
    let config = config(world, entity)?;
    let section = {
        let mut controller = controller_mut(world, entity)?;
        controller.state = RagdollState::Recovering;
        controller.physics_alpha = 1.0;
        controller.recovery_section()
    };

    if !B::play_montage(world, entity, config.recovery_play_rate) {
        warn!("{}", RagdollError::MissingMontage(entity));
    }

    let requested = config.section_name(section);
    let resolved = resolve_section::<B>(world, entity, requested)
        .map(|(_, length)| (requested, length))
        .or_else(|err| {
            warn!("{err}, falling back to `{}`", config.default_section);
            resolve_section::<B>(world, entity, &config.default_section)
                .map(|(_, length)| (config.default_section.as_str(), length))
        });

    let length = match resolved {
        Ok((name, length)) => {
            B::jump_to_section(world, entity, name);
            length
        }
        Err(err) => {
            warn!("{err}, recovering {entity:?} on the next tick");
            0.0
        }
    };

    with_timers(world, entity, |timers| timers.recovery.arm_secs(length));

    info!("{entity:?} recovering with `{requested}` ({length}s)");
    announce(world, entity, TransitionKind::RecoveryStarted(section));
    Ok(())
}

/// Recovering → Standing, run when the recovery timer fires.
///
/// Gives the body back to animation and restores locomotion.
pub fn finish_recovery<B: MotionHost>(world: &mut World, entity: Entity) -> Result<(), RagdollError> {
    let config = config(world, entity)?;
    with_timers(world, entity, |timers| timers.recovery.cancel());
    {
        let mut controller = controller_mut(world, entity)?;
        if !controller.is_recovering() {
            debug!("stale recovery timer for {entity:?} ignored");
            return Ok(());
        }
        controller.state = RagdollState::Standing;
        controller.sensed_pose = None;
    }

    B::set_movement_mode(world, entity, MovementMode::Walking);
    B::set_physics_simulation_below(world, entity, &config.reference_bone, false);

    info!("{entity:?} recovered");
    announce(world, entity, TransitionKind::Recovered);
    Ok(())
}

/// Handle a ground-contact notification.
///
/// Starts the knockdown sequence once per character, and only while not
/// ragdolled. Returns whether the sequence started.
pub fn ground_contact<B: MotionHost>(world: &mut World, entity: Entity) -> Result<bool, RagdollError> {
    let config = config(world, entity)?;
    {
        let current = controller(world, entity)?;
        if current.is_knocked() || current.is_ragdolled() {
            debug!("ground contact ignored for {entity:?}");
            return Ok(false);
        }
    }

    B::set_physics_simulation_below(world, entity, &config.reference_bone, true);
    if !B::play_montage(world, entity, 1.0) {
        warn!("{}", RagdollError::MissingMontage(entity));
    }
    B::jump_to_section(world, entity, &config.knockdown_section);
    controller_mut(world, entity)?.knocked = true;
    B::set_movement_mode(world, entity, MovementMode::None);

    let length = match resolve_section::<B>(world, entity, &config.knockdown_section) {
        Ok((_, length)) => length,
        Err(err) => {
            warn!("{err}, knockdown of {entity:?} finishes on the next tick");
            0.0
        }
    };
    with_timers(world, entity, |timers| timers.knockdown.arm_secs(length));

    info!("{entity:?} knocked down ({length}s)");
    announce(world, entity, TransitionKind::KnockedDown);
    Ok(true)
}

/// Run when the knockdown timer fires.
///
/// Only reports the end of the sequence: the knocked latch stays set and the
/// ragdoll state is left alone.
pub fn finish_knockdown(world: &mut World, entity: Entity) {
    with_timers(world, entity, |timers| timers.knockdown.cancel());
    info!("{entity:?} knockdown sequence finished");
    announce(world, entity, TransitionKind::KnockdownFinished);
}
