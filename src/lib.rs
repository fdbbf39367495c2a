//! # `msg_ragdoll_controller`
//!
//! A ragdoll and stand-up recovery controller for 3D characters, with a host
//! backend abstraction.
//!
//! This crate provides the state machine that takes a character in and out of
//! physics simulation:
//! - Hands the skeleton below a reference bone to physics on request
//! - Probes the ground while ragdolled and keeps the capsule under the body
//! - Picks a stand-up animation from the way the character is lying
//! - Fades physics out while the stand-up montage plays, then restores
//!   locomotion when the montage section ends
//! - Runs a one-shot knockdown sequence on ground contact
//! - Abstracts the host engine for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! ```text
//! Standing --toggle--> Ragdolled --toggle--> Recovering --timer--> Standing
//! ```
//!
//! Every fixed tick:
//! 1. Deferred timers advance and fire recovery/knockdown completions
//! 2. Pending [`RagdollIntent`](intent::RagdollIntent) requests drive the state machine
//! 3. Ragdolled characters probe the ground and reposition their capsule
//! 4. Recovering characters fade the physics blend weight toward zero
//! 5. Montages advance and marker components are synced
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_ragdoll_controller::prelude::*;
//!
//! let montage = Montage::new()
//!     .with_section("Default", 2.0)
//!     .with_section("StandUp_Forward", 1.5)
//!     .with_section("KnockDown", 0.8);
//!
//! // Spawn this on the character together with its SkeletonRig and Transform
//! let bundle = RagdollBundle::new(RagdollConfig::humanoid(), montage);
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod detection;
pub mod error;
pub mod intent;
pub mod interp;
pub mod montage;
pub mod rig;
pub mod scheduler;
pub mod state;
pub mod systems;
pub mod transitions;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::MotionHost;
    pub use crate::collision::CollisionData;
    pub use crate::config::RagdollConfig;
    pub use crate::detection::{RecoverySection, SensedPose};
    pub use crate::error::RagdollError;
    pub use crate::intent::RagdollIntent;
    pub use crate::montage::{Montage, MontagePlayer};
    pub use crate::rig::{PhysicsBlend, SkeletonRig};
    pub use crate::scheduler::{DeferredTimer, RagdollTimers};
    pub use crate::state::{
        KnockedDown, MovementMode, RagdollController, RagdollState, RagdollTransition,
        Ragdolled, Recovering, TransitionKind,
    };
    pub use crate::{RagdollBundle, RagdollControllerPlugin, RagdollControllerSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::Rapier3dBackend;
}

/// Ordering of the controller systems within a fixed tick.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RagdollControllerSet {
    /// Advance deferred timers and fire completions.
    Timers,
    /// Consume trigger intents.
    Triggers,
    /// Probe and reposition ragdolled characters.
    Sensors,
    /// Fade the physics blend during recovery.
    Blend,
    /// Advance montage playback.
    Animation,
    /// Sync marker components.
    Markers,
}

/// Everything a character needs besides its rig and transform.
#[derive(Bundle, Default)]
pub struct RagdollBundle {
    pub controller: state::RagdollController,
    pub config: config::RagdollConfig,
    pub intent: intent::RagdollIntent,
    pub timers: scheduler::RagdollTimers,
    pub montage: montage::MontagePlayer,
    pub movement_mode: state::MovementMode,
    pub physics_blend: rig::PhysicsBlend,
}

impl RagdollBundle {
    /// Create a bundle with `config` playing `montage` for recovery.
    pub fn new(config: config::RagdollConfig, montage: montage::Montage) -> Self {
        Self {
            config,
            montage: montage::MontagePlayer::new(montage),
            ..default()
        }
    }
}

/// Main plugin for the ragdoll controller.
///
/// This plugin is generic over a host backend `B` which provides raycasts,
/// bone transforms, physics toggles and montage control.
///
/// # Examples
///
/// With the Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_ragdoll_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(RagdollControllerPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct RagdollControllerPlugin<B: backend::MotionHost> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::MotionHost> Default for RagdollControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::MotionHost> Plugin for RagdollControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::RagdollConfig>();
        app.register_type::<intent::RagdollIntent>();
        app.register_type::<montage::MontagePlayer>();
        app.register_type::<rig::PhysicsBlend>();
        app.register_type::<state::RagdollController>();
        app.register_type::<state::MovementMode>();
        app.register_type::<state::Ragdolled>();
        app.register_type::<state::Recovering>();
        app.register_type::<state::KnockedDown>();

        app.add_event::<state::RagdollTransition>();

        // Add the host backend plugin
        app.add_plugins(B::plugin());

        app.configure_sets(
            FixedUpdate,
            (
                RagdollControllerSet::Timers,
                RagdollControllerSet::Triggers,
                RagdollControllerSet::Sensors,
                RagdollControllerSet::Blend,
                RagdollControllerSet::Animation,
                RagdollControllerSet::Markers,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::tick_ragdoll_timers::<B>.in_set(RagdollControllerSet::Timers),
                systems::apply_ragdoll_intents::<B>.in_set(RagdollControllerSet::Triggers),
                systems::update_ragdoll_sensors::<B>.in_set(RagdollControllerSet::Sensors),
                systems::decay_physics_blend::<B>.in_set(RagdollControllerSet::Blend),
                systems::advance_montages::<B>.in_set(RagdollControllerSet::Animation),
                systems::sync_state_markers.in_set(RagdollControllerSet::Markers),
            ),
        );
    }
}
