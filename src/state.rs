//! Ragdoll state.
//!
//! [`RagdollController`] holds the per-character state machine and the
//! values the systems carry from tick to tick. Marker components mirror the
//! state so other systems can filter on it in queries.

use bevy::prelude::*;

use crate::detection::{RecoverySection, SensedPose};

/// Ragdoll state of a character.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RagdollState {
    /// Animation-driven, normal locomotion.
    #[default]
    Standing,
    /// Physics-driven body, capsule follows the sensed pose.
    Ragdolled,
    /// Still ragdolled, playing the stand-up montage while physics fades out.
    Recovering,
}

impl RagdollState {
    /// Whether the body is under physics simulation.
    /// True while recovering too: recovery starts from the ragdoll.
    pub fn is_ragdolled(&self) -> bool {
        matches!(self, Self::Ragdolled | Self::Recovering)
    }

    /// Whether the stand-up recovery is running.
    pub fn is_recovering(&self) -> bool {
        matches!(self, Self::Recovering)
    }
}

/// Core ragdoll controller component.
///
/// The state is only changed by the transition functions in
/// [`transitions`](crate::transitions).
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct RagdollController {
    pub(crate) state: RagdollState,
    /// Set once by the ground-contact knockdown, never cleared.
    pub(crate) knocked: bool,
    /// Smoothed capsule location. Re-synced to the bone while standing so it
    /// is primed for the next ragdoll.
    pub lying_location: Vec3,
    /// Pose sensed on the latest ragdolled tick.
    #[reflect(ignore)]
    pub sensed_pose: Option<SensedPose>,
    /// Fraction of the body below the reference bone driven by physics.
    pub physics_alpha: f32,
}

impl Default for RagdollController {
    fn default() -> Self {
        Self {
            state: RagdollState::Standing,
            knocked: false,
            lying_location: Vec3::ZERO,
            sensed_pose: None,
            physics_alpha: 0.0,
        }
    }
}

impl RagdollController {
    /// Create a standing controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> RagdollState {
        self.state
    }

    /// Whether the body is under physics simulation.
    pub fn is_ragdolled(&self) -> bool {
        self.state.is_ragdolled()
    }

    /// Whether the stand-up recovery is running.
    pub fn is_recovering(&self) -> bool {
        self.state.is_recovering()
    }

    /// Whether the knockdown sequence has already been triggered.
    pub fn is_knocked(&self) -> bool {
        self.knocked
    }

    /// Recovery section chosen by the latest probe.
    pub fn recovery_section(&self) -> RecoverySection {
        self.sensed_pose
            .map(|pose| pose.section)
            .unwrap_or_default()
    }
}

/// How the external locomotion layer should move the character.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
pub enum MovementMode {
    /// Regular ground locomotion.
    #[default]
    Walking,
    /// No locomotion; the ragdoll controller owns the capsule.
    None,
}

/// Marker component: the body is physics-driven (includes recovery).
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Ragdolled;

/// Marker component: the stand-up recovery is running.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Recovering;

/// Marker component: the knockdown sequence has been triggered.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct KnockedDown;

/// What happened in a [`RagdollTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Standing → Ragdolled.
    Ragdolled,
    /// Ragdolled → Recovering, playing this section.
    RecoveryStarted(RecoverySection),
    /// Recovering → Standing.
    Recovered,
    /// The ground-contact knockdown started.
    KnockedDown,
    /// The knockdown timer ran out. No state change follows.
    KnockdownFinished,
}

/// Sent for every ragdoll transition.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagdollTransition {
    pub entity: Entity,
    pub kind: TransitionKind,
}
