//! Error types for the ragdoll controller.

use bevy::prelude::*;
use thiserror::Error;

/// Failures the controller absorbs by falling back and logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RagdollError {
    /// The entity has no [`RagdollController`](crate::state::RagdollController).
    #[error("entity {0:?} has no ragdoll controller")]
    MissingController(Entity),

    /// The entity has no [`RagdollConfig`](crate::config::RagdollConfig).
    #[error("entity {0:?} has no ragdoll config")]
    MissingConfig(Entity),

    /// The montage has no section with this name.
    #[error("montage has no section named `{0}`")]
    MissingSection(String),

    /// The entity has no montage to play.
    #[error("entity {0:?} has no montage player")]
    MissingMontage(Entity),
}
