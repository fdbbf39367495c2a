//! Ragdoll trigger intents.
//!
//! Input and gameplay code do not call the state machine directly; they set
//! requests on [`RagdollIntent`] and the trigger system consumes them on the
//! next fixed tick.

use bevy::prelude::*;

/// Pending ragdoll triggers for a character.
///
/// # Example
///
/// ```rust
/// use msg_ragdoll_controller::prelude::*;
///
/// let mut intent = RagdollIntent::new();
/// intent.request_toggle();
/// assert!(intent.has_pending());
///
/// // The trigger system takes each request exactly once
/// assert!(intent.take_toggle());
/// assert!(!intent.take_toggle());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct RagdollIntent {
    /// The "toggle physics" action fired.
    pub toggle_physics: bool,
    /// The character touched the ground after an external hit.
    pub ground_contact: bool,
}

impl RagdollIntent {
    /// Create an intent with no pending requests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a ragdoll toggle: enter the ragdoll when standing, start the
    /// recovery when ragdolled.
    pub fn request_toggle(&mut self) {
        self.toggle_physics = true;
    }

    /// Report a ground contact that may start the knockdown sequence.
    pub fn notify_ground_contact(&mut self) {
        self.ground_contact = true;
    }

    /// Whether any request is waiting.
    pub fn has_pending(&self) -> bool {
        self.toggle_physics || self.ground_contact
    }

    /// Consume the toggle request.
    pub fn take_toggle(&mut self) -> bool {
        std::mem::take(&mut self.toggle_physics)
    }

    /// Consume the ground-contact notification.
    pub fn take_ground_contact(&mut self) -> bool {
        std::mem::take(&mut self.ground_contact)
    }

    /// Drop every pending request.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_nothing_pending() {
        let intent = RagdollIntent::new();
        assert!(!intent.has_pending());
    }

    #[test]
    fn requests_are_taken_once() {
        let mut intent = RagdollIntent::new();
        intent.request_toggle();
        intent.notify_ground_contact();

        assert!(intent.take_ground_contact());
        assert!(!intent.take_ground_contact());
        assert!(intent.has_pending());
        assert!(intent.take_toggle());
        assert!(!intent.has_pending());
    }

    #[test]
    fn repeated_requests_collapse() {
        let mut intent = RagdollIntent::new();
        intent.request_toggle();
        intent.request_toggle();

        assert!(intent.take_toggle());
        assert!(!intent.take_toggle());
    }

    #[test]
    fn clear_drops_requests() {
        let mut intent = RagdollIntent::new();
        intent.request_toggle();
        intent.notify_ground_contact();
        intent.clear();
        assert!(!intent.has_pending());
    }
}
