//! Deferred one-shot timers.
//!
//! The recovery and knockdown sequences each finish after the authored length
//! of an animation section. Each sequence owns one [`DeferredTimer`] slot; the
//! timer system advances the slots at the start of every tick and fires the
//! completion when a slot runs out.

use std::time::Duration;

use bevy::prelude::*;

/// A single-shot timer slot.
///
/// At most one timer is pending per slot. Arming a pending slot replaces the
/// previous timer; firing or cancelling disarms it.
#[derive(Debug, Clone, Default)]
pub struct DeferredTimer {
    timer: Option<Timer>,
}

impl DeferredTimer {
    /// Schedule the slot to fire once after `duration`.
    pub fn arm(&mut self, duration: Duration) {
        self.timer = Some(Timer::new(duration, TimerMode::Once));
    }

    /// Schedule the slot to fire once after `seconds`.
    ///
    /// Negative or non-finite lengths fire on the next tick.
    pub fn arm_secs(&mut self, seconds: f32) {
        let duration = if seconds.is_finite() && seconds > 0.0 {
            Duration::from_secs_f32(seconds)
        } else {
            Duration::ZERO
        };
        self.arm(duration);
    }

    /// Clear the pending timer. No effect if nothing is pending.
    pub fn cancel(&mut self) {
        self.timer = None;
    }

    /// Whether a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Duration the pending timer was armed with.
    pub fn duration(&self) -> Option<Duration> {
        self.timer.as_ref().map(Timer::duration)
    }

    /// Time left before the pending timer fires.
    pub fn remaining(&self) -> Option<Duration> {
        self.timer.as_ref().map(Timer::remaining)
    }

    /// Advance the pending timer.
    ///
    /// Returns `true` exactly once, on the tick the timer runs out, and
    /// disarms the slot.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        timer.tick(delta);
        if timer.finished() {
            self.timer = None;
            true
        } else {
            false
        }
    }
}

/// Timer slots owned by a ragdoll character.
#[derive(Component, Debug, Clone, Default)]
pub struct RagdollTimers {
    /// Finishes the stand-up recovery.
    pub recovery: DeferredTimer,
    /// Finishes the ground-contact knockdown sequence.
    pub knockdown: DeferredTimer,
}

/// Which slots fired during a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiredTimers {
    pub recovery: bool,
    pub knockdown: bool,
}

impl FiredTimers {
    pub fn any(&self) -> bool {
        self.recovery || self.knockdown
    }
}

impl RagdollTimers {
    /// Advance both slots.
    pub fn tick(&mut self, delta: Duration) -> FiredTimers {
        FiredTimers {
            recovery: self.recovery.tick(delta),
            knockdown: self.knockdown.tick(delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUARTER: Duration = Duration::from_millis(250);

    #[test]
    fn idle_slot_never_fires() {
        let mut slot = DeferredTimer::default();
        assert!(!slot.is_pending());
        assert!(!slot.tick(Duration::from_secs(10)));
        assert!(slot.duration().is_none());
    }

    #[test]
    fn fires_once_after_duration() {
        let mut slot = DeferredTimer::default();
        slot.arm(Duration::from_secs(1));

        for _ in 0..3 {
            assert!(!slot.tick(QUARTER));
        }
        assert_eq!(slot.remaining(), Some(QUARTER));
        assert!(slot.tick(QUARTER));
        assert!(!slot.is_pending());
        assert!(!slot.tick(QUARTER));
    }

    #[test]
    fn rearm_replaces_pending_timer() {
        let mut slot = DeferredTimer::default();
        slot.arm(Duration::from_millis(500));
        assert!(!slot.tick(QUARTER));

        slot.arm(Duration::from_secs(1));
        assert_eq!(slot.duration(), Some(Duration::from_secs(1)));
        assert!(!slot.tick(QUARTER));
        assert!(!slot.tick(QUARTER));
        assert!(!slot.tick(QUARTER));
        assert!(slot.tick(QUARTER));
    }

    #[test]
    fn cancel_clears_and_is_idempotent() {
        let mut slot = DeferredTimer::default();
        slot.cancel();
        slot.arm(QUARTER);
        slot.cancel();
        slot.cancel();
        assert!(!slot.is_pending());
        assert!(!slot.tick(Duration::from_secs(1)));
    }

    #[test]
    fn zero_and_invalid_lengths_fire_next_tick() {
        let mut slot = DeferredTimer::default();
        slot.arm_secs(-1.0);
        assert_eq!(slot.duration(), Some(Duration::ZERO));
        assert!(slot.tick(Duration::ZERO));

        slot.arm_secs(f32::NAN);
        assert!(slot.tick(QUARTER));
    }

    #[test]
    fn slots_are_independent() {
        let mut timers = RagdollTimers::default();
        timers.recovery.arm(QUARTER);
        timers.knockdown.arm(Duration::from_millis(500));

        let fired = timers.tick(QUARTER);
        assert!(fired.recovery);
        assert!(!fired.knockdown);
        assert!(fired.any());

        let fired = timers.tick(QUARTER);
        assert_eq!(fired, FiredTimers { recovery: false, knockdown: true });
    }
}
