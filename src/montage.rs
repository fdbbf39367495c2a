//! Reference montage player.
//!
//! A [`Montage`] is an animation clip split into named sections laid end to
//! end. [`MontagePlayer`] tracks playback of one montage on a character. The
//! default [`MotionHost`](crate::backend::MotionHost) montage functions drive
//! this component; hosts with their own animation graph can override them.

use bevy::prelude::*;

use crate::error::RagdollError;

/// A named, contiguous part of a montage.
#[derive(Reflect, Debug, Clone, PartialEq)]
pub struct MontageSection {
    /// Section name.
    pub name: String,
    /// Start time within the montage (seconds).
    pub start: f32,
    /// Authored length (seconds).
    pub length: f32,
}

impl MontageSection {
    /// End time within the montage (seconds).
    #[inline]
    pub fn end(&self) -> f32 {
        self.start + self.length
    }
}

/// An animation clip addressable by section.
#[derive(Reflect, Debug, Clone, Default, PartialEq)]
pub struct Montage {
    sections: Vec<MontageSection>,
}

impl Montage {
    /// Create an empty montage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append a section after the existing ones.
    pub fn with_section(mut self, name: impl Into<String>, length: f32) -> Self {
        let start = self.total_length();
        self.sections.push(MontageSection {
            name: name.into(),
            start,
            length: length.max(0.0),
        });
        self
    }

    /// All sections in playback order.
    pub fn sections(&self) -> &[MontageSection] {
        &self.sections
    }

    /// Index of the section called `name`.
    pub fn section_index(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    /// Section at `index`.
    pub fn section(&self, index: usize) -> Option<&MontageSection> {
        self.sections.get(index)
    }

    /// Authored length of the section at `index`.
    pub fn section_length(&self, index: usize) -> Option<f32> {
        self.section(index).map(|s| s.length)
    }

    /// Index of the section playing at `time`.
    pub fn section_at(&self, time: f32) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| time >= s.start && time < s.end())
            .or_else(|| {
                // The very end of the clip belongs to the last section
                (!self.sections.is_empty() && time >= self.total_length())
                    .then(|| self.sections.len() - 1)
            })
    }

    /// Length of the whole montage.
    pub fn total_length(&self) -> f32 {
        self.sections.last().map(MontageSection::end).unwrap_or(0.0)
    }
}

/// Playback state of a character's recovery montage.
#[derive(Component, Reflect, Debug, Clone, Default)]
#[reflect(Component)]
pub struct MontagePlayer {
    montage: Montage,
    position: f32,
    play_rate: f32,
    playing: bool,
    /// Section last jumped to; playback stops at its end.
    active_section: Option<usize>,
}

impl MontagePlayer {
    /// Create a stopped player for `montage`.
    pub fn new(montage: Montage) -> Self {
        Self {
            montage,
            position: 0.0,
            play_rate: 1.0,
            playing: false,
            active_section: None,
        }
    }

    /// The montage this player plays.
    pub fn montage(&self) -> &Montage {
        &self.montage
    }

    /// Play from the start at `play_rate`.
    pub fn play(&mut self, play_rate: f32) {
        self.position = 0.0;
        self.play_rate = play_rate;
        self.playing = true;
        self.active_section = None;
    }

    /// Stop playback, keeping the current position.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Move playback to the start of the section called `name`.
    ///
    /// Playback then stops at the end of that section rather than running
    /// into the next one.
    pub fn jump_to_section(&mut self, name: &str) -> Result<usize, RagdollError> {
        let index = self
            .montage
            .section_index(name)
            .ok_or_else(|| RagdollError::MissingSection(name.to_string()))?;
        self.position = self.montage.sections[index].start;
        self.active_section = Some(index);
        Ok(index)
    }

    /// Advance playback by `dt` seconds.
    ///
    /// Stops at the end of the section last jumped to, or at the end of the
    /// montage when playing from the start.
    pub fn advance(&mut self, dt: f32) {
        if !self.playing || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.position += dt * self.play_rate;
        let end = self
            .active_section
            .and_then(|index| self.montage.section(index))
            .map_or_else(|| self.montage.total_length(), MontageSection::end);
        if self.position >= end {
            self.position = end;
            self.playing = false;
        }
    }

    /// Whether the montage is playing.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playback position in seconds.
    pub fn position(&self) -> f32 {
        self.position
    }

    /// Current playback rate.
    pub fn play_rate(&self) -> f32 {
        self.play_rate
    }

    /// Index of the section being played.
    pub fn current_section(&self) -> Option<usize> {
        self.active_section
            .or_else(|| self.montage.section_at(self.position))
    }

    /// Name of the section under the playhead.
    pub fn current_section_name(&self) -> Option<&str> {
        self.current_section()
            .and_then(|i| self.montage.section(i))
            .map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standup_montage() -> Montage {
        Montage::new()
            .with_section("Default", 2.0)
            .with_section("StandUp_Forward", 1.5)
            .with_section("KnockDown", 0.5)
    }

    #[test]
    fn sections_are_laid_end_to_end() {
        let montage = standup_montage();
        assert_eq!(montage.sections().len(), 3);
        assert_eq!(montage.section(1).map(|s| s.start), Some(2.0));
        assert_eq!(montage.section(2).map(|s| s.start), Some(3.5));
        assert_eq!(montage.total_length(), 4.0);
    }

    #[test]
    fn lookup_by_name_and_index() {
        let montage = standup_montage();
        assert_eq!(montage.section_index("KnockDown"), Some(2));
        assert_eq!(montage.section_index("Missing"), None);
        assert_eq!(montage.section_length(1), Some(1.5));
        assert_eq!(montage.section_length(9), None);
    }

    #[test]
    fn section_at_time() {
        let montage = standup_montage();
        assert_eq!(montage.section_at(0.0), Some(0));
        assert_eq!(montage.section_at(2.0), Some(1));
        assert_eq!(montage.section_at(3.9), Some(2));
        assert_eq!(montage.section_at(4.0), Some(2));
        assert_eq!(montage.section_at(-1.0), None);
        assert_eq!(Montage::new().section_at(0.0), None);
    }

    #[test]
    fn negative_length_is_clamped() {
        let montage = Montage::new().with_section("Broken", -3.0);
        assert_eq!(montage.section_length(0), Some(0.0));
    }

    #[test]
    fn play_then_jump() {
        let mut player = MontagePlayer::new(standup_montage());
        assert!(!player.is_playing());

        player.play(1.0);
        assert!(player.is_playing());
        assert_eq!(player.current_section_name(), Some("Default"));

        assert_eq!(player.jump_to_section("StandUp_Forward"), Ok(1));
        assert_eq!(player.position(), 2.0);
        assert_eq!(player.current_section_name(), Some("StandUp_Forward"));
    }

    #[test]
    fn jump_to_missing_section_keeps_position() {
        let mut player = MontagePlayer::new(standup_montage());
        player.play(1.0);
        player.advance(0.5);

        let result = player.jump_to_section("Nope");
        assert_eq!(result, Err(RagdollError::MissingSection("Nope".to_string())));
        assert_eq!(player.position(), 0.5);
    }

    #[test]
    fn advance_respects_rate_and_stops_at_end() {
        let mut player = MontagePlayer::new(standup_montage());
        player.advance(1.0);
        assert_eq!(player.position(), 0.0);

        player.play(2.0);
        player.advance(0.5);
        assert_eq!(player.position(), 1.0);

        player.advance(10.0);
        assert_eq!(player.position(), 4.0);
        assert!(!player.is_playing());
    }

    #[test]
    fn jumped_section_stops_at_its_own_end() {
        let mut player = MontagePlayer::new(standup_montage());
        player.play(1.0);
        assert_eq!(player.jump_to_section("Default"), Ok(0));

        player.advance(1.5);
        assert!(player.is_playing());
        player.advance(1.5);
        assert_eq!(player.position(), 2.0);
        assert!(!player.is_playing());
        assert_eq!(player.current_section_name(), Some("Default"));

        // Restarting plays the whole montage again
        player.play(1.0);
        player.advance(3.0);
        assert!(player.is_playing());
        assert_eq!(player.current_section_name(), Some("StandUp_Forward"));
    }

    #[test]
    fn advance_ignores_invalid_deltas() {
        let mut player = MontagePlayer::new(standup_montage());
        player.play(1.0);
        player.advance(f32::NAN);
        player.advance(-1.0);
        assert_eq!(player.position(), 0.0);
        assert!(player.is_playing());
    }
}
