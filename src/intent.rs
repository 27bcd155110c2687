//! Input flags.
//!
//! The host writes raw key state into [`InputFlags`]; the state machine only
//! reads it. Nothing in this crate synthesizes presses.

use bevy::prelude::*;

/// Raw pressed state of the locomotion keys.
///
/// # Example
///
/// ```rust
/// use msg_locomotion::prelude::*;
///
/// let mut input = InputFlags::new();
/// assert!(input.no_direction());
///
/// input.set_up(true);
/// input.set_left(true);
/// assert!(input.any_direction());
///
/// input.clear();
/// assert!(input.no_direction());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[reflect(Component)]
pub struct InputFlags {
    /// Move along the camera's forward direction.
    pub up: bool,
    /// Move against the camera's forward direction.
    pub down: bool,
    /// Move along the camera's left direction.
    pub left: bool,
    /// Move along the camera's right direction.
    pub right: bool,
    /// Jump key held.
    pub jump: bool,
    /// Run modifier held.
    pub run: bool,
}

impl InputFlags {
    /// Create flags with nothing pressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the forward key state.
    pub fn set_up(&mut self, pressed: bool) {
        self.up = pressed;
    }

    /// Set the backward key state.
    pub fn set_down(&mut self, pressed: bool) {
        self.down = pressed;
    }

    /// Set the left key state.
    pub fn set_left(&mut self, pressed: bool) {
        self.left = pressed;
    }

    /// Set the right key state.
    pub fn set_right(&mut self, pressed: bool) {
        self.right = pressed;
    }

    /// Set the jump key state.
    ///
    /// Call this every frame with the current state. Jumps trigger on the
    /// frame this changes from `false` to `true`.
    pub fn set_jump(&mut self, pressed: bool) {
        self.jump = pressed;
    }

    /// Set the run modifier state.
    pub fn set_run(&mut self, pressed: bool) {
        self.run = pressed;
    }

    /// Release everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when none of the four direction keys is held.
    pub fn no_direction(&self) -> bool {
        !self.up && !self.down && !self.left && !self.right
    }

    /// True when at least one direction key is held.
    pub fn any_direction(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Whether any flag differs from `previous`.
    pub fn changed_from(&self, previous: &InputFlags) -> bool {
        self != previous
    }

    /// Whether jump went from released in `previous` to pressed now.
    pub fn jump_just_pressed(&self, previous: &InputFlags) -> bool {
        self.jump && !previous.jump
    }
}
