//! Locomotion state machine.
//!
//! Exactly one [`StateKind`] is active at a time. Each kind pairs a static
//! [`StateProfile`] (clip, speed, spring tuning, velocity influence) with
//! transition rules in [`transitions`]. Entering a state never carries data
//! over from the previous one: the controller builds a fresh [`ActiveState`]
//! and re-applies the profile.

use bevy::prelude::*;

use crate::collision::GroundContact;
use crate::config::LocomotionConfig;
use crate::intent::InputFlags;

mod profile;
pub mod transitions;

pub use profile::{SpringOverride, StateProfile, VehicleCapabilities};
pub use transitions::{
    appropriate_drop_state, appropriate_start_walk_state, classify_landing, classify_start_walk,
    fall_in_air, jump_variant, on_input_change, resume_locomotion, update, StateUpdate,
};

/// Every locomotion behavior the character can be in.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StateKind {
    /// Standing still. Initial state.
    #[default]
    Idle,
    /// Starting to walk straight ahead.
    StartWalkForward,
    /// Starting to walk toward the left.
    StartWalkLeft,
    /// Starting to walk toward the right.
    StartWalkRight,
    /// Pivoting over the left shoulder into a walk behind.
    StartWalkBackLeft,
    /// Pivoting over the right shoulder into a walk behind.
    StartWalkBackRight,
    /// Continuous locomotion.
    Walk,
    /// Continuous locomotion with the run modifier held.
    Sprint,
    /// Stopping from a walk.
    EndWalk,
    /// Stopping from a sprint.
    EndSprint,
    /// No ground under the character.
    Falling,
    /// Landing recovery while standing.
    DropIdle,
    /// Landing recovery while moving.
    DropRunning,
    /// Rolling out of a hard landing.
    DropRolling,
    /// Standing jump wind-up and take-off.
    JumpIdle,
    /// Running jump wind-up and take-off.
    JumpRunning,
}

impl StateKind {
    /// Every state, in declaration order.
    pub const ALL: [StateKind; 16] = [
        StateKind::Idle,
        StateKind::StartWalkForward,
        StateKind::StartWalkLeft,
        StateKind::StartWalkRight,
        StateKind::StartWalkBackLeft,
        StateKind::StartWalkBackRight,
        StateKind::Walk,
        StateKind::Sprint,
        StateKind::EndWalk,
        StateKind::EndSprint,
        StateKind::Falling,
        StateKind::DropIdle,
        StateKind::DropRunning,
        StateKind::DropRolling,
        StateKind::JumpIdle,
        StateKind::JumpRunning,
    ];

    /// Whether the state assumes ground contact.
    pub const fn is_grounded(self) -> bool {
        self.profile().grounded
    }

    /// Whether this is one of the five start-walk variants.
    pub const fn is_start_walk(self) -> bool {
        matches!(
            self,
            StateKind::StartWalkForward
                | StateKind::StartWalkLeft
                | StateKind::StartWalkRight
                | StateKind::StartWalkBackLeft
                | StateKind::StartWalkBackRight
        )
    }

    /// Whether this is a stop variant.
    pub const fn is_end_walk(self) -> bool {
        matches!(self, StateKind::EndWalk | StateKind::EndSprint)
    }
}

/// The state currently driving a character.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveState {
    kind: StateKind,
    timer: f32,
    animation_length: Option<f32>,
    animation_requested: bool,
    jumped: bool,
    missing_length_reported: bool,
}

impl ActiveState {
    /// Enter `kind` with a zeroed timer.
    pub fn new(kind: StateKind) -> Self {
        Self {
            kind,
            timer: 0.0,
            animation_length: None,
            animation_requested: false,
            jumped: false,
            missing_length_reported: false,
        }
    }

    /// Which state this is.
    #[inline]
    pub fn kind(&self) -> StateKind {
        self.kind
    }

    /// Seconds spent in this state.
    #[inline]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Duration of the state's clip, once the animation system reported it.
    #[inline]
    pub fn animation_length(&self) -> Option<f32> {
        self.animation_length
    }

    /// Whether the clip has been requested from the animation system.
    #[inline]
    pub fn animation_requested(&self) -> bool {
        self.animation_requested
    }

    /// Whether a jump state already took off.
    #[inline]
    pub fn jumped(&self) -> bool {
        self.jumped
    }

    pub(crate) fn advance_timer(&mut self, dt: f32) {
        self.timer += dt;
    }

    pub(crate) fn mark_jumped(&mut self) {
        self.jumped = true;
    }

    /// Record the clip duration returned by the animation system.
    pub(crate) fn set_animation_length(&mut self, length: Option<f32>) {
        self.animation_length = length;
        self.animation_requested = true;
    }

    /// True once the clip has played through, allowing for the current frame.
    ///
    /// A clip with no known duration never ends; that is reported once per
    /// state entry and the state stays put until input forces it out.
    pub fn animation_ended(&mut self, dt: f32) -> bool {
        if !self.animation_requested {
            return false;
        }
        match self.animation_length {
            Some(length) => self.timer > length - dt,
            None => {
                if !self.missing_length_reported {
                    self.missing_length_reported = true;
                    error!(
                        "{:?}: clip '{}' has no known duration, state will not time out",
                        self.kind,
                        self.kind.profile().clip
                    );
                }
                false
            }
        }
    }
}

/// Everything a transition rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct StateContext<'a> {
    /// Current key state.
    pub input: &'a InputFlags,
    /// Jump went down this frame.
    pub jump_pressed: bool,
    /// Ground contact from the last probe.
    pub ground: GroundContact,
    /// Current facing (unit, ground plane).
    pub orientation: Vec3,
    /// Camera-relative movement direction, or zero.
    pub movement: Vec3,
    /// Current simulated ground speed.
    pub horizontal_speed: f32,
    /// Shared tuning.
    pub config: &'a LocomotionConfig,
}

impl StateContext<'_> {
    /// No direction key held.
    #[inline]
    pub fn no_direction(&self) -> bool {
        self.input.no_direction()
    }

    /// Some direction key held.
    #[inline]
    pub fn any_direction(&self) -> bool {
        self.input.any_direction()
    }
}
