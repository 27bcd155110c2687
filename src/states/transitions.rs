//! Transition rules.
//!
//! Two entry points mirror the two ways a state can react: [`on_input_change`]
//! runs on frames where the key state differs from the previous frame, and
//! [`update`] runs on every other frame. Both return the next state (if any)
//! and never mutate the controller directly.

use std::f32::consts::PI;

use crate::config::{LandingThresholds, StartWalkThresholds};
use crate::direction::signed_angle_between;
use crate::intent::InputFlags;

use super::{ActiveState, StateContext, StateKind};

/// Outcome of a per-frame state update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateUpdate {
    /// State to switch to.
    pub next: Option<StateKind>,
    /// Vertical take-off speed requested this frame.
    pub jump: Option<f32>,
}

impl StateUpdate {
    /// Stay in the current state.
    pub const STAY: Self = Self {
        next: None,
        jump: None,
    };

    /// Switch to `kind`.
    pub fn to(kind: StateKind) -> Self {
        Self {
            next: Some(kind),
            jump: None,
        }
    }

    fn maybe(next: Option<StateKind>) -> Self {
        Self { next, jump: None }
    }
}

/// Falling if the last ground ray missed.
#[inline]
pub fn fall_in_air(ctx: &StateContext) -> Option<StateKind> {
    (!ctx.ground.hit).then_some(StateKind::Falling)
}

/// Pick the landing recovery for a vertical impact velocity.
///
/// Harder than `rolling` always rolls. Harder than `hard` recovers running
/// or standing depending on held direction. Anything softer resumes
/// locomotion without a recovery animation.
pub fn classify_landing(
    impact_y: f32,
    input: &InputFlags,
    thresholds: &LandingThresholds,
) -> StateKind {
    if impact_y < thresholds.rolling {
        StateKind::DropRolling
    } else if impact_y < thresholds.hard {
        if input.any_direction() {
            StateKind::DropRunning
        } else {
            StateKind::DropIdle
        }
    } else {
        resume_locomotion(input)
    }
}

/// Landing recovery for the impact recorded at the last touchdown.
pub fn appropriate_drop_state(ctx: &StateContext) -> StateKind {
    classify_landing(
        ctx.ground.impact_velocity.y,
        ctx.input,
        &ctx.config.landing,
    )
}

/// Pick the start-walk variant for the signed angle from facing to movement.
///
/// Thresholds are fractions of a half turn. Positive angles are to the left.
pub fn classify_start_walk(angle: f32, thresholds: &StartWalkThresholds) -> StateKind {
    let pivot = thresholds.pivot * PI;
    let strafe = thresholds.strafe * PI;

    if angle > pivot {
        StateKind::StartWalkBackLeft
    } else if angle < -pivot {
        StateKind::StartWalkBackRight
    } else if angle > strafe {
        StateKind::StartWalkLeft
    } else if angle < -strafe {
        StateKind::StartWalkRight
    } else {
        StateKind::StartWalkForward
    }
}

/// Start-walk variant for the current facing and movement direction.
pub fn appropriate_start_walk_state(ctx: &StateContext) -> StateKind {
    classify_start_walk(
        signed_angle_between(ctx.orientation, ctx.movement),
        &ctx.config.start_walk,
    )
}

/// Walk, Sprint or Idle depending on held keys.
pub fn resume_locomotion(input: &InputFlags) -> StateKind {
    match (input.any_direction(), input.run) {
        (false, _) => StateKind::Idle,
        (true, false) => StateKind::Walk,
        (true, true) => StateKind::Sprint,
    }
}

/// React to a change in key state.
pub fn on_input_change(state: &ActiveState, ctx: &StateContext) -> Option<StateKind> {
    let kind = state.kind();
    if kind.is_grounded() {
        if let Some(falling) = fall_in_air(ctx) {
            return Some(falling);
        }
    }

    match kind {
        StateKind::Idle | StateKind::DropIdle => {
            if ctx.jump_pressed {
                Some(jump_variant(ctx))
            } else if ctx.any_direction() {
                Some(appropriate_start_walk_state(ctx))
            } else {
                None
            }
        }
        StateKind::StartWalkForward
        | StateKind::StartWalkLeft
        | StateKind::StartWalkRight
        | StateKind::StartWalkBackLeft
        | StateKind::StartWalkBackRight => {
            if ctx.jump_pressed {
                Some(jump_variant(ctx))
            } else if ctx.no_direction() {
                if state.timer() < ctx.config.start_walk_cancel_window {
                    Some(StateKind::Idle)
                } else {
                    Some(StateKind::EndWalk)
                }
            } else if ctx.input.run {
                Some(StateKind::Sprint)
            } else {
                None
            }
        }
        StateKind::Walk => {
            if ctx.jump_pressed {
                Some(jump_variant(ctx))
            } else {
                walk_release(ctx).or_else(|| ctx.input.run.then_some(StateKind::Sprint))
            }
        }
        StateKind::Sprint => {
            if ctx.jump_pressed {
                Some(jump_variant(ctx))
            } else {
                sprint_release(ctx)
            }
        }
        StateKind::EndWalk | StateKind::EndSprint => {
            if ctx.jump_pressed {
                Some(jump_variant(ctx))
            } else if ctx.any_direction() {
                Some(resume_locomotion(ctx.input))
            } else {
                None
            }
        }
        StateKind::DropRunning | StateKind::DropRolling => {
            if ctx.jump_pressed {
                Some(jump_variant(ctx))
            } else if kind == StateKind::DropRunning && ctx.no_direction() {
                Some(StateKind::EndWalk)
            } else {
                None
            }
        }
        StateKind::Falling | StateKind::JumpIdle | StateKind::JumpRunning => None,
    }
}

/// Advance `state` by one frame. The timer has already been advanced.
pub fn update(state: &mut ActiveState, ctx: &StateContext, dt: f32) -> StateUpdate {
    let kind = state.kind();
    if kind.is_grounded() {
        if let Some(falling) = fall_in_air(ctx) {
            return StateUpdate::to(falling);
        }
    }

    match kind {
        StateKind::Idle => {
            if ctx.any_direction() {
                StateUpdate::to(appropriate_start_walk_state(ctx))
            } else {
                StateUpdate::STAY
            }
        }
        StateKind::StartWalkForward
        | StateKind::StartWalkLeft
        | StateKind::StartWalkRight
        | StateKind::StartWalkBackLeft
        | StateKind::StartWalkBackRight => {
            if state.animation_ended(dt) {
                StateUpdate::to(resume_locomotion(ctx.input))
            } else {
                StateUpdate::STAY
            }
        }
        StateKind::Walk => StateUpdate::maybe(walk_release(ctx)),
        StateKind::Sprint => StateUpdate::maybe(sprint_release(ctx)),
        StateKind::EndWalk | StateKind::EndSprint => {
            if state.animation_ended(dt) {
                StateUpdate::to(StateKind::Idle)
            } else {
                StateUpdate::STAY
            }
        }
        StateKind::Falling => {
            if ctx.ground.hit {
                StateUpdate::to(appropriate_drop_state(ctx))
            } else {
                StateUpdate::STAY
            }
        }
        StateKind::DropIdle | StateKind::DropRunning | StateKind::DropRolling => {
            if state.animation_ended(dt) {
                StateUpdate::to(resume_locomotion(ctx.input))
            } else {
                StateUpdate::STAY
            }
        }
        StateKind::JumpIdle => jump(
            state,
            ctx,
            ctx.config.jump_idle_takeoff,
            ctx.config.jump_idle_speed,
        ),
        StateKind::JumpRunning => jump(
            state,
            ctx,
            ctx.config.jump_running_takeoff,
            ctx.config.jump_running_speed,
        ),
    }
}

/// Running jump when a direction is held at the press, standing otherwise.
pub fn jump_variant(ctx: &StateContext) -> StateKind {
    if ctx.any_direction() {
        StateKind::JumpRunning
    } else {
        StateKind::JumpIdle
    }
}

fn walk_release(ctx: &StateContext) -> Option<StateKind> {
    ctx.no_direction().then_some(StateKind::EndWalk)
}

fn sprint_release(ctx: &StateContext) -> Option<StateKind> {
    if ctx.no_direction() {
        Some(StateKind::EndSprint)
    } else if !ctx.input.run {
        Some(StateKind::Walk)
    } else {
        None
    }
}

fn jump(state: &mut ActiveState, ctx: &StateContext, takeoff: f32, speed: f32) -> StateUpdate {
    if !ctx.ground.hit {
        return StateUpdate::to(StateKind::Falling);
    }

    if !state.jumped() {
        if state.timer() > takeoff {
            state.mark_jumped();
            return StateUpdate {
                next: None,
                jump: Some(speed),
            };
        }
        return StateUpdate::STAY;
    }

    // Took off but never left the ground (ceiling, steep slope)
    if state.timer() > takeoff + ctx.config.jump_land_check {
        StateUpdate::to(resume_locomotion(ctx.input))
    } else {
        StateUpdate::STAY
    }
}
