//! State marker components and events.
//!
//! Markers mirror the controller's ground contact so gameplay code can
//! filter queries on them. Events report state transitions and accept
//! teleport requests.

use bevy::prelude::*;

use crate::states::StateKind;

/// Marker component indicating the character's ground ray hit.
///
/// This is a marker component - it has no data, just indicates state.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// // Grounded is a marker component - just use it in queries
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character's ground ray missed.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Sent whenever a character enters a new locomotion state.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocomotionStateChanged {
    /// The character.
    pub entity: Entity,
    /// State that was left.
    pub from: StateKind,
    /// State that was entered.
    pub to: StateKind,
}

/// Request to teleport a character and put it back to rest in Idle.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ResetLocomotion {
    /// The character.
    pub entity: Entity,
    /// New world position.
    pub position: Vec3,
    /// New heading (yaw, 0 faces +Z).
    pub heading: f32,
}

impl ResetLocomotion {
    /// Teleport `entity` to `position`, facing `heading`.
    pub fn new(entity: Entity, position: Vec3, heading: f32) -> Self {
        Self {
            entity,
            position,
            heading,
        }
    }
}
