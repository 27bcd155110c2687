//! Direction math.
//!
//! All directions live on the ground plane (Y up). Headings are yaw angles
//! around +Y where heading 0 faces +Z and positive angles turn left.

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::intent::InputFlags;

/// Yaw-only camera basis used to map input onto the ground plane.
///
/// Kept up to date from the entity marked with [`LocomotionCamera`], or
/// written directly by the host.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct CameraBasis {
    forward: Vec3,
    right: Vec3,
}

impl Default for CameraBasis {
    fn default() -> Self {
        // Bevy cameras look down -Z
        Self {
            forward: Vec3::NEG_Z,
            right: Vec3::X,
        }
    }
}

impl CameraBasis {
    /// Build a basis from camera forward and right vectors.
    ///
    /// Pitch is stripped from both. When the camera looks straight up or
    /// down, forward is rebuilt from right.
    pub fn new(forward: Vec3, right: Vec3) -> Self {
        let right = flatten(right);
        let right = if right == Vec3::ZERO {
            let forward = flatten(forward);
            if forward == Vec3::ZERO {
                return Self::default();
            }
            forward.cross(Vec3::Y)
        } else {
            right
        };

        let forward = flatten(forward);
        let forward = if forward == Vec3::ZERO {
            Vec3::Y.cross(right)
        } else {
            forward
        };

        Self { forward, right }
    }

    /// Build a basis from a camera transform.
    pub fn from_transform(transform: &GlobalTransform) -> Self {
        Self::new(*transform.forward(), *transform.right())
    }

    /// Pitch-free forward direction.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Pitch-free right direction.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Pitch-free left direction.
    #[inline]
    pub fn left(&self) -> Vec3 {
        -self.right
    }
}

/// Marks the camera whose yaw defines "forward" for movement input.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct LocomotionCamera;

/// Project onto the ground plane and normalize, or zero.
#[inline]
fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z).normalize_or_zero()
}

/// Camera-relative movement direction for the pressed keys.
///
/// Up/down map to camera forward, left/right to camera right. The result is
/// normalized and on the ground plane, or [`Vec3::ZERO`] when nothing (or
/// only opposing keys) is pressed. Zero is not a direction; callers must
/// check for it.
pub fn camera_relative_movement_vector(input: &InputFlags, camera: &CameraBasis) -> Vec3 {
    let forward_axis = input.up as i8 - input.down as i8;
    let right_axis = input.right as i8 - input.left as i8;

    let movement =
        camera.forward() * f32::from(forward_axis) + camera.right() * f32::from(right_axis);
    flatten(movement)
}

/// Signed yaw angle that rotates `from` onto `to` around +Y.
///
/// The result lies in `(-π, π]`; positive means `to` is to the left of
/// `from`. Opposite vectors return `π`. Returns `0.0` if either vector has
/// no ground-plane component.
pub fn signed_angle_between(from: Vec3, to: Vec3) -> f32 {
    let a = flatten(from);
    let b = flatten(to);
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }

    let angle = a.cross(b).y.atan2(a.dot(b));
    if angle <= -PI {
        PI
    } else {
        angle
    }
}

/// Yaw heading of a ground-plane direction.
#[inline]
pub fn heading_of(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Unit ground-plane direction for a yaw heading.
#[inline]
pub fn direction_from_heading(heading: f32) -> Vec3 {
    Quat::from_rotation_y(heading) * Vec3::Z
}
