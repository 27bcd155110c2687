//! Spring simulators.
//!
//! Used to smooth the character's velocity and heading toward the values the
//! active state asks for. Integration runs at a fixed rate; the reported
//! value is interpolated between the last two fixed frames, so the output is
//! continuous however the caller slices time.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use crate::config::SpringTuning;

/// Arithmetic a value needs in order to be driven by a [`SpringSimulator`].
pub trait SpringValue: Copy + std::fmt::Debug {
    /// The additive identity.
    const ZERO: Self;

    /// Returns `to - from`.
    fn difference(from: Self, to: Self) -> Self;

    /// Returns `self + delta`.
    fn offset(self, delta: Self) -> Self;

    /// Returns `self * factor`.
    fn scale(self, factor: f32) -> Self;

    /// Linear interpolation that respects [`SpringValue::difference`].
    fn lerp_towards(self, to: Self, t: f32) -> Self {
        self.offset(Self::difference(self, to).scale(t))
    }
}

impl SpringValue for f32 {
    const ZERO: Self = 0.0;

    fn difference(from: Self, to: Self) -> Self {
        to - from
    }

    fn offset(self, delta: Self) -> Self {
        self + delta
    }

    fn scale(self, factor: f32) -> Self {
        self * factor
    }
}

impl SpringValue for Vec3 {
    const ZERO: Self = Vec3::ZERO;

    fn difference(from: Self, to: Self) -> Self {
        to - from
    }

    fn offset(self, delta: Self) -> Self {
        self + delta
    }

    fn scale(self, factor: f32) -> Self {
        self * factor
    }
}

/// Wrap an angle in radians into `(-π, π]`.
#[inline]
pub fn wrap_angle(radians: f32) -> f32 {
    let wrapped = radians.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// A yaw angle in radians, kept in `(-π, π]`.
///
/// Differences between two angles take the short way around, so a spring
/// driven from 179° toward -179° turns through 180°. Scaling does not wrap:
/// a scaled difference is a turn, not a heading.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
pub struct Angle(f32);

impl Angle {
    /// Create an angle, wrapping it into `(-π, π]`.
    pub fn new(radians: f32) -> Self {
        Self(wrap_angle(radians))
    }

    /// Create an angle from degrees.
    pub fn from_degrees(degrees: f32) -> Self {
        Self::new(degrees.to_radians())
    }

    /// The angle in radians.
    #[inline]
    pub fn radians(self) -> f32 {
        self.0
    }

    /// The angle in degrees.
    #[inline]
    pub fn degrees(self) -> f32 {
        self.0.to_degrees()
    }
}

impl SpringValue for Angle {
    const ZERO: Self = Angle(0.0);

    fn difference(from: Self, to: Self) -> Self {
        Angle::new(to.0 - from.0)
    }

    fn offset(self, delta: Self) -> Self {
        Angle::new(self.0 + delta.0)
    }

    fn scale(self, factor: f32) -> Self {
        Angle(self.0 * factor)
    }
}

/// The smallest mass at which a spring with the given per-frame `damping`
/// stops overshooting.
///
/// Derived from the discrete update used by [`SpringSimulator`]: the error
/// decays without oscillation when `1 + d - d/m >= 2√d`.
pub fn critical_mass(damping: f32) -> f32 {
    if damping <= 0.0 {
        return 0.0;
    }
    let root = damping.sqrt();
    if root >= 1.0 {
        return f32::INFINITY;
    }
    damping / ((1.0 - root) * (1.0 - root))
}

#[derive(Debug, Clone, Copy)]
struct SpringFrame<T> {
    position: T,
    velocity: T,
}

/// Damped spring that pulls `position` toward `target`.
///
/// Each fixed frame:
/// `velocity = (velocity + (target - position) / mass) * damping`, then
/// `position += velocity`. `damping` is a per-frame retention factor in
/// `(0, 1]`; lower values damp harder. `mass` slows the response.
#[derive(Debug, Clone)]
pub struct SpringSimulator<T: SpringValue> {
    /// Per-frame velocity retention in `(0, 1]`.
    pub damping: f32,
    /// Inertia of the simulated value. Must be positive.
    pub mass: f32,
    target: T,
    position: T,
    velocity: T,
    frame_time: f32,
    accumulator: f32,
    previous: SpringFrame<T>,
    latest: SpringFrame<T>,
}

/// Smooths the character's planar velocity.
pub type VelocitySimulator = SpringSimulator<Vec3>;

/// Smooths the character's heading.
pub type RotationSimulator = SpringSimulator<Angle>;

impl<T: SpringValue> SpringSimulator<T> {
    /// Create a simulator at rest on `initial`, integrating at `rate` Hz.
    pub fn new(rate: f32, tuning: SpringTuning, initial: T) -> Self {
        let frame = SpringFrame {
            position: initial,
            velocity: T::ZERO,
        };
        Self {
            damping: tuning.damping,
            mass: tuning.mass,
            target: initial,
            position: initial,
            velocity: T::ZERO,
            frame_time: 1.0 / rate.max(1.0),
            accumulator: 0.0,
            previous: frame,
            latest: frame,
        }
    }

    /// Replace damping and mass. Position and velocity are kept.
    pub fn set_tuning(&mut self, tuning: SpringTuning) {
        self.damping = tuning.damping;
        self.mass = tuning.mass;
    }

    /// Current damping and mass.
    pub fn tuning(&self) -> SpringTuning {
        SpringTuning {
            damping: self.damping,
            mass: self.mass,
        }
    }

    /// The value the spring is pulling toward.
    #[inline]
    pub fn target(&self) -> T {
        self.target
    }

    /// The smoothed value.
    #[inline]
    pub fn position(&self) -> T {
        self.position
    }

    /// Rate of change of the smoothed value, per fixed frame.
    #[inline]
    pub fn velocity(&self) -> T {
        self.velocity
    }

    /// Duration of one fixed integration frame.
    #[inline]
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    /// Set the value to pull toward. Does not move the current value.
    pub fn set_target(&mut self, target: T) {
        self.target = target;
    }

    /// Advance the spring by `dt` seconds. Non-positive `dt` is ignored.
    pub fn simulate(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }

        self.accumulator += dt;
        while self.accumulator >= self.frame_time {
            self.accumulator -= self.frame_time;
            self.previous = self.latest;
            self.latest = self.step(self.latest);
        }

        let alpha = (self.accumulator / self.frame_time).clamp(0.0, 1.0);
        self.position = self
            .previous
            .position
            .lerp_towards(self.latest.position, alpha);
        self.velocity = self
            .previous
            .velocity
            .lerp_towards(self.latest.velocity, alpha);
    }

    fn step(&self, frame: SpringFrame<T>) -> SpringFrame<T> {
        let acceleration =
            T::difference(frame.position, self.target).scale(1.0 / self.mass.max(f32::EPSILON));
        let velocity = frame.velocity.offset(acceleration).scale(self.damping);
        SpringFrame {
            position: frame.position.offset(velocity),
            velocity,
        }
    }

    /// Snap to the target with no residual velocity.
    pub fn reset(&mut self) {
        let frame = SpringFrame {
            position: self.target,
            velocity: T::ZERO,
        };
        self.position = self.target;
        self.velocity = T::ZERO;
        self.accumulator = 0.0;
        self.previous = frame;
        self.latest = frame;
    }

    /// Set the target and snap to it.
    pub fn snap_to(&mut self, value: T) {
        self.target = value;
        self.reset();
    }

    /// Whether the current tuning converges without overshoot.
    pub fn is_overdamped(&self) -> bool {
        self.mass >= critical_mass(self.damping)
    }
}
