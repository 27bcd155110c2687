//! The character controller.
//!
//! [`CharacterController`] owns the active state and both spring simulators.
//! One frame is split in three so the ECS systems can interleave physics:
//!
//! 1. [`CharacterController::advance`] runs the state machine and the springs.
//! 2. [`CharacterController::probe_ground`] casts the ground ray.
//! 3. [`CharacterController::request_animation`] asks for the state's clip.
//!
//! [`CharacterController::tick`] runs all three in order.

use bevy::prelude::*;

use crate::animation::AnimationSink;
use crate::collision::{GroundContact, GroundProbe};
use crate::config::LocomotionConfig;
use crate::direction::{
    camera_relative_movement_vector, direction_from_heading, heading_of, CameraBasis,
};
use crate::intent::InputFlags;
use crate::simulator::{Angle, RotationSimulator, VelocitySimulator};
use crate::states::{self, ActiveState, StateContext, StateKind, VehicleCapabilities};

/// Locomotion state of one character.
///
/// # Example
///
/// ```rust
/// use msg_locomotion::prelude::*;
///
/// let config = LocomotionConfig::default();
/// let controller = CharacterController::new(&config);
/// assert_eq!(controller.kind(), StateKind::Idle);
/// ```
#[derive(Component, Debug, Clone)]
pub struct CharacterController {
    position: Vec3,
    orientation: Vec3,
    state: ActiveState,
    state_entry: u32,
    velocity_simulator: VelocitySimulator,
    rotation_simulator: RotationSimulator,
    velocity_influence: Vec3,
    velocity_is_additive: bool,
    ground: GroundContact,
    previous_input: InputFlags,
    movement: Vec3,
    pending_jump: Option<f32>,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new(&LocomotionConfig::default())
    }
}

impl CharacterController {
    /// Create a controller in Idle, facing +Z.
    pub fn new(config: &LocomotionConfig) -> Self {
        let mut controller = Self {
            position: Vec3::ZERO,
            orientation: Vec3::Z,
            state: ActiveState::new(StateKind::Idle),
            state_entry: 0,
            velocity_simulator: VelocitySimulator::new(
                config.simulation_rate,
                config.velocity_spring,
                Vec3::ZERO,
            ),
            rotation_simulator: RotationSimulator::new(
                config.simulation_rate,
                config.rotation_spring,
                Angle::new(0.0),
            ),
            velocity_influence: Vec3::ONE,
            velocity_is_additive: false,
            ground: GroundContact::default(),
            previous_input: InputFlags::default(),
            movement: Vec3::ZERO,
            pending_jump: None,
        };
        controller.apply_profile(config);
        controller
    }

    /// Builder: start facing `heading` (yaw, 0 faces +Z).
    pub fn with_heading(mut self, heading: f32) -> Self {
        self.rotation_simulator.snap_to(Angle::new(heading));
        self.orientation = direction_from_heading(heading);
        self
    }

    /// Builder: start at `position`.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Which state is active.
    #[inline]
    pub fn kind(&self) -> StateKind {
        self.state.kind()
    }

    /// The active state.
    #[inline]
    pub fn state(&self) -> &ActiveState {
        &self.state
    }

    /// Counts state entries, so re-entering the same kind is distinguishable.
    #[inline]
    pub fn state_entry(&self) -> u32 {
        self.state_entry
    }

    /// Ray origin used for ground probing.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Update the ray origin, normally from the physics body.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Current facing on the ground plane.
    #[inline]
    pub fn orientation(&self) -> Vec3 {
        self.orientation
    }

    /// Current heading (yaw, radians).
    #[inline]
    pub fn heading(&self) -> f32 {
        self.rotation_simulator.position().radians()
    }

    /// Smoothed locomotion velocity.
    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity_simulator.position()
    }

    /// Ground-plane speed of the smoothed velocity.
    pub fn horizontal_speed(&self) -> f32 {
        let velocity = self.velocity();
        Vec3::new(velocity.x, 0.0, velocity.z).length()
    }

    /// Camera-relative movement direction from the last advance, or zero.
    #[inline]
    pub fn movement(&self) -> Vec3 {
        self.movement
    }

    /// Ground contact from the last probe.
    #[inline]
    pub fn ground(&self) -> &GroundContact {
        &self.ground
    }

    /// Whether the last ground ray hit.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.ground.hit
    }

    /// Per-axis weight of the smoothed velocity against the body's velocity.
    #[inline]
    pub fn velocity_influence(&self) -> Vec3 {
        self.velocity_influence
    }

    /// Whether the smoothed velocity is added to the body's velocity.
    #[inline]
    pub fn velocity_is_additive(&self) -> bool {
        self.velocity_is_additive
    }

    /// Vehicle flags of the active state.
    pub fn capabilities(&self) -> VehicleCapabilities {
        self.state.kind().profile().capabilities
    }

    /// The velocity spring.
    #[inline]
    pub fn velocity_simulator(&self) -> &VelocitySimulator {
        &self.velocity_simulator
    }

    /// The heading spring.
    #[inline]
    pub fn rotation_simulator(&self) -> &RotationSimulator {
        &self.rotation_simulator
    }

    /// Enter `kind`, discarding the current state.
    ///
    /// Re-tunes both springs and the velocity mask from the state's profile
    /// and queues its clip for the next [`request_animation`](Self::request_animation).
    pub fn set_state(&mut self, kind: StateKind, config: &LocomotionConfig) {
        debug!("locomotion state {:?} -> {:?}", self.state.kind(), kind);
        self.state = ActiveState::new(kind);
        self.state_entry = self.state_entry.wrapping_add(1);
        self.apply_profile(config);
    }

    fn apply_profile(&mut self, config: &LocomotionConfig) {
        let profile = self.state.kind().profile();
        self.velocity_simulator
            .set_tuning(profile.velocity_spring.apply(config.velocity_spring));
        self.rotation_simulator
            .set_tuning(profile.rotation_spring.apply(config.rotation_spring));
        self.velocity_influence = profile.velocity_influence;
        self.velocity_is_additive = profile.velocity_is_additive;
    }

    /// Run the state machine and both springs for one frame.
    ///
    /// When the key state changed since the last frame the state first gets
    /// a chance to react to that; otherwise it runs its regular update. A
    /// state entered here is not updated until the next frame.
    pub fn advance(
        &mut self,
        dt: f32,
        input: &InputFlags,
        camera: &CameraBasis,
        config: &LocomotionConfig,
    ) {
        self.movement = camera_relative_movement_vector(input, camera);
        let input_changed = input.changed_from(&self.previous_input);
        let jump_pressed = input.jump_just_pressed(&self.previous_input);
        self.previous_input = *input;

        self.state.advance_timer(dt);

        let ctx = StateContext {
            input,
            jump_pressed,
            ground: self.ground,
            orientation: self.orientation,
            movement: self.movement,
            horizontal_speed: self.horizontal_speed(),
            config,
        };

        let reaction = if input_changed {
            states::on_input_change(&self.state, &ctx)
        } else {
            None
        };

        match reaction {
            Some(next) => self.set_state(next, config),
            None => {
                let outcome = states::update(&mut self.state, &ctx, dt);
                if let Some(speed) = outcome.jump {
                    self.pending_jump = Some(speed);
                }
                if let Some(next) = outcome.next {
                    self.set_state(next, config);
                }
            }
        }

        let speed = self.state.kind().profile().speed * config.move_speed;
        self.velocity_simulator.set_target(self.movement * speed);
        self.velocity_simulator.simulate(dt);

        if self.movement != Vec3::ZERO {
            self.rotation_simulator
                .set_target(Angle::new(heading_of(self.movement)));
        }
        self.rotation_simulator.simulate(dt);
        self.orientation = direction_from_heading(self.heading());
    }

    /// Cast the ground ray straight down. Returns true on touchdown.
    pub fn probe_ground(&mut self, probe: &mut impl GroundProbe, config: &LocomotionConfig) -> bool {
        let origin = self.position + Vec3::Y * config.ray_origin_offset;
        let hit = probe.cast_ray(origin, Vec3::NEG_Y, config.ray_cast_length);
        let was_grounded = self.ground.hit;
        let landed = self.ground.record(hit);
        if was_grounded != self.ground.hit {
            trace!(
                "ground contact {} (impact {:?})",
                if self.ground.hit { "gained" } else { "lost" },
                self.ground.impact_velocity
            );
        }
        landed
    }

    /// Ask `sink` for the active state's clip if it has not been asked yet.
    pub fn request_animation(&mut self, sink: &mut impl AnimationSink) {
        if self.state.animation_requested() {
            return;
        }
        let profile = self.state.kind().profile();
        let length = sink.set_animation(profile.clip, profile.fade_in);
        self.state.set_animation_length(length);
    }

    /// Run one complete frame.
    pub fn tick(
        &mut self,
        dt: f32,
        input: &InputFlags,
        camera: &CameraBasis,
        config: &LocomotionConfig,
        probe: &mut impl GroundProbe,
        sink: &mut impl AnimationSink,
    ) {
        self.advance(dt, input, camera, config);
        self.probe_ground(probe, config);
        self.request_animation(sink);
    }

    /// Blend the smoothed velocity into the body's velocity.
    ///
    /// Replacing states move each axis from `physics` toward the smoothed
    /// velocity by its influence weight. Additive states push along an axis
    /// only while the body is slower than the spring target on that axis or
    /// moving against it.
    pub fn resolve_velocity(&self, physics: Vec3, dt: f32) -> Vec3 {
        let simulated = self.velocity_simulator.position();
        let influence = self.velocity_influence;

        if !self.velocity_is_additive {
            return physics + (simulated - physics) * influence;
        }

        let wanted = self.velocity_simulator.target();
        let add = simulated * influence * (dt / self.velocity_simulator.frame_time());
        let axis = |body: f32, add: f32, wanted: f32| {
            if body.abs() < wanted.abs() || body * add < 0.0 {
                body + add
            } else {
                body
            }
        };
        Vec3::new(
            axis(physics.x, add.x, wanted.x),
            axis(physics.y, add.y, wanted.y),
            axis(physics.z, add.z, wanted.z),
        )
    }

    /// Take the vertical take-off speed a jump state asked for, if any.
    pub fn take_jump(&mut self) -> Option<f32> {
        self.pending_jump.take()
    }

    /// Put the character back to rest at `position`, facing `heading`.
    ///
    /// Both springs snap with no residual motion and the machine re-enters
    /// Idle. Ground contact is kept but the recorded impact is cleared.
    pub fn reset(&mut self, position: Vec3, heading: f32, config: &LocomotionConfig) {
        self.position = position;
        self.velocity_simulator.snap_to(Vec3::ZERO);
        self.rotation_simulator.snap_to(Angle::new(heading));
        self.orientation = direction_from_heading(heading);
        self.ground.impact_velocity = Vec3::ZERO;
        self.movement = Vec3::ZERO;
        self.pending_jump = None;
        self.set_state(StateKind::Idle, config);
    }
}
