//! Locomotion configuration components.
//!
//! This module defines the tuning shared by every locomotion state: default
//! spring parameters, movement speed, ground probe length, jump timing and
//! the thresholds used to pick landing and start-walk animations.

use bevy::prelude::*;
use thiserror::Error;

/// Damping and mass of a [`SpringSimulator`](crate::simulator::SpringSimulator).
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SpringTuning {
    /// Per-frame velocity retention in `(0, 1]`. Lower values damp harder.
    pub damping: f32,
    /// Inertia. Higher values respond more slowly.
    pub mass: f32,
}

impl SpringTuning {
    /// Create a tuning.
    pub const fn new(damping: f32, mass: f32) -> Self {
        Self { damping, mass }
    }
}

/// Vertical impact speeds that decide which landing recovery plays.
///
/// Both values are negative (downward). Impacts below `rolling` roll;
/// impacts below `hard` play a recovery; softer landings resume directly.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct LandingThresholds {
    /// Impact speed below which the character rolls.
    pub rolling: f32,
    /// Impact speed below which the character plays a recovery animation.
    pub hard: f32,
}

impl Default for LandingThresholds {
    fn default() -> Self {
        Self {
            rolling: -6.0,
            hard: -2.0,
        }
    }
}

/// Fractions of a half turn (π) that split start-walk animations.
///
/// A desired heading more than `pivot * π` away from the current one
/// plays a back pivot; more than `strafe * π` plays a side start.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct StartWalkThresholds {
    /// Fraction of π beyond which a back pivot plays.
    pub pivot: f32,
    /// Fraction of π beyond which a side start plays.
    pub strafe: f32,
}

impl Default for StartWalkThresholds {
    fn default() -> Self {
        Self {
            pivot: 0.8,
            strafe: 0.3,
        }
    }
}

/// Invalid locomotion tuning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Spring mass must be positive and finite.
    #[error("{spring} spring mass must be positive, got {mass}")]
    InvalidMass { spring: &'static str, mass: f32 },

    /// Spring damping must lie in (0, 1].
    #[error("{spring} spring damping must be in (0, 1], got {damping}")]
    InvalidDamping { spring: &'static str, damping: f32 },

    /// A rotation spring lighter than 1 would turn more than half a circle
    /// in one frame.
    #[error("rotation spring mass must be at least 1, got {0}")]
    RotationMassTooLow(f32),

    /// Simulation rate must be positive.
    #[error("simulation rate must be positive, got {0}")]
    InvalidSimulationRate(f32),

    /// Move speed must be positive.
    #[error("move speed must be positive, got {0}")]
    InvalidMoveSpeed(f32),

    /// Timestep clamp must be positive.
    #[error("max timestep must be positive, got {0}")]
    InvalidMaxTimestep(f32),

    /// Ground probe must have a positive length.
    #[error("ray cast length must be positive, got {0}")]
    InvalidRayLength(f32),

    /// Landing thresholds must satisfy `rolling < hard <= 0`.
    #[error("landing thresholds out of order: rolling {rolling}, hard {hard}")]
    LandingThresholdOrder { rolling: f32, hard: f32 },

    /// Start-walk fractions must satisfy `0 < strafe < pivot < 1`.
    #[error("start-walk thresholds out of order: strafe {strafe}, pivot {pivot}")]
    StartWalkThresholdOrder { strafe: f32, pivot: f32 },
}

/// Configuration shared by every locomotion state of a character.
///
/// Individual states override spring tuning through their
/// [`StateProfile`](crate::states::StateProfile); anything a state leaves
/// unset falls back to the defaults here.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct LocomotionConfig {
    // === Springs ===
    /// Velocity spring tuning used when a state does not override it.
    pub velocity_spring: SpringTuning,

    /// Rotation spring tuning used when a state does not override it.
    pub rotation_spring: SpringTuning,

    /// Fixed integration rate of both springs (Hz).
    pub simulation_rate: f32,

    // === Movement ===
    /// Full locomotion speed (units/second). State speed factors scale this.
    pub move_speed: f32,

    /// Largest timestep fed to the state machine in one update (seconds).
    pub max_timestep: f32,

    // === Ground Probe ===
    /// Length of the downward ground ray, measured from the ray origin.
    pub ray_cast_length: f32,

    /// Height of the ray origin above the character position.
    pub ray_origin_offset: f32,

    // === Transition Thresholds ===
    /// Landing severity thresholds.
    pub landing: LandingThresholds,

    /// Start-walk direction thresholds.
    pub start_walk: StartWalkThresholds,

    /// Time after entering a start-walk during which releasing every
    /// direction returns straight to idle instead of playing a stop.
    pub start_walk_cancel_window: f32,

    // === Jump Settings ===
    /// Upward take-off speed of a standing jump.
    pub jump_idle_speed: f32,

    /// Upward take-off speed of a running jump.
    pub jump_running_speed: f32,

    /// Seconds into the standing jump animation when the character leaves the ground.
    pub jump_idle_takeoff: f32,

    /// Seconds into the running jump animation when the character leaves the ground.
    pub jump_running_takeoff: f32,

    /// Seconds after which a jump that is still grounded counts as landed.
    pub jump_land_check: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            // Springs
            velocity_spring: SpringTuning::new(0.8, 50.0),
            rotation_spring: SpringTuning::new(0.5, 10.0),
            simulation_rate: 60.0,

            // Movement
            move_speed: 4.0,
            max_timestep: 1.0 / 30.0,

            // Ground probe
            ray_cast_length: 0.9,
            ray_origin_offset: 0.0,

            // Thresholds
            landing: LandingThresholds::default(),
            start_walk: StartWalkThresholds::default(),
            start_walk_cancel_window: 0.1,

            // Jump
            jump_idle_speed: 4.0,
            jump_running_speed: 4.0,
            jump_idle_takeoff: 0.2,
            jump_running_takeoff: 0.13,
            jump_land_check: 0.3,
        }
    }
}

impl LocomotionConfig {
    /// Create a config optimized for responsive player control.
    pub fn player() -> Self {
        Self::default()
    }

    /// Create a config for a slower, heavier character.
    pub fn heavy() -> Self {
        Self {
            velocity_spring: SpringTuning::new(0.8, 80.0),
            rotation_spring: SpringTuning::new(0.6, 20.0),
            move_speed: 3.0,
            jump_idle_speed: 3.0,
            jump_running_speed: 3.5,
            ..default()
        }
    }

    /// Check every value for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_spring("velocity", self.velocity_spring)?;
        validate_spring("rotation", self.rotation_spring)?;
        if self.rotation_spring.mass < 1.0 {
            return Err(ConfigError::RotationMassTooLow(self.rotation_spring.mass));
        }

        if !(self.simulation_rate > 0.0) {
            return Err(ConfigError::InvalidSimulationRate(self.simulation_rate));
        }
        if !(self.move_speed > 0.0) {
            return Err(ConfigError::InvalidMoveSpeed(self.move_speed));
        }
        if !(self.max_timestep > 0.0) {
            return Err(ConfigError::InvalidMaxTimestep(self.max_timestep));
        }
        if !(self.ray_cast_length > 0.0) {
            return Err(ConfigError::InvalidRayLength(self.ray_cast_length));
        }

        let landing = self.landing;
        if !(landing.rolling < landing.hard && landing.hard <= 0.0) {
            return Err(ConfigError::LandingThresholdOrder {
                rolling: landing.rolling,
                hard: landing.hard,
            });
        }

        let start = self.start_walk;
        if !(0.0 < start.strafe && start.strafe < start.pivot && start.pivot < 1.0) {
            return Err(ConfigError::StartWalkThresholdOrder {
                strafe: start.strafe,
                pivot: start.pivot,
            });
        }

        Ok(())
    }

    /// Builder: set default velocity spring.
    pub fn with_velocity_spring(mut self, damping: f32, mass: f32) -> Self {
        self.velocity_spring = SpringTuning::new(damping, mass);
        self
    }

    /// Builder: set default rotation spring.
    pub fn with_rotation_spring(mut self, damping: f32, mass: f32) -> Self {
        self.rotation_spring = SpringTuning::new(damping, mass);
        self
    }

    /// Builder: set move speed.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set ground ray length.
    pub fn with_ray_cast_length(mut self, length: f32) -> Self {
        self.ray_cast_length = length;
        self
    }

    /// Builder: set ground ray origin offset.
    pub fn with_ray_origin_offset(mut self, offset: f32) -> Self {
        self.ray_origin_offset = offset;
        self
    }

    /// Builder: set landing thresholds.
    pub fn with_landing_thresholds(mut self, rolling: f32, hard: f32) -> Self {
        self.landing = LandingThresholds { rolling, hard };
        self
    }

    /// Builder: set start-walk thresholds (fractions of π).
    pub fn with_start_walk_thresholds(mut self, pivot: f32, strafe: f32) -> Self {
        self.start_walk = StartWalkThresholds { pivot, strafe };
        self
    }

    /// Builder: set jump take-off speeds.
    pub fn with_jump_speeds(mut self, idle: f32, running: f32) -> Self {
        self.jump_idle_speed = idle;
        self.jump_running_speed = running;
        self
    }

    /// Builder: set timestep clamp.
    pub fn with_max_timestep(mut self, max_timestep: f32) -> Self {
        self.max_timestep = max_timestep;
        self
    }
}

fn validate_spring(spring: &'static str, tuning: SpringTuning) -> Result<(), ConfigError> {
    if !(tuning.mass > 0.0 && tuning.mass.is_finite()) {
        return Err(ConfigError::InvalidMass {
            spring,
            mass: tuning.mass,
        });
    }
    if !(tuning.damping > 0.0 && tuning.damping <= 1.0) {
        return Err(ConfigError::InvalidDamping {
            spring,
            damping: tuning.damping,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(LocomotionConfig::default().validate(), Ok(()));
        assert_eq!(LocomotionConfig::heavy().validate(), Ok(()));
    }

    #[test]
    fn default_thresholds() {
        let config = LocomotionConfig::default();
        assert_eq!(config.landing.rolling, -6.0);
        assert_eq!(config.landing.hard, -2.0);
        assert_eq!(config.start_walk.pivot, 0.8);
        assert_eq!(config.start_walk.strafe, 0.3);
    }

    #[test]
    fn heavy_preset_is_slower() {
        let heavy = LocomotionConfig::heavy();
        let default = LocomotionConfig::default();
        assert!(heavy.move_speed < default.move_speed);
        assert!(heavy.velocity_spring.mass > default.velocity_spring.mass);
    }

    #[test]
    fn rejects_bad_springs() {
        let config = LocomotionConfig::default().with_velocity_spring(0.8, 0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMass { spring: "velocity", .. })
        ));

        let config = LocomotionConfig::default().with_rotation_spring(1.5, 10.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDamping { spring: "rotation", .. })
        ));
    }

    #[test]
    fn rejects_light_rotation_spring() {
        let config = LocomotionConfig::default().with_rotation_spring(0.5, 0.5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::RotationMassTooLow(0.5))
        );

        // Velocity springs may be light
        let config = LocomotionConfig::default().with_velocity_spring(0.5, 0.5);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_threshold_order() {
        let config = LocomotionConfig::default().with_landing_thresholds(-2.0, -6.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::LandingThresholdOrder { .. })
        ));

        let config = LocomotionConfig::default().with_start_walk_thresholds(0.3, 0.8);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartWalkThresholdOrder { .. })
        ));
    }

    #[test]
    fn error_messages_name_the_spring() {
        let err = ConfigError::InvalidMass {
            spring: "velocity",
            mass: -1.0,
        };
        assert_eq!(err.to_string(), "velocity spring mass must be positive, got -1");
    }

    #[test]
    fn builders() {
        let config = LocomotionConfig::default()
            .with_move_speed(6.0)
            .with_ray_cast_length(1.2)
            .with_jump_speeds(5.0, 6.0)
            .with_max_timestep(0.05);
        assert_eq!(config.move_speed, 6.0);
        assert_eq!(config.ray_cast_length, 1.2);
        assert_eq!(config.jump_idle_speed, 5.0);
        assert_eq!(config.jump_running_speed, 6.0);
        assert_eq!(config.max_timestep, 0.05);
    }
}
