//! Per-state configuration table.

use bevy::prelude::*;

use super::StateKind;
use crate::config::SpringTuning;

/// Partial override of a spring tuning. Unset fields keep the config default.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpringOverride {
    /// Replacement damping.
    pub damping: Option<f32>,
    /// Replacement mass.
    pub mass: Option<f32>,
}

impl SpringOverride {
    /// Keep the default tuning.
    pub const NONE: Self = Self {
        damping: None,
        mass: None,
    };

    /// Override mass only.
    pub const fn mass(mass: f32) -> Self {
        Self {
            damping: None,
            mass: Some(mass),
        }
    }

    /// Override damping only.
    pub const fn damping(damping: f32) -> Self {
        Self {
            damping: Some(damping),
            mass: None,
        }
    }

    /// Override both.
    pub const fn both(damping: f32, mass: f32) -> Self {
        Self {
            damping: Some(damping),
            mass: Some(mass),
        }
    }

    /// Apply on top of `base`.
    pub fn apply(self, base: SpringTuning) -> SpringTuning {
        SpringTuning {
            damping: self.damping.unwrap_or(base.damping),
            mass: self.mass.unwrap_or(base.mass),
        }
    }
}

/// What the character may do with vehicles while in a state.
///
/// Vehicles are not simulated by this crate; hosts read these flags.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleCapabilities {
    /// May look for nearby vehicles.
    pub can_find_vehicles_to_enter: bool,
    /// May start entering a vehicle.
    pub can_enter_vehicles: bool,
    /// May leave a vehicle.
    pub can_leave_vehicles: bool,
}

impl Default for VehicleCapabilities {
    fn default() -> Self {
        BASE.capabilities
    }
}

/// Static description of one state: animation, speed and spring tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateProfile {
    /// Animation clip name.
    pub clip: &'static str,
    /// Fade-in of the clip (seconds).
    pub fade_in: f32,
    /// Whether the clip repeats.
    pub looping: bool,
    /// Fraction of `move_speed` the state targets along the movement vector.
    pub speed: f32,
    /// Velocity spring override.
    pub velocity_spring: SpringOverride,
    /// Rotation spring override.
    pub rotation_spring: SpringOverride,
    /// Per-axis weight of the simulated velocity against the body's velocity.
    pub velocity_influence: Vec3,
    /// Add the simulated velocity to the body's velocity instead of replacing it.
    pub velocity_is_additive: bool,
    /// Vehicle interaction flags.
    pub capabilities: VehicleCapabilities,
    /// Whether the state assumes ground contact.
    pub grounded: bool,
}

const BASE: StateProfile = StateProfile {
    clip: "idle",
    fade_in: 0.1,
    looping: false,
    speed: 0.0,
    velocity_spring: SpringOverride::NONE,
    rotation_spring: SpringOverride::NONE,
    velocity_influence: Vec3::new(1.0, 0.0, 1.0),
    velocity_is_additive: false,
    capabilities: VehicleCapabilities {
        can_find_vehicles_to_enter: true,
        can_enter_vehicles: false,
        can_leave_vehicles: true,
    },
    grounded: true,
};

const CAN_ENTER: VehicleCapabilities = VehicleCapabilities {
    can_enter_vehicles: true,
    ..BASE.capabilities
};

const START_WALK: StateProfile = StateProfile {
    speed: 0.8,
    rotation_spring: SpringOverride::both(0.7, 20.0),
    capabilities: CAN_ENTER,
    ..BASE
};

const END_WALK: StateProfile = StateProfile {
    clip: "stop",
    capabilities: CAN_ENTER,
    ..BASE
};

const DROP: StateProfile = StateProfile {
    capabilities: CAN_ENTER,
    ..BASE
};

const AIRBORNE: StateProfile = StateProfile {
    grounded: false,
    ..BASE
};

impl StateKind {
    /// Configuration of this state.
    pub const fn profile(self) -> StateProfile {
        match self {
            StateKind::Idle => StateProfile {
                looping: true,
                capabilities: CAN_ENTER,
                ..BASE
            },
            StateKind::StartWalkForward => StateProfile {
                clip: "start_forward",
                ..START_WALK
            },
            StateKind::StartWalkLeft => StateProfile {
                clip: "start_left",
                ..START_WALK
            },
            StateKind::StartWalkRight => StateProfile {
                clip: "start_right",
                ..START_WALK
            },
            StateKind::StartWalkBackLeft => StateProfile {
                clip: "start_back_left",
                ..START_WALK
            },
            StateKind::StartWalkBackRight => StateProfile {
                clip: "start_back_right",
                ..START_WALK
            },
            StateKind::Walk => StateProfile {
                clip: "run",
                looping: true,
                speed: 0.8,
                capabilities: CAN_ENTER,
                ..BASE
            },
            StateKind::Sprint => StateProfile {
                clip: "sprint",
                looping: true,
                speed: 1.4,
                velocity_spring: SpringOverride::mass(10.0),
                rotation_spring: SpringOverride::both(0.8, 50.0),
                capabilities: CAN_ENTER,
                ..BASE
            },
            StateKind::EndWalk => END_WALK,
            StateKind::EndSprint => StateProfile {
                clip: "stop_sprint",
                velocity_spring: SpringOverride::mass(70.0),
                ..END_WALK
            },
            StateKind::Falling => StateProfile {
                clip: "falling",
                fade_in: 0.3,
                looping: true,
                speed: 0.8,
                velocity_spring: SpringOverride::mass(100.0),
                rotation_spring: SpringOverride::damping(0.3),
                velocity_influence: Vec3::new(0.05, 0.0, 0.05),
                velocity_is_additive: true,
                ..AIRBORNE
            },
            StateKind::DropIdle => StateProfile {
                clip: "drop_idle",
                velocity_spring: SpringOverride::both(0.5, 7.0),
                ..DROP
            },
            StateKind::DropRunning => StateProfile {
                clip: "drop_running",
                speed: 0.8,
                ..DROP
            },
            StateKind::DropRolling => StateProfile {
                clip: "drop_running_roll",
                fade_in: 0.03,
                speed: 0.8,
                velocity_spring: SpringOverride::both(0.6, 1.0),
                ..DROP
            },
            StateKind::JumpIdle => StateProfile {
                clip: "jump_idle",
                velocity_spring: SpringOverride::mass(50.0),
                ..AIRBORNE
            },
            StateKind::JumpRunning => StateProfile {
                clip: "jump_running",
                fade_in: 0.03,
                speed: 0.8,
                velocity_spring: SpringOverride::mass(100.0),
                ..AIRBORNE
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::StateKind;

    #[test]
    fn override_applies_partially() {
        let base = SpringTuning::new(0.8, 50.0);
        assert_eq!(SpringOverride::NONE.apply(base), base);
        assert_eq!(
            SpringOverride::mass(100.0).apply(base),
            SpringTuning::new(0.8, 100.0)
        );
        assert_eq!(
            SpringOverride::damping(0.3).apply(base),
            SpringTuning::new(0.3, 50.0)
        );
        assert_eq!(
            SpringOverride::both(0.5, 7.0).apply(base),
            SpringTuning::new(0.5, 7.0)
        );
    }

    #[test]
    fn every_state_has_a_distinct_clip() {
        let mut clips: Vec<&str> = StateKind::ALL.iter().map(|k| k.profile().clip).collect();
        clips.sort_unstable();
        clips.dedup();
        assert_eq!(clips.len(), StateKind::ALL.len());
    }

    #[test]
    fn every_state_has_a_fade_in() {
        for kind in StateKind::ALL {
            assert!(kind.profile().fade_in > 0.0, "{kind:?}");
        }
    }

    #[test]
    fn no_state_steers_vertically() {
        for kind in StateKind::ALL {
            assert_eq!(kind.profile().velocity_influence.y, 0.0, "{kind:?}");
        }
    }

    #[test]
    fn falling_barely_steers_and_adds() {
        let falling = StateKind::Falling.profile();
        assert!(falling.velocity_is_additive);
        assert!(falling.velocity_influence.x < 0.1);
        assert!(falling.velocity_influence.z < 0.1);
        assert!(!falling.grounded);
    }

    #[test]
    fn grounded_catalogue() {
        use StateKind::*;
        for kind in [
            Idle,
            StartWalkForward,
            StartWalkLeft,
            StartWalkRight,
            StartWalkBackLeft,
            StartWalkBackRight,
            Walk,
            Sprint,
            EndWalk,
            EndSprint,
            DropIdle,
            DropRunning,
            DropRolling,
        ] {
            assert!(kind.profile().grounded, "{kind:?}");
        }
        for kind in [Falling, JumpIdle, JumpRunning] {
            assert!(!kind.profile().grounded, "{kind:?}");
        }
    }

    #[test]
    fn start_walks_share_tuning() {
        let forward = StateKind::StartWalkForward.profile();
        for kind in [
            StateKind::StartWalkLeft,
            StateKind::StartWalkRight,
            StateKind::StartWalkBackLeft,
            StateKind::StartWalkBackRight,
        ] {
            let profile = kind.profile();
            assert_eq!(profile.rotation_spring, forward.rotation_spring);
            assert_eq!(profile.speed, forward.speed);
            assert_ne!(profile.clip, forward.clip);
        }
    }

    #[test]
    fn capabilities() {
        assert!(StateKind::Walk.profile().capabilities.can_enter_vehicles);
        assert!(!StateKind::Falling.profile().capabilities.can_enter_vehicles);
        assert!(StateKind::Falling.profile().capabilities.can_leave_vehicles);
        assert!(!VehicleCapabilities::default().can_enter_vehicles);
    }
}
