//! # `msg_locomotion`
//!
//! A third-person locomotion state machine for Bevy, with spring-smoothed
//! velocity and heading and a physics backend abstraction.
//!
//! This crate provides a character controller that:
//! - Picks one of sixteen locomotion states (idle, start-walk variants, walk,
//!   sprint, stops, falling, landing recoveries, jumps) from raw key input
//!   and a downward ground ray
//! - Smooths velocity and heading with damped springs tuned per state
//! - Maps input onto the ground plane relative to the camera's yaw
//! - Chooses start-walk and landing animations that match the turn angle
//!   and impact speed
//! - Abstracts physics backend for easy swapping (Rapier3D included)
//!
//! ## Architecture
//!
//! Each fixed step runs in four phases (see [`LocomotionSet`]):
//! 1. Reset requests and camera sync
//! 2. State machine update and spring integration
//! 3. Ground probe through the physics backend
//! 4. Velocity blend into the body, rotation, markers and animation requests
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use msg_locomotion::prelude::*;
//!
//! // Create controller components for a player character
//! let config = LocomotionConfig::player();
//! let controller = CharacterController::new(&config);
//! let input = InputFlags::default();
//!
//! // These can be spawned together with physics components
//! ```

use bevy::prelude::*;

pub mod animation;
pub mod backend;
pub mod collision;
pub mod config;
pub mod controller;
pub mod direction;
pub mod intent;
pub mod simulator;
pub mod state;
pub mod states;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

pub use direction::LocomotionCamera;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::animation::{AnimationSink, ClipLibrary, Headless};
    pub use crate::backend::LocomotionPhysicsBackend;
    pub use crate::collision::{GroundContact, GroundProbe, RayHit};
    pub use crate::config::{
        ConfigError, LandingThresholds, LocomotionConfig, SpringTuning, StartWalkThresholds,
    };
    pub use crate::controller::CharacterController;
    pub use crate::direction::{CameraBasis, LocomotionCamera};
    pub use crate::intent::InputFlags;
    pub use crate::simulator::{Angle, RotationSimulator, SpringSimulator, VelocitySimulator};
    pub use crate::state::{Airborne, Grounded, LocomotionStateChanged, ResetLocomotion};
    pub use crate::states::{StateKind, StateProfile, VehicleCapabilities};
    pub use crate::{LocomotionPlugin, LocomotionSet};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::Rapier3dBackend;
}

/// System sets for the locomotion controller, chained in [`FixedUpdate`].
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocomotionSet {
    /// Reset requests, camera sync, config checks.
    Preparation,
    /// State machine and springs.
    StateMachine,
    /// Ground probe (added by the backend plugin).
    Sensors,
    /// Velocity, rotation, markers, animation requests.
    FinalApplication,
}

/// Main plugin for the locomotion controller.
///
/// This plugin is generic over a physics backend `B` which provides the actual
/// physics operations (velocity access, ground probing).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier3dBackend`)
///
/// # Examples
///
/// With Rapier3D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(LocomotionPlugin::<Rapier3dBackend>::default())
///     .run();
/// ```
pub struct LocomotionPlugin<B: backend::LocomotionPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::LocomotionPhysicsBackend> Default for LocomotionPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::LocomotionPhysicsBackend> Plugin for LocomotionPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::LocomotionConfig>();
        app.register_type::<intent::InputFlags>();
        app.register_type::<direction::CameraBasis>();
        app.register_type::<direction::LocomotionCamera>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<states::StateKind>();

        app.init_resource::<direction::CameraBasis>();
        app.add_event::<state::LocomotionStateChanged>();
        app.add_event::<state::ResetLocomotion>();

        app.configure_sets(
            FixedUpdate,
            (
                LocomotionSet::Preparation,
                LocomotionSet::StateMachine,
                LocomotionSet::Sensors,
                LocomotionSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::report_invalid_configs,
                systems::sync_camera_basis,
                systems::handle_reset_requests::<B>,
            )
                .chain()
                .in_set(LocomotionSet::Preparation),
        );
        app.add_systems(
            FixedUpdate,
            systems::update_locomotion::<B>.in_set(LocomotionSet::StateMachine),
        );
        app.add_systems(
            FixedUpdate,
            (
                systems::apply_locomotion_velocity::<B>,
                systems::sync_character_rotation,
                systems::sync_state_markers,
                systems::request_animations,
            )
                .chain()
                .in_set(LocomotionSet::FinalApplication),
        );

        app.add_systems(Update, animation::drive_animation_players);
    }
}
