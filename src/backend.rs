//! Physics backend abstraction.
//!
//! This module defines the trait a physics engine implements to carry
//! characters driven by the locomotion controller. The backend owns the
//! rigid body; the controller only reads and writes its velocity and
//! position. Ground probing is done by a system the backend's plugin adds to
//! [`LocomotionSet::Sensors`](crate::LocomotionSet::Sensors).

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// All functions are static and operate on the [`World`], so the exclusive
/// controller systems can call them between their collect and apply passes.
///
/// See [`Rapier3dBackend`](crate::rapier::Rapier3dBackend) for the bundled
/// implementation.
pub trait LocomotionPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend, including its ground
    /// probe system.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec3;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3);

    /// Get the world position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Teleport an entity.
    fn set_position(world: &mut World, entity: Entity, position: Vec3);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}
