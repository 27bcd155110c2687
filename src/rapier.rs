//! Rapier3D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier3D.
//! Enable with the `rapier3d` feature.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::LocomotionPhysicsBackend;
use crate::collision::{GroundProbe, RayHit};
use crate::config::LocomotionConfig;
use crate::controller::CharacterController;

/// Rapier3D physics backend for the locomotion controller.
///
/// Velocity is read and written through Rapier's [`Velocity`] component.
/// The ground ray is cast by a dedicated system that receives the Rapier
/// context as a system parameter.
pub struct Rapier3dBackend;

impl LocomotionPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        Rapier3dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation())
            })
            .unwrap_or(Vec3::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = position;
        }
    }
}

/// Plugin that sets up Rapier3D-specific systems for the locomotion controller.
pub struct Rapier3dBackendPlugin;

impl Plugin for Rapier3dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::LocomotionSet;

        app.add_systems(
            FixedUpdate,
            rapier_ground_probe.in_set(LocomotionSet::Sensors),
        );
    }
}

/// Ground ray against the Rapier query pipeline.
///
/// Impact velocity is the character's velocity relative to whatever body
/// was hit, so landing on a moving platform is judged by the relative speed.
struct RapierGroundProbe<'a, 'c, F: Fn(Entity) -> Vec3> {
    context: &'a RapierContext<'c>,
    filter: QueryFilter<'a>,
    own_velocity: Vec3,
    ground_velocity: F,
}

impl<F: Fn(Entity) -> Vec3> GroundProbe for RapierGroundProbe<'_, '_, F> {
    fn cast_ray(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        self.context
            .cast_ray_and_get_normal(origin, direction, max_distance, true, self.filter)
            .map(|(hit_entity, hit)| {
                let relative = self.own_velocity - (self.ground_velocity)(hit_entity);
                RayHit::new(hit.time_of_impact, hit.point, hit.normal, Some(hit_entity))
                    .with_impact_velocity(relative)
            })
    }
}

/// Rapier-specific ground probe system.
///
/// Casts the ground ray straight down from each controller's position,
/// skipping the character's own body and sensors.
fn rapier_ground_probe(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        Option<&LocomotionConfig>,
        Option<&Velocity>,
        Option<&CollisionGroups>,
        &mut CharacterController,
    )>,
    q_bodies: Query<&Velocity>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    let default_config = LocomotionConfig::default();
    let ground_velocity =
        |entity: Entity| q_bodies.get(entity).map(|v| v.linvel).unwrap_or(Vec3::ZERO);

    for (entity, config, velocity, collision_groups, mut controller) in &mut q_controllers {
        let config = config.unwrap_or(&default_config);

        let mut filter = QueryFilter::default()
            .exclude_rigid_body(entity)
            .exclude_collider(entity)
            .exclude_sensors();
        if let Some(groups) = collision_groups {
            filter = filter.groups(*groups);
        }

        let mut probe = RapierGroundProbe {
            context: &context,
            filter,
            own_velocity: velocity.map(|v| v.linvel).unwrap_or(Vec3::ZERO),
            ground_velocity,
        };
        controller.probe_ground(&mut probe, config);
    }
}

/// Bundle of Rapier components for a locomotion character.
///
/// The body is dynamic so it collides and falls under gravity; rotation is
/// locked because heading comes from the rotation spring, not from physics.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier3d::prelude::*;
/// use msg_locomotion::prelude::*;
/// use msg_locomotion::rapier::Rapier3dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     let config = LocomotionConfig::player();
///     commands.spawn((
///         Transform::from_xyz(0.0, 1.0, 0.0),
///         CharacterController::new(&config),
///         config,
///         InputFlags::default(),
///         Rapier3dCharacterBundle::new(),
///         Collider::capsule_y(0.5, 0.3),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`].
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Written by the controller each fixed step.
    pub velocity: Velocity,
    /// Which axes are locked. Rotation is locked by default.
    pub locked_axes: LockedAxes,
    /// Damping coefficients for velocity reduction.
    pub damping: Damping,
    /// Friction of the character's collider. Zero so walls don't grab the body.
    pub friction: Friction,
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier3dCharacterBundle {
    /// Create a dynamic, rotation-locked character bundle.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 0.0,
            },
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
        }
    }

    /// Set the rigid body type for the character.
    ///
    /// ```ignore
    /// // Kinematic character for scripted sequences
    /// let bundle = Rapier3dCharacterBundle::new()
    ///     .with_body(RigidBody::KinematicVelocityBased);
    /// ```
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }

    /// Set the damping coefficients for velocity reduction.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }
}
