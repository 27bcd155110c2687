//! Core locomotion systems.
//!
//! These systems drive every [`CharacterController`] once per fixed step.
//! They are generic over the physics backend so the controller can sit on
//! top of any engine that implements [`LocomotionPhysicsBackend`].

use bevy::ecs::system::SystemState;
use bevy::prelude::*;

use crate::animation::{ClipLibrary, Headless};
use crate::backend::LocomotionPhysicsBackend;
use crate::config::LocomotionConfig;
use crate::controller::CharacterController;
use crate::direction::{CameraBasis, LocomotionCamera};
use crate::intent::InputFlags;
use crate::state::{Airborne, Grounded, LocomotionStateChanged, ResetLocomotion};

/// Copy the yaw of the [`LocomotionCamera`] into [`CameraBasis`].
///
/// Leaves the basis untouched when there is no marked camera, or more
/// than one.
pub fn sync_camera_basis(
    q_camera: Query<&GlobalTransform, With<LocomotionCamera>>,
    mut basis: ResMut<CameraBasis>,
) {
    let Ok(transform) = q_camera.single() else {
        return;
    };
    let next = CameraBasis::from_transform(transform);
    if *basis != next {
        *basis = next;
    }
}

/// Log configurations that will not behave as tuned.
pub fn report_invalid_configs(
    q_configs: Query<(Entity, &LocomotionConfig), Changed<LocomotionConfig>>,
) {
    for (entity, config) in &q_configs {
        if let Err(err) = config.validate() {
            warn!("{entity}: invalid locomotion config: {err}");
        }
    }
}

/// Apply pending [`ResetLocomotion`] requests.
///
/// Teleports the body, zeroes its velocity and puts the controller back to
/// rest in Idle. Requests are read through a cursor, so host readers still
/// see them.
pub fn handle_reset_requests<B: LocomotionPhysicsBackend>(
    world: &mut World,
    reader: &mut SystemState<EventReader<ResetLocomotion>>,
) {
    let requests: Vec<ResetLocomotion> = reader.get_mut(world).read().copied().collect();

    for request in requests {
        let config = world
            .get::<LocomotionConfig>(request.entity)
            .cloned()
            .unwrap_or_default();

        let Some(mut controller) = world.get_mut::<CharacterController>(request.entity) else {
            warn!("{}: reset requested without a CharacterController", request.entity);
            continue;
        };
        let from = controller.kind();
        controller.reset(request.position, request.heading, &config);
        let to = controller.kind();

        B::set_position(world, request.entity, request.position);
        B::set_velocity(world, request.entity, Vec3::ZERO);

        if from != to {
            world.send_event(LocomotionStateChanged {
                entity: request.entity,
                from,
                to,
            });
        }
    }
}

/// Run the state machine and both springs.
///
/// The frame time is the fixed timestep, clamped per character to
/// `max_timestep`.
pub fn update_locomotion<B: LocomotionPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    let camera = world
        .get_resource::<CameraBasis>()
        .copied()
        .unwrap_or_default();

    // Collect entities first to avoid holding the query across backend calls
    let entities: Vec<(Entity, LocomotionConfig, InputFlags)> = world
        .query_filtered::<
            (Entity, Option<&LocomotionConfig>, Option<&InputFlags>),
            With<CharacterController>,
        >()
        .iter(world)
        .map(|(e, config, input)| {
            (
                e,
                config.cloned().unwrap_or_default(),
                input.copied().unwrap_or_default(),
            )
        })
        .collect();

    let mut changes = Vec::new();
    for (entity, config, input) in entities {
        let position = B::get_position(world, entity);
        let Some(mut controller) = world.get_mut::<CharacterController>(entity) else {
            continue;
        };

        controller.set_position(position);
        let from = controller.kind();
        controller.advance(dt.min(config.max_timestep), &input, &camera, &config);
        let to = controller.kind();

        if from != to {
            changes.push(LocomotionStateChanged { entity, from, to });
        }
    }

    if !changes.is_empty() {
        world.send_event_batch(changes);
    }
}

/// Ask for each character's clip once per state entry.
///
/// Characters without a [`ClipLibrary`] run headless.
pub fn request_animations(
    mut q_controllers: Query<(&mut CharacterController, Option<&mut ClipLibrary>)>,
) {
    for (mut controller, library) in &mut q_controllers {
        if controller.state().animation_requested() {
            continue;
        }
        match library {
            Some(mut library) => controller.request_animation(&mut *library),
            None => controller.request_animation(&mut Headless),
        }
    }
}

/// Blend the smoothed velocity into the body and apply pending jumps.
pub fn apply_locomotion_velocity<B: LocomotionPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, f32)> = world
        .query::<(Entity, Option<&LocomotionConfig>, &CharacterController)>()
        .iter(world)
        .map(|(e, config, _)| {
            let max = config.map(|c| c.max_timestep).unwrap_or(f32::INFINITY);
            (e, dt.min(max))
        })
        .collect();

    for (entity, dt) in entities {
        let physics = B::get_velocity(world, entity);
        let Some(mut controller) = world.get_mut::<CharacterController>(entity) else {
            continue;
        };

        let mut velocity = controller.resolve_velocity(physics, dt);
        if let Some(speed) = controller.take_jump() {
            velocity.y = speed;
        }

        B::set_velocity(world, entity, velocity);
    }
}

/// Face each character along its smoothed heading.
pub fn sync_character_rotation(mut q_controllers: Query<(&CharacterController, &mut Transform)>) {
    for (controller, mut transform) in &mut q_controllers {
        let rotation = Quat::from_rotation_y(controller.heading());
        if transform.rotation != rotation {
            transform.rotation = rotation;
        }
    }
}

/// Sync state marker components with the controller's ground contact.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(Entity, &CharacterController, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, controller, has_grounded, has_airborne) in &q_controllers {
        let grounded = controller.is_grounded();
        if grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !grounded && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }
    }
}
