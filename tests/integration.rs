//! Integration tests for the locomotion controller.
//!
//! These tests drive the full plugin in a headless app on top of a small
//! kinematic backend: a flat floor, gravity, and bodies that move by their
//! velocity. Each fixed step runs the controller's sets followed by the
//! integration step.

use bevy::prelude::*;
use msg_locomotion::prelude::*;

const DT: f32 = 1.0 / 60.0;
const GRAVITY: f32 = 9.81;
/// Height of a standing character's origin above the floor.
const STAND: f32 = 0.5;

// ==================== Test Backend ====================

/// Velocity of a kinematic test body.
#[derive(Component, Default)]
struct Body {
    velocity: Vec3,
}

/// Infinite flat floor.
#[derive(Resource)]
struct Floor {
    height: f32,
}

struct KinematicBackend;

impl LocomotionPhysicsBackend for KinematicBackend {
    fn plugin() -> impl Plugin {
        KinematicBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Body>(entity)
            .map(|b| b.velocity)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec3) {
        if let Some(mut body) = world.get_mut::<Body>(entity) {
            body.velocity = velocity;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = position;
        }
    }
}

struct KinematicBackendPlugin;

impl Plugin for KinematicBackendPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Floor { height: 0.0 });
        app.add_systems(
            FixedUpdate,
            flat_ground_probe.in_set(LocomotionSet::Sensors),
        );
        app.add_systems(
            FixedUpdate,
            integrate_bodies.after(LocomotionSet::FinalApplication),
        );
    }
}

struct FlatProbe {
    floor: f32,
    velocity: Vec3,
}

impl GroundProbe for FlatProbe {
    fn cast_ray(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let distance = origin.y - self.floor;
        (direction == Vec3::NEG_Y && (0.0..=max_distance).contains(&distance)).then(|| {
            RayHit::new(
                distance,
                Vec3::new(origin.x, self.floor, origin.z),
                Vec3::Y,
                None,
            )
            .with_impact_velocity(self.velocity)
        })
    }
}

fn flat_ground_probe(
    floor: Res<Floor>,
    mut q: Query<(Option<&LocomotionConfig>, &Body, &mut CharacterController)>,
) {
    for (config, body, mut controller) in &mut q {
        let config = config.copied().unwrap_or_default();
        let mut probe = FlatProbe {
            floor: floor.height,
            velocity: body.velocity,
        };
        controller.probe_ground(&mut probe, &config);
    }
}

fn integrate_bodies(floor: Res<Floor>, mut q: Query<(&mut Body, &mut Transform)>) {
    for (mut body, mut transform) in &mut q {
        body.velocity.y -= GRAVITY * DT;
        transform.translation += body.velocity * DT;

        let rest = floor.height + STAND;
        if transform.translation.y < rest {
            transform.translation.y = rest;
            body.velocity.y = body.velocity.y.max(0.0);
        }
    }
}

// ==================== Helpers ====================

#[derive(Resource, Default)]
struct TransitionLog(Vec<(StateKind, StateKind)>);

fn record_transitions(
    mut events: EventReader<LocomotionStateChanged>,
    mut log: ResMut<TransitionLog>,
) {
    for event in events.read() {
        log.0.push((event.from, event.to));
    }
}

/// Create a headless test app with the locomotion plugin.
fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(LocomotionPlugin::<KinematicBackend>::default());
    app.init_resource::<TransitionLog>();
    app.add_systems(
        FixedUpdate,
        record_transitions.after(LocomotionSet::FinalApplication),
    );
    app
}

/// Spawn a character at `position` with default config.
fn spawn_character(app: &mut App, position: Vec3) -> Entity {
    let config = LocomotionConfig::default();
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            CharacterController::new(&config),
            config,
            InputFlags::default(),
            Body::default(),
        ))
        .id()
}

/// Run one fixed step.
fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

/// Run the app for N fixed steps.
fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

/// Run until the character enters `kind`. Returns false on timeout.
fn run_until(app: &mut App, entity: Entity, kind: StateKind, max_frames: usize) -> bool {
    for _ in 0..max_frames {
        tick(app);
        if state_of(app, entity) == kind {
            return true;
        }
    }
    false
}

fn state_of(app: &App, entity: Entity) -> StateKind {
    app.world()
        .get::<CharacterController>(entity)
        .map(|c| c.kind())
        .unwrap_or_default()
}

fn input(app: &mut App, entity: Entity) -> Mut<'_, InputFlags> {
    app.world_mut().get_mut::<InputFlags>(entity).unwrap()
}

fn position(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Transform>(entity).unwrap().translation
}

fn log(app: &App) -> &[(StateKind, StateKind)] {
    &app.world().resource::<TransitionLog>().0
}

fn settled_character(app: &mut App) -> Entity {
    let entity = spawn_character(app, Vec3::new(0.0, STAND, 0.0));
    run_frames(app, 3);
    entity
}

// ==================== Resting ====================

#[test]
fn character_settles_into_idle_on_the_floor() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    assert_eq!(state_of(&app, entity), StateKind::Idle);
    assert!(app.world().get::<Grounded>(entity).is_some());
    assert!(app.world().get::<Airborne>(entity).is_none());
    assert!((position(&app, entity).y - STAND).abs() < 1e-4);
}

#[test]
fn plugin_registers_resources_and_events() {
    let app = create_test_app();
    assert!(app.world().get_resource::<CameraBasis>().is_some());
    assert!(app
        .world()
        .get_resource::<Events<LocomotionStateChanged>>()
        .is_some());
    assert!(app.world().get_resource::<Events<ResetLocomotion>>().is_some());
}

// ==================== Walking ====================

#[test]
fn walk_cycle_moves_along_camera_forward() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    // Default camera looks down -Z; the character faces +Z, so this is a pivot
    input(&mut app, entity).set_up(true);
    tick(&mut app);
    assert!(state_of(&app, entity).is_start_walk());

    assert!(run_until(&mut app, entity, StateKind::Walk, 10));
    run_frames(&mut app, 60);

    let pos = position(&app, entity);
    assert!(pos.z < -1.0, "should walk toward -Z, at {pos:?}");
    assert!(pos.x.abs() < 0.05);

    let rotation = app.world().get::<Transform>(entity).unwrap().rotation;
    assert!((rotation * Vec3::Z).dot(Vec3::NEG_Z) > 0.95);

    input(&mut app, entity).set_up(false);
    tick(&mut app);
    assert_eq!(state_of(&app, entity), StateKind::EndWalk);
    assert!(run_until(&mut app, entity, StateKind::Idle, 10));

    let log = log(&app);
    assert!(log.contains(&(StateKind::Walk, StateKind::EndWalk)));
    assert!(log.contains(&(StateKind::EndWalk, StateKind::Idle)));
}

#[test]
fn camera_yaw_defines_forward() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    app.world_mut().spawn((
        LocomotionCamera,
        GlobalTransform::from(Transform::from_xyz(0.0, 5.0, 0.0).looking_to(Vec3::X, Vec3::Y)),
    ));
    tick(&mut app);
    let basis = *app.world().resource::<CameraBasis>();
    assert!((basis.forward() - Vec3::X).length() < 1e-4);

    input(&mut app, entity).set_up(true);
    run_frames(&mut app, 90);

    let pos = position(&app, entity);
    assert!(pos.x > 1.0, "should walk toward +X, at {pos:?}");
    assert!(pos.z.abs() < 0.05);
}

#[test]
fn run_modifier_sprints_faster() {
    let mut walker_app = create_test_app();
    let walker = settled_character(&mut walker_app);
    input(&mut walker_app, walker).set_up(true);
    run_frames(&mut walker_app, 120);

    let mut sprinter_app = create_test_app();
    let sprinter = settled_character(&mut sprinter_app);
    {
        let mut flags = input(&mut sprinter_app, sprinter);
        flags.set_up(true);
        flags.set_run(true);
    }
    run_frames(&mut sprinter_app, 120);

    assert_eq!(state_of(&walker_app, walker), StateKind::Walk);
    assert_eq!(state_of(&sprinter_app, sprinter), StateKind::Sprint);
    assert!(position(&sprinter_app, sprinter).z < position(&walker_app, walker).z);

    // Letting go of run drops back to a walk
    input(&mut sprinter_app, sprinter).set_run(false);
    tick(&mut sprinter_app);
    assert_eq!(state_of(&sprinter_app, sprinter), StateKind::Walk);
}

// ==================== Falling and Landing ====================

#[test]
fn long_drop_rolls() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, Vec3::new(0.0, 6.0, 0.0));

    run_frames(&mut app, 5);
    assert_eq!(state_of(&app, entity), StateKind::Falling);
    assert!(app.world().get::<Airborne>(entity).is_some());

    assert!(run_until(&mut app, entity, StateKind::DropRolling, 120));
    let impact = app
        .world()
        .get::<CharacterController>(entity)
        .unwrap()
        .ground()
        .impact_velocity;
    assert!(impact.y < -6.0, "{impact:?}");

    // Headless clips end at once
    assert!(run_until(&mut app, entity, StateKind::Idle, 5));
}

#[test]
fn short_drop_recovers_standing() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, Vec3::new(0.0, 1.5, 0.0));

    assert!(run_until(&mut app, entity, StateKind::DropIdle, 60));
    assert!(!log(&app).contains(&(StateKind::Falling, StateKind::DropRolling)));
}

#[test]
fn short_drop_while_moving_recovers_running() {
    let mut app = create_test_app();
    let entity = spawn_character(&mut app, Vec3::new(0.0, 1.5, 0.0));
    input(&mut app, entity).set_up(true);

    assert!(run_until(&mut app, entity, StateKind::DropRunning, 60));
    assert!(run_until(&mut app, entity, StateKind::Walk, 5));
}

#[test]
fn walking_off_a_ledge_falls() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    app.world_mut().resource_mut::<Floor>().height = -10.0;
    run_frames(&mut app, 2);
    assert_eq!(state_of(&app, entity), StateKind::Falling);
}

// ==================== Jumping ====================

#[test]
fn standing_jump_leaves_and_lands() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    input(&mut app, entity).set_jump(true);
    tick(&mut app);
    assert_eq!(state_of(&app, entity), StateKind::JumpIdle);

    assert!(run_until(&mut app, entity, StateKind::Falling, 60));
    assert!(position(&app, entity).y > STAND + 0.3);

    input(&mut app, entity).set_jump(false);
    assert!(run_until(&mut app, entity, StateKind::Idle, 120));
    assert!(app.world().get::<Grounded>(entity).is_some());

    let log = log(&app);
    assert!(log.contains(&(StateKind::Idle, StateKind::JumpIdle)));
    assert!(log.contains(&(StateKind::JumpIdle, StateKind::Falling)));
}

#[test]
fn holding_jump_does_not_jump_again() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    input(&mut app, entity).set_jump(true);
    assert!(run_until(&mut app, entity, StateKind::Idle, 180));
    run_frames(&mut app, 30);
    assert_eq!(state_of(&app, entity), StateKind::Idle);
}

// ==================== Reset ====================

#[test]
fn reset_teleports_and_idles() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    input(&mut app, entity).set_up(true);
    run_frames(&mut app, 30);
    input(&mut app, entity).clear();

    app.world_mut()
        .send_event(ResetLocomotion::new(entity, Vec3::new(3.0, STAND, 3.0), 0.0));
    tick(&mut app);

    assert_eq!(state_of(&app, entity), StateKind::Idle);
    let pos = position(&app, entity);
    assert!((pos.x - 3.0).abs() < 1e-4 && (pos.z - 3.0).abs() < 1e-4, "{pos:?}");
    let controller = app.world().get::<CharacterController>(entity).unwrap();
    assert_eq!(controller.velocity(), Vec3::ZERO);
    assert!(controller.heading().abs() < 1e-4);
}

#[derive(Resource, Default)]
struct SeenResets(usize);

fn count_resets(mut events: EventReader<ResetLocomotion>, mut seen: ResMut<SeenResets>) {
    seen.0 += events.read().count();
}

#[test]
fn reset_is_applied_once_and_left_for_other_readers() {
    let mut app = create_test_app();
    app.init_resource::<SeenResets>();
    app.add_systems(FixedUpdate, count_resets.after(LocomotionSet::FinalApplication));
    let entity = settled_character(&mut app);

    app.world_mut()
        .send_event(ResetLocomotion::new(entity, Vec3::new(3.0, STAND, 3.0), 0.0));
    tick(&mut app);
    assert!((position(&app, entity).x - 3.0).abs() < 1e-4);
    assert_eq!(app.world().resource::<SeenResets>().0, 1);

    // A second step in the same frame must not teleport again
    app.world_mut()
        .get_mut::<Transform>(entity)
        .unwrap()
        .translation = Vec3::new(0.0, STAND, 0.0);
    tick(&mut app);
    assert!(position(&app, entity).x.abs() < 1e-3);
    assert_eq!(app.world().resource::<SeenResets>().0, 1);
}

// ==================== Animation ====================

#[test]
fn clips_with_unknown_duration_hold_the_state() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);
    app.world_mut().entity_mut(entity).insert(ClipLibrary::new());

    input(&mut app, entity).set_up(true);
    run_frames(&mut app, 60);
    assert!(state_of(&app, entity).is_start_walk());

    // Input still forces a way out
    input(&mut app, entity).set_up(false);
    tick(&mut app);
    assert_eq!(state_of(&app, entity), StateKind::EndWalk);
}

#[test]
fn known_clip_durations_time_states() {
    let mut app = create_test_app();
    let entity = settled_character(&mut app);

    let mut library = ClipLibrary::new();
    for (i, kind) in StateKind::ALL.into_iter().enumerate() {
        library.insert(kind.profile().clip, AnimationNodeIndex::new(i + 1), 0.5);
    }
    app.world_mut().entity_mut(entity).insert(library);

    input(&mut app, entity).set_up(true);
    tick(&mut app);
    assert!(state_of(&app, entity).is_start_walk());

    // About half a second of start animation
    run_frames(&mut app, 25);
    assert!(state_of(&app, entity).is_start_walk());
    assert!(run_until(&mut app, entity, StateKind::Walk, 10));
}
