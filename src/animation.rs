//! Animation seam.
//!
//! The state machine only needs to know how long a clip lasts. Playback is
//! left to Bevy's [`AnimationPlayer`]: [`ClipLibrary`] maps clip names to
//! graph nodes and durations, and [`drive_animation_players`] keeps each
//! character's player on the active state's clip.

use std::collections::HashMap;
use std::time::Duration;

use bevy::prelude::*;

use crate::controller::CharacterController;

/// Something that can start a named clip.
pub trait AnimationSink {
    /// Start `clip` with a linear fade-in of `fade_in` seconds.
    ///
    /// Returns the clip's duration, or `None` if the clip is unknown.
    fn set_animation(&mut self, clip: &str, fade_in: f32) -> Option<f32>;
}

/// Sink for characters with no animation rig.
///
/// Every clip lasts zero seconds, so timed states end on their first update.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl AnimationSink for Headless {
    fn set_animation(&mut self, _clip: &str, _fade_in: f32) -> Option<f32> {
        Some(0.0)
    }
}

/// Where a clip lives in the animation graph and how long it plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipInfo {
    /// Graph node playing the clip.
    pub node: AnimationNodeIndex,
    /// Duration in seconds at normal speed.
    pub duration: f32,
}

/// Clips available to one character.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use msg_locomotion::prelude::*;
///
/// let library = ClipLibrary::new()
///     .with_clip("idle", AnimationNodeIndex::new(1), 2.0)
///     .with_clip("stop", AnimationNodeIndex::new(2), 0.4);
/// assert_eq!(library.duration("stop"), Some(0.4));
/// ```
#[derive(Component, Debug, Clone, Default)]
pub struct ClipLibrary {
    clips: HashMap<String, ClipInfo>,
    player: Option<Entity>,
    played_entry: Option<u32>,
}

impl ClipLibrary {
    /// Empty library. The player is looked up on the character itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a clip.
    pub fn with_clip(
        mut self,
        name: impl Into<String>,
        node: AnimationNodeIndex,
        duration: f32,
    ) -> Self {
        self.insert(name, node, duration);
        self
    }

    /// Builder: the entity carrying the [`AnimationPlayer`], usually a child
    /// spawned by the scene loader.
    pub fn with_player(mut self, player: Entity) -> Self {
        self.player = Some(player);
        self
    }

    /// Register or replace a clip.
    pub fn insert(&mut self, name: impl Into<String>, node: AnimationNodeIndex, duration: f32) {
        self.clips.insert(name.into(), ClipInfo { node, duration });
    }

    /// Point the library at a player entity.
    pub fn set_player(&mut self, player: Entity) {
        self.player = Some(player);
    }

    /// Player entity, if set.
    #[inline]
    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /// Lookup by clip name.
    pub fn get(&self, clip: &str) -> Option<&ClipInfo> {
        self.clips.get(clip)
    }

    /// Duration of a clip.
    pub fn duration(&self, clip: &str) -> Option<f32> {
        self.get(clip).map(|info| info.duration)
    }

    /// Number of registered clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// Whether no clips are registered.
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl AnimationSink for ClipLibrary {
    fn set_animation(&mut self, clip: &str, _fade_in: f32) -> Option<f32> {
        // Playback is started by `drive_animation_players`
        self.duration(clip)
    }
}

/// Play each character's active clip on its animation player.
///
/// A clip is started once per state entry, so leaving and re-entering a
/// state between two renders restarts its clip. Looping clips repeat forever.
pub fn drive_animation_players(
    mut q_characters: Query<(Entity, &CharacterController, &mut ClipLibrary)>,
    mut q_players: Query<(&mut AnimationPlayer, &mut AnimationTransitions)>,
) {
    for (entity, controller, mut library) in &mut q_characters {
        let entry = controller.state_entry();
        if library.played_entry == Some(entry) {
            continue;
        }

        let profile = controller.kind().profile();
        let Some(info) = library.get(profile.clip).copied() else {
            continue;
        };

        let player_entity = library.player().unwrap_or(entity);
        let Ok((mut player, mut transitions)) = q_players.get_mut(player_entity) else {
            continue;
        };

        let active = transitions.play(
            &mut player,
            info.node,
            Duration::from_secs_f32(profile.fade_in.max(0.0)),
        );
        if profile.looping {
            active.repeat();
        }
        library.played_entry = Some(entry);
    }
}
