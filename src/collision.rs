//! Ground ray results.

use bevy::prelude::*;

/// Result of a ground ray that hit something.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// World position of the hit point.
    pub point: Vec3,
    /// Surface normal at the hit point.
    pub normal: Vec3,
    /// Entity that was hit, if the backend knows it.
    pub entity: Option<Entity>,
    /// Character velocity relative to the surface at the moment of the cast.
    pub relative_impact_velocity: Vec3,
}

impl RayHit {
    /// Create a hit result.
    pub fn new(distance: f32, point: Vec3, normal: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            point,
            normal,
            entity,
            relative_impact_velocity: Vec3::ZERO,
        }
    }

    /// Builder: set the relative impact velocity.
    pub fn with_impact_velocity(mut self, velocity: Vec3) -> Self {
        self.relative_impact_velocity = velocity;
        self
    }
}

/// Something that can cast the downward ground ray.
///
/// Physics backends implement this over their query pipeline; tests
/// implement it over a fixed answer.
pub trait GroundProbe {
    /// Cast a ray and return the closest hit within `max_distance`.
    fn cast_ray(&mut self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit>;
}

/// Ground contact as of the last probe.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundContact {
    /// Whether the last ray hit.
    pub hit: bool,
    /// Hit point of the last ray (only meaningful when `hit`).
    pub point: Vec3,
    /// Surface normal of the last ray (only meaningful when `hit`).
    pub normal: Vec3,
    /// Distance from ray origin to the ground (only meaningful when `hit`).
    pub distance: f32,
    /// Relative velocity recorded at the last airborne-to-grounded transition.
    pub impact_velocity: Vec3,
}

impl GroundContact {
    /// Record a new probe result. Returns true when this lands the character.
    pub fn record(&mut self, hit: Option<RayHit>) -> bool {
        let was_grounded = self.hit;
        match hit {
            Some(hit) => {
                self.hit = true;
                self.point = hit.point;
                self.normal = hit.normal;
                self.distance = hit.distance;
                if !was_grounded {
                    self.impact_velocity = hit.relative_impact_velocity;
                }
                !was_grounded
            }
            None => {
                self.hit = false;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hit_new() {
        let hit = RayHit::new(0.5, Vec3::new(1.0, 0.0, 2.0), Vec3::Y, None);
        assert_eq!(hit.distance, 0.5);
        assert_eq!(hit.point, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.relative_impact_velocity, Vec3::ZERO);
    }

    #[test]
    fn ray_hit_with_entity() {
        let entity = Entity::from_raw(42);
        let hit = RayHit::new(0.5, Vec3::ZERO, Vec3::Y, Some(entity));
        assert_eq!(hit.entity, Some(entity));
    }

    #[test]
    fn impact_velocity_recorded_only_on_landing() {
        let mut contact = GroundContact::default();
        let landing = RayHit::new(0.5, Vec3::ZERO, Vec3::Y, None)
            .with_impact_velocity(Vec3::new(0.0, -7.0, 0.0));
        assert!(contact.record(Some(landing)));
        assert!(contact.hit);
        assert_eq!(contact.impact_velocity.y, -7.0);

        // Staying grounded keeps the landing impact
        let standing = RayHit::new(0.5, Vec3::ZERO, Vec3::Y, None);
        assert!(!contact.record(Some(standing)));
        assert_eq!(contact.impact_velocity.y, -7.0);

        // Leaving the ground keeps it too, until the next landing
        assert!(!contact.record(None));
        assert!(!contact.hit);
        assert_eq!(contact.impact_velocity.y, -7.0);

        let soft = RayHit::new(0.5, Vec3::ZERO, Vec3::Y, None)
            .with_impact_velocity(Vec3::new(0.0, -1.0, 0.0));
        assert!(contact.record(Some(soft)));
        assert_eq!(contact.impact_velocity.y, -1.0);
    }
}
