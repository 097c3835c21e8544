//! Per-entity time integration and drag
//!
//! Each pass is a partial function over entities: an entity lacking a
//! component the pass needs is left untouched.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::entity::Entity;
use super::vector::{Vector2, VectorExt};
use crate::consts::*;

/// Which physics a simulation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhysicsMode {
    /// Nothing moves
    Static,
    /// Constant velocity, no forces
    UniformMotion,
    /// Free fall, no ground
    Gravity,
    /// Free fall with a perfectly elastic ground
    ElasticBounce,
    /// Free fall, elastic ground and quadratic air drag
    Drag,
    /// Free fall, restitution-aware ground and air drag
    #[default]
    InelasticBounce,
}

/// How positions and velocities are advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    None,
    Uniform,
    Gravity,
}

/// How the ground responds to penetration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundResponse {
    /// Mirror every bounce, ignoring restitution
    Elastic,
    /// Use restitution when the entity has one, elastic otherwise
    Restitution,
}

/// The passes a mode enables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passes {
    pub integration: Integration,
    pub ground: Option<GroundResponse>,
    pub drag: bool,
}

impl PhysicsMode {
    pub fn passes(self) -> Passes {
        match self {
            PhysicsMode::Static => Passes {
                integration: Integration::None,
                ground: None,
                drag: false,
            },
            PhysicsMode::UniformMotion => Passes {
                integration: Integration::Uniform,
                ground: None,
                drag: false,
            },
            PhysicsMode::Gravity => Passes {
                integration: Integration::Gravity,
                ground: None,
                drag: false,
            },
            PhysicsMode::ElasticBounce => Passes {
                integration: Integration::Gravity,
                ground: Some(GroundResponse::Elastic),
                drag: false,
            },
            PhysicsMode::Drag => Passes {
                integration: Integration::Gravity,
                ground: Some(GroundResponse::Elastic),
                drag: true,
            },
            PhysicsMode::InelasticBounce => Passes {
                integration: Integration::Gravity,
                ground: Some(GroundResponse::Restitution),
                drag: true,
            },
        }
    }

    /// Every mode, from no motion to the full pipeline
    pub const ALL: [PhysicsMode; 6] = [
        PhysicsMode::Static,
        PhysicsMode::UniformMotion,
        PhysicsMode::Gravity,
        PhysicsMode::ElasticBounce,
        PhysicsMode::Drag,
        PhysicsMode::InelasticBounce,
    ];

    /// The following mode in [`PhysicsMode::ALL`], wrapping around
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicsMode::Static => "static",
            PhysicsMode::UniformMotion => "uniform-motion",
            PhysicsMode::Gravity => "gravity",
            PhysicsMode::ElasticBounce => "elastic-bounce",
            PhysicsMode::Drag => "drag",
            PhysicsMode::InelasticBounce => "inelastic-bounce",
        }
    }
}

/// Physical constants shared by the passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub gravity: Vector2,
    pub boost_gain: f64,
    pub air_density: f64,
    pub restitution_offset: f64,
    pub momentum_cost: f64,
    pub min_rebound_speed: f64,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: DVec2::from_array(GRAVITY),
            boost_gain: BOOST_GAIN,
            air_density: AIR_DENSITY,
            restitution_offset: RESTITUTION_OFFSET,
            momentum_cost: MOMENTUM_COST,
            min_rebound_speed: MIN_REBOUND_SPEED,
        }
    }
}

impl PhysicsParams {
    /// Gravity scaled by `(boost_gain * s + 1)` while boost has been held `s` seconds
    pub fn effective_gravity(&self, boost_secs: Option<f64>) -> Vector2 {
        match boost_secs {
            Some(s) => self.gravity * (self.boost_gain * s + 1.0),
            None => self.gravity,
        }
    }
}

/// `position += velocity * dt`, velocity unchanged
pub fn integrate_uniform(entity: &mut Entity, dt: f64) {
    let (Some(position), Some(velocity)) = (entity.position, entity.velocity) else {
        return;
    };
    entity.position = Some(position + velocity * dt);
}

/// Trapezoidal step: new velocity from gravity, position from the mean velocity
pub fn integrate_gravity(entity: &mut Entity, gravity: Vector2, dt: f64) {
    let (Some(position), Some(velocity)) = (entity.position, entity.velocity) else {
        return;
    };
    let new_velocity = velocity + gravity * dt;
    entity.velocity = Some(new_velocity);
    entity.position = Some(position + (velocity + new_velocity) / 2.0 * dt);
}

/// Quadratic drag force for a sphere moving at `velocity`
///
/// `Fd = |v|² v̂ * (0.5 * ρ * Cd * π r²)`, pointing along the velocity; the
/// caller subtracts it.
pub fn drag_force(velocity: Vector2, drag_coefficient: f64, radius: f64, air_density: f64) -> Vector2 {
    let area = PI * radius * radius;
    velocity.raise_magnitude(2.0) * (0.5 * air_density * drag_coefficient * area)
}

/// `velocity -= Fd * dt / mass`; needs velocity, drag coefficient, radius and mass
pub fn apply_drag(entity: &mut Entity, air_density: f64, dt: f64) {
    let (Some(velocity), Some(cd), Some(radius), Some(mass)) = (
        entity.velocity,
        entity.drag_coefficient,
        entity.shape_radius,
        entity.mass,
    ) else {
        return;
    };
    let force = drag_force(velocity, cd, radius, air_density);
    entity.velocity = Some(velocity - force * (dt / mass));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Components;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn basketball_drop() -> Entity {
        Entity::new(
            1,
            Components::new()
                .with_position(0.0, 1.0)
                .with_velocity(0.0, 0.0)
                .with_mass(0.6)
                .with_radius(0.121),
        )
    }

    #[test]
    fn test_gravity_step_matches_trapezoid() {
        let mut entity = basketball_drop();
        integrate_gravity(&mut entity, DVec2::new(0.0, -9.8), 0.1);

        let velocity = entity.velocity.unwrap();
        let position = entity.position.unwrap();
        assert!((velocity - DVec2::new(0.0, -0.98)).length() < EPS);
        assert!((position - DVec2::new(0.0, 1.0 - 0.049)).length() < EPS);
    }

    #[test]
    fn test_gravity_converges_to_free_fall() {
        let mut entity = Entity::new(
            1,
            Components::new()
                .with_position(0.0, 100.0)
                .with_velocity(2.0, 3.0),
        );
        let g = DVec2::new(0.0, -9.8);
        let steps = 1000;
        let t: f64 = 1.0;
        for _ in 0..steps {
            integrate_gravity(&mut entity, g, t / steps as f64);
        }
        let expected_v = DVec2::new(2.0, 3.0) + g * t;
        let expected_p = DVec2::new(0.0, 100.0) + DVec2::new(2.0, 3.0) * t + g * (0.5 * t * t);
        assert!((entity.velocity.unwrap() - expected_v).length() < 1e-9);
        assert!((entity.position.unwrap() - expected_p).length() < 1e-6);
    }

    #[test]
    fn test_uniform_motion_keeps_velocity() {
        let mut entity = Entity::new(
            1,
            Components::new()
                .with_position(1.0, 1.0)
                .with_velocity(20.0, 20.0),
        );
        integrate_uniform(&mut entity, 0.5);
        assert_eq!(entity.position, Some(DVec2::new(11.0, 11.0)));
        assert_eq!(entity.velocity, Some(DVec2::new(20.0, 20.0)));
    }

    #[test]
    fn test_boost_scales_gravity() {
        let params = PhysicsParams::default();
        assert_eq!(params.effective_gravity(None), DVec2::new(0.0, -9.8));
        let boosted = params.effective_gravity(Some(0.5));
        assert!((boosted - DVec2::new(0.0, -9.8 * 6.0)).length() < EPS);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let mut entity = Entity::new(
            1,
            Components::new()
                .with_velocity(10.0, 0.0)
                .with_mass(0.6)
                .with_radius(0.121)
                .with_drag(0.47),
        );
        apply_drag(&mut entity, AIR_DENSITY, 0.01);

        let expected_force = 100.0 * 0.5 * AIR_DENSITY * 0.47 * PI * 0.121 * 0.121;
        let velocity = entity.velocity.unwrap();
        assert!((velocity.x - (10.0 - expected_force * 0.01 / 0.6)).abs() < EPS);
        assert!(velocity.x < 10.0);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn test_drag_skips_entities_without_mass() {
        let mut entity = Entity::new(
            1,
            Components::new()
                .with_velocity(10.0, 0.0)
                .with_radius(0.121)
                .with_drag(0.47),
        );
        apply_drag(&mut entity, AIR_DENSITY, 0.01);
        assert_eq!(entity.velocity, Some(DVec2::new(10.0, 0.0)));
    }

    #[test]
    fn test_static_mode_has_no_passes() {
        let passes = PhysicsMode::Static.passes();
        assert_eq!(passes.integration, Integration::None);
        assert!(passes.ground.is_none());
        assert!(!passes.drag);
    }

    #[test]
    fn test_next_mode_cycles() {
        assert_eq!(PhysicsMode::Static.next(), PhysicsMode::UniformMotion);
        assert_eq!(PhysicsMode::InelasticBounce.next(), PhysicsMode::Static);
        let mut mode = PhysicsMode::Gravity;
        for _ in 0..PhysicsMode::ALL.len() {
            mode = mode.next();
        }
        assert_eq!(mode, PhysicsMode::Gravity);
    }

    #[test]
    fn test_mode_serde_names() {
        let mode: PhysicsMode = serde_json::from_str("\"uniform-motion\"").unwrap();
        assert_eq!(mode, PhysicsMode::UniformMotion);
        assert_eq!(mode.as_str(), "uniform-motion");
        assert!(serde_json::from_str::<PhysicsMode>("\"warp-drive\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_no_velocity_means_no_motion(
            x in -100.0..100.0f64,
            y in 0.0..100.0f64,
            dt in 0.0..0.1f64,
            steps in 1usize..50,
        ) {
            let mut entity = Entity::new(1, Components::new().with_position(x, y).with_mass(1.0));
            for _ in 0..steps {
                integrate_uniform(&mut entity, dt);
                integrate_gravity(&mut entity, DVec2::new(0.0, -9.8), dt);
                apply_drag(&mut entity, AIR_DENSITY, dt);
            }
            prop_assert_eq!(entity.position, Some(DVec2::new(x, y)));
        }
    }
}
