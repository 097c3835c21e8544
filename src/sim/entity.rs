//! Entities and their optional components
//!
//! Every component is independently optional. A pass that needs a component
//! an entity lacks simply leaves that entity alone.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::vector::Vector2;

/// Stable entity identifier, unique within a store for the whole run
pub type EntityId = u32;

/// Fill colour of an entity: a palette slot or a literal colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Base08,
    Base09,
    Base0A,
    Base0B,
    Base0C,
    Base0D,
    Base0E,
    Base0F,
    Rgb(u8, u8, u8),
}

/// Component set used to create an entity (absent = `None`/`false`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Components {
    pub position: Option<Vector2>,
    pub velocity: Option<Vector2>,
    /// kg
    pub mass: Option<f64>,
    /// m
    pub shape_radius: Option<f64>,
    /// Unitless drag coefficient (Cd)
    pub drag_coefficient: Option<f64>,
    /// Bounciness in [0, 1]; absent means perfectly elastic
    pub restitution_coefficient: Option<f64>,
    pub fill_color: Option<ColorToken>,
    pub name: Option<String>,
    /// Record a position trail every running frame
    pub track_trail: bool,
    /// Survive restarts unchanged
    pub persistent: bool,
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(DVec2::new(x, y));
        self
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.velocity = Some(DVec2::new(vx, vy));
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.shape_radius = Some(radius);
        self
    }

    pub fn with_drag(mut self, drag_coefficient: f64) -> Self {
        self.drag_coefficient = Some(drag_coefficient);
        self
    }

    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution_coefficient = Some(restitution);
        self
    }

    pub fn with_color(mut self, color: ColorToken) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tracked(mut self) -> Self {
        self.track_trail = true;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Fill in radius, mass, drag and restitution from a preset
    pub fn with_ball(self, kind: BallKind) -> Self {
        let spec = kind.spec();
        self.with_radius(spec.radius)
            .with_mass(spec.mass)
            .with_drag(spec.drag_coefficient)
            .with_restitution(spec.restitution)
    }
}

/// A simulated circular body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub position: Option<Vector2>,
    pub velocity: Option<Vector2>,
    pub mass: Option<f64>,
    pub shape_radius: Option<f64>,
    pub drag_coefficient: Option<f64>,
    pub restitution_coefficient: Option<f64>,
    pub fill_color: Option<ColorToken>,
    pub name: Option<String>,
    pub track_trail: bool,
    pub persistent: bool,
    /// Creation-time position, restored on restart
    starting_position: Option<Vector2>,
    /// Creation-time velocity, restored on restart
    starting_velocity: Option<Vector2>,
}

impl Entity {
    pub fn new(id: EntityId, components: Components) -> Self {
        Self {
            id,
            starting_position: components.position,
            starting_velocity: components.velocity,
            position: components.position,
            velocity: components.velocity,
            mass: components.mass,
            shape_radius: components.shape_radius,
            drag_coefficient: components.drag_coefficient,
            restitution_coefficient: components.restitution_coefficient,
            fill_color: components.fill_color,
            name: components.name,
            track_trail: components.track_trail,
            persistent: components.persistent,
        }
    }

    pub fn starting_position(&self) -> Option<Vector2> {
        self.starting_position
    }

    pub fn starting_velocity(&self) -> Option<Vector2> {
        self.starting_velocity
    }

    /// Put position and velocity back to their creation-time values
    pub fn reset_motion(&mut self) {
        self.position = self.starting_position;
        self.velocity = self.starting_velocity;
    }

    /// Merge a patch into this entity's components
    pub fn apply(&mut self, patch: ComponentPatch) {
        patch.position.apply_to(&mut self.position);
        patch.velocity.apply_to(&mut self.velocity);
        patch.mass.apply_to(&mut self.mass);
        patch.shape_radius.apply_to(&mut self.shape_radius);
        patch.drag_coefficient.apply_to(&mut self.drag_coefficient);
        patch
            .restitution_coefficient
            .apply_to(&mut self.restitution_coefficient);
        patch.fill_color.apply_to(&mut self.fill_color);
        patch.name.apply_to(&mut self.name);
        if let Some(track) = patch.track_trail {
            self.track_trail = track;
        }
        if let Some(persistent) = patch.persistent {
            self.persistent = persistent;
        }
    }
}

/// Edit applied to one optional component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Patch<T> {
    /// Leave the component as it is
    Keep,
    /// Add or replace the component
    Set(T),
    /// Remove the component
    Clear,
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Set(value) => *slot = Some(value),
            Patch::Clear => *slot = None,
        }
    }
}

/// Partial component update; untouched fields keep their current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentPatch {
    pub position: Patch<Vector2>,
    pub velocity: Patch<Vector2>,
    pub mass: Patch<f64>,
    pub shape_radius: Patch<f64>,
    pub drag_coefficient: Patch<f64>,
    pub restitution_coefficient: Patch<f64>,
    pub fill_color: Patch<ColorToken>,
    pub name: Patch<String>,
    pub track_trail: Option<bool>,
    pub persistent: Option<bool>,
}

/// Physical description of a ball preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallSpec {
    /// m
    pub radius: f64,
    /// kg
    pub mass: f64,
    pub drag_coefficient: f64,
    pub restitution: f64,
}

/// Real-world ball presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BallKind {
    Basketball,
    GolfBall,
    BowlingBall,
    PingPongBall,
}

impl BallKind {
    pub fn spec(self) -> BallSpec {
        match self {
            // 76 cm circumference
            BallKind::Basketball => BallSpec {
                radius: 0.76 / (2.0 * PI),
                mass: 0.6,
                drag_coefficient: 0.47,
                restitution: 0.77,
            },
            BallKind::GolfBall => BallSpec {
                radius: 0.04267 / 2.0,
                mass: 0.04593,
                drag_coefficient: 0.35,
                restitution: 0.821,
            },
            // Restitution is a guess
            BallKind::BowlingBall => BallSpec {
                radius: 0.2159 / 2.0,
                mass: 7.0,
                drag_coefficient: 0.47,
                restitution: 0.8,
            },
            BallKind::PingPongBall => BallSpec {
                radius: 0.04 / 2.0,
                mass: 0.0027,
                drag_coefficient: 0.47,
                restitution: 0.905,
            },
        }
    }

    /// Mean density of the preset (kg/m³)
    pub fn density(self) -> f64 {
        let spec = self.spec();
        density_from_radius_mass(spec.radius, spec.mass)
    }
}

/// Volume of a sphere of the given radius
#[inline]
pub fn sphere_volume(radius: f64) -> f64 {
    4.0 / 3.0 * PI * radius.powi(3)
}

#[inline]
pub fn density_from_radius_mass(radius: f64, mass: f64) -> f64 {
    mass / sphere_volume(radius)
}

#[inline]
pub fn mass_from_radius_density(radius: f64, density: f64) -> f64 {
    density * sphere_volume(radius)
}
