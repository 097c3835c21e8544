//! Deterministic simulation module
//!
//! All physics lives here. This module must stay free of rendering and
//! platform code:
//! - Time only enters through the frame timestamp passed to `advance`
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)

pub mod camera;
pub mod collision;
pub mod entity;
pub mod integrator;
pub mod scene;
pub mod schedule;
pub mod store;
pub mod vector;

pub use camera::Camera;
pub use collision::{Bounce, conserved_speed, resolve_ground};
pub use entity::{BallKind, ColorToken, ComponentPatch, Components, Entity, EntityId, Patch};
pub use integrator::{PhysicsMode, PhysicsParams};
pub use scene::Scene;
pub use schedule::{
    FrameInputs, RunState, Simulation, StepReport, System, TrailLog, TrailPoint, World,
};
pub use store::EntityStore;
pub use vector::{Vector2, VectorExt};
