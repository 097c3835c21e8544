//! Ground collision response
//!
//! The ground is the line `y = 0`; entities are circles resting on it when
//! `position.y == shape_radius`. A bounce is resolved by bookkeeping energy:
//! total mechanical energy at the (invalid) penetrating position is carried
//! over to the corrected position, and whatever is not potential energy
//! becomes rebound speed.

use glam::DVec2;

use super::entity::Entity;
use super::integrator::{GroundResponse, PhysicsParams};
use super::vector::{Vector2, VectorExt};

/// Upward ground normal
pub const GROUND_NORMAL: Vector2 = DVec2::Y;

/// Outcome of a resolved bounce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    /// Speed at the penetrating position
    pub impact_speed: f64,
    /// Speed after the bounce
    pub rebound_speed: f64,
    /// Restitution branch was used
    pub inelastic: bool,
}

/// Fraction of impact speed kept by a bounce
///
/// Approaches `rc` for slow impacts and `rc - offset` for fast ones; never
/// increases with speed.
pub fn conserved_speed(restitution: f64, speed: f64, offset: f64) -> f64 {
    restitution - offset + offset / (1.0 + (0.13 * speed.abs() - 2.0).exp())
}

/// Potential energy above the resting height
#[inline]
pub fn potential_energy(gravity: f64, mass: f64, y: f64, radius: f64) -> f64 {
    gravity * mass * (y - radius)
}

#[inline]
pub fn kinetic_energy(mass: f64, velocity: Vector2) -> f64 {
    0.5 * mass * velocity.magnitude().powi(2)
}

/// Push a penetrating entity back above the ground and reflect its velocity
///
/// Needs position, velocity and shape radius. Energy bookkeeping uses the
/// entity's mass, or 1 when it has none. The restitution falloff is driven
/// by `pre_step_speed`, the speed before this frame's integration; `None`
/// falls back to the current speed.
pub fn resolve_ground(
    entity: &mut Entity,
    pre_step_speed: Option<f64>,
    gravity: Vector2,
    response: GroundResponse,
    params: &PhysicsParams,
) -> Option<Bounce> {
    let (Some(position), Some(velocity), Some(radius)) =
        (entity.position, entity.velocity, entity.shape_radius)
    else {
        return None;
    };
    if position.y >= radius {
        return None;
    }

    let g = gravity.magnitude();
    let mass = entity.mass.unwrap_or(1.0);
    let impact_speed = velocity.magnitude();
    let energy = potential_energy(g, mass, position.y, radius) + kinetic_energy(mass, velocity);

    let restitution = match response {
        GroundResponse::Elastic => None,
        GroundResponse::Restitution => entity.restitution_coefficient,
    };
    let approach_speed = pre_step_speed.unwrap_or(impact_speed);
    let kept = restitution.map(|rc| conserved_speed(rc, approach_speed, params.restitution_offset));

    let corrected_y = match kept {
        Some(kept) => radius + kept * (radius - position.y),
        None => 2.0 * radius - position.y,
    };

    let kinetic = energy - potential_energy(g, mass, corrected_y, radius);
    let speed = (2.0 * kinetic / mass).sqrt();
    let speed = if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        params.min_rebound_speed
    };

    // A resting penetration has no direction to reflect; push straight up
    let mut new_velocity = match velocity.normalized() {
        Some(direction) => (direction * speed).reflection(GROUND_NORMAL),
        None => GROUND_NORMAL * speed,
    };
    if let Some(kept) = kept {
        new_velocity = (new_velocity * kept).reduce_magnitude_by(params.momentum_cost);
    }

    entity.position = Some(DVec2::new(position.x, corrected_y));
    entity.velocity = Some(new_velocity);

    Some(Bounce {
        impact_speed,
        rebound_speed: new_velocity.magnitude(),
        inelastic: kept.is_some(),
    })
}
