//! Scene bootstrap: the default demo scene and JSON scene files

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{BallKind, ColorToken, Components, EntityId};
use super::schedule::Simulation;
use crate::SimError;

/// Mean of `repetitions` uniform samples in [0, 1); tends toward a normal
/// distribution around 0.5 as `repetitions` grows
pub fn normalizing_random<R: Rng>(rng: &mut R, repetitions: u32) -> f64 {
    let n = repetitions.max(1);
    (0..n).map(|_| rng.random::<f64>()).sum::<f64>() / n as f64
}

/// A list of entities to create
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub entities: Vec<Components>,
}

impl Scene {
    /// A thrown basketball plus a static marker placed from `seed`
    pub fn demo(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);

        let ball = Components::new()
            .named("Basketball")
            .with_position(1.0, 1.0)
            .with_velocity(20.0, 20.0)
            .with_ball(BallKind::Basketball)
            .with_color(ColorToken::Rgb(0xff, 0x00, 0x00))
            .tracked();

        let marker_x = rng.random::<f64>() * 100.0;
        let marker_y = normalizing_random(&mut rng, 4) * 0.2 + 1.3;
        let marker_radius = normalizing_random(&mut rng, 4) * 0.05 + 0.2;
        let marker = Components::new()
            .named("Marker")
            .with_position(marker_x, marker_y)
            .with_radius(marker_radius)
            .with_color(ColorToken::Rgb(0x00, 0x00, 0xff));

        Self {
            entities: vec![ball, marker],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let scene: Self = serde_json::from_str(json)?;
        log::info!("Loaded scene with {} entities", scene.entities.len());
        Ok(scene)
    }

    /// Add every entity to the simulation, returning their ids in order
    pub fn spawn(self, sim: &mut Simulation) -> Vec<EntityId> {
        self.entities
            .into_iter()
            .map(|components| sim.add_entity(components))
            .collect()
    }
}
