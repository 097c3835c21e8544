//! Systems and the frame scheduler
//!
//! A frame computes a clamped `dt`, then runs the registered systems once, in
//! registration order. The built-in pipeline is integrate → ground → drag →
//! trails; rendering happens after the systems (see `crate::frame`).

use std::collections::{BTreeMap, VecDeque};

use super::collision::resolve_ground;
use super::entity::{ColorToken, ComponentPatch, Components, Entity, EntityId};
use super::integrator::{
    GroundResponse, Integration, PhysicsMode, PhysicsParams, apply_drag, integrate_gravity,
    integrate_uniform,
};
use super::store::EntityStore;
use super::vector::{Vector2, VectorExt};
use crate::{SimConfig, SimError};

/// Inputs shared by every system during one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    /// Clamped step (s)
    pub dt: f64,
    /// Seconds the boost input has been held, if it is held
    pub boost_secs: Option<f64>,
    /// Gravity with boost applied
    pub gravity: Vector2,
    pub running: bool,
}

/// One recorded trail position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub entity_id: EntityId,
    pub position: Vector2,
    pub color: Option<ColorToken>,
}

/// Bounded trail history, oldest first
#[derive(Debug, Clone)]
pub struct TrailLog {
    points: VecDeque<TrailPoint>,
    capacity: usize,
}

impl TrailLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::new(),
            capacity,
        }
    }

    pub fn record(&mut self, point: TrailPoint) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    /// Trail of a single entity, oldest first
    pub fn for_entity(&self, id: EntityId) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter().filter(move |p| p.entity_id == id)
    }
}

/// Everything systems may mutate
#[derive(Debug, Clone)]
pub struct World {
    pub entities: EntityStore,
    pub trails: TrailLog,
    /// Speed of each moving entity before this frame's integration
    pub pre_step_speeds: BTreeMap<EntityId, f64>,
}

impl World {
    pub fn new(trail_capacity: usize) -> Self {
        Self {
            entities: EntityStore::new(),
            trails: TrailLog::new(trail_capacity),
            pre_step_speeds: BTreeMap::new(),
        }
    }
}

/// A per-frame transformation of the world
pub trait System {
    fn name(&self) -> &'static str;

    /// Whether the system is skipped while paused
    fn requires_running(&self) -> bool {
        true
    }

    fn run(&mut self, world: &mut World, frame: &FrameInputs);
}

/// Advances positions (and velocities under gravity)
#[derive(Debug, Clone, Copy)]
pub struct IntegrateSystem {
    pub integration: Integration,
}

impl System for IntegrateSystem {
    fn name(&self) -> &'static str {
        "integrate"
    }

    fn run(&mut self, world: &mut World, frame: &FrameInputs) {
        world.pre_step_speeds.clear();
        for entity in world.entities.iter_mut() {
            if let Some(velocity) = entity.velocity {
                world.pre_step_speeds.insert(entity.id, velocity.magnitude());
            }
            match self.integration {
                Integration::None => {}
                Integration::Uniform => integrate_uniform(entity, frame.dt),
                Integration::Gravity => integrate_gravity(entity, frame.gravity, frame.dt),
            }
        }
    }
}

/// Resolves ground penetration
#[derive(Debug, Clone, Copy)]
pub struct GroundSystem {
    pub response: GroundResponse,
    pub params: PhysicsParams,
}

impl System for GroundSystem {
    fn name(&self) -> &'static str {
        "ground"
    }

    fn run(&mut self, world: &mut World, frame: &FrameInputs) {
        let World {
            entities,
            pre_step_speeds,
            ..
        } = world;
        for entity in entities.iter_mut() {
            let pre_step_speed = pre_step_speeds.get(&entity.id).copied();
            if let Some(bounce) =
                resolve_ground(entity, pre_step_speed, frame.gravity, self.response, &self.params)
            {
                log::trace!(
                    "Entity {} bounced: {:.3} -> {:.3} m/s",
                    entity.id,
                    bounce.impact_speed,
                    bounce.rebound_speed
                );
            }
        }
    }
}

/// Quadratic air drag
#[derive(Debug, Clone, Copy)]
pub struct DragSystem {
    pub air_density: f64,
}

impl System for DragSystem {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn run(&mut self, world: &mut World, frame: &FrameInputs) {
        for entity in world.entities.iter_mut() {
            apply_drag(entity, self.air_density, frame.dt);
        }
    }
}

/// Records positions of entities with `track_trail`
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailSystem;

impl System for TrailSystem {
    fn name(&self) -> &'static str {
        "trails"
    }

    fn run(&mut self, world: &mut World, _frame: &FrameInputs) {
        let World {
            entities, trails, ..
        } = world;
        for entity in entities.iter().filter(|e| e.track_trail) {
            if let Some(position) = entity.position {
                trails.record(TrailPoint {
                    entity_id: entity.id,
                    position,
                    color: entity.fill_color,
                });
            }
        }
    }
}

/// The built-in pipeline for a physics mode
pub fn default_systems(mode: PhysicsMode, params: PhysicsParams) -> Vec<Box<dyn System>> {
    let passes = mode.passes();
    let mut systems: Vec<Box<dyn System>> = Vec::new();
    if passes.integration != Integration::None {
        systems.push(Box::new(IntegrateSystem {
            integration: passes.integration,
        }));
    }
    if let Some(response) = passes.ground {
        systems.push(Box::new(GroundSystem { response, params }));
    }
    if passes.drag {
        systems.push(Box::new(DragSystem {
            air_density: params.air_density,
        }));
    }
    systems.push(Box::new(TrailSystem));
    systems
}

/// Whether physics advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Paused,
    Running,
}

/// Result of advancing one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub dt: f64,
    pub running: bool,
    pub boost_secs: Option<f64>,
}

/// Owns the world, the system list and frame timing
pub struct Simulation {
    world: World,
    systems: Vec<Box<dyn System>>,
    run_state: RunState,
    mode: PhysicsMode,
    params: PhysicsParams,
    max_dt: f64,
    dt: f64,
    last_frame_ms: Option<f64>,
    /// When the boost input became active
    boost_started_ms: Option<f64>,
}

impl Simulation {
    /// Empty simulation running the built-in pipeline for `config.mode`
    pub fn new(config: &SimConfig) -> Self {
        let params = config.physics_params();
        Self {
            world: World::new(config.max_trail_points),
            systems: default_systems(config.mode, params),
            run_state: if config.start_running {
                RunState::Running
            } else {
                RunState::Paused
            },
            mode: config.mode,
            params,
            max_dt: config.max_dt,
            dt: config.initial_dt,
            last_frame_ms: None,
            boost_started_ms: None,
        }
    }

    /// Append a system; it runs after every system already registered
    pub fn add_system(&mut self, system: Box<dyn System>) {
        log::debug!("Registered system '{}'", system.name());
        self.systems.push(system);
    }

    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Replace the system list with the built-in pipeline for `mode`
    ///
    /// Systems registered through [`Simulation::add_system`] are dropped and
    /// must be added again.
    pub fn set_mode(&mut self, mode: PhysicsMode) {
        log::info!("Physics mode: {}", mode.as_str());
        self.mode = mode;
        self.systems = default_systems(mode, self.params);
    }

    pub fn mode(&self) -> PhysicsMode {
        self.mode
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    // === Edit commands ===

    pub fn add_entity(&mut self, components: Components) -> EntityId {
        self.world.entities.add_entity(components)
    }

    pub fn update_entity(&mut self, id: EntityId, patch: ComponentPatch) -> Result<(), SimError> {
        self.world.entities.update_entity(id, patch).inspect_err(|e| {
            log::warn!("Rejected update: {}", e);
        })
    }

    pub fn remove_entities<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&Entity) -> bool,
    {
        self.world.entities.remove_entities(predicate)
    }

    // === Run control ===

    pub fn run(&mut self) {
        if self.run_state == RunState::Paused {
            log::info!("Simulation running");
        }
        self.run_state = RunState::Running;
    }

    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            log::info!("Simulation paused");
        }
        self.run_state = RunState::Paused;
    }

    /// Reset non-persistent entities and clear trails; run state is kept
    pub fn restart(&mut self) {
        self.world.entities.reset_non_persistent();
        self.world.trails.clear();
        log::info!("Simulation restarted");
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    // === Boost input ===

    /// Record that the boost input became active at `at_ms`; repeats are ignored
    pub fn boost_started(&mut self, at_ms: f64) {
        if self.boost_started_ms.is_none() {
            log::debug!("Boost started at {:.1} ms", at_ms);
            self.boost_started_ms = Some(at_ms);
        }
    }

    pub fn boost_ended(&mut self) {
        if self.boost_started_ms.take().is_some() {
            log::debug!("Boost ended");
        }
    }

    /// Seconds the boost has been held as of `frame_ms`
    pub fn boost_secs(&self, frame_ms: f64) -> Option<f64> {
        self.boost_started_ms
            .map(|start| ((frame_ms - start) / 1000.0).max(0.0))
    }

    // === Frame ===

    /// Update frame timing and run every system once
    pub fn advance(&mut self, now_ms: f64) -> StepReport {
        self.update_time(now_ms);

        let boost_secs = self.boost_secs(now_ms);
        let frame = FrameInputs {
            dt: self.dt,
            boost_secs,
            gravity: self.params.effective_gravity(boost_secs),
            running: self.is_running(),
        };

        for system in self.systems.iter_mut() {
            if system.requires_running() && !frame.running {
                continue;
            }
            system.run(&mut self.world, &frame);
        }

        StepReport {
            dt: frame.dt,
            running: frame.running,
            boost_secs,
        }
    }

    fn update_time(&mut self, now_ms: f64) {
        if let Some(last) = self.last_frame_ms {
            let raw = (now_ms - last) / 1000.0;
            if raw > self.max_dt {
                log::debug!("Clamped frame step {:.4}s to {:.4}s", raw, self.max_dt);
            }
            self.dt = raw.min(self.max_dt).max(0.0);
        }
        self.last_frame_ms = Some(now_ms);
    }

    /// Step used by the most recent frame
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn entities(&self) -> &EntityStore {
        &self.world.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.world.entities.get(id)
    }

    pub fn trails(&self) -> &TrailLog {
        &self.world.trails
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn config(mode: PhysicsMode) -> SimConfig {
        SimConfig {
            mode,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_default_pipeline_order() {
        let sim = Simulation::new(&config(PhysicsMode::InelasticBounce));
        assert_eq!(sim.system_names(), vec!["integrate", "ground", "drag", "trails"]);

        let sim = Simulation::new(&config(PhysicsMode::Static));
        assert_eq!(sim.system_names(), vec!["trails"]);
    }

    #[test]
    fn test_set_mode_rebuilds_pipeline_and_drops_custom_systems() {
        let mut sim = Simulation::new(&config(PhysicsMode::InelasticBounce));
        sim.add_system(Box::new(TrailSystem));
        assert_eq!(sim.system_names().len(), 5);

        sim.set_mode(PhysicsMode::UniformMotion);
        assert_eq!(sim.mode(), PhysicsMode::UniformMotion);
        assert_eq!(sim.system_names(), vec!["integrate", "trails"]);

        let id = sim.add_entity(Components::new().with_position(0.0, 5.0).with_velocity(1.0, 0.0));
        sim.advance(0.0);
        sim.advance(16.0);
        let entity = sim.entity(id).unwrap();
        assert_eq!(entity.velocity, Some(DVec2::new(1.0, 0.0)));
        assert_eq!(entity.position.unwrap().y, 5.0);
    }

    #[test]
    fn test_first_frame_uses_initial_dt_then_clamps() {
        let mut sim = Simulation::new(&config(PhysicsMode::Gravity));
        let report = sim.advance(1000.0);
        assert_eq!(report.dt, 0.001);

        let report = sim.advance(1010.0);
        assert!((report.dt - 0.01).abs() < 1e-12);

        // A long stall (tab switch) is clamped
        let report = sim.advance(6000.0);
        assert!((report.dt - 1.0 / 30.0).abs() < 1e-12);

        // Clock going backwards never yields a negative step
        let report = sim.advance(5000.0);
        assert_eq!(report.dt, 0.0);
    }

    #[test]
    fn test_gravity_frame_matches_single_step() {
        let mut sim = Simulation::new(&config(PhysicsMode::Gravity));
        let id = sim.add_entity(
            Components::new()
                .with_position(0.0, 1.0)
                .with_velocity(0.0, 0.0)
                .with_mass(0.6)
                .with_radius(0.121),
        );
        sim.advance(0.0);
        sim.update_entity(
            id,
            ComponentPatch {
                position: crate::sim::entity::Patch::Set(DVec2::new(0.0, 1.0)),
                velocity: crate::sim::entity::Patch::Set(DVec2::ZERO),
                ..Default::default()
            },
        )
        .unwrap();

        // Stay under the 1/30 s clamp so the step is exactly 0.03 s
        sim.advance(30.0);
        let entity = sim.entity(id).unwrap();
        let dt = 0.03;
        assert!((entity.velocity.unwrap().y - (-9.8 * dt)).abs() < 1e-12);
        assert!((entity.position.unwrap().y - (1.0 - 0.5 * 9.8 * dt * dt)).abs() < 1e-12);
    }

    #[test]
    fn test_ground_uses_speed_from_before_integration() {
        let mut sim = Simulation::new(&config(PhysicsMode::InelasticBounce));
        let id = sim.add_entity(
            Components::new()
                .with_position(0.0, 0.2)
                .with_velocity(0.0, -30.0)
                .with_ball(crate::sim::entity::BallKind::Basketball),
        );
        sim.advance(0.0);
        let before = sim.entity(id).unwrap().clone();
        let pre_step_speed = before.velocity.unwrap().magnitude();

        sim.advance(20.0);

        let mut expected = before.clone();
        integrate_gravity(&mut expected, sim.params().gravity, sim.dt());
        assert!(expected.position.unwrap().y < expected.shape_radius.unwrap());
        resolve_ground(
            &mut expected,
            Some(pre_step_speed),
            sim.params().gravity,
            GroundResponse::Restitution,
            sim.params(),
        )
        .unwrap();
        assert_eq!(sim.entity(id).unwrap().position, expected.position);

        let mut post_step = before;
        integrate_gravity(&mut post_step, sim.params().gravity, sim.dt());
        resolve_ground(
            &mut post_step,
            None,
            sim.params().gravity,
            GroundResponse::Restitution,
            sim.params(),
        )
        .unwrap();
        assert_ne!(sim.entity(id).unwrap().position, post_step.position);
    }

    #[test]
    fn test_paused_simulation_does_not_move() {
        let mut sim = Simulation::new(&config(PhysicsMode::UniformMotion));
        let id = sim.add_entity(Components::new().with_position(0.0, 1.0).with_velocity(1.0, 0.0).tracked());
        sim.pause();
        sim.advance(0.0);
        sim.advance(16.0);
        assert_eq!(sim.entity(id).unwrap().position, Some(DVec2::new(0.0, 1.0)));
        assert!(sim.trails().is_empty());

        sim.run();
        sim.advance(32.0);
        assert!(sim.entity(id).unwrap().position.unwrap().x > 0.0);
        assert_eq!(sim.trails().len(), 1);
    }

    #[test]
    fn test_boost_duration_is_measured_from_frame_time() {
        let mut sim = Simulation::new(&config(PhysicsMode::Gravity));
        sim.advance(0.0);
        sim.boost_started(100.0);
        sim.boost_started(150.0);
        let report = sim.advance(600.0);
        assert_eq!(report.boost_secs, Some(0.5));

        sim.boost_ended();
        let report = sim.advance(620.0);
        assert_eq!(report.boost_secs, None);
    }

    #[test]
    fn test_boost_pulls_harder() {
        let mut plain = Simulation::new(&config(PhysicsMode::Gravity));
        let mut boosted = Simulation::new(&config(PhysicsMode::Gravity));
        for sim in [&mut plain, &mut boosted] {
            sim.add_entity(Components::new().with_position(0.0, 10.0).with_velocity(0.0, 0.0));
            sim.advance(0.0);
        }
        boosted.boost_started(0.0);
        plain.advance(20.0);
        boosted.advance(20.0);

        let plain_v = plain.entity(1).unwrap().velocity.unwrap().y;
        let boosted_v = boosted.entity(1).unwrap().velocity.unwrap().y;
        assert!(boosted_v < plain_v);
    }

    #[test]
    fn test_restart_resets_motion_and_clears_trails() {
        let mut sim = Simulation::new(&config(PhysicsMode::UniformMotion));
        let moving = sim.add_entity(
            Components::new()
                .with_position(0.0, 1.0)
                .with_velocity(2.0, 0.0)
                .tracked(),
        );
        let pinned = sim.add_entity(
            Components::new()
                .with_position(5.0, 1.0)
                .with_velocity(1.0, 0.0)
                .persistent(),
        );
        sim.advance(0.0);
        for frame in 1..10 {
            sim.advance(frame as f64 * 16.0);
        }
        let pinned_before = sim.entity(pinned).unwrap().position;
        assert!(!sim.trails().is_empty());

        sim.restart();

        assert_eq!(sim.entity(moving).unwrap().position, Some(DVec2::new(0.0, 1.0)));
        assert_eq!(sim.entity(moving).unwrap().velocity, Some(DVec2::new(2.0, 0.0)));
        assert_eq!(sim.entity(pinned).unwrap().position, pinned_before);
        assert_ne!(pinned_before, Some(DVec2::new(5.0, 1.0)));
        assert!(sim.trails().is_empty());
        assert!(sim.is_running());
    }

    #[test]
    fn test_trail_log_drops_oldest() {
        let mut log = TrailLog::new(2);
        for i in 0..3 {
            log.record(TrailPoint {
                entity_id: 1,
                position: DVec2::new(i as f64, 0.0),
                color: None,
            });
        }
        let xs: Vec<f64> = log.iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![1.0, 2.0]);
        assert_eq!(log.for_entity(2).count(), 0);
    }

    struct Counter {
        calls: usize,
        always: bool,
    }

    impl System for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        fn requires_running(&self) -> bool {
            !self.always
        }

        fn run(&mut self, world: &mut World, _frame: &FrameInputs) {
            self.calls += 1;
            world.entities.add_entity(Components::new());
        }
    }

    #[test]
    fn test_custom_system_runs_last_and_respects_pause() {
        let mut sim = Simulation::new(&config(PhysicsMode::Static));
        sim.add_system(Box::new(Counter {
            calls: 0,
            always: false,
        }));
        sim.add_system(Box::new(Counter {
            calls: 0,
            always: true,
        }));
        assert_eq!(sim.system_names(), vec!["trails", "counter", "counter"]);

        sim.pause();
        sim.advance(0.0);
        assert_eq!(sim.entities().len(), 1);

        sim.run();
        sim.advance(16.0);
        assert_eq!(sim.entities().len(), 3);
    }
}
