//! One host frame: advance the simulation, fit the camera, draw
//!
//! Hosts call [`FrameDriver::tick`] once per display refresh with the
//! frame timestamp in milliseconds.

use crate::SimConfig;
use crate::renderer::{SceneRenderer, Surface};
use crate::sim::{Camera, Simulation};

/// What happened during one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    /// Step the systems advanced by (s)
    pub dt: f64,
    pub running: bool,
    /// Seconds the boost input has been held
    pub boost_secs: Option<f64>,
    /// `None` when nothing could be framed
    pub camera: Option<Camera>,
}

/// Runs the systems then the render pass
#[derive(Debug, Clone)]
pub struct FrameDriver {
    pub renderer: SceneRenderer,
    side_margin_px: f64,
    surface_was_empty: bool,
}

impl FrameDriver {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            renderer: SceneRenderer::default(),
            side_margin_px: config.side_margin_px,
            surface_was_empty: false,
        }
    }

    pub fn tick(&mut self, sim: &mut Simulation, now_ms: f64, surface: &mut dyn Surface) -> FrameMetrics {
        let report = sim.advance(now_ms);

        let width = surface.width() as f64;
        let height = surface.height() as f64;
        let empty = width <= 0.0 || height <= 0.0;
        if empty && !self.surface_was_empty {
            log::warn!("Surface is {}x{}; skipping camera fit", width, height);
        }
        self.surface_was_empty = empty;

        let camera = Camera::fit(sim.entities(), width, height, self.side_margin_px);
        self.renderer.render(sim, camera.as_ref(), surface);

        log::trace!(
            "Frame dt={:.4}s running={} scale={:?}",
            report.dt,
            report.running,
            camera.map(|c| c.scale)
        );

        FrameMetrics {
            dt: report.dt,
            running: report.running,
            boost_secs: report.boost_secs,
            camera,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::ShapeBatch;
    use crate::renderer::surface::RecordingSurface;
    use crate::sim::{Components, Scene};

    #[test]
    fn test_tick_reports_step_and_camera() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(&config);
        Scene::demo(5).spawn(&mut sim);
        let mut driver = FrameDriver::new(&config);
        let mut surface = RecordingSurface::new(1280.0, 720.0);

        let first = driver.tick(&mut sim, 0.0, &mut surface);
        assert_eq!(first.dt, 0.001);
        assert!(first.running);
        assert!(first.camera.is_some());
        assert_eq!(surface.circles().len(), 2);
        assert!(surface.texts().iter().any(|t| t.starts_with("Basketball: ")));

        let second = driver.tick(&mut sim, 16.0, &mut surface);
        assert!((second.dt - 0.016).abs() < 1e-12);
    }

    #[test]
    fn test_empty_world_has_no_camera() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(&config);
        let mut driver = FrameDriver::new(&config);
        let mut surface = RecordingSurface::new(640.0, 480.0);
        let metrics = driver.tick(&mut sim, 0.0, &mut surface);
        assert!(metrics.camera.is_none());
        assert_eq!(surface.calls.len(), 1);
    }

    #[test]
    fn test_zero_sized_surface_is_tolerated() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(&config);
        sim.add_entity(Components::new().with_position(0.0, 1.0));
        let mut driver = FrameDriver::new(&config);
        let mut batch = ShapeBatch::new(0.0, 0.0);
        let metrics = driver.tick(&mut sim, 0.0, &mut batch);
        assert!(metrics.camera.is_none());
        assert!(batch.vertices().is_empty());
    }

    #[test]
    fn test_demo_ball_bounces_and_stays_above_ground() {
        let config = SimConfig::default();
        let mut sim = Simulation::new(&config);
        let ids = Scene::demo(9).spawn(&mut sim);
        let mut driver = FrameDriver::new(&config);
        let mut batch = ShapeBatch::new(1280.0, 720.0);

        let mut lowest = f64::INFINITY;
        for frame in 0..900 {
            driver.tick(&mut sim, frame as f64 * 16.0, &mut batch);
            let ball = sim.entity(ids[0]).unwrap();
            lowest = lowest.min(ball.position.unwrap().y - ball.shape_radius.unwrap());
        }
        assert!(lowest > -1e-9);
        assert!(!batch.vertices().is_empty());
    }
}
