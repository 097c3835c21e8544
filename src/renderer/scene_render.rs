//! Render pass: background gridlines, ground, trails, entities and info text
//!
//! Everything is drawn in surface pixels through a [`Camera`] fitted for
//! the current frame. With no camera (nothing positioned) only the
//! background and the status text are drawn.

use std::collections::BTreeMap;

use glam::DVec2;

use super::surface::{Palette, Surface};
use crate::consts::MAX_GRIDLINES;
use crate::sim::{Camera, EntityId, Simulation, TrailPoint, VectorExt};

/// Smallest on-screen radius of an entity (px)
const MIN_ENTITY_RADIUS_PX: f32 = 2.0;
/// Thickness of the ground strip (px)
const GROUND_STRIP_PX: f32 = 3.0;
/// Top-left of the info text block and its line spacing (px)
const INFO_ORIGIN: (f32, f32) = (10.0, 20.0);
const INFO_LINE_HEIGHT: f32 = 18.0;
/// Gridline indices are confined to `[-GRID_EXTENT, GRID_EXTENT]` metres
const GRID_EXTENT: f64 = 1e15;

/// Gridline thickness in metres for the line at integer coordinate `i`
///
/// Every 5th line is thicker, every 25th thicker again; the origin line is
/// the thickest of all.
pub fn line_width(i: i64) -> f64 {
    if i == 0 {
        return 0.005 * 3f64.powi(3);
    }
    let mut exponent = 1u32;
    while let Some(period) = 5i64.checked_pow(exponent) {
        if i % period != 0 {
            break;
        }
        exponent += 1;
    }
    0.005 * 3f64.powi(exponent as i32 - 1)
}

/// Spacing between drawn gridlines when `count` unit lines are visible
///
/// The smallest power of 5 that keeps the drawn count within
/// [`MAX_GRIDLINES`].
pub fn grid_step(count: usize) -> i64 {
    let mut step = 1i64;
    while count as i64 / step > MAX_GRIDLINES as i64 {
        step *= 5;
    }
    step
}

/// Integer coordinates of the gridlines drawn between `min` and `max`
///
/// Only multiples of [`grid_step`] are produced, so the iterator length is
/// bounded by [`MAX_GRIDLINES`] however wide the range is.
pub fn gridline_indices(min: f64, max: f64) -> impl Iterator<Item = i64> {
    let (first, last) = if min.is_nan() || max.is_nan() || max < min {
        (1, 0)
    } else {
        (
            min.clamp(-GRID_EXTENT, GRID_EXTENT).floor() as i64,
            max.clamp(-GRID_EXTENT, GRID_EXTENT).ceil() as i64,
        )
    };
    let step = grid_step((last - first + 1).max(0) as usize);
    let mut start = first.div_euclid(step) * step;
    if start < first {
        start += step;
    }
    (start..=last).step_by(step as usize)
}

/// Draws one frame of the simulation onto a [`Surface`]
#[derive(Debug, Clone)]
pub struct SceneRenderer {
    pub palette: Palette,
    /// Draw the per-entity info text
    pub show_info: bool,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            show_info: true,
        }
    }
}

impl SceneRenderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            show_info: true,
        }
    }

    pub fn render(&self, sim: &Simulation, camera: Option<&Camera>, surface: &mut dyn Surface) {
        surface.clear_and_fill_background(self.palette.background);

        if let Some(camera) = camera {
            self.draw_gridlines(camera, surface);
            self.draw_ground(camera, surface);
            self.draw_trails(sim, camera, surface);
            self.draw_entities(sim, camera, surface);
        }

        let mut line = 0;
        if !sim.is_running() {
            self.draw_info_line(surface, &mut line, "Paused");
        }
        if self.show_info {
            for entity in sim.entities().iter() {
                let (Some(name), Some(position)) = (entity.name.as_deref(), entity.position) else {
                    continue;
                };
                let speed = entity.velocity.map_or(0.0, |v| v.magnitude());
                let text = format!(
                    "{}: position ({:.2}, {:.2}) speed {:.2}",
                    name, position.x, position.y, speed
                );
                self.draw_info_line(surface, &mut line, &text);
            }
        }
    }

    fn draw_info_line(&self, surface: &mut dyn Surface, line: &mut usize, text: &str) {
        let (x, y) = INFO_ORIGIN;
        surface.draw_text(text, x, y + *line as f32 * INFO_LINE_HEIGHT);
        *line += 1;
    }

    fn draw_gridlines(&self, camera: &Camera, surface: &mut dyn Surface) {
        let width = surface.width();
        let height = surface.height();
        let color = self.palette.gridline;

        for xi in gridline_indices(camera.min_view_x, camera.max_view_x) {
            let centre = camera.to_pixels(DVec2::new(xi as f64, 0.0)).x as f32;
            let thickness = camera.length_to_pixels(line_width(xi)) as f32;
            surface.draw_filled_rect(centre - thickness / 2.0, 0.0, thickness, height, color);
        }

        for yi in gridline_indices(1.0, camera.max_view_y) {
            let centre = camera.to_pixels(DVec2::new(0.0, yi as f64)).y as f32;
            let thickness = camera.length_to_pixels(line_width(yi)) as f32;
            surface.draw_filled_rect(0.0, centre - thickness / 2.0, width, thickness, color);
        }
    }

    fn draw_ground(&self, camera: &Camera, surface: &mut dyn Surface) {
        let ground = camera.to_pixels(DVec2::ZERO).y as f32;
        surface.draw_filled_rect(
            0.0,
            ground - GROUND_STRIP_PX,
            surface.width(),
            GROUND_STRIP_PX,
            self.palette.ground,
        );
    }

    fn draw_trails(&self, sim: &Simulation, camera: &Camera, surface: &mut dyn Surface) {
        let mut by_entity: BTreeMap<EntityId, Vec<&TrailPoint>> = BTreeMap::new();
        for point in sim.trails().iter() {
            by_entity.entry(point.entity_id).or_default().push(point);
        }

        for points in by_entity.values() {
            for pair in points.windows(2) {
                let from = camera.to_pixels(pair[0].position);
                let to = camera.to_pixels(pair[1].position);
                surface.draw_line(
                    from.x as f32,
                    from.y as f32,
                    to.x as f32,
                    to.y as f32,
                    self.palette.resolve(pair[1].color),
                );
            }
        }
    }

    fn draw_entities(&self, sim: &Simulation, camera: &Camera, surface: &mut dyn Surface) {
        for entity in sim.entities().iter() {
            let Some(position) = entity.position else {
                continue;
            };
            let centre = camera.to_pixels(position);
            let radius = entity
                .shape_radius
                .map_or(0.0, |r| camera.length_to_pixels(r) as f32)
                .max(MIN_ENTITY_RADIUS_PX);
            surface.draw_filled_circle(
                centre.x as f32,
                centre.y as f32,
                radius,
                self.palette.resolve(entity.fill_color),
            );
        }
    }
}
