//! World-to-pixel camera
//!
//! The vertical scale is soft-clamped with a logistic curve: it shrinks
//! smoothly as the highest entity climbs instead of snapping to a new zoom.
//!
//! ```text
//! H      = surface_height * 0.9
//! y_pix  = 2H / (1 + exp(500 h / H))
//! scale  = (H - y_pix) / h          = H * tanh(250 h / H) / h
//! ```
//!
//! The tanh form is the same curve without the cancellation in `H - y_pix`
//! for small `h`; its limit at `h -> 0` is `500 / 2` px per metre.

use glam::DVec2;

use super::store::EntityStore;
use crate::consts::{SCALE_STEEPNESS, VIEW_HEIGHT_FRACTION};

/// Projection parameters for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Pixels per metre
    pub scale: f64,
    pub min_view_x: f64,
    pub max_view_x: f64,
    pub min_view_y: f64,
    pub max_view_y: f64,
    pub surface_width: f64,
    pub surface_height: f64,
}

/// Vertical pixels-per-metre for a world of the given height
pub fn height_scale(world_height: f64, surface_height: f64) -> f64 {
    let usable = surface_height * VIEW_HEIGHT_FRACTION;
    let limit = SCALE_STEEPNESS / 2.0;
    if world_height.abs() <= f64::EPSILON {
        return limit;
    }
    let scale = usable * (limit * world_height / usable).tanh() / world_height;
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        limit
    }
}

/// Horizontal pixels-per-metre to fit `world_width` between the side margins
///
/// A zero-width world does not constrain the scale.
pub fn width_scale(world_width: f64, surface_width: f64, side_margin_px: f64) -> f64 {
    if world_width <= f64::EPSILON {
        return f64::INFINITY;
    }
    let usable = (surface_width - 2.0 * side_margin_px).max(1.0);
    usable / world_width
}

impl Camera {
    /// Frame every positioned entity on a `width` x `height` pixel surface
    ///
    /// Returns `None` when no entity has a position or the surface is empty.
    pub fn fit(store: &EntityStore, width: f64, height: f64, side_margin_px: f64) -> Option<Self> {
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        let min_x = store.min_entity_x()?;
        let max_x = store.max_entity_x()?;
        let max_y = store.max_entity_y()?;
        let min_view_y = 0.0;

        let scale = height_scale(max_y - min_view_y, height)
            .min(width_scale(max_x - min_x, width, side_margin_px));

        Some(Self {
            scale,
            min_view_x: min_x - side_margin_px / scale,
            max_view_x: max_x + side_margin_px / scale,
            min_view_y,
            max_view_y: max_y + height * (1.0 - VIEW_HEIGHT_FRACTION) / scale,
            surface_width: width,
            surface_height: height,
        })
    }

    /// World metres to surface pixels (origin top-left, y down)
    pub fn to_pixels(&self, world: DVec2) -> DVec2 {
        DVec2::new(
            (world.x - self.min_view_x) * self.scale,
            self.surface_height - (world.y - self.min_view_y) * self.scale,
        )
    }

    /// World length to pixel length
    #[inline]
    pub fn length_to_pixels(&self, metres: f64) -> f64 {
        metres * self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Components;
    use proptest::prelude::*;

    #[test]
    fn test_height_scale_limit_at_ground() {
        assert_eq!(height_scale(0.0, 1000.0), 250.0);
        let near = height_scale(1e-6, 1000.0);
        assert!((near - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_height_scale_matches_logistic_form() {
        let h: f64 = 3.0;
        let surface: f64 = 800.0;
        let usable = surface * 0.9;
        let y_pix = 2.0 * usable / (1.0 + (500.0 * h / usable).exp());
        let expected = (usable - y_pix) / h;
        assert!((height_scale(h, surface) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_height_scale_shrinks_with_height() {
        let low = height_scale(1.0, 800.0);
        let high = height_scale(100.0, 800.0);
        let huge = height_scale(1e9, 800.0);
        assert!(low > high);
        assert!(high > huge);
        assert!(huge > 0.0 && huge < 1e-5);
    }

    #[test]
    fn test_single_entity_is_height_limited() {
        let mut store = EntityStore::new();
        store.add_entity(Components::new().with_position(3.0, 2.0));
        let camera = Camera::fit(&store, 1200.0, 800.0, 100.0).unwrap();

        assert_eq!(camera.scale, height_scale(2.0, 800.0));
        assert!((camera.min_view_x - (3.0 - 100.0 / camera.scale)).abs() < 1e-12);
        assert!((camera.max_view_x - (3.0 + 100.0 / camera.scale)).abs() < 1e-12);
        assert_eq!(camera.min_view_y, 0.0);
        assert!((camera.max_view_y - (2.0 + 80.0 / camera.scale)).abs() < 1e-9);
    }

    #[test]
    fn test_wide_scene_is_width_limited() {
        let mut store = EntityStore::new();
        store.add_entity(Components::new().with_position(0.0, 1.0));
        store.add_entity(Components::new().with_position(100.0, 1.0));
        let camera = Camera::fit(&store, 1200.0, 800.0, 100.0).unwrap();

        assert!((camera.scale - 10.0).abs() < 1e-12);
        let left = camera.to_pixels(DVec2::new(0.0, 0.0));
        let right = camera.to_pixels(DVec2::new(100.0, 0.0));
        assert!((left.x - 100.0).abs() < 1e-9);
        assert!((right.x - 1100.0).abs() < 1e-9);
        assert!((left.y - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_positions_means_no_camera() {
        let mut store = EntityStore::new();
        assert!(Camera::fit(&store, 800.0, 600.0, 100.0).is_none());
        store.add_entity(Components::new().with_mass(1.0));
        assert!(Camera::fit(&store, 800.0, 600.0, 100.0).is_none());
        store.add_entity(Components::new().with_position(0.0, 1.0));
        assert!(Camera::fit(&store, 0.0, 600.0, 100.0).is_none());
    }

    #[test]
    fn test_narrow_surface_keeps_positive_scale() {
        let mut store = EntityStore::new();
        store.add_entity(Components::new().with_position(0.0, 1.0));
        store.add_entity(Components::new().with_position(10.0, 1.0));
        let camera = Camera::fit(&store, 150.0, 600.0, 100.0).unwrap();
        assert!(camera.scale > 0.0);
    }

    proptest! {
        #[test]
        fn prop_height_scale_positive_and_finite(
            height in 0.0..1e12f64,
            surface in 1.0..10_000.0f64,
        ) {
            let scale = height_scale(height, surface);
            prop_assert!(scale.is_finite());
            prop_assert!(scale > 0.0);
        }
    }
}
