//! Bounce Lab - a 2D bouncing-ball physics toy
//!
//! Core modules:
//! - `sim`: Entity store, physics passes, camera and frame scheduling
//! - `renderer`: Drawing surface abstraction, render pass and WebGPU pipeline
//! - `frame`: Per-frame driver tying the simulation to a surface
//! - `settings`: Data-driven simulation configuration
//! - `error`: Error type for commands and configuration

pub mod error;
pub mod frame;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use frame::{FrameDriver, FrameMetrics};
pub use settings::SimConfig;

/// Physics and camera constants
pub mod consts {
    /// Standard gravity (m/s², pointing down)
    pub const GRAVITY: [f64; 2] = [0.0, -9.8];
    /// Boost multiplies gravity by `BOOST_GAIN * held_seconds + 1`
    pub const BOOST_GAIN: f64 = 10.0;
    /// Air density at 20°C (kg/m³)
    pub const AIR_DENSITY: f64 = 1.2041;

    /// Largest step a single frame may advance (s)
    pub const MAX_DT: f64 = 1.0 / 30.0;
    /// Step used for the very first frame, before a previous timestamp exists
    pub const INITIAL_DT: f64 = 0.001;

    /// Restitution loss term of the conserved-speed logistic
    pub const RESTITUTION_OFFSET: f64 = 0.2;
    /// Speed subtracted from every inelastic rebound (m/s)
    pub const MOMENTUM_COST: f64 = 0.1;
    /// Rebound speed used when the energy budget is exhausted (m/s)
    pub const MIN_REBOUND_SPEED: f64 = 0.001;

    /// Horizontal camera margin (px)
    pub const SIDE_MARGIN_PX: f64 = 100.0;
    /// Fraction of the surface height available to the world above ground
    pub const VIEW_HEIGHT_FRACTION: f64 = 0.9;
    /// Steepness of the logistic height compression
    pub const SCALE_STEEPNESS: f64 = 500.0;

    /// Trail points kept per simulation
    pub const MAX_TRAIL_POINTS: usize = 10_000;
    /// Upper bound on gridlines drawn per axis
    pub const MAX_GRIDLINES: usize = 400;
}
