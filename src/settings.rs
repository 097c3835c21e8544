//! Simulation configuration
//!
//! Persisted as JSON in LocalStorage on the web; native builds use defaults
//! unless a JSON document is supplied.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::SimError;
use crate::consts::*;
use crate::sim::integrator::{PhysicsMode, PhysicsParams};

/// Tunable simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Which physics passes run
    pub mode: PhysicsMode,

    // === Forces ===
    /// Base gravity (m/s²)
    pub gravity: [f64; 2],
    /// Boost factor is `boost_gain * held_seconds + 1`
    pub boost_gain: f64,
    /// kg/m³
    pub air_density: f64,

    // === Time stepping ===
    /// Largest step one frame may take (s)
    pub max_dt: f64,
    /// Step of the first frame (s)
    pub initial_dt: f64,

    // === Bounce tuning ===
    pub restitution_offset: f64,
    /// m/s removed from every inelastic rebound
    pub momentum_cost: f64,
    /// Rebound speed when the energy budget is spent (m/s)
    pub min_rebound_speed: f64,

    // === View ===
    /// Horizontal camera margin (px)
    pub side_margin_px: f64,
    pub max_trail_points: usize,

    /// Whether the simulation starts running or paused
    pub start_running: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            mode: PhysicsMode::InelasticBounce,

            gravity: GRAVITY,
            boost_gain: BOOST_GAIN,
            air_density: AIR_DENSITY,

            max_dt: MAX_DT,
            initial_dt: INITIAL_DT,

            restitution_offset: RESTITUTION_OFFSET,
            momentum_cost: MOMENTUM_COST,
            min_rebound_speed: MIN_REBOUND_SPEED,

            side_margin_px: SIDE_MARGIN_PX,
            max_trail_points: MAX_TRAIL_POINTS,

            start_running: true,
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reject values the physics passes cannot work with
    pub fn validate(&self) -> Result<(), SimError> {
        let finite = [
            ("gravity.x", self.gravity[0]),
            ("gravity.y", self.gravity[1]),
            ("boost_gain", self.boost_gain),
            ("air_density", self.air_density),
            ("max_dt", self.max_dt),
            ("initial_dt", self.initial_dt),
            ("restitution_offset", self.restitution_offset),
            ("momentum_cost", self.momentum_cost),
            ("min_rebound_speed", self.min_rebound_speed),
            ("side_margin_px", self.side_margin_px),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(SimError::InvalidConfig {
                    field,
                    value,
                    reason: "must be finite",
                });
            }
        }

        let positive = [("max_dt", self.max_dt), ("initial_dt", self.initial_dt)];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(SimError::InvalidConfig {
                    field,
                    value,
                    reason: "must be positive",
                });
            }
        }

        let non_negative = [
            ("air_density", self.air_density),
            ("momentum_cost", self.momentum_cost),
            ("min_rebound_speed", self.min_rebound_speed),
            ("side_margin_px", self.side_margin_px),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(SimError::InvalidConfig {
                    field,
                    value,
                    reason: "must not be negative",
                });
            }
        }

        Ok(())
    }

    /// Constants for the physics passes
    pub fn physics_params(&self) -> PhysicsParams {
        PhysicsParams {
            gravity: DVec2::from_array(self.gravity),
            boost_gain: self.boost_gain,
            air_density: self.air_density,
            restitution_offset: self.restitution_offset,
            momentum_cost: self.momentum_cost,
            min_rebound_speed: self.min_rebound_speed,
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "bounce_lab_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded settings from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No settings storage on native ({})", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode, PhysicsMode::InelasticBounce);
        assert!((config.max_dt - 1.0 / 30.0).abs() < 1e-15);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = SimConfig::from_json(r#"{"mode":"elastic-bounce","momentum_cost":0.05}"#).unwrap();
        assert_eq!(config.mode, PhysicsMode::ElasticBounce);
        assert_eq!(config.momentum_cost, 0.05);
        assert_eq!(config.air_density, AIR_DENSITY);
    }

    #[test]
    fn test_unknown_mode_is_a_parse_error() {
        let result = SimConfig::from_json(r#"{"mode":"anti-gravity"}"#);
        assert!(matches!(result, Err(SimError::Parse(_))));
    }

    #[test]
    fn test_non_positive_max_dt_rejected() {
        let result = SimConfig::from_json(r#"{"max_dt":0.0}"#);
        assert!(matches!(
            result,
            Err(SimError::InvalidConfig { field: "max_dt", .. })
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_mode() {
        let config = SimConfig {
            mode: PhysicsMode::Drag,
            start_running: false,
            ..Default::default()
        };
        let parsed = SimConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_physics_params_follow_config() {
        let config = SimConfig {
            gravity: [0.0, -1.62],
            ..Default::default()
        };
        let params = config.physics_params();
        assert_eq!(params.gravity, DVec2::new(0.0, -1.62));
        assert_eq!(params.air_density, AIR_DENSITY);
    }
}
