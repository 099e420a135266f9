//! The climate boundary.
//!
//! Weather modeling lives outside the core; the node drives one
//! `update_weather` call per timestep and disease models read the resulting
//! fields.  `ConstantClimate` is the fixed-weather implementation used when
//! no climate inputs are configured.

use epi_core::NodeRng;

/// Per-node weather state, advanced once per timestep.
pub trait Climate: Send {
    /// Advance the weather to `time` (days).
    fn update_weather(&mut self, time: f32, dt: f32, rng: &mut NodeRng);

    /// Air temperature in °C.
    fn air_temperature(&self) -> f32;

    /// Rainfall in mm/day.
    fn rainfall(&self) -> f32;

    /// Relative humidity in `[0, 1]`.
    fn humidity(&self) -> f32;
}

/// Weather that never changes.
#[derive(Clone, Debug)]
pub struct ConstantClimate {
    pub air_temperature: f32,
    pub rainfall:        f32,
    pub humidity:        f32,
}

impl Default for ConstantClimate {
    fn default() -> Self {
        Self { air_temperature: 22.0, rainfall: 0.0, humidity: 0.75 }
    }
}

impl Climate for ConstantClimate {
    fn update_weather(&mut self, _time: f32, _dt: f32, _rng: &mut NodeRng) {}

    fn air_temperature(&self) -> f32 {
        self.air_temperature
    }

    fn rainfall(&self) -> f32 {
        self.rainfall
    }

    fn humidity(&self) -> f32 {
        self.humidity
    }
}
