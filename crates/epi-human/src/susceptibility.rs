//! Immunity state: how exposed, how contagious, how fragile.

use serde::{Deserialize, Serialize};

/// Per-individual immune modifiers, all in `[0, 1]` where 1.0 means
/// "no protection".
///
/// The initial acquisition modifier comes from the demographics provider's
/// initial-immunity draw at individual creation; everything after that is
/// waning and post-infection boosting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Susceptibility {
    /// Multiplier on the force of infection when acquiring.
    pub mod_acquire: f32,
    /// Multiplier on shed contagion when transmitting.
    pub mod_transmit: f32,
    /// Multiplier on disease mortality.
    pub mod_mortality: f32,
}

impl Susceptibility {
    /// `initial_acquisition` of 1.0 = fully susceptible, 0.0 = fully immune.
    pub fn new(initial_acquisition: f32) -> Self {
        Self {
            mod_acquire:   initial_acquisition.clamp(0.0, 1.0),
            mod_transmit:  1.0,
            mod_mortality: 1.0,
        }
    }

    /// Wane acquired immunity back toward full susceptibility.
    pub fn update(&mut self, dt: f32, waning_rate: f32) {
        if waning_rate > 0.0 && self.mod_acquire < 1.0 {
            self.mod_acquire = (self.mod_acquire + waning_rate * dt).min(1.0);
        }
    }

    /// Apply post-infection immunity after a cleared infection.
    pub fn update_infection_cleared(&mut self, acquisition_multiplier: f32) {
        self.mod_acquire = (self.mod_acquire * acquisition_multiplier).clamp(0.0, 1.0);
    }
}

impl Default for Susceptibility {
    fn default() -> Self {
        Self::new(1.0)
    }
}
