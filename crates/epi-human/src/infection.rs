//! The generic infection: a draw-once duration timer with constant shedding.

use epi_core::{NodeRng, Suid};
use serde::{Deserialize, Serialize};

use crate::InfectionParams;

/// Pending state transition for one infection, consumed by the owning
/// individual's update.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum InfectionStateChange {
    #[default]
    None,
    Cleared,
    Fatal,
}

/// One active infection carried by an individual.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Infection {
    suid:           Suid,
    remaining_days: f32,
    infectiousness: f32,
    state_change:   InfectionStateChange,
}

impl Infection {
    /// Create a new infection, drawing its duration from an exponential with
    /// the configured mean.
    pub fn new(suid: Suid, rng: &mut NodeRng, params: &InfectionParams) -> Self {
        let remaining_days = if params.mean_duration_days > 0.0 {
            rng.exponential(1.0 / params.mean_duration_days)
        } else {
            0.0
        };
        Self {
            suid,
            remaining_days,
            infectiousness: params.infectiousness,
            state_change: InfectionStateChange::None,
        }
    }

    pub fn suid(&self) -> Suid {
        self.suid
    }

    /// Contagion shed per day, before individual-level modifiers.
    pub fn infectiousness(&self) -> f32 {
        self.infectiousness
    }

    pub fn state_change(&self) -> InfectionStateChange {
        self.state_change
    }

    /// Advance the timer.  When it runs out the infection resolves: fatal
    /// with probability `case_fatality × mortality_modifier`, cleared
    /// otherwise.
    pub fn update(
        &mut self,
        dt: f32,
        rng: &mut NodeRng,
        params: &InfectionParams,
        mortality_modifier: f32,
    ) {
        if self.state_change != InfectionStateChange::None {
            return;
        }
        self.remaining_days -= dt;
        if self.remaining_days <= 0.0 {
            self.state_change = if rng.smart_draw(params.case_fatality * mortality_modifier) {
                InfectionStateChange::Fatal
            } else {
                InfectionStateChange::Cleared
            };
        }
    }
}
