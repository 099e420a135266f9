//! Simulation time model.
//!
//! # Design
//!
//! The canonical time unit is the *day*, stored as `f32`, advanced by a fixed
//! `dt` once per timestep.  An integer timestep counter rides alongside for
//! exact loop bounds and output intervals; all demographic arithmetic (ages,
//! pregnancy timers, migration waits) is in float days, matching the rate
//! parameters the demographic and migration inputs are expressed in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Days per simulated year, used for age and calendar-year conversion.
pub const DAYS_PER_YEAR: f32 = 365.0;

// ── SimClock ─────────────────────────────────────────────────────────────────

/// Tracks the current simulation time in days plus the timestep counter.
///
/// Cheap to copy; holds no heap data.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimClock {
    /// Elapsed simulated time in days since the start of the run.
    pub time: f32,
    /// Number of completed timesteps.
    pub timestep: u32,
    /// Days per timestep.
    pub dt: f32,
    /// Calendar year at time zero (e.g. 1960.0), for year-keyed demographic
    /// distributions.
    pub base_year: f32,
}

impl SimClock {
    pub fn new(dt: f32, base_year: f32) -> Self {
        Self { time: 0.0, timestep: 0, dt, base_year }
    }

    /// Advance by one timestep.
    #[inline]
    pub fn advance(&mut self) {
        self.time += self.dt;
        self.timestep += 1;
    }

    /// Current calendar year as a float (e.g. 1972.4).
    #[inline]
    pub fn year(&self) -> f32 {
        self.base_year + self.time / DAYS_PER_YEAR
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.1}d (step {})", self.time, self.timestep)
    }
}

// ── SimParams ────────────────────────────────────────────────────────────────

/// Top-level simulation parameters.
///
/// Built once at startup (typically deserialized from a JSON parameter file
/// by the application crate) and shared immutably; nothing in the core
/// mutates it after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimParams {
    /// Total timesteps to simulate.
    pub total_timesteps: u32,

    /// Days per timestep.  1.0 for the standard daily step.
    pub dt_days: f32,

    /// Master RNG seed.  The same seed and rank count always reproduce the
    /// same run.
    pub seed: u64,

    /// Calendar year at time zero.
    pub base_year: f32,
}

impl SimParams {
    /// Simulated days covered by the whole run.
    #[inline]
    pub fn duration_days(&self) -> f32 {
        self.total_timesteps as f32 * self.dt_days
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.dt_days, self.base_year)
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            total_timesteps: 365,
            dt_days:         1.0,
            seed:            0,
            base_year:       2015.0,
        }
    }
}
