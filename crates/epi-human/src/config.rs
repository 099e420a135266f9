//! Immutable per-run configuration for individuals.
//!
//! Built once at startup and shared (via `Arc`) by every node on the rank;
//! nothing mutates it after construction.

use epi_core::{MigrationStructure, MigrationType};
use serde::{Deserialize, Serialize};

// ── RoundTripConfig ──────────────────────────────────────────────────────────

/// Round-trip behavior for one migration type.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RoundTripConfig {
    /// Probability that a trip of this type is a round trip.
    pub probability: f32,

    /// Rate parameter (1/mean days) for the exponential draw of the stay at
    /// the destination.  Zero means "return immediately".
    pub duration_rate: f32,
}

impl RoundTripConfig {
    /// Stay-at-destination mean of `mean_days`; zero mean = instantaneous.
    pub fn with_mean_days(probability: f32, mean_days: f32) -> Self {
        let duration_rate = if mean_days > 0.0 { 1.0 / mean_days } else { 0.0 };
        Self { probability, duration_rate }
    }
}

impl Default for RoundTripConfig {
    fn default() -> Self {
        Self { probability: 0.0, duration_rate: 0.0 }
    }
}

// ── InfectionParams ──────────────────────────────────────────────────────────

/// Parameters of the generic infection model.
///
/// Disease-specific biology stays outside the core: this is the minimal
/// timer-plus-shedding model every disease build specializes.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct InfectionParams {
    /// Mean infectious duration in days (exponential draw per infection).
    pub mean_duration_days: f32,

    /// Contagion shed per day while infectious, before modifiers.
    pub infectiousness: f32,

    /// Probability the infection is fatal when it runs its course.
    pub case_fatality: f32,
}

impl Default for InfectionParams {
    fn default() -> Self {
        Self {
            mean_duration_days: 8.0,
            infectiousness:     1.0,
            case_fatality:      0.0,
        }
    }
}

// ── HumanConfig ──────────────────────────────────────────────────────────────

/// Per-run configuration shared by every `IndividualHuman`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HumanConfig {
    /// Run-wide migration model.
    pub migration_structure: MigrationStructure,

    /// Round-trip behavior per migration type.
    pub local_roundtrip:    RoundTripConfig,
    pub air_roundtrip:      RoundTripConfig,
    pub regional_roundtrip: RoundTripConfig,
    pub sea_roundtrip:      RoundTripConfig,
    /// Family trips always return; only the duration field applies.
    pub family_roundtrip: RoundTripConfig,

    /// Maximum depth of an individual's waypoint stack — how far a
    /// multi-stop wanderer can get from home before being turned around.
    pub max_waypoints: usize,

    /// Whether individuals age.
    pub enable_aging: bool,

    /// Whether non-disease mortality applies.
    pub enable_natural_mortality: bool,

    /// Whether an infected individual can acquire further infections.
    pub enable_superinfection: bool,

    /// Cap on simultaneous infections when superinfection is enabled.
    pub max_infections: usize,

    /// Generic infection model parameters.
    pub infection: InfectionParams,

    /// Daily rate at which immunity wanes back toward full susceptibility.
    pub immunity_waning_rate: f32,

    /// Multiplier applied to acquisition susceptibility after an infection
    /// clears (post-infection immunity).
    pub post_infection_acquisition_multiplier: f32,
}

impl HumanConfig {
    /// Round-trip configuration for a rate-drawn trip type.
    ///
    /// # Panics
    ///
    /// Panics on `None`/`Intervention` — neither is ever drawn from a
    /// migration CDF, so reaching here is a programming error.
    pub fn roundtrip(&self, trip_type: MigrationType) -> &RoundTripConfig {
        match trip_type {
            MigrationType::Local    => &self.local_roundtrip,
            MigrationType::Air      => &self.air_roundtrip,
            MigrationType::Regional => &self.regional_roundtrip,
            MigrationType::Sea      => &self.sea_roundtrip,
            MigrationType::Family   => &self.family_roundtrip,
            MigrationType::None | MigrationType::Intervention => {
                panic!("no round-trip configuration for {trip_type} migration")
            }
        }
    }
}

impl Default for HumanConfig {
    fn default() -> Self {
        Self {
            migration_structure:      MigrationStructure::FixedRate,
            local_roundtrip:          RoundTripConfig::with_mean_days(0.95, 7.0),
            air_roundtrip:            RoundTripConfig::with_mean_days(0.8, 14.0),
            regional_roundtrip:       RoundTripConfig::with_mean_days(0.1, 30.0),
            sea_roundtrip:            RoundTripConfig::with_mean_days(0.25, 30.0),
            family_roundtrip:         RoundTripConfig::with_mean_days(1.0, 30.0),
            max_waypoints:            10,
            enable_aging:             true,
            enable_natural_mortality: false,
            enable_superinfection:    false,
            max_infections:           1,
            infection:                InfectionParams::default(),
            immunity_waning_rate:     0.0,
            post_infection_acquisition_multiplier: 1.0,
        }
    }
}
