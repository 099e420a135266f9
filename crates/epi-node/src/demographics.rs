//! The demographics boundary.
//!
//! Demographics file parsing lives outside the core; the node consumes draws
//! through this trait.  `StaticDemographics` is the flat-distribution
//! implementation used by tests and demo applications.

use epi_core::{Gender, NodeRng, DAYS_PER_YEAR};

/// Distribution queries the node makes while creating individuals and
/// running vital dynamics.
///
/// Rates are per day.  Implementations are shared across every node on the
/// rank, so they must be `Send + Sync` and interior-mutability-free — all
/// randomness comes from the caller's `NodeRng`.
pub trait DemographicsProvider: Send + Sync {
    /// Identity of the node-ID universe these demographics describe.
    /// Migration files must carry the same reference or they are rejected.
    fn id_reference(&self) -> &str;

    /// Age draw for a member of the initial population.
    fn draw_initial_age_days(&self, rng: &mut NodeRng) -> f32;

    /// Probability a newly created individual is female.
    fn female_ratio(&self) -> f32;

    /// Probability a member of the initial population starts infected.
    fn initial_prevalence(&self) -> f32;

    /// Initial acquisition susceptibility (1.0 = fully susceptible).
    fn draw_initial_acquisition(&self, _age_days: f32, _rng: &mut NodeRng) -> f32 {
        1.0
    }

    /// Per-individual migration-rate multiplier.
    fn draw_migration_heterogeneity(&self, _rng: &mut NodeRng) -> f32 {
        1.0
    }

    /// Non-disease mortality rate (deaths/day) by sex, age, and calendar
    /// year.
    fn mortality_rate(&self, gender: Gender, age_days: f32, year: f32) -> f32;

    /// Conception rate (pregnancies/day) for a possible mother of this age
    /// in this calendar year.
    fn fertility_rate(&self, age_days: f32, year: f32) -> f32;
}

// ── StaticDemographics ───────────────────────────────────────────────────────

/// Flat demographic distributions: uniform ages, constant rates.
#[derive(Clone, Debug)]
pub struct StaticDemographics {
    pub id_reference:       String,
    pub max_initial_age_years: f32,
    pub female_ratio:       f32,
    pub initial_prevalence: f32,
    pub mortality_rate:     f32,
    pub fertility_rate:     f32,
}

impl Default for StaticDemographics {
    fn default() -> Self {
        Self {
            id_reference:          "static-demographics".to_string(),
            max_initial_age_years: 70.0,
            female_ratio:          0.5,
            initial_prevalence:    0.0,
            mortality_rate:        0.0,
            fertility_rate:        0.0,
        }
    }
}

impl DemographicsProvider for StaticDemographics {
    fn id_reference(&self) -> &str {
        &self.id_reference
    }

    fn draw_initial_age_days(&self, rng: &mut NodeRng) -> f32 {
        rng.gen_range(0.0..self.max_initial_age_years * DAYS_PER_YEAR)
    }

    fn female_ratio(&self) -> f32 {
        self.female_ratio
    }

    fn initial_prevalence(&self) -> f32 {
        self.initial_prevalence
    }

    fn mortality_rate(&self, _gender: Gender, _age_days: f32, _year: f32) -> f32 {
        self.mortality_rate
    }

    fn fertility_rate(&self, _age_days: f32, _year: f32) -> f32 {
        self.fertility_rate
    }
}
