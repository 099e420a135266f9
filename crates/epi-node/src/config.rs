//! Immutable per-run node configuration.

use epi_core::VitalBirthDependence;
use serde::{Deserialize, Serialize};

/// Per-run configuration shared by every `Node` on the rank.
///
/// Built once at startup and shared via `Arc`; never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Master switch for births.
    pub enable_births: bool,

    /// Which birth-rate model drives vital dynamics.
    pub birth_dependence: VitalBirthDependence,

    /// Base birth rate.  Meaning depends on `birth_dependence`:
    /// births/node/day (fixed), births/person/day (population-dependent), or
    /// births/possible-mother/day (demographic-dependent / pregnancies).
    pub birth_rate: f32,

    /// Global birth-rate scale knob.
    pub x_birth: f32,

    /// Whether initial populations seed infections at the demographics
    /// provider's initial prevalence.
    pub enable_initial_prevalence: bool,

    /// Property key that partitions residents into separate transmission
    /// pools (`None` = one well-mixed pool per node).
    pub transmission_property_key: Option<String>,

    /// Base Monte-Carlo sampling rate; each simulated individual stands in
    /// for `1 / sample_rate` real people.
    pub sample_rate: f32,

    /// Log-linear ramp of node-wide susceptibility scaling over time.
    pub enable_susceptibility_scaling: bool,

    /// Daily increment of the susceptibility scale factor (clamped at 1.0).
    pub susceptibility_scaling_rate: f32,
}

impl NodeConfig {
    /// Monte-Carlo weight assigned to newly created individuals.
    #[inline]
    pub fn mc_weight(&self) -> f32 {
        1.0 / self.sample_rate
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            enable_births:                 false,
            birth_dependence:              VitalBirthDependence::FixedBirthRate,
            birth_rate:                    0.0,
            x_birth:                       1.0,
            enable_initial_prevalence:     false,
            transmission_property_key:     None,
            sample_rate:                   1.0,
            enable_susceptibility_scaling: false,
            susceptibility_scaling_rate:   0.0,
        }
    }
}
