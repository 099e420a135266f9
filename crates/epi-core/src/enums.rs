//! Shared closed enumerations.
//!
//! All variants are plain data — no behavior beyond labels — so they live
//! here rather than with the subsystems that interpret them.  Every enum
//! derives serde because individuals (and therefore their state) cross rank
//! boundaries.

use serde::{Deserialize, Serialize};

// ── Gender ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male   => "male",
            Gender::Female => "female",
        }
    }
}

// ── MigrationType ────────────────────────────────────────────────────────────

/// The kind of trip an individual is on (or `None` when settled).
///
/// `Intervention` marks trips forced by an intervention rather than drawn
/// from the node's migration rates; it never appears in a rate file.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum MigrationType {
    #[default]
    None,
    Local,
    Air,
    Regional,
    Sea,
    Family,
    Intervention,
}

impl MigrationType {
    /// The four types backed by rate files, in file-layout order.
    pub const FILE_BACKED: [MigrationType; 4] = [
        MigrationType::Local,
        MigrationType::Air,
        MigrationType::Regional,
        MigrationType::Sea,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MigrationType::None         => "none",
            MigrationType::Local        => "local",
            MigrationType::Air          => "air",
            MigrationType::Regional     => "regional",
            MigrationType::Sea          => "sea",
            MigrationType::Family       => "family",
            MigrationType::Intervention => "intervention",
        }
    }
}

impl std::fmt::Display for MigrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── MigrationStructure ───────────────────────────────────────────────────────

/// Run-wide migration model selector.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum MigrationStructure {
    /// Individuals never migrate on their own.
    #[default]
    NoMigration,
    /// Individuals draw trips from their node's fixed-rate migration CDF.
    FixedRate,
}

// ── HumanStateChange ─────────────────────────────────────────────────────────

/// The pending state transition for an individual this timestep.
///
/// Set during `IndividualHuman::update`, consumed by the owning node's
/// removal sweep at the end of `Node::update`.  Death kinds do not destroy
/// the individual immediately — the die-at-home rule may route them home
/// first.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum HumanStateChange {
    #[default]
    None,
    Migrating,
    DiedFromNaturalCauses,
    KilledByInfection,
    KilledByMcSampling,
}

impl HumanStateChange {
    /// `true` for any of the death kinds.
    #[inline]
    pub fn is_death(self) -> bool {
        matches!(
            self,
            HumanStateChange::DiedFromNaturalCauses
                | HumanStateChange::KilledByInfection
                | HumanStateChange::KilledByMcSampling
        )
    }
}

// ── VitalBirthDependence ─────────────────────────────────────────────────────

/// Which birth-rate model drives vital dynamics.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum VitalBirthDependence {
    /// Constant expected births per day per node.
    #[default]
    FixedBirthRate,
    /// Expected births scale with current node population.
    PopulationDepRate,
    /// Expected births scale with the count of possible mothers.
    DemographicDepRate,
    /// Explicit per-individual pregnancy tracking with a 40-week countdown.
    IndividualPregnancies,
}
