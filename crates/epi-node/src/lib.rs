//! `epi-node` — the geographic unit that owns a population.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                 |
//! |------------------|----------------------------------------------------------|
//! | [`config`]       | `NodeConfig` — vital dynamics and transmission settings  |
//! | [`demographics`] | `DemographicsProvider` boundary trait, `StaticDemographics` |
//! | [`climate`]      | `Climate` boundary trait, `ConstantClimate`              |
//! | [`transmission`] | `TransmissionPools` — property-keyed contagion pools     |
//! | [`node`]         | `Node`, `IdGenerators`, `NodeEventObserver`              |
//!
//! # The update contract
//!
//! `Node::update` runs a fixed nine-step sequence every timestep (weather,
//! interventions + external events, family-trip release, counter reset,
//! start-of-timestep infectivity, per-individual updates, vital dynamics,
//! the removal sweep, susceptibility ramp).  Two rules are load-bearing:
//!
//! - **Snapshot-then-apply**: the force of infection is computed from the
//!   start-of-timestep population before any individual updates, and
//!   removals happen in a separate sweep after all updates.  Mutating the
//!   resident vector mid-iteration would poison the timestep's statistics.
//! - **Move on removal**: the sweep uses `swap_remove` (O(1), order is
//!   deliberately not preserved) and hands departing individuals back to the
//!   caller by value — exactly-once ownership transfer with no shared state.

pub mod climate;
pub mod config;
pub mod demographics;
pub mod node;
pub mod transmission;

#[cfg(test)]
mod tests;

pub use climate::{Climate, ConstantClimate};
pub use config::NodeConfig;
pub use demographics::{DemographicsProvider, StaticDemographics};
pub use node::{IdGenerators, Node, NodeEventObserver};
pub use transmission::TransmissionPools;
