//! `epi-human` — one simulated person.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                |
//! |-------------------|---------------------------------------------------------|
//! | [`config`]        | `HumanConfig`, `RoundTripConfig`, `InfectionParams`     |
//! | [`infection`]     | `Infection` — generic timer-based infection model       |
//! | [`susceptibility`]| `Susceptibility` — acquisition/transmission modifiers   |
//! | [`interventions`] | `InterventionsContainer`, `HeldIntervention`            |
//! | [`human`]         | `IndividualHuman` and its per-timestep update           |
//!
//! # Ownership
//!
//! An `IndividualHuman` is a plain value owned by exactly one `Node` at a
//! time.  Migration between nodes (or ranks) moves the value: the source
//! node removes it from its vector and the destination inserts it, with a
//! per-rank queue as the only intermediate holder.  There are no back
//! references to the owning node — every operation that needs node state
//! receives it as an argument, so re-parenting is a non-event.
//!
//! # Produce-then-apply
//!
//! `IndividualHuman::update` never mutates node-level state.  Anything the
//! node must act on (a family-trip registration, events to broadcast) is
//! returned in a [`HumanUpdateOutcome`] and applied by the node after the
//! resident iteration finishes, which keeps the per-timestep statistics
//! causally clean.

pub mod config;
pub mod human;
pub mod infection;
pub mod interventions;
pub mod susceptibility;

#[cfg(test)]
mod tests;

pub use config::{HumanConfig, InfectionParams, RoundTripConfig};
pub use human::{
    FamilyTripRequest, HumanContext, HumanUpdateOutcome, IndividualHuman, Waypoint,
};
pub use infection::{Infection, InfectionStateChange};
pub use interventions::{HeldIntervention, InterventionsContainer};
pub use susceptibility::Susceptibility;
