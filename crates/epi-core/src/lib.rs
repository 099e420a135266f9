//! `epi-core` — foundational types for the `rust_epi` epidemiological
//! simulation framework.
//!
//! This crate is a dependency of every other `epi-*` crate.  It intentionally
//! has no `epi-*` dependencies and a small external footprint (`rand`,
//! `rand_distr`, `rustc-hash`, `serde`, `thiserror`).
//!
//! # What lives here
//!
//! | Module          | Contents                                               |
//! |-----------------|--------------------------------------------------------|
//! | [`suids`]       | `Suid`, `SuidGenerator` (rank-striped allocation)      |
//! | [`time`]        | `SimClock`, `SimParams`, `DAYS_PER_YEAR`               |
//! | [`rng`]         | `NodeRng` (per-node), `SimRng` (global)                |
//! | [`geo`]         | `GeoPoint`, haversine distance                         |
//! | [`enums`]       | `Gender`, `MigrationType`, `HumanStateChange`, …       |
//! | [`event`]       | `EventTrigger` and built-in trigger constants          |
//! | [`properties`]  | `PropertyBag` (categorical socio-demographic tags)     |
//! | [`error`]       | `EpiError`, `EpiResult`                                |
//!
//! All public types derive `serde::Serialize`/`Deserialize` unconditionally:
//! the cross-rank exchange protocol serializes individuals, node summaries,
//! and event lists every timestep, so serialization is not optional here.

pub mod enums;
pub mod error;
pub mod event;
pub mod geo;
pub mod properties;
pub mod rng;
pub mod suids;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use enums::{
    Gender, HumanStateChange, MigrationStructure, MigrationType, VitalBirthDependence,
};
pub use error::{EpiError, EpiResult};
pub use event::EventTrigger;
pub use geo::GeoPoint;
pub use properties::PropertyBag;
pub use rng::{NodeRng, SimRng};
pub use suids::{Suid, SuidGenerator};
pub use time::{SimClock, SimParams, DAYS_PER_YEAR};
