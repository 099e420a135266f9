//! `epi-migration` — who can go where, how often, and for how long.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`info`]    | `MigrationInfo` (per-node CDF sampler), `MigrationStep`       |
//! | [`file`]    | `MigrationInfoFile` — binary rate table + JSON metadata       |
//! | [`factory`] | `MigrationInfoFactory` — assembles one `MigrationInfo` per node |
//! | [`error`]   | `MigrationError`, `MigrationResult<T>`                        |
//!
//! # Sampling model
//!
//! Each node owns one `MigrationInfo`: parallel arrays of reachable
//! destination, trip type, and cumulative probability, plus the total
//! outbound rate (trips/person/day).  An individual wanting to migrate draws
//! a wait time from `Exp(modifier × total_rate)` and a destination by
//! walking the CDF with a uniform draw.  The CDF's final entry is force-set
//! to exactly 1.0 after normalization so the walk can never run off the end
//! under floating-point rounding.
//!
//! A node with no reachable destinations (or zero total rate) is a valid
//! configuration — "migrationally isolated" — logged as a warning at build
//! time, and its residents simply never draw a trip.

pub mod error;
pub mod factory;
pub mod file;
pub mod info;


pub use error::{MigrationError, MigrationResult};
pub use factory::MigrationInfoFactory;
pub use file::MigrationInfoFile;
pub use info::{MigrationInfo, MigrationStep};
