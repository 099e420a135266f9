//! `epi-exchange` — the collective data-exchange layer between ranks.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`transport`] | `RankTransport` trait, `LocalTransport` (single rank)     |
//! | [`memory`]    | `MemoryHub` — in-process channel mesh for N ranks         |
//! | [`exchanger`] | `exchange_items` — typed all-to-all over any transport    |
//! | [`error`]     | `ExchangeError`, `ExchangeResult<T>`                      |
//!
//! # Exchange model
//!
//! The simulation performs a small number of *collective* rounds per
//! timestep: migration resolution, node-summary sync, and the cross-node
//! event exchange.  Each round is all-to-all and blocking — every rank sends
//! one buffer to every other rank and waits to receive one from each, so the
//! round doubles as the timestep's synchronization barrier.  A rank that
//! finishes its local work early parks in the receive until every peer has
//! posted.
//!
//! `RankTransport` is the seam: the provided [`memory::MemoryHub`] wires N
//! in-process ranks together over channels (tests, single-machine runs); a
//! message-passing-interface-backed transport slots in behind the same trait
//! for real multi-host deployment without touching the simulation.
//!
//! # Failure policy
//!
//! Codec failures mid-exchange are fatal to the run.  A partially delivered
//! migration round would leave individuals neither at their source nor their
//! destination, corrupting population counts irrecoverably — so the error
//! propagates out and the harness aborts.

pub mod error;
pub mod exchanger;
pub mod memory;
pub mod transport;


pub use error::{ExchangeError, ExchangeResult};
pub use exchanger::exchange_items;
pub use memory::{MemoryHub, MemoryTransport};
pub use transport::{LocalTransport, RankTransport};
