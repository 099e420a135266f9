//! `epi-sim` — the distributed timestep loop.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`node_info`] | `NodeInfo` — the routing/qualification record per node        |
//! | [`rank_map`]  | `NodeRankMap` — the merged node→rank directory                |
//! | [`events`]    | Cross-node event staging, `NodeQualifier` implementations     |
//! | [`sim`]       | `Simulation` — the per-timestep loop and migration resolution |
//! | [`builder`]   | `SimulationBuilder`, `NodeSeed`                               |
//! | [`error`]     | `SimError`, `SimResult<T>`                                    |
//!
//! # One timestep
//!
//! ```text
//! for each owned node (ascending suid):
//!   ① inject events staged for it by other nodes last step
//!   ② node.update(dt)            — returns this node's emigrants
//!   ③ route emigrants            — queues[rank_of(destination)]
//! ④ resolve migration            — deliver self queue (reverse order,
//!                                  no codec), exchange the rest, deliver
//! ⑤ refresh + sync node summaries (population per node, all ranks)
//! ⑥ exchange staged node events  — re-keyed by destination node suid
//! ⑦ advance clock, end-of-step reports, barrier
//! ```
//!
//! Steps ④–⑥ are collective exchanges: every rank participates or nobody
//! proceeds.  Within one timestep every individual removed from a source
//! node is delivered to exactly one destination node — ownership moves by
//! value through the per-rank queues, and the queues are always drained
//! before the step ends.

pub mod builder;
pub mod error;
pub mod events;
pub mod node_info;
pub mod rank_map;
pub mod sim;


pub use builder::{NodeSeed, SimulationBuilder};
pub use error::{SimError, SimResult};
pub use events::{DistanceQualifier, EventsForOtherNodes, MigrationReachableQualifier, NodeQualifier};
pub use node_info::NodeInfo;
pub use rank_map::NodeRankMap;
pub use sim::Simulation;
