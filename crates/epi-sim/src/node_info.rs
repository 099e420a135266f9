//! The per-node record every rank knows about every node.

use epi_core::{GeoPoint, Suid};
use serde::{Deserialize, Serialize};

/// Summary of one node, owned by exactly one rank.
///
/// The full record is broadcast once during the initial rank-map merge; the
/// population field is refreshed by the per-timestep summary sync so that
/// routing and event-qualification decisions can use current sizes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub suid:        Suid,
    pub external_id: u32,
    pub rank:        usize,
    pub position:    GeoPoint,
    /// Weighted resident population as of the last summary sync.
    pub population: f32,
}

/// The per-timestep summary refresh sent for each locally-owned node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub suid:       Suid,
    pub population: f32,
}
