//! Cross-node event broadcast: staging, qualification, and the wire shape.

use rustc_hash::FxHashMap;

use epi_core::{EventTrigger, GeoPoint, Suid};

use crate::node_info::NodeInfo;

// ── EventsForOtherNodes ──────────────────────────────────────────────────────

/// Events staged for nodes owned by one destination rank, keyed by the
/// destination node.
///
/// A node may receive the same trigger more than once per timestep;
/// deduplication, if wanted, belongs to whatever consumes the event.
#[derive(Clone, Debug, Default)]
pub struct EventsForOtherNodes {
    map: FxHashMap<Suid, Vec<EventTrigger>>,
}

impl EventsForOtherNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Suid, trigger: EventTrigger) {
        self.map.entry(node).or_default().push(trigger);
    }

    /// Merge another staging set into this one.
    pub fn update(&mut self, other: EventsForOtherNodes) {
        for (node, triggers) in other.map {
            self.map.entry(node).or_default().extend(triggers);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Flatten into `(node, trigger)` pairs for the wire.
    pub fn into_entries(self) -> Vec<(Suid, EventTrigger)> {
        self.map
            .into_iter()
            .flat_map(|(node, triggers)| triggers.into_iter().map(move |t| (node, t)))
            .collect()
    }
}

// ── NodeQualifier ────────────────────────────────────────────────────────────

/// Decides which known nodes a broadcast event should reach.
pub trait NodeQualifier {
    fn qualifies(&self, info: &NodeInfo) -> bool;
}

/// Qualify every node within `max_km` of the broadcast origin.
pub struct DistanceQualifier {
    pub origin: GeoPoint,
    pub max_km: f32,
}

impl NodeQualifier for DistanceQualifier {
    fn qualifies(&self, info: &NodeInfo) -> bool {
        self.origin.distance_km(info.position) <= self.max_km
    }
}

/// Qualify the nodes reachable from the broadcasting node's migration
/// network.
pub struct MigrationReachableQualifier {
    pub reachable: Vec<Suid>,
}

impl NodeQualifier for MigrationReachableQualifier {
    fn qualifies(&self, info: &NodeInfo) -> bool {
        self.reachable.contains(&info.suid)
    }
}
