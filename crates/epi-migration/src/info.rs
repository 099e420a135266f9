//! The per-node migration sampler.

use epi_core::{MigrationType, NodeRng, Suid};
use serde::{Deserialize, Serialize};

// ── MigrationStep ────────────────────────────────────────────────────────────

/// One sampled trip: where to go, what kind of trip, and how long until
/// departure (days).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MigrationStep {
    pub destination: Suid,
    pub trip_type:   MigrationType,
    /// Days until the individual actually leaves.
    pub time: f32,
}

// ── MigrationInfo ────────────────────────────────────────────────────────────

/// A node's outbound migration options: reachable destinations, the trip
/// type for each, and the normalized cumulative distribution used to pick
/// one.
///
/// Invariant: `rate_cdf` is non-decreasing and its final entry is exactly
/// 1.0 whenever it is non-empty.  The last entry is force-set after
/// normalization; without the clamp, a uniform draw close to 1.0 could walk
/// past the end of the array when the raw rates don't sum cleanly in f32.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MigrationInfo {
    reachable:  Vec<Suid>,
    trip_types: Vec<MigrationType>,
    rate_cdf:   Vec<f32>,
    total_rate: f32,
}

impl MigrationInfo {
    /// Build from raw `(destination, trip type, rate)` triples.
    ///
    /// Rates are trips/person/day.  Non-positive-rate entries are kept (they
    /// get zero probability mass) so the reachable-node list reflects the
    /// file contents.
    pub fn new(rate_data: Vec<(Suid, MigrationType, f32)>) -> Self {
        let mut reachable  = Vec::with_capacity(rate_data.len());
        let mut trip_types = Vec::with_capacity(rate_data.len());
        let mut rate_cdf   = Vec::with_capacity(rate_data.len());

        for (destination, trip_type, rate) in rate_data {
            reachable.push(destination);
            trip_types.push(trip_type);
            rate_cdf.push(rate.max(0.0));
        }

        let total_rate = normalize_rates(&mut rate_cdf);

        Self { reachable, trip_types, rate_cdf, total_rate }
    }

    /// An isolated node: no destinations, zero rate.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` if this node has no reachable destinations.
    pub fn is_empty(&self) -> bool {
        self.reachable.is_empty()
    }

    /// Destinations residents of this node can reach, in file order.
    pub fn reachable_nodes(&self) -> &[Suid] {
        &self.reachable
    }

    /// Trip types parallel to [`reachable_nodes`](Self::reachable_nodes).
    pub fn trip_types(&self) -> &[MigrationType] {
        &self.trip_types
    }

    /// Total outbound rate (trips/person/day) before any per-individual
    /// modifier.
    pub fn total_rate(&self) -> f32 {
        self.total_rate
    }

    /// The cumulative distribution over destinations.
    pub fn rate_cdf(&self) -> &[f32] {
        &self.rate_cdf
    }

    /// Sample a trip for one individual.
    ///
    /// `rate_modifier` is the individual's migration heterogeneity
    /// multiplier; it scales the wait-time rate, not the destination choice.
    /// Returns `None` when the node is isolated or the total rate is zero —
    /// the caller treats that as "no trip", not an error.
    pub fn pick_migration_step(
        &self,
        rng: &mut NodeRng,
        rate_modifier: f32,
    ) -> Option<MigrationStep> {
        if self.rate_cdf.is_empty() || self.total_rate <= 0.0 {
            return None;
        }

        let time = rng.exponential(rate_modifier * self.total_rate);

        // uniform01() < 1.0 and the final CDF entry is exactly 1.0, so the
        // walk always terminates in-bounds.
        let draw = rng.uniform01();
        let mut index = 0;
        while draw > self.rate_cdf[index] {
            index += 1;
        }

        Some(MigrationStep {
            destination: self.reachable[index],
            trip_type:   self.trip_types[index],
            time,
        })
    }
}

// ── Normalization ────────────────────────────────────────────────────────────

/// Convert raw rates in `rates` into a cumulative distribution in place and
/// return the total rate.
///
/// The final entry is force-set to 1.0 (see the `MigrationInfo` invariant).
fn normalize_rates(rates: &mut [f32]) -> f32 {
    let total: f32 = rates.iter().sum();

    if !rates.is_empty() && total > 0.0 {
        rates[0] /= total;
        for i in 1..rates.len() {
            rates[i] = rates[i] / total + rates[i - 1];
        }
        let last = rates.len() - 1;
        rates[last] = 1.0;
    }

    total
}
