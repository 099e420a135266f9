//! Property-keyed contagion pools.
//!
//! A node's residents mix within pools: either one well-mixed pool for the
//! whole node, or one pool per distinct value of a configured property key
//! ("property-restricted transmission").  Each timestep the node deposits
//! start-of-timestep shedding into the pools, and the force of infection an
//! individual sees is its pool's contagion divided by the pool's weighted
//! population.
//!
//! Pool membership is derived per node and reassigned on every arrival; it
//! is never serialized with the individual.

use epi_core::PropertyBag;
use rustc_hash::FxHashMap;

/// The contagion pools for one node.
#[derive(Debug, Default)]
pub struct TransmissionPools {
    property_key: Option<String>,
    /// Property value → pool index.  A single anonymous pool when no key is
    /// configured.
    index_by_value: FxHashMap<String, usize>,

    deposits:   Vec<f32>,
    population: Vec<f32>,
    /// Force of infection per pool (per person per day), valid after
    /// [`end_update`](Self::end_update).
    force: Vec<f32>,
}

impl TransmissionPools {
    pub fn new(property_key: Option<String>) -> Self {
        Self { property_key, ..Self::default() }
    }

    /// Pool index for an individual with these properties, creating the pool
    /// on first sight of a new property value.
    pub fn group_for(&mut self, properties: &PropertyBag) -> usize {
        let value = match &self.property_key {
            None => "",
            Some(key) => properties.get(key).unwrap_or(""),
        };
        if let Some(&idx) = self.index_by_value.get(value) {
            return idx;
        }
        let idx = self.deposits.len();
        self.index_by_value.insert(value.to_string(), idx);
        self.deposits.push(0.0);
        self.population.push(0.0);
        self.force.push(0.0);
        idx
    }

    /// Zero the per-timestep accumulators (population and deposits).
    pub fn clear(&mut self) {
        self.deposits.fill(0.0);
        self.population.fill(0.0);
    }

    /// Count `mc_weight` people into pool `group` for this timestep.
    pub fn accumulate_population(&mut self, group: usize, mc_weight: f32) {
        self.population[group] += mc_weight;
    }

    /// Shed `amount` contagion into pool `group`.
    pub fn deposit(&mut self, group: usize, amount: f32) {
        self.deposits[group] += amount;
    }

    /// Finish the accumulation pass: convert deposits to per-person force of
    /// infection, scaled by `infectivity_multiplier`.
    pub fn end_update(&mut self, infectivity_multiplier: f32) {
        for g in 0..self.deposits.len() {
            self.force[g] = if self.population[g] > 0.0 {
                self.deposits[g] * infectivity_multiplier / self.population[g]
            } else {
                0.0
            };
        }
    }

    /// Force of infection (per day) seen by members of pool `group`.
    ///
    /// Individuals without a pool assignment (arrived or born mid-timestep)
    /// see zero force this timestep.
    pub fn force_of_infection(&self, group: Option<usize>) -> f32 {
        match group {
            Some(g) => self.force[g],
            None => 0.0,
        }
    }

    /// Total contagion deposited this timestep across all pools.
    pub fn total_contagion(&self) -> f32 {
        self.deposits.iter().sum()
    }

    pub fn pool_count(&self) -> usize {
        self.deposits.len()
    }
}
