//! Fluent builder for constructing a [`Simulation`].

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::info;

use epi_core::{GeoPoint, SimParams, SuidGenerator};
use epi_exchange::RankTransport;
use epi_human::HumanConfig;
use epi_migration::MigrationInfoFactory;
use epi_node::{
    Climate, ConstantClimate, DemographicsProvider, IdGenerators, Node, NodeConfig,
};
use epi_report::Report;

use crate::rank_map::NodeRankMap;
use crate::sim::Simulation;
use crate::{SimError, SimResult};

/// One node in the run's node list, identical on every rank.
///
/// Which rank instantiates it is decided by the builder's static partition;
/// the seed list itself must be the same everywhere or the rank maps will
/// not agree.
#[derive(Clone, Debug)]
pub struct NodeSeed {
    pub external_id:        u32,
    pub position:           GeoPoint,
    pub initial_population: usize,
}

/// Fluent builder for [`Simulation<T>`].
///
/// # Required inputs
///
/// - [`SimParams`] — timestep count, dt, seed
/// - a [`RankTransport`] — [`LocalTransport`](epi_exchange::LocalTransport)
///   for single-rank runs, one [`MemoryHub`](epi_exchange::MemoryHub)
///   endpoint per rank otherwise
/// - a [`DemographicsProvider`]
/// - at least one [`NodeSeed`]
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                          |
/// |-------------------|----------------------------------|
/// | `.human_config`   | `HumanConfig::default()`         |
/// | `.node_config`    | `NodeConfig::default()`          |
/// | `.migration`      | no factory — all nodes isolated  |
/// | `.climate_for`    | `ConstantClimate::default()`     |
/// | `.report`         | none                             |
pub struct SimulationBuilder<T: RankTransport> {
    params:            SimParams,
    transport:         T,
    demographics:      Arc<dyn DemographicsProvider>,
    human_config:      Arc<HumanConfig>,
    node_config:       Arc<NodeConfig>,
    migration_factory: Option<MigrationInfoFactory>,
    climate_factory:   Box<dyn Fn(u32) -> Box<dyn Climate>>,
    seeds:             Vec<NodeSeed>,
    reports:           Vec<Box<dyn Report>>,
}

impl<T: RankTransport> SimulationBuilder<T> {
    pub fn new(
        params: SimParams,
        transport: T,
        demographics: Arc<dyn DemographicsProvider>,
    ) -> Self {
        Self {
            params,
            transport,
            demographics,
            human_config: Arc::new(HumanConfig::default()),
            node_config: Arc::new(NodeConfig::default()),
            migration_factory: None,
            climate_factory: Box::new(|_| Box::new(ConstantClimate::default())),
            seeds: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn human_config(mut self, config: HumanConfig) -> Self {
        self.human_config = Arc::new(config);
        self
    }

    pub fn node_config(mut self, config: NodeConfig) -> Self {
        self.node_config = Arc::new(config);
        self
    }

    /// Supply the migration-rate files.  Without a factory every node is
    /// migrationally isolated (valid, warned per node).
    pub fn migration(mut self, factory: MigrationInfoFactory) -> Self {
        self.migration_factory = Some(factory);
        self
    }

    /// Per-node climate constructor keyed by external node ID.
    pub fn climate_for(mut self, factory: impl Fn(u32) -> Box<dyn Climate> + 'static) -> Self {
        self.climate_factory = Box::new(factory);
        self
    }

    pub fn nodes(mut self, seeds: Vec<NodeSeed>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn add_node(mut self, seed: NodeSeed) -> Self {
        self.seeds.push(seed);
        self
    }

    pub fn report(mut self, report: Box<dyn Report>) -> Self {
        self.reports.push(report);
        self
    }

    /// Instantiate this rank's nodes, merge the rank map, wire migration,
    /// and populate.
    ///
    /// Collective: every rank must call `build` with the identical seed
    /// list, and no rank returns before the rank-map merge completes.
    pub fn build(mut self) -> SimResult<Simulation<T>> {
        if self.seeds.is_empty() {
            return Err(SimError::Config("no nodes configured".to_string()));
        }
        {
            let mut seen = rustc_hash::FxHashSet::default();
            for seed in &self.seeds {
                if !seen.insert(seed.external_id) {
                    return Err(SimError::Config(format!(
                        "duplicate external node id {}",
                        seed.external_id
                    )));
                }
            }
        }

        let rank = self.transport.rank();
        let num_tasks = self.transport.num_tasks();

        let mut node_ids = SuidGenerator::new(rank, num_tasks);
        let mut ids = IdGenerators::new(rank, num_tasks);
        let mut rank_map = NodeRankMap::new();
        let mut nodes = FxHashMap::default();
        let mut node_order = Vec::new();

        // Static round-robin partition over the shared seed list.
        let my_seeds: Vec<NodeSeed> = self
            .seeds
            .iter()
            .enumerate()
            .filter(|(i, _)| i % num_tasks == rank)
            .map(|(_, seed)| seed.clone())
            .collect();

        for seed in &my_seeds {
            let suid = node_ids.next_suid();
            let node = Node::new(
                suid,
                seed.external_id,
                seed.position,
                self.params.seed,
                Arc::clone(&self.human_config),
                Arc::clone(&self.node_config),
                Arc::clone(&self.demographics),
                (self.climate_factory)(seed.external_id),
            );
            rank_map.add(rank, &node)?;
            node_order.push(suid);
            nodes.insert(suid, node);
        }
        node_order.sort_unstable();

        info!(rank, local_nodes = nodes.len(), total_seeds = self.seeds.len(), "nodes created");

        // Learn every other rank's nodes before wiring migration: rate
        // files reference destinations this rank does not own.
        rank_map.merge_maps(&mut self.transport)?;

        if let Some(factory) = &self.migration_factory {
            let id_map = rank_map.external_id_map();
            for suid in &node_order {
                let node = nodes.get_mut(suid).expect("local node");
                let info = factory.create_migration_info(node.external_id(), &id_map)?;
                node.set_migration_info(info);
            }
        }

        for seed in &my_seeds {
            let suid = rank_map
                .suid_for_external_id(seed.external_id)
                .expect("just added");
            let node = nodes.get_mut(&suid).expect("local node");
            node.populate_from_demographics(seed.initial_population, &mut ids);
            rank_map.update(node);
        }
        rank_map.sync(&mut self.transport)?;

        Ok(Simulation {
            clock: self.params.make_clock(),
            params: self.params,
            transport: self.transport,
            nodes,
            node_order,
            rank_map,
            ids,
            migrating_queues: (0..num_tasks).map(|_| Vec::new()).collect(),
            events_staged: (0..num_tasks)
                .map(|_| crate::events::EventsForOtherNodes::new())
                .collect(),
            events_to_process: FxHashMap::default(),
            reports: self.reports,
        })
    }
}
