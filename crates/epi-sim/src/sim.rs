//! The `Simulation`: owner of this rank's nodes and the timestep loop.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use epi_core::{EventTrigger, SimClock, SimParams, Suid};
use epi_exchange::{exchange_items, RankTransport};
use epi_human::IndividualHuman;
use epi_node::{IdGenerators, Node};
use epi_report::Report;

use crate::events::{EventsForOtherNodes, NodeQualifier};
use crate::rank_map::NodeRankMap;
use crate::{SimError, SimResult};

/// The per-rank simulation: the nodes this rank owns, the per-timestep
/// loop, and the collective exchanges that stitch ranks together.
///
/// Construct via [`SimulationBuilder`](crate::SimulationBuilder).
pub struct Simulation<T: RankTransport> {
    pub(crate) params:    SimParams,
    pub(crate) clock:     SimClock,
    pub(crate) transport: T,

    /// Nodes resident on this rank.
    pub(crate) nodes: FxHashMap<Suid, Node>,
    /// Deterministic node iteration order (ascending suid).
    pub(crate) node_order: Vec<Suid>,

    pub(crate) rank_map: NodeRankMap,
    pub(crate) ids:      IdGenerators,

    /// Outbound mailboxes: `queues[rank]` holds individuals headed to nodes
    /// owned by `rank`.  Always fully drained within the timestep that
    /// filled them.
    pub(crate) migrating_queues: Vec<Vec<IndividualHuman>>,

    /// Events staged for each destination rank's nodes this timestep.
    pub(crate) events_staged: Vec<EventsForOtherNodes>,
    /// Events to inject into locally-owned nodes at the start of the next
    /// timestep, keyed by node.
    pub(crate) events_to_process: FxHashMap<Suid, Vec<EventTrigger>>,

    pub(crate) reports: Vec<Box<dyn Report>>,
}

impl<T: RankTransport> Simulation<T> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn rank(&self) -> usize {
        self.transport.rank()
    }

    pub fn num_tasks(&self) -> usize {
        self.transport.num_tasks()
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn rank_map(&self) -> &NodeRankMap {
        &self.rank_map
    }

    pub fn node(&self, suid: Suid) -> Option<&Node> {
        self.nodes.get(&suid)
    }

    pub fn node_mut(&mut self, suid: Suid) -> Option<&mut Node> {
        self.nodes.get_mut(&suid)
    }

    /// This rank's nodes in deterministic iteration order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().map(|suid| &self.nodes[suid])
    }

    /// Weighted population across this rank's nodes (as of the last
    /// completed timestep).
    pub fn total_population(&self) -> f32 {
        self.nodes.values().map(Node::stat_pop).sum()
    }

    /// Raw resident count across this rank's nodes.
    pub fn total_individuals(&self) -> usize {
        self.nodes.values().map(|n| n.individuals().len()).sum()
    }

    pub fn add_report(&mut self, report: Box<dyn Report>) {
        self.reports.push(report);
    }

    // ── The run loop ──────────────────────────────────────────────────────

    /// Run from the current timestep to `params.total_timesteps`.
    pub fn run(&mut self) -> SimResult<()> {
        info!(
            rank = self.rank(),
            nodes = self.nodes.len(),
            timesteps = self.params.total_timesteps,
            "starting simulation"
        );
        while self.clock.timestep < self.params.total_timesteps {
            self.update(self.params.dt_days)?;
        }
        for report in &mut self.reports {
            report.finalize()?;
        }
        info!(rank = self.rank(), "simulation complete");
        Ok(())
    }

    /// Advance the whole rank by one timestep.  Collective: every rank must
    /// call `update` in lockstep.
    pub fn update(&mut self, dt: f32) -> SimResult<()> {
        for report in &mut self.reports {
            report.begin_timestep();
        }

        let time = self.clock.time;
        let year = self.clock.year();

        // ── Update nodes, routing each node's emigrants as it finishes ────
        for i in 0..self.node_order.len() {
            let suid = self.node_order[i];
            let pending = self.events_to_process.remove(&suid).unwrap_or_default();

            let emigrants = {
                let node = self
                    .nodes
                    .get_mut(&suid)
                    .expect("node_order only holds owned nodes");
                node.add_events_from_other_nodes(pending);

                let reports = &mut self.reports;
                let any_individual_data =
                    reports.iter().any(|r| r.requires_individual_data());
                let emigrants =
                    node.update(time, dt, year, &mut self.ids, |individual| {
                        if any_individual_data {
                            for report in reports.iter_mut() {
                                if report.requires_individual_data() {
                                    report.log_individual_data(individual);
                                }
                            }
                        }
                    });

                for report in self.reports.iter_mut() {
                    report.log_node_data(node);
                }
                emigrants
            };

            for individual in emigrants {
                self.post_migrating_individual(individual)?;
            }
        }

        // ── Resolve migration (collective) ────────────────────────────────
        self.resolve_migration()?;

        // ── Refresh and sync node summaries (collective) ──────────────────
        for i in 0..self.node_order.len() {
            let suid = self.node_order[i];
            self.rank_map.update(&self.nodes[&suid]);
        }
        self.rank_map.sync(&mut self.transport)?;

        // ── Exchange staged node events (collective) ──────────────────────
        self.update_node_events()?;

        // ── Close out the timestep ────────────────────────────────────────
        self.clock.advance();
        let end_time = self.clock.time;
        for report in &mut self.reports {
            report.end_timestep(end_time, dt);
        }
        self.transport.barrier()?;
        Ok(())
    }

    // ── Migration resolution ──────────────────────────────────────────────

    /// Enqueue an emigrant on the mailbox of the rank owning its
    /// destination.
    pub fn post_migrating_individual(&mut self, individual: IndividualHuman) -> SimResult<()> {
        let destination = individual.migration_destination();
        if destination.is_nil() {
            return Err(SimError::Integrity(format!(
                "individual {} emigrated with no destination",
                individual.suid()
            )));
        }
        let rank = self
            .rank_map
            .get_rank_from_node_suid(destination)
            .ok_or(SimError::UnknownDestination { destination })?;
        self.migrating_queues[rank].push(individual);
        Ok(())
    }

    /// Deliver every queued migrant: in-process for the local queue,
    /// through the collective exchange for everyone else.
    ///
    /// Every individual that left a source node this timestep reaches
    /// exactly one destination node before this returns — queues never carry
    /// anything across a timestep boundary.
    fn resolve_migration(&mut self) -> SimResult<()> {
        let my_rank = self.transport.rank();
        let num_tasks = self.transport.num_tasks();

        let mut queues = std::mem::replace(
            &mut self.migrating_queues,
            (0..num_tasks).map(|_| Vec::new()).collect(),
        );

        // Local deliveries first, no codec involved.  Reverse iteration
        // makes delivery order deterministic relative to enqueue order.
        let self_queue = std::mem::take(&mut queues[my_rank]);
        debug!(rank = my_rank, local = self_queue.len(), "resolving migration");
        for individual in self_queue.into_iter().rev() {
            self.deliver_immigrant(individual)?;
        }

        // Cross-rank deliveries.
        let inbound = exchange_items(&mut self.transport, queues)?;
        for (rank, queue) in inbound.into_iter().enumerate() {
            if rank == my_rank {
                continue;
            }
            for individual in queue {
                self.deliver_immigrant(individual)?;
            }
        }
        Ok(())
    }

    fn deliver_immigrant(&mut self, individual: IndividualHuman) -> SimResult<()> {
        let destination = individual.migration_destination();
        let node = self.nodes.get_mut(&destination).ok_or_else(|| {
            SimError::Integrity(format!(
                "individual {} delivered to node {destination} this rank does not own",
                individual.suid()
            ))
        })?;
        node.process_immigrating(individual);
        Ok(())
    }

    // ── Cross-node event broadcast ────────────────────────────────────────

    /// Stage `trigger` for every known node the qualifier accepts.
    /// Delivered (and injected into destination nodes) at the start of the
    /// next timestep.
    pub fn distribute_event_to_other_nodes(
        &mut self,
        trigger: EventTrigger,
        qualifier: &dyn NodeQualifier,
    ) {
        let staged = &mut self.events_staged;
        for info in self.rank_map.infos() {
            if qualifier.qualifies(info) {
                staged[info.rank].add(info.suid, trigger.clone());
            }
        }
    }

    /// Exchange staged events with every rank and re-key the incoming set by
    /// destination node.  Collective; called once per timestep.
    fn update_node_events(&mut self) -> SimResult<()> {
        let my_rank = self.transport.rank();
        let num_tasks = self.transport.num_tasks();

        let staged = std::mem::replace(
            &mut self.events_staged,
            (0..num_tasks).map(|_| EventsForOtherNodes::new()).collect(),
        );
        let outbound: Vec<Vec<(Suid, EventTrigger)>> =
            staged.into_iter().map(EventsForOtherNodes::into_entries).collect();

        let inbound = exchange_items(&mut self.transport, outbound)?;

        self.events_to_process.clear();
        for entries in inbound {
            for (node, trigger) in entries {
                self.events_to_process.entry(node).or_default().push(trigger);
            }
        }
        Ok(())
    }
}
