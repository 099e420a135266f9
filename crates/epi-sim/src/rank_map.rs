//! The distributed node→rank directory.

use rustc_hash::FxHashMap;
use tracing::debug;

use epi_core::Suid;
use epi_exchange::{exchange_items, RankTransport};
use epi_node::Node;

use crate::node_info::{NodeInfo, NodeSummary};
use crate::{SimError, SimResult};

/// Every rank's view of which rank owns which node.
///
/// Built locally as each rank instantiates its nodes, then merged once so
/// every rank knows every node.  After the merge, ownership never moves;
/// only the per-node population summaries are refreshed each timestep.
#[derive(Debug, Default)]
pub struct NodeRankMap {
    map:            FxHashMap<Suid, NodeInfo>,
    by_external_id: FxHashMap<u32, Suid>,
}

impl NodeRankMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `rank` owns `node`.  Called while instantiating local
    /// nodes, before the merge.
    pub fn add(&mut self, rank: usize, node: &Node) -> SimResult<()> {
        self.add_info(NodeInfo {
            suid:        node.suid(),
            external_id: node.external_id(),
            rank,
            position:    node.position(),
            population:  0.0,
        })
    }

    /// Insert one node record, failing on a suid already claimed.
    pub fn add_info(&mut self, info: NodeInfo) -> SimResult<()> {
        if let Some(existing) = self.map.get(&info.suid) {
            return Err(SimError::DuplicateNodeRank {
                suid:          info.suid,
                existing_rank: existing.rank,
                new_rank:      info.rank,
            });
        }
        self.by_external_id.insert(info.external_id, info.suid);
        self.map.insert(info.suid, info);
        Ok(())
    }

    /// Learn every other rank's nodes.  Collective; call exactly once after
    /// initial node creation.
    ///
    /// Single-rank runs short-circuit to a no-op.  A suid claimed by two
    /// ranks fails the merge — that is a partitioning bug, never a condition
    /// to recover from.
    pub fn merge_maps<T: RankTransport + ?Sized>(&mut self, transport: &mut T) -> SimResult<()> {
        let num_tasks = transport.num_tasks();
        if num_tasks == 1 {
            return Ok(());
        }

        let my_rank = transport.rank();
        let local: Vec<NodeInfo> = self.map.values().cloned().collect();
        debug!(count = local.len(), "broadcasting local node-rank entries");

        let outbound: Vec<Vec<NodeInfo>> = (0..num_tasks)
            .map(|rank| if rank == my_rank { Vec::new() } else { local.clone() })
            .collect();
        let inbound = exchange_items(transport, outbound)?;

        for (rank, infos) in inbound.into_iter().enumerate() {
            if rank == my_rank {
                continue;
            }
            debug!(count = infos.len(), from = rank, "merging node-rank entries");
            for info in infos {
                self.add_info(info)?;
            }
        }
        Ok(())
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    /// The rank owning `suid`, if known.
    pub fn get_rank_from_node_suid(&self, suid: Suid) -> Option<usize> {
        self.map.get(&suid).map(|info| info.rank)
    }

    /// The rank owning the node with this external ID, if known.
    pub fn get_initial_rank_from_node_id(&self, external_id: u32) -> Option<usize> {
        self.by_external_id
            .get(&external_id)
            .and_then(|suid| self.get_rank_from_node_suid(*suid))
    }

    /// The suid for an external node ID, if known.
    pub fn suid_for_external_id(&self, external_id: u32) -> Option<Suid> {
        self.by_external_id.get(&external_id).copied()
    }

    pub fn node_info(&self, suid: Suid) -> Option<&NodeInfo> {
        self.map.get(&suid)
    }

    /// Iterate every known node record (all ranks).
    pub fn infos(&self) -> impl Iterator<Item = &NodeInfo> {
        self.map.values()
    }

    /// External-id → suid map over every known node, as the migration
    /// factory wants it.
    pub fn external_id_map(&self) -> FxHashMap<u32, Suid> {
        self.by_external_id
            .iter()
            .map(|(&ext, &suid)| (ext, suid))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    // ── Per-timestep summary refresh ──────────────────────────────────────

    /// Refresh the local summary for one owned node.
    pub fn update(&mut self, node: &Node) {
        if let Some(info) = self.map.get_mut(&node.suid()) {
            info.population = node.stat_pop();
        }
    }

    /// Exchange summaries for locally-owned nodes with every other rank.
    /// Collective; called once per timestep.
    pub fn sync<T: RankTransport + ?Sized>(&mut self, transport: &mut T) -> SimResult<()> {
        let num_tasks = transport.num_tasks();
        if num_tasks == 1 {
            return Ok(());
        }

        let my_rank = transport.rank();
        let local: Vec<NodeSummary> = self
            .map
            .values()
            .filter(|info| info.rank == my_rank)
            .map(|info| NodeSummary { suid: info.suid, population: info.population })
            .collect();

        let outbound: Vec<Vec<NodeSummary>> = (0..num_tasks)
            .map(|rank| if rank == my_rank { Vec::new() } else { local.clone() })
            .collect();
        let inbound = exchange_items(transport, outbound)?;

        for (rank, summaries) in inbound.into_iter().enumerate() {
            if rank == my_rank {
                continue;
            }
            for summary in summaries {
                let info = self.map.get_mut(&summary.suid).ok_or(SimError::Integrity(
                    format!("summary for unknown node {}", summary.suid),
                ))?;
                info.population = summary.population;
            }
        }
        Ok(())
    }
}
