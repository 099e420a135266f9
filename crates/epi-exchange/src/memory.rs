//! In-process rank mesh over channels.
//!
//! `MemoryHub::create(n)` builds a fully connected mesh of unbounded
//! channels — one per directed rank pair — and hands back one
//! [`MemoryTransport`] per rank.  Each transport is `Send`, so tests and
//! single-machine multi-rank runs put one rank on each thread.
//!
//! The exchange protocol is post-then-drain: every rank first sends to all
//! peers (unbounded channels, never blocks), then blocks receiving one
//! buffer from each peer.  The blocking drain is what makes every collective
//! call an all-ranks barrier.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{ExchangeError, ExchangeResult, RankTransport};

/// Builds connected [`MemoryTransport`] sets.
pub struct MemoryHub;

impl MemoryHub {
    /// Create `num_tasks` connected transports, one per rank.
    pub fn create(num_tasks: usize) -> Vec<MemoryTransport> {
        assert!(num_tasks > 0, "need at least one rank");

        // senders[from][to] / receivers[to][from]
        let mut senders: Vec<Vec<Option<Sender<Vec<u8>>>>> =
            (0..num_tasks).map(|_| (0..num_tasks).map(|_| None).collect()).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Vec<u8>>>>> =
            (0..num_tasks).map(|_| (0..num_tasks).map(|_| None).collect()).collect();

        for from in 0..num_tasks {
            for to in 0..num_tasks {
                if from == to {
                    continue;
                }
                let (tx, rx) = unbounded();
                senders[from][to] = Some(tx);
                receivers[to][from] = Some(rx);
            }
        }

        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (tx, rx))| MemoryTransport {
                rank,
                num_tasks,
                senders: tx,
                receivers: rx,
            })
            .collect()
    }
}

/// One rank's endpoint in an in-process mesh.
pub struct MemoryTransport {
    rank:      usize,
    num_tasks: usize,
    senders:   Vec<Option<Sender<Vec<u8>>>>,
    receivers: Vec<Option<Receiver<Vec<u8>>>>,
}

impl RankTransport for MemoryTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    fn exchange(&mut self, outbound: Vec<Vec<u8>>) -> ExchangeResult<Vec<Vec<u8>>> {
        if outbound.len() != self.num_tasks {
            return Err(ExchangeError::RankCountMismatch {
                expected: self.num_tasks,
                got:      outbound.len(),
            });
        }

        // Post everything first so no rank can deadlock in the drain.
        for (peer, buffer) in outbound.into_iter().enumerate() {
            if peer == self.rank {
                continue;
            }
            let sender = self.senders[peer].as_ref().expect("mesh is fully connected");
            sender
                .send(buffer)
                .map_err(|_| ExchangeError::Disconnected { peer })?;
        }

        let mut inbound = vec![Vec::new(); self.num_tasks];
        for peer in 0..self.num_tasks {
            if peer == self.rank {
                continue;
            }
            let receiver = self.receivers[peer].as_ref().expect("mesh is fully connected");
            inbound[peer] = receiver
                .recv()
                .map_err(|_| ExchangeError::Disconnected { peer })?;
        }

        Ok(inbound)
    }

    fn barrier(&mut self) -> ExchangeResult<()> {
        let empty = vec![Vec::new(); self.num_tasks];
        self.exchange(empty).map(|_| ())
    }
}
