//! The transport seam and the single-rank fast path.

use crate::{ExchangeError, ExchangeResult};

/// One rank's handle to the collective exchange fabric.
///
/// All methods are collective: every rank in the communicator must make the
/// matching call, and no rank returns until every peer has participated.
/// This is the only blocking surface in the whole simulation.
pub trait RankTransport: Send {
    /// This process's rank index, in `0..num_tasks()`.
    fn rank(&self) -> usize;

    /// Total participating ranks.
    fn num_tasks(&self) -> usize;

    /// All-to-all buffer exchange.
    ///
    /// `outbound` must hold one buffer per rank; `outbound[self.rank()]` is
    /// ignored (self-delivery never crosses the transport).  Returns inbound
    /// buffers indexed by source rank, with `inbound[self.rank()]` empty.
    fn exchange(&mut self, outbound: Vec<Vec<u8>>) -> ExchangeResult<Vec<Vec<u8>>>;

    /// Block until every rank reaches this barrier.
    fn barrier(&mut self) -> ExchangeResult<()>;
}

/// The single-process transport: rank 0 of 1, every collective is a no-op.
///
/// Exists so single-rank runs take the exact same code paths as distributed
/// ones without a special case in the simulation.
#[derive(Debug, Default)]
pub struct LocalTransport;

impl RankTransport for LocalTransport {
    fn rank(&self) -> usize {
        0
    }

    fn num_tasks(&self) -> usize {
        1
    }

    fn exchange(&mut self, outbound: Vec<Vec<u8>>) -> ExchangeResult<Vec<Vec<u8>>> {
        if outbound.len() != 1 {
            return Err(ExchangeError::RankCountMismatch { expected: 1, got: outbound.len() });
        }
        Ok(vec![Vec::new()])
    }

    fn barrier(&mut self) -> ExchangeResult<()> {
        Ok(())
    }
}
