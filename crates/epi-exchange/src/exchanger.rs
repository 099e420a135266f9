//! Typed all-to-all exchange over any transport.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ExchangeError, ExchangeResult, RankTransport};

/// Exchange per-rank item queues with every peer.
///
/// `outbound[r]` is the list destined for rank `r`.  The self queue
/// (`outbound[my_rank]`) is moved straight through to the result without
/// touching the codec — local delivery costs nothing and preserves the exact
/// objects that were enqueued.  Everything else is bitcode-serialized, sent,
/// and decoded per source rank.
///
/// The call is collective: all ranks must call it in the same round.
pub fn exchange_items<T, Tr>(
    transport: &mut Tr,
    mut outbound: Vec<Vec<T>>,
) -> ExchangeResult<Vec<Vec<T>>>
where
    T: Serialize + DeserializeOwned,
    Tr: RankTransport + ?Sized,
{
    let my_rank = transport.rank();
    let num_tasks = transport.num_tasks();

    if outbound.len() != num_tasks {
        return Err(ExchangeError::RankCountMismatch {
            expected: num_tasks,
            got:      outbound.len(),
        });
    }

    let mut buffers = vec![Vec::new(); num_tasks];
    for (rank, items) in outbound.iter().enumerate() {
        if rank == my_rank || items.is_empty() {
            continue;
        }
        buffers[rank] =
            bitcode::serialize(items).map_err(|e| ExchangeError::Codec(e.to_string()))?;
    }

    let inbound_buffers = transport.exchange(buffers)?;

    let mut inbound: Vec<Vec<T>> = Vec::with_capacity(num_tasks);
    for (rank, buffer) in inbound_buffers.into_iter().enumerate() {
        if rank == my_rank {
            inbound.push(std::mem::take(&mut outbound[my_rank]));
        } else if buffer.is_empty() {
            inbound.push(Vec::new());
        } else {
            inbound.push(
                bitcode::deserialize(&buffer).map_err(|e| ExchangeError::Codec(e.to_string()))?,
            );
        }
    }

    Ok(inbound)
}
