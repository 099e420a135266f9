//! Simulation-unique identifiers and their rank-striped allocator.
//!
//! # Design
//!
//! Every live entity (node, individual, infection) carries a `Suid` — a
//! process-wide-unique signed 32-bit integer.  Uniqueness across ranks is
//! guaranteed by striping: a generator on rank `r` of `n` total ranks hands
//! out `r + 1, r + 1 + n, r + 1 + 2n, …`, so no two ranks can ever mint the
//! same value and zero is never produced.
//!
//! Zero is the nil sentinel: `Suid::NIL` never denotes a live entity, which
//! lets "no destination" / "not migrating" be represented without `Option`
//! in hot per-agent state.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Suid ─────────────────────────────────────────────────────────────────────

/// A simulation-unique identity shared by nodes, individuals, and infections.
///
/// `Suid` is `Copy + Ord + Hash` so it can be used as a map key without
/// ceremony.  The inner integer is `pub` for archive/reporting code; prefer
/// the named helpers elsewhere.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize,
)]
pub struct Suid(pub i32);

impl Suid {
    /// The nil sentinel.  Never allocated by any generator.
    pub const NIL: Suid = Suid(0);

    /// `true` if this is the nil sentinel.
    #[inline(always)]
    pub fn is_nil(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Suid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Suid({})", self.0)
    }
}

// ── SuidGenerator ────────────────────────────────────────────────────────────

/// Rank-striped monotonic `Suid` allocator.
///
/// Each rank constructs one generator per entity class (nodes, individuals,
/// infections); the striping parameters make the classes collision-free
/// across ranks without any coordination.
///
/// The generator itself is serialized in checkpoints so allocation resumes
/// where it left off.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuidGenerator {
    next:      i32,
    num_tasks: i32,
}

impl SuidGenerator {
    /// Create a generator for `rank` out of `num_tasks` total ranks.
    ///
    /// # Panics
    ///
    /// Panics if `rank >= num_tasks` or `num_tasks == 0` — both indicate a
    /// mis-wired transport, not a runtime condition.
    pub fn new(rank: usize, num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "num_tasks must be > 0");
        assert!(rank < num_tasks, "rank {rank} out of range for {num_tasks} tasks");
        Self {
            next:      rank as i32 + 1,
            num_tasks: num_tasks as i32,
        }
    }

    /// Allocate the next `Suid` in this rank's stripe.
    ///
    /// # Panics
    ///
    /// Panics on 32-bit exhaustion; minting ~2 billion entities on one rank
    /// is treated as an integrity violation rather than a recoverable error.
    pub fn next_suid(&mut self) -> Suid {
        let id = self.next;
        self.next = self
            .next
            .checked_add(self.num_tasks)
            .expect("Suid space exhausted");
        Suid(id)
    }
}
