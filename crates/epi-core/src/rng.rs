//! Deterministic per-node and simulation-level RNG wrappers.
//!
//! # Determinism strategy
//!
//! Each node gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (node_suid * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive suids uniformly across the seed space.  Every
//! draw made on behalf of a node's residents comes from that node's stream,
//! so results are reproducible regardless of how nodes are partitioned
//! across ranks — a node carries the same stream whether it shares a rank
//! with one neighbor or a hundred.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Poisson};

use crate::Suid;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── NodeRng ──────────────────────────────────────────────────────────────────

/// Per-node deterministic RNG.
///
/// One per `Node`, created at node construction.  The type is intentionally
/// not `Sync`: a node's stream must never be shared.
#[derive(Debug)]
pub struct NodeRng(SmallRng);

impl NodeRng {
    /// Seed deterministically from the run's global seed and a node suid.
    pub fn new(global_seed: u64, node: Suid) -> Self {
        let seed = global_seed ^ (node.0 as u64).wrapping_mul(MIXING_CONSTANT);
        NodeRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand_distr` distribution
    /// types not wrapped below.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Uniform draw in `[0, 1)`.
    #[inline]
    pub fn uniform01(&mut self) -> f32 {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p`, short-circuiting the degenerate cases so
    /// `p <= 0` and `p >= 1` consume no randomness.
    #[inline]
    pub fn smart_draw(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.0.gen_bool(p as f64)
        }
    }

    /// Exponentially distributed draw with the given rate (events/day).
    ///
    /// A non-positive rate means "instantaneous": returns 0.
    pub fn exponential(&mut self, rate: f32) -> f32 {
        if rate <= 0.0 {
            return 0.0;
        }
        Exp::new(rate as f64)
            .expect("rate checked positive")
            .sample(&mut self.0) as f32
    }

    /// Poisson-distributed count with mean `lambda`.  Zero for `lambda <= 0`.
    pub fn poisson(&mut self, lambda: f64) -> u64 {
        if lambda <= 0.0 {
            return 0;
        }
        Poisson::new(lambda)
            .expect("lambda checked positive")
            .sample(&mut self.0) as u64
    }
}

// ── SimRng ───────────────────────────────────────────────────────────────────

/// Simulation-level RNG for draws not attributable to any node (initial
/// partition shuffling, exogenous events).
#[derive(Debug)]
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn uniform01(&mut self) -> f32 {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
