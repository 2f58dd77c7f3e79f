//! Seeding for search runs.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Pick the seed for a run: the configured one, or a fresh random one
///
/// The chosen seed is always reported in logs so a failing run can be
/// reproduced by configuring it explicitly.
pub fn resolve_seed(configured: Option<u64>) -> u64 {
    match configured {
        Some(seed) => seed,
        None => StdRng::from_entropy().next_u64(),
    }
}

/// Create a new RNG with a specific seed
pub fn create_seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// RNG for one parallel worker, derived from the run seed and worker index
pub fn worker_rng(seed: u64, worker: usize) -> StdRng {
    create_seeded_rng(seed.wrapping_add(worker as u64))
}
