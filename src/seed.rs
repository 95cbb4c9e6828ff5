//! Per-table hash seeds.
//!
//! Every hash index draws its seed once, when it is first created, and keeps
//! it across grow/shrink/rebuild so stored hashes stay valid. The default
//! source is a process-wide LCG so collision patterns differ between tables;
//! tests and adversarial-input callers can inject their own.

use core::cell::Cell;
use core::sync::atomic::{AtomicU64, Ordering};

/// Initial value of the process-wide seed state.
pub const DEFAULT_SEED: u64 = 0x3141_5926;

const LCG_MUL: u64 = 2_862_933_555_777_941_757;
const LCG_ADD: u64 = 3_037_000_493;

static GLOBAL_SEED: AtomicU64 = AtomicU64::new(DEFAULT_SEED);

#[inline]
fn lcg_step(s: u64) -> u64 {
    s.wrapping_mul(LCG_MUL).wrapping_add(LCG_ADD)
}

/// A source of table seeds.
pub trait SeedSource {
    /// Seed for a newly created table.
    fn next_seed(&self) -> u64;
}

/// The process-wide seed state. Each call returns the current state and
/// advances it by one LCG step.
#[derive(Copy, Clone, Debug, Default)]
pub struct GlobalSeed;

impl SeedSource for GlobalSeed {
    fn next_seed(&self) -> u64 {
        let prev = GLOBAL_SEED
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| Some(lcg_step(s)));
        // fetch_update only fails when the closure returns None.
        match prev {
            Ok(s) | Err(s) => s,
        }
    }
}

/// Replace the process-wide seed state, e.g. with OS randomness at startup.
pub fn reseed_global(seed: u64) {
    GLOBAL_SEED.store(seed, Ordering::Relaxed);
}

/// Instance-local LCG, for reproducible seed sequences.
#[derive(Clone, Debug)]
pub struct LcgSeed {
    state: Cell<u64>,
}

impl LcgSeed {
    pub fn new(seed: u64) -> Self {
        Self {
            state: Cell::new(seed),
        }
    }
}

impl Default for LcgSeed {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl SeedSource for LcgSeed {
    fn next_seed(&self) -> u64 {
        let s = self.state.get();
        self.state.set(lcg_step(s));
        s
    }
}

/// A caller-chosen seed used for every table.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FixedSeed(pub u64);

impl SeedSource for FixedSeed {
    fn next_seed(&self) -> u64 {
        self.0
    }
}

impl<S: SeedSource + ?Sized> SeedSource for &S {
    fn next_seed(&self) -> u64 {
        (**self).next_seed()
    }
}
