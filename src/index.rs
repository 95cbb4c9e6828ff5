//! HashIndex: bucketed open-addressing index from stored hashes to record
//! positions in a [`GrowArray`](crate::GrowArray).
//!
//! The index never looks at keys itself. Callers hand it a hash and an
//! equality callback over record positions; the index only stores `(hash,
//! position)` pairs and keeps the probe structure healthy.
//!
//! Layout and probing
//! - Slots are grouped into buckets of `BUCKET_LEN` (8, or 4 with the
//!   `small-buckets` feature). Each bucket keeps its hashes and positions in
//!   two separate cache-line-sized arrays.
//! - A probe starts at `hash & (slot_count - 1)`. The containing bucket is
//!   scanned from that offset to its end and then from its start back to the
//!   offset. After that the probe advances quadratically over buckets:
//!   `pos += step; step += BUCKET_LEN`, wrapping at `slot_count`.
//! - Because `slot_count` is a power of two and every step is a multiple of
//!   the bucket length, the first `slot_count` positions of a probe visit
//!   every slot exactly once. Probes are bounded by that count.
//!
//! Reserved hashes
//! - 0 marks an empty slot and 1 a tombstone. Computed hashes below 2 are
//!   nudged up by 2 before they are stored or compared (see [`stored_hash`]).
//!
//! Maintenance
//! - Grow: before an insert, when `used_count >= used_count_threshold`, the
//!   table is rebuilt at twice the size.
//! - Shrink: after a delete, when `used_count < used_count_shrink_threshold`
//!   and the table spans more than one bucket, it is rebuilt at half size.
//! - Rebuild in place: otherwise, when `tombstone_count >
//!   tombstone_count_threshold`, it is rebuilt at the same size.
//! - Rebuilds reuse the stored hashes and the table seed; no key is hashed
//!   again.
//! - `used_count_threshold + tombstone_count_threshold < slot_count` holds for
//!   every table, so live entries plus tombstones always leave an empty slot.

use crate::error::{Error, Result};
use tracing::{debug, trace};

#[cfg(not(feature = "small-buckets"))]
pub const BUCKET_LEN: usize = 8;
#[cfg(feature = "small-buckets")]
pub const BUCKET_LEN: usize = 4;

const BUCKET_MASK: usize = BUCKET_LEN - 1;
const BUCKET_SHIFT: u32 = BUCKET_LEN.trailing_zeros();

pub const HASH_EMPTY: u64 = 0;
pub const HASH_DELETED: u64 = 1;

const INDEX_EMPTY: isize = -1;
const INDEX_DELETED: isize = -2;

/// Map a computed hash onto the range of storable hashes.
#[inline]
pub fn stored_hash(h: u64) -> u64 {
    if h < 2 {
        h + 2
    } else {
        h
    }
}

#[derive(Clone, Copy, Debug)]
#[repr(C, align(64))]
struct Bucket {
    hash: [u64; BUCKET_LEN],
    index: [isize; BUCKET_LEN],
}

const EMPTY_BUCKET: Bucket = Bucket {
    hash: [HASH_EMPTY; BUCKET_LEN],
    index: [INDEX_EMPTY; BUCKET_LEN],
};

/// Grow, tombstone-rebuild and shrink thresholds, in sixteenths of the slot
/// count.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LoadPolicy {
    grow: u8,
    tombstone: u8,
    shrink: u8,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Thresholds for one concrete slot count.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Thresholds {
    pub used: usize,
    pub tombstone: usize,
    pub shrink: usize,
}

impl LoadPolicy {
    /// Grow at 75% occupancy, rebuild at 18.75% tombstones, shrink below 25%.
    pub const DEFAULT: Self = Self {
        grow: 12,
        tombstone: 3,
        shrink: 4,
    };

    /// Build a policy from thresholds in sixteenths.
    ///
    /// Fails with [`Error::InvalidPolicy`] unless `grow + tombstone < 16`,
    /// `grow >= 4`, `tombstone >= 1` and `2 * shrink < grow`.
    pub fn new(grow: u8, tombstone: u8, shrink: u8) -> Result<Self> {
        if tombstone == 0 {
            return Err(Error::InvalidPolicy(
                "tombstone threshold must be at least 1/16",
            ));
        }
        if u16::from(grow) + u16::from(tombstone) >= 16 {
            return Err(Error::InvalidPolicy(
                "grow and tombstone thresholds must sum to less than 16/16",
            ));
        }
        if grow < 4 {
            return Err(Error::InvalidPolicy(
                "grow threshold must be at least 4/16",
            ));
        }
        if 2 * u16::from(shrink) >= u16::from(grow) {
            return Err(Error::InvalidPolicy(
                "shrink threshold must be below half the grow threshold",
            ));
        }
        Ok(Self {
            grow,
            tombstone,
            shrink,
        })
    }

    /// Concrete thresholds for a table of `slot_count` slots, rounded down.
    /// Single-bucket tables get a shrink threshold of 0.
    pub fn thresholds(&self, slot_count: usize) -> Thresholds {
        let frac = |n: u8| ((slot_count as u128 * n as u128) / 16) as usize;
        Thresholds {
            used: frac(self.grow),
            tombstone: frac(self.tombstone),
            // A single-bucket table never shrinks.
            shrink: if slot_count <= BUCKET_LEN {
                0
            } else {
                frac(self.shrink)
            },
        }
    }
}

/// Maintenance counters, carried across rebuilds.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexStats {
    pub grows: u64,
    pub shrinks: u64,
    pub rebuilds: u64,
}

/// Result of an insert probe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Probe {
    /// The key is present at `slot`, pointing at record `index`.
    Found { slot: usize, index: usize },
    /// The key is absent; `slot` is where it should go (a reused tombstone
    /// when one was passed on the way).
    Vacant { slot: usize },
}

/// Slot positions visited by a probe, in order. Yields exactly
/// `slot_count` positions, each slot once.
struct ProbeSeq {
    base: usize,
    start: usize,
    step: usize,
    i: usize,
    left: usize,
    mask: usize,
}

impl ProbeSeq {
    fn new(hash: u64, slot_count: usize) -> Self {
        let pos = (hash as usize) & (slot_count - 1);
        Self {
            base: pos & !BUCKET_MASK,
            start: pos & BUCKET_MASK,
            step: BUCKET_LEN,
            i: 0,
            left: slot_count,
            mask: slot_count - 1,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.left == 0 {
            return None;
        }
        self.left -= 1;
        let slot = self.base + ((self.start + self.i) & BUCKET_MASK);
        self.i += 1;
        if self.i == BUCKET_LEN {
            self.i = 0;
            self.base = (self.base + self.step) & self.mask;
            self.step += BUCKET_LEN;
        }
        Some(slot)
    }
}

#[derive(Clone, Debug)]
pub struct HashIndex {
    buckets: Vec<Bucket>,
    slot_count: usize,
    used_count: usize,
    tombstone_count: usize,
    thresholds: Thresholds,
    seed: u64,
    policy: LoadPolicy,
    stats: IndexStats,
}

impl HashIndex {
    /// Empty table of `slot_count` slots (a power of two, at least one
    /// bucket). Fails with [`Error::AllocFailed`] if the buckets cannot be
    /// allocated.
    pub fn try_new(slot_count: usize, seed: u64, policy: LoadPolicy) -> Result<Self> {
        assert!(
            slot_count.is_power_of_two() && slot_count >= BUCKET_LEN,
            "slot count {slot_count} must be a power of two of at least {BUCKET_LEN}"
        );
        let n = slot_count >> BUCKET_SHIFT;
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(n)
            .map_err(|_| Error::alloc_failed::<Bucket>(n))?;
        buckets.resize(n, EMPTY_BUCKET);

        let thresholds = policy.thresholds(slot_count);
        assert!(
            thresholds.used + thresholds.tombstone < slot_count,
            "thresholds {thresholds:?} leave no empty slot in a table of {slot_count}"
        );
        trace!(slot_count, seed, "hash index created");
        Ok(Self {
            buckets,
            slot_count,
            used_count: 0,
            tombstone_count: 0,
            thresholds,
            seed,
            policy,
            stats: IndexStats::default(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn used_count(&self) -> usize {
        self.used_count
    }

    pub fn tombstone_count(&self) -> usize {
        self.tombstone_count
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn policy(&self) -> LoadPolicy {
        self.policy
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    #[inline]
    fn hash_at(&self, slot: usize) -> u64 {
        self.buckets[slot >> BUCKET_SHIFT].hash[slot & BUCKET_MASK]
    }

    #[inline]
    fn index_at(&self, slot: usize) -> isize {
        self.buckets[slot >> BUCKET_SHIFT].index[slot & BUCKET_MASK]
    }

    #[inline]
    fn set(&mut self, slot: usize, hash: u64, index: isize) {
        let b = &mut self.buckets[slot >> BUCKET_SHIFT];
        b.hash[slot & BUCKET_MASK] = hash;
        b.index[slot & BUCKET_MASK] = index;
    }

    /// Locate a stored entry. `eq` is called with the record position of
    /// every entry whose stored hash matches.
    pub fn find<F>(&self, hash: u64, mut eq: F) -> Option<(usize, usize)>
    where
        F: FnMut(usize) -> bool,
    {
        debug_assert!(hash >= 2);
        for slot in ProbeSeq::new(hash, self.slot_count) {
            match self.hash_at(slot) {
                HASH_EMPTY => return None,
                h if h == hash => {
                    let index = self.index_at(slot) as usize;
                    if eq(index) {
                        return Some((slot, index));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Probe for `hash` as an insert would: report the existing entry, or
    /// the slot a new entry should occupy.
    pub fn probe_insert<F>(&self, hash: u64, mut eq: F) -> Probe
    where
        F: FnMut(usize) -> bool,
    {
        debug_assert!(hash >= 2);
        let mut tombstone = None;
        for slot in ProbeSeq::new(hash, self.slot_count) {
            match self.hash_at(slot) {
                HASH_EMPTY => {
                    return Probe::Vacant {
                        slot: tombstone.unwrap_or(slot),
                    }
                }
                HASH_DELETED => {
                    if tombstone.is_none() {
                        tombstone = Some(slot);
                    }
                }
                h if h == hash => {
                    let index = self.index_at(slot) as usize;
                    if eq(index) {
                        return Probe::Found { slot, index };
                    }
                }
                _ => {}
            }
        }
        // Every slot was visited without meeting an empty one; the used
        // threshold keeps live entries below the slot count, so a tombstone
        // must have been seen.
        match tombstone {
            Some(slot) => Probe::Vacant { slot },
            None => panic!("hash index has neither empty slots nor tombstones"),
        }
    }

    /// Store `(hash, index)` in a slot returned by `probe_insert`.
    pub fn occupy(&mut self, slot: usize, hash: u64, index: usize) {
        match self.hash_at(slot) {
            HASH_EMPTY => {}
            HASH_DELETED => self.tombstone_count -= 1,
            h => panic!("slot {slot} is occupied (hash {h:#x})"),
        }
        self.set(slot, hash, index as isize);
        self.used_count += 1;
    }

    /// Turn an occupied slot into a tombstone.
    pub fn remove_at(&mut self, slot: usize) {
        debug_assert!(self.index_at(slot) >= 0, "slot {slot} is not occupied");
        self.set(slot, HASH_DELETED, INDEX_DELETED);
        self.used_count -= 1;
        self.tombstone_count += 1;
    }

    /// Repoint the entry with stored `hash` at record `from` to record `to`.
    /// Used after a swap-delete moved the last record.
    pub fn patch(&mut self, hash: u64, from: usize, to: usize) {
        let found = self.find(hash, |i| i == from);
        let Some((slot, _)) = found else {
            panic!("no index entry for moved record {from}");
        };
        self.buckets[slot >> BUCKET_SHIFT].index[slot & BUCKET_MASK] = to as isize;
    }

    /// True when the next insert must be preceded by a grow.
    pub fn needs_grow(&self) -> bool {
        self.used_count >= self.thresholds.used
    }

    /// Copy every live entry into a fresh table of `slot_count` slots, with
    /// the same seed and policy.
    pub fn rebuilt(&self, slot_count: usize) -> Result<Self> {
        let mut t = Self::try_new(slot_count, self.seed, self.policy)?;
        debug_assert!(self.used_count < t.slot_count);
        for b in &self.buckets {
            for j in 0..BUCKET_LEN {
                if b.index[j] < 0 {
                    continue;
                }
                let hash = b.hash[j];
                let slot = ProbeSeq::new(hash, t.slot_count)
                    .find(|&s| t.hash_at(s) == HASH_EMPTY);
                let Some(slot) = slot else {
                    panic!("rebuilt table of {slot_count} slots overflowed");
                };
                t.set(slot, hash, b.index[j]);
            }
        }
        t.used_count = self.used_count;
        t.stats = self.stats;
        Ok(t)
    }

    /// Double the table.
    pub fn try_grow(&mut self) -> Result<()> {
        let to = self.slot_count.checked_mul(2).ok_or(Error::CapacityOverflow)?;
        let mut t = self.rebuilt(to)?;
        t.stats.grows += 1;
        debug!(
            from = self.slot_count,
            to,
            used = self.used_count,
            tombstones = self.tombstone_count,
            "hash index grow"
        );
        *self = t;
        Ok(())
    }

    /// Shrink or rebuild in place after a delete, if the thresholds call for
    /// it. Allocation failure leaves the current table, which stays valid.
    pub fn after_delete(&mut self) {
        let shrink = self.used_count < self.thresholds.shrink && self.slot_count > BUCKET_LEN;
        let rebuild = self.tombstone_count > self.thresholds.tombstone;
        let to = match (shrink, rebuild) {
            (true, _) => self.slot_count >> 1,
            (false, true) => self.slot_count,
            (false, false) => return,
        };
        match self.rebuilt(to) {
            Ok(mut t) => {
                if shrink {
                    t.stats.shrinks += 1;
                } else {
                    t.stats.rebuilds += 1;
                }
                debug!(
                    from = self.slot_count,
                    to,
                    used = self.used_count,
                    tombstones = self.tombstone_count,
                    "hash index {}",
                    if shrink { "shrink" } else { "rebuild" }
                );
                *self = t;
            }
            Err(e) => {
                debug!(error = %e, "hash index maintenance skipped");
            }
        }
    }

    /// Live `(slot, hash, record index)` triples in slot order.
    pub fn live(&self) -> impl Iterator<Item = (usize, u64, usize)> + '_ {
        self.buckets.iter().enumerate().flat_map(|(bi, b)| {
            (0..BUCKET_LEN).filter_map(move |j| {
                (b.index[j] >= 0).then(|| ((bi << BUCKET_SHIFT) + j, b.hash[j], b.index[j] as usize))
            })
        })
    }
}
