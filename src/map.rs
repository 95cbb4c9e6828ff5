//! ArrayMap: a hash map whose entries live densely, in insertion order, in a
//! [`GrowArray`], with a [`HashIndex`] mapping key hashes to positions.
//!
//! Deletion is swap-with-last, so positions are only stable until the next
//! delete. A missing key reads as the map's default value.

use crate::array::GrowArray;
use crate::error::{infallible, Result};
use crate::hash::HashKey;
use crate::index::{stored_hash, HashIndex, IndexStats, LoadPolicy, Probe, BUCKET_LEN};
use crate::seed::{GlobalSeed, SeedSource};
use core::borrow::Borrow;
use core::fmt;

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

/// Outcome of [`Table::try_slot`].
pub(crate) enum Slot {
    Occupied(usize),
    Vacant { slot: usize, hash: u64 },
}

/// Records plus index, shared by every map flavour. Key semantics (hashing,
/// equality, key materialization) are supplied by the caller.
#[derive(Clone, Debug)]
pub(crate) struct Table<K, V> {
    pub(crate) records: GrowArray<Entry<K, V>>,
    pub(crate) index: Option<HashIndex>,
    policy: LoadPolicy,
}

impl<K, V> Table<K, V> {
    pub(crate) const fn new(policy: LoadPolicy) -> Self {
        Self {
            records: GrowArray::new(),
            index: None,
            policy,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn find<H, F>(&self, hash_fn: H, mut eq: F) -> Option<usize>
    where
        H: FnOnce(u64) -> u64,
        F: FnMut(&K) -> bool,
    {
        let index = self.index.as_ref()?;
        let hash = stored_hash(hash_fn(index.seed()));
        let records = &self.records;
        index.find(hash, |i| eq(&records[i].key)).map(|(_, i)| i)
    }

    /// Create or grow the index as needed and probe for a key. A vacant
    /// result has record capacity reserved, so [`Table::fill`] cannot fail.
    pub(crate) fn try_slot<S, H, F>(&mut self, seeds: &S, hash_fn: H, mut eq: F) -> Result<Slot>
    where
        S: SeedSource,
        H: FnOnce(u64) -> u64,
        F: FnMut(&K) -> bool,
    {
        let Self {
            records,
            index,
            policy,
        } = self;
        let index = match index {
            Some(ix) => {
                if ix.needs_grow() {
                    ix.try_grow()?;
                }
                ix
            }
            None => index.insert(HashIndex::try_new(BUCKET_LEN, seeds.next_seed(), *policy)?),
        };

        let hash = stored_hash(hash_fn(index.seed()));
        match index.probe_insert(hash, |i| eq(&records[i].key)) {
            Probe::Found { index: i, .. } => Ok(Slot::Occupied(i)),
            Probe::Vacant { slot } => {
                records.try_set_capacity(records.len() + 1)?;
                Ok(Slot::Vacant { slot, hash })
            }
        }
    }

    /// Append a record into a slot returned by [`Table::try_slot`].
    pub(crate) fn fill(&mut self, slot: usize, hash: u64, key: K, value: V) -> usize {
        let i = self.records.len();
        self.records.push(Entry { key, value, hash });
        match self.index.as_mut() {
            Some(ix) => ix.occupy(slot, hash, i),
            None => unreachable!("vacant slot without an index"),
        }
        i
    }

    pub(crate) fn remove<H, F>(&mut self, hash_fn: H, mut eq: F) -> Option<Entry<K, V>>
    where
        H: FnOnce(u64) -> u64,
        F: FnMut(&K) -> bool,
    {
        let Self { records, index, .. } = self;
        let index = index.as_mut()?;
        let hash = stored_hash(hash_fn(index.seed()));
        let (slot, i) = index.find(hash, |i| eq(&records[i].key))?;

        index.remove_at(slot);
        let last = records.len() - 1;
        let entry = match records.delete_swap(i) {
            Ok(e) => e,
            Err(e) => unreachable!("index points past the records: {e}"),
        };
        if i != last {
            index.patch(records[i].hash, last, i);
        }
        index.after_delete();
        Some(entry)
    }

    pub(crate) fn clear(&mut self) {
        self.records.free();
        self.index = None;
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.index.as_ref().map_or(0, HashIndex::slot_count)
    }

    pub(crate) fn stats(&self) -> IndexStats {
        self.index.as_ref().map(HashIndex::stats).unwrap_or_default()
    }

    pub(crate) fn seed(&self) -> Option<u64> {
        self.index.as_ref().map(HashIndex::seed)
    }

    /// Panics if records and index disagree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let Some(ix) = &self.index else {
            assert!(self.records.is_empty());
            return;
        };
        let th = ix.thresholds();
        assert_eq!(ix.used_count(), self.records.len());
        assert!(ix.used_count() <= th.used, "{} > {}", ix.used_count(), th.used);
        assert!(ix.tombstone_count() <= th.tombstone);
        assert!(ix.used_count() + ix.tombstone_count() < ix.slot_count());
        let mut seen = vec![false; self.records.len()];
        for (_, h, i) in ix.live() {
            assert!(!seen[i], "record {i} indexed twice");
            seen[i] = true;
            assert_eq!(self.records[i].hash, h);
        }
        assert!(seen.iter().all(|&b| b));
    }
}

/// Hash map over [`HashKey`] keys with dense, ordered storage.
///
/// `get` on a missing key returns the map's default value rather than
/// `None`; use [`ArrayMap::get_checked`] to distinguish.
pub struct ArrayMap<K, V, S = GlobalSeed> {
    table: Table<K, V>,
    default: V,
    seeds: S,
}

impl<K, V: Default> ArrayMap<K, V> {
    pub fn new() -> Self {
        Self::with_default(V::default())
    }

    /// Empty map with record storage for `n` entries.
    pub fn with_capacity(n: usize) -> Self {
        let mut m = Self::new();
        m.table.records.set_capacity(n);
        m
    }
}

impl<K, V: Default> Default for ArrayMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ArrayMap<K, V> {
    pub fn with_default(default: V) -> Self {
        Self::with_seed_source(default, GlobalSeed)
    }
}

/// Iterator over `(&K, &V)` in record order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in record order.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &mut e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V, S> ArrayMap<K, V, S> {
    pub fn with_seed_source(default: V, seeds: S) -> Self {
        Self::with_policy(default, seeds, LoadPolicy::DEFAULT)
    }

    pub fn with_policy(default: V, seeds: S, policy: LoadPolicy) -> Self {
        Self {
            table: Table::new(policy),
            default,
            seeds,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record capacity.
    pub fn capacity(&self) -> usize {
        self.table.records.capacity()
    }

    /// Entry at record position `i`.
    pub fn entry_at(&self, i: usize) -> Option<(&K, &V)> {
        self.table.records.get(i).map(|e| (&e.key, &e.value))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.records.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.records.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> + '_ {
        self.table.records.iter().map(|e| &e.key)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.table.records.iter().map(|e| &e.value)
    }

    /// Value returned by `get` for missing keys.
    pub fn default_value(&self) -> &V {
        &self.default
    }

    pub fn set_default(&mut self, default: V) {
        self.default = default;
    }

    /// Drop every entry and the index. The next insert creates a fresh table
    /// with a newly drawn seed.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Slots in the current index table; 0 before the first insert.
    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    pub fn index_stats(&self) -> IndexStats {
        self.table.stats()
    }

    /// Seed of the current index table, if one exists.
    pub fn seed(&self) -> Option<u64> {
        self.table.seed()
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.table.assert_consistent();
    }
}

impl<K, V, S> ArrayMap<K, V, S>
where
    K: HashKey + Eq,
    S: SeedSource,
{
    /// Insert or overwrite; returns the previous value for an existing key.
    pub fn try_put(&mut self, key: K, value: V) -> Result<Option<V>> {
        let slot = self
            .table
            .try_slot(&self.seeds, |seed| key.hash_key(seed), |k| *k == key)?;
        match slot {
            Slot::Occupied(i) => Ok(Some(core::mem::replace(
                &mut self.table.records[i].value,
                value,
            ))),
            Slot::Vacant { slot, hash } => {
                self.table.fill(slot, hash, key, value);
                Ok(None)
            }
        }
    }

    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        infallible(self.try_put(key, value))
    }

    /// Record position of `q`.
    pub fn get_index<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.table
            .find(|seed| q.hash_key(seed), |k| k.borrow() == q)
    }

    /// Value for `q`, or the default value when absent.
    pub fn get<Q>(&self, q: &Q) -> &V
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.get_checked(q).unwrap_or(&self.default)
    }

    pub fn get_checked<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.get_index(q).map(|i| &self.table.records[i].value)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.get_index(q).and_then(|i| self.entry_at(i))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        let i = self.get_index(q)?;
        Some(&mut self.table.records[i].value)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.get_index(q).is_some()
    }

    /// Remove `q`; the last record moves into its position.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.table
            .remove(|seed| q.hash_key(seed), |k| k.borrow() == q)
            .map(|e| (e.key, e.value))
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    /// Remove `q`, reporting whether it was present.
    pub fn delete<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + HashKey + Eq,
    {
        self.remove_entry(q).is_some()
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for ArrayMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            default: self.default.clone(),
            seeds: self.seeds.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ArrayMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for ArrayMap<K, V, S>
where
    K: HashKey + Eq,
    S: SeedSource,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ArrayMap<K, V>
where
    K: HashKey + Eq,
    V: Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut m = Self::new();
        m.extend(iter);
        m
    }
}

impl<'a, K, V, S> IntoIterator for &'a ArrayMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ArrayMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
