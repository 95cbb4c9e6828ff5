//! StrMap: maps keyed by string content.
//!
//! The key representation picks how the map holds key text:
//! - `&'a str` ([`BorrowedStrMap`]): the caller's strings are referenced and
//!   must outlive the map.
//! - `Box<str>` ([`OwnedStrMap`]): each new key is copied on insert and
//!   freed with its record.
//! - [`ArenaStr`] ([`ArenaStrMap`]): each new key is copied into the map's
//!   [`StringArena`]. Deleting a key does not reclaim its bytes and
//!   re-inserting stores a second copy; `clear` frees the whole arena.
//!
//! Overwriting an existing key keeps the stored key; the incoming text is
//! not copied. Lookups always take `&str`.

use crate::arena::{ArenaStr, StringArena};
use crate::error::{infallible, Error, Result};
use crate::hash::hash_str;
use crate::index::{IndexStats, LoadPolicy};
use crate::map::{Entry, Slot, Table};
use crate::seed::{GlobalSeed, SeedSource};
use core::fmt;

mod sealed {
    use crate::arena::{ArenaStr, StringArena};

    pub trait Sealed {
        /// Key text; `arena` is the owning map's arena.
        fn resolve<'a>(&'a self, arena: &'a StringArena) -> &'a str;

        fn matches(&self, arena: &StringArena, q: &str) -> bool {
            self.resolve(arena) == q
        }
    }

    impl Sealed for &str {
        #[inline]
        fn resolve<'a>(&'a self, _arena: &'a StringArena) -> &'a str {
            self
        }
    }

    impl Sealed for Box<str> {
        #[inline]
        fn resolve<'a>(&'a self, _arena: &'a StringArena) -> &'a str {
            self
        }
    }

    // Keys of an arena map are only ever minted by that map's arena, and
    // `clear` resets the arena together with the table.
    impl Sealed for ArenaStr {
        #[inline]
        fn resolve<'a>(&'a self, arena: &'a StringArena) -> &'a str {
            arena.get_minted(*self)
        }

        #[inline]
        fn matches(&self, arena: &StringArena, q: &str) -> bool {
            arena.get_bytes(*self) == Some(q.as_bytes())
        }
    }
}

use sealed::Sealed as _;

/// Key representations usable in a [`StrMap`]: `&str`, `Box<str>` and
/// [`ArenaStr`].
pub trait StrKey: sealed::Sealed {}

impl StrKey for &str {}
impl StrKey for Box<str> {}
impl StrKey for ArenaStr {}

pub struct StrMap<K, V, S = GlobalSeed> {
    table: Table<K, V>,
    arena: StringArena,
    default: V,
    seeds: S,
}

/// Keys borrowed from the caller.
pub type BorrowedStrMap<'a, V, S = GlobalSeed> = StrMap<&'a str, V, S>;
/// Keys copied into individually owned boxes.
pub type OwnedStrMap<V, S = GlobalSeed> = StrMap<Box<str>, V, S>;
/// Keys copied into a map-owned arena.
pub type ArenaStrMap<V, S = GlobalSeed> = StrMap<ArenaStr, V, S>;

impl<K: StrKey, V: Default> StrMap<K, V> {
    pub fn new() -> Self {
        Self::with_default(V::default())
    }

    pub fn with_capacity(n: usize) -> Self {
        let mut m = Self::new();
        m.table.records.set_capacity(n);
        m
    }
}

impl<K: StrKey, V: Default> Default for StrMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: StrKey, V> StrMap<K, V> {
    pub fn with_default(default: V) -> Self {
        Self::with_seed_source(default, GlobalSeed)
    }
}

/// Iterator over `(&str, &V)` in record order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Entry<K, V>>,
    arena: &'a StringArena,
}

impl<'a, K: StrKey, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a str, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.it.next().map(|e| (e.key.resolve(arena), &e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K: StrKey, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&str, &mut V)` in record order.
pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Entry<K, V>>,
    arena: &'a StringArena,
}

impl<'a, K: StrKey, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a str, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.it.next().map(|e| (e.key.resolve(arena), &mut e.value))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K: StrKey, V> ExactSizeIterator for IterMut<'_, K, V> {}

fn try_box_str(s: &str) -> Result<Box<str>> {
    let mut b = String::new();
    b.try_reserve_exact(s.len())
        .map_err(|_| Error::alloc_failed::<u8>(s.len()))?;
    b.push_str(s);
    Ok(b.into_boxed_str())
}

impl<K: StrKey, V, S> StrMap<K, V, S> {
    pub fn with_seed_source(default: V, seeds: S) -> Self {
        Self::with_policy(default, seeds, LoadPolicy::DEFAULT)
    }

    pub fn with_policy(default: V, seeds: S, policy: LoadPolicy) -> Self {
        Self {
            table: Table::new(policy),
            arena: StringArena::new(),
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

    pub fn capacity(&self) -> usize {
        self.table.records.capacity()
    }

    pub fn get_index(&self, key: &str) -> Option<usize> {
        let arena = &self.arena;
        self.table
            .find(|seed| hash_str(key, seed), |k| k.matches(arena, key))
    }

    /// Value for `key`, or the default value when absent.
    pub fn get(&self, key: &str) -> &V {
        self.get_checked(key).unwrap_or(&self.default)
    }

    pub fn get_checked(&self, key: &str) -> Option<&V> {
        self.get_index(key).map(|i| &self.table.records[i].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let i = self.get_index(key)?;
        Some(&mut self.table.records[i].value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get_index(key).is_some()
    }

    /// Entry at record position `i`.
    pub fn entry_at(&self, i: usize) -> Option<(&str, &V)> {
        self.table
            .records
            .get(i)
            .map(|e| (e.key.resolve(&self.arena), &e.value))
    }

    /// Remove `key`, returning the stored key and its value. The last record
    /// moves into the vacated position.
    pub fn remove_entry(&mut self, key: &str) -> Option<(K, V)> {
        let arena = &self.arena;
        self.table
            .remove(|seed| hash_str(key, seed), |k| k.matches(arena, key))
            .map(|e| (e.key, e.value))
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, reporting whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.records.iter(),
            arena: &self.arena,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.records.iter_mut(),
            arena: &self.arena,
        }
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &V> + '_ {
        self.table.records.iter().map(|e| &e.value)
    }

    pub fn default_value(&self) -> &V {
        &self.default
    }

    pub fn set_default(&mut self, default: V) {
        self.default = default;
    }

    /// Drop every entry, the index and any interned key text.
    pub fn clear(&mut self) {
        self.table.clear();
        self.arena.reset();
    }

    pub fn slot_count(&self) -> usize {
        self.table.slot_count()
    }

    pub fn index_stats(&self) -> IndexStats {
        self.table.stats()
    }

    pub fn seed(&self) -> Option<u64> {
        self.table.seed()
    }

    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.table.assert_consistent();
    }
}

impl<K: StrKey, V, S: SeedSource> StrMap<K, V, S> {
    /// Insert or overwrite. `make_key` materializes the stored key and runs
    /// only when `key` is new.
    fn try_put_with<F>(&mut self, key: &str, value: V, make_key: F) -> Result<Option<V>>
    where
        F: FnOnce(&mut StringArena) -> Result<K>,
    {
        let Self {
            table,
            arena,
            seeds,
            ..
        } = self;
        let slot = {
            let arena = &*arena;
            table.try_slot(&*seeds, |seed| hash_str(key, seed), |k| k.matches(arena, key))?
        };
        match slot {
            Slot::Occupied(i) => Ok(Some(core::mem::replace(
                &mut table.records[i].value,
                value,
            ))),
            Slot::Vacant { slot, hash } => {
                let k = make_key(arena)?;
                table.fill(slot, hash, k, value);
                Ok(None)
            }
        }
    }
}

impl<'a, V, S: SeedSource> StrMap<&'a str, V, S> {
    pub fn try_put(&mut self, key: &'a str, value: V) -> Result<Option<V>> {
        self.try_put_with(key, value, move |_| Ok(key))
    }

    pub fn put(&mut self, key: &'a str, value: V) -> Option<V> {
        infallible(self.try_put(key, value))
    }
}

impl<V, S: SeedSource> StrMap<Box<str>, V, S> {
    /// Insert or overwrite, copying `key` if it is new.
    pub fn try_put(&mut self, key: &str, value: V) -> Result<Option<V>> {
        self.try_put_with(key, value, |_| try_box_str(key))
    }

    pub fn put(&mut self, key: &str, value: V) -> Option<V> {
        infallible(self.try_put(key, value))
    }
}

impl<V, S: SeedSource> StrMap<ArenaStr, V, S> {
    /// Insert or overwrite, interning `key` if it is new.
    pub fn try_put(&mut self, key: &str, value: V) -> Result<Option<V>> {
        self.try_put_with(key, value, |arena| arena.try_intern(key))
    }

    pub fn put(&mut self, key: &str, value: V) -> Option<V> {
        infallible(self.try_put(key, value))
    }

    /// The arena holding this map's key text.
    pub fn arena(&self) -> &StringArena {
        &self.arena
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for StrMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            arena: self.arena.clone(),
            default: self.default.clone(),
            seeds: self.seeds.clone(),
        }
    }
}

impl<K: StrKey, V: fmt::Debug, S> fmt::Debug for StrMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K: StrKey, V, S> IntoIterator for &'a StrMap<K, V, S> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
