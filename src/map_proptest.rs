#![cfg(test)]

// Property tests for ArrayMap and StrMap kept inside the crate so they can
// check index internals after every operation.

use crate::hash::{hash_str, HashKey};
use crate::map::ArrayMap;
use crate::seed::LcgSeed;
use crate::str_map::{ArenaStrMap, OwnedStrMap, StrMap};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl HashKey for Key {
    fn hash_key(&self, seed: u64) -> u64 {
        hash_str(&self.0, seed)
    }
}

// Key whose hash keeps only two bits, so most keys collide.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Clash(u16);
impl HashKey for Clash {
    fn hash_key(&self, _seed: u64) -> u64 {
        u64::from(self.0 & 3)
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Delete(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=40).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            4 => idx.clone().prop_map(OpI::Delete),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `put` returns the model's previous value; missing keys read as the default.
// - `delete` reports presence exactly when the model holds the key.
// - `iter` yields each live entry exactly once; key set equals the model's.
// - After every op the index agrees with the records: used count equals
//   length, every record is indexed once with its stored hash, and live
//   plus tombstoned slots stay below the slot count.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: ArrayMap<Key, i32, LcgSeed> = ArrayMap::with_seed_source(-7, LcgSeed::new(1));
        let mut model: HashMap<Key, i32> = HashMap::new();

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = key_from(&pool, i);
                    let prev = sut.put(k.clone(), v);
                    prop_assert_eq!(prev, model.insert(k, v));
                }
                OpI::Delete(i) => {
                    let k = key_from(&pool, i);
                    prop_assert_eq!(sut.delete(k.0.as_str()), model.remove(&k).is_some());
                }
                OpI::Get(i) => {
                    let k = key_from(&pool, i);
                    let want = model.get(&k).copied().unwrap_or(-7);
                    prop_assert_eq!(*sut.get(&k), want);
                    prop_assert_eq!(sut.get_checked(k.0.as_str()).copied(), model.get(&k).copied());
                }
                OpI::Contains(s) => {
                    prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&Key(s)));
                }
                OpI::Mutate(i, d) => {
                    let k = key_from(&pool, i);
                    match (sut.get_mut(&k), model.get_mut(&k)) {
                        (Some(a), Some(b)) => {
                            *a = a.wrapping_add(d);
                            *b = b.wrapping_add(d);
                        }
                        (None, None) => {}
                        (a, b) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", a, b),
                    }
                }
                OpI::Iterate => {
                    let mut seen = BTreeSet::new();
                    for (k, v) in sut.iter() {
                        prop_assert!(seen.insert(k.clone()), "duplicate key in iteration");
                        prop_assert_eq!(Some(v), model.get(k));
                    }
                    prop_assert_eq!(seen.len(), model.len());
                }
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.slot_count(), 0);
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            sut.assert_consistent();
        }
    }
}

// Property: heavily colliding keys still behave like a map, and deleting down
// and re-inserting matches a fresh map built from the same final inserts.
proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_colliding_keys(ops in proptest::collection::vec((0u16..64, any::<bool>()), 1..400)) {
        let mut sut: ArrayMap<Clash, u32> = ArrayMap::with_default(u32::MAX);
        let mut model: HashMap<Clash, u32> = HashMap::new();
        for (step, (k, put)) in ops.into_iter().enumerate() {
            let k = Clash(k);
            if put {
                prop_assert_eq!(sut.put(k, step as u32), model.insert(k, step as u32));
            } else {
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
            }
            sut.assert_consistent();
        }
        let mut fresh: ArrayMap<Clash, u32> = ArrayMap::with_default(u32::MAX);
        for (k, v) in sut.iter() {
            fresh.put(*k, *v);
        }
        for k in 0..64 {
            let k = Clash(k);
            prop_assert_eq!(sut.get(&k), fresh.get(&k));
            prop_assert_eq!(sut.get_checked(&k), model.get(&k));
        }
    }
}

// Property: owned-copy and arena-interned string maps agree with the model
// and with each other, including across clear.
proptest! {
    #![proptest_config(ProptestConfig { cases: 48, .. ProptestConfig::default() })]
    #[test]
    fn prop_string_modes((pool, ops) in arb_scenario()) {
        let mut owned: OwnedStrMap<i32> = StrMap::new();
        let mut arena: ArenaStrMap<i32> = StrMap::new();
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            match op {
                OpI::Put(i, v) => {
                    let k = &pool[i];
                    let want = model.insert(k.clone(), v);
                    prop_assert_eq!(owned.put(k, v), want);
                    prop_assert_eq!(arena.put(k, v), want);
                }
                OpI::Delete(i) => {
                    let want = model.remove(&pool[i]).is_some();
                    prop_assert_eq!(owned.delete(&pool[i]), want);
                    prop_assert_eq!(arena.delete(&pool[i]), want);
                }
                OpI::Get(i) | OpI::Mutate(i, _) => {
                    let want = model.get(&pool[i]).copied().unwrap_or(0);
                    prop_assert_eq!(*owned.get(&pool[i]), want);
                    prop_assert_eq!(*arena.get(&pool[i]), want);
                }
                OpI::Contains(s) => {
                    prop_assert_eq!(owned.contains_key(&s), model.contains_key(&s));
                    prop_assert_eq!(arena.contains_key(&s), model.contains_key(&s));
                }
                OpI::Iterate => {
                    let a: Vec<(&str, &i32)> = owned.iter().collect();
                    let b: Vec<(&str, &i32)> = arena.iter().collect();
                    prop_assert_eq!(a, b);
                }
                OpI::Clear => {
                    owned.clear();
                    arena.clear();
                    model.clear();
                    prop_assert_eq!(arena.arena().block_count(), 0);
                }
            }
            prop_assert_eq!(owned.len(), model.len());
            prop_assert_eq!(arena.len(), model.len());
            arena.assert_consistent();
        }
    }
}
