// ArrayMap and GrowArray integration suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Round-trip: after put(k, v) and no later put/delete of k, get(k) == v.
// - Deletion: after delete(k), get_checked(k) is None until k is re-put.
// - Cardinality: len() equals the number of distinct live keys.
// - Growth and shrink: observable contents never depend on how many
//   grow/shrink/rebuild events happened.
use arrmap::{ArrayMap, Error, FixedSeed, GrowArray, HashKey, LcgSeed, LoadPolicy};

// Test: the integer walkthrough.
// Assumes: default value is -1.
// Verifies: hits, misses, partial deletion and full deletion.
#[test]
fn even_keys_walkthrough() {
    let mut m: ArrayMap<i32, i32> = ArrayMap::with_default(-1);
    for k in (0..100).step_by(2) {
        m.put(k, k * 3);
    }
    assert_eq!(*m.get(&50), 150);
    assert_eq!(*m.get(&51), -1);
    for k in (0..100).filter(|k| k % 4 == 2) {
        m.delete(&k);
    }
    assert_eq!(*m.get(&2), -1);
    assert_eq!(*m.get(&4), 12);
    for k in (0..100).step_by(4) {
        m.delete(&k);
    }
    assert_eq!(m.len(), 0);
}

// Test: growth correctness.
// Assumes: nothing about the number of grow events.
// Verifies: N sequential inserts give len N and every key retrievable.
#[test]
fn many_inserts_all_retrievable() {
    let mut m: ArrayMap<u64, u64> = ArrayMap::new();
    for k in 0..50_000u64 {
        assert_eq!(m.put(k, k ^ 0xabcd), None);
    }
    assert_eq!(m.len(), 50_000);
    for k in 0..50_000u64 {
        assert_eq!(m.get_checked(&k), Some(&(k ^ 0xabcd)));
    }
    assert!(m.index_stats().grows > 0);
    assert!(m.slot_count().is_power_of_two());
}

// Test: shrink/rebuild safety.
// Assumes: deleting most keys triggers shrink and in-place rebuilds.
// Verifies: the surviving key/value set matches a fresh map built from
// the same final insertions.
#[test]
fn delete_down_then_reinsert_matches_fresh() {
    let mut m: ArrayMap<u32, u32> = ArrayMap::new();
    for k in 0..10_000 {
        m.put(k, k);
    }
    for k in 0..10_000 {
        if k % 97 != 0 {
            assert!(m.delete(&k));
        }
    }
    assert!(m.index_stats().shrinks > 0);
    for k in 20_000..20_500 {
        m.put(k, k + 1);
    }

    let mut fresh: ArrayMap<u32, u32> = ArrayMap::new();
    for k in (0..10_000).filter(|k| k % 97 == 0) {
        fresh.put(k, k);
    }
    for k in 20_000..20_500 {
        fresh.put(k, k + 1);
    }
    assert_eq!(m.len(), fresh.len());
    for (k, v) in fresh.iter() {
        assert_eq!(m.get_checked(k), Some(v));
    }
}

// Test: interleaved delete/insert churn at a steady size.
// Assumes: each delete is followed by an insert of a brand-new key, so
// tombstones accumulate while the live count stays flat.
// Verifies: in-place rebuilds fire, the table never resizes, and contents
// match a std HashMap model.
#[test]
fn churn_triggers_in_place_rebuilds() {
    let mut m: ArrayMap<u64, u64, LcgSeed> = ArrayMap::with_seed_source(0, LcgSeed::new(9));
    let mut model = std::collections::HashMap::new();
    for k in 0..600u64 {
        m.put(k, k);
        model.insert(k, k);
    }
    let slots = m.slot_count();
    let mut next = 1_000_000u64;
    for _ in 0..4 {
        let live: Vec<u64> = m.keys().copied().collect();
        for k in live {
            assert!(m.delete(&k));
            model.remove(&k);
            m.put(next, next / 2);
            model.insert(next, next / 2);
            next += 1;
        }
    }
    assert_eq!(m.len(), 600);
    assert_eq!(m.slot_count(), slots);
    assert!(m.index_stats().rebuilds > 0);
    assert_eq!(m.index_stats().shrinks, 0);
    for (k, v) in &model {
        assert_eq!(m.get_checked(k), Some(v));
    }
}

// Test: every key hashing to the same value.
// Assumes: equality is the only thing separating keys.
// Verifies: lookups terminate and resolve correctly.
#[test]
fn full_collision_keys() {
    #[derive(PartialEq, Eq, Debug)]
    struct Same(u32);
    impl HashKey for Same {
        fn hash_key(&self, _seed: u64) -> u64 {
            1
        }
    }

    let mut m: ArrayMap<Same, u32> = ArrayMap::new();
    for i in 0..200 {
        m.put(Same(i), i);
    }
    for i in (0..200).rev().step_by(3) {
        assert!(m.delete(&Same(i)));
    }
    for i in 0..200 {
        assert_eq!(m.contains_key(&Same(i)), (199 - i) % 3 != 0);
    }
    assert_eq!(m.get_checked(&Same(1000)), None);
}

// Test: seeds are drawn once per table.
// Assumes: FixedSeed hands out the same seed every time.
// Verifies: the seed survives growth and is redrawn after clear.
#[test]
fn seed_is_kept_across_growth() {
    let mut m: ArrayMap<u16, (), FixedSeed> = ArrayMap::with_seed_source((), FixedSeed(0x5eed));
    m.put(1, ());
    assert_eq!(m.seed(), Some(0x5eed));
    for k in 0..1000 {
        m.put(k, ());
    }
    assert_eq!(m.seed(), Some(0x5eed));

    let mut l: ArrayMap<u16, (), LcgSeed> = ArrayMap::with_seed_source((), LcgSeed::new(4));
    l.put(1, ());
    let first = l.seed();
    l.clear();
    l.put(1, ());
    assert_ne!(l.seed(), first);
}

// Test: load policy validation and use.
// Assumes: thresholds are in sixteenths.
// Verifies: invalid policies (including a zero tombstone threshold) are
// rejected; a lower grow threshold yields a larger table for the same
// contents.
#[test]
fn load_policy() {
    assert!(matches!(LoadPolicy::new(13, 3, 4), Err(Error::InvalidPolicy(_))));
    assert!(matches!(LoadPolicy::new(12, 0, 1), Err(Error::InvalidPolicy(_))));
    let sparse = LoadPolicy::new(6, 2, 2).unwrap();
    let mut a: ArrayMap<u32, u32> = ArrayMap::with_policy(0, Default::default(), sparse);
    let mut b: ArrayMap<u32, u32> = ArrayMap::new();
    for k in 0..3000 {
        a.put(k, k);
        b.put(k, k);
    }
    assert!(a.slot_count() > b.slot_count());
    assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
}

// Test: GrowArray basics through the public surface.
// Verifies: push/pop, swap-delete, range delete and error reporting.
#[test]
fn grow_array_operations() {
    let mut a: GrowArray<u32> = GrowArray::new();
    assert_eq!(a.pop(), Err(Error::Empty));
    for i in 0..10 {
        a.push(i);
    }
    assert_eq!(a.len(), 10);
    assert!(a.capacity() >= 10);
    assert_eq!(a.delete_swap(0), Ok(0));
    assert_eq!(a[0], 9);
    a.delete_range(1, 4).unwrap();
    assert_eq!(a.as_slice(), &[9, 5, 6, 7, 8]);
    assert_eq!(a.pop(), Ok(8));
    assert_eq!(a.delete(10), Err(Error::OutOfBounds { index: 10, len: 4 }));
    let total: u32 = a.iter().sum();
    assert_eq!(total, 27);
}

// Test: maps move across threads when their parts allow it.
// Verifies: the default seed source keeps maps Send and Sync.
#[test]
fn maps_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ArrayMap<u64, String>>();
    assert_send_sync::<arrmap::OwnedStrMap<u64>>();
    assert_send_sync::<arrmap::ArenaStrMap<u64>>();
    assert_send_sync::<GrowArray<u8>>();

    let mut m: ArrayMap<u64, u64> = ArrayMap::new();
    m.put(1, 2);
    let h = std::thread::spawn(move || *m.get(&1));
    assert_eq!(h.join().unwrap(), 2);
}
