// StrMap integration suite.
//
// The three key representations share one facade; these tests pin down
// where their ownership behavior differs:
// - Borrowed keys reference caller text that must outlive the map.
// - Owned keys are copied once, on first insert, and freed on delete.
// - Arena keys are copied into the map's arena and only freed by clear.
use arrmap::{ArenaStrMap, BorrowedStrMap, OwnedStrMap, StrMap, StringArena};

// Test: the owned-copy walkthrough.
// Verifies: an overwrite keeps one entry holding the newest value.
#[test]
fn owned_bob_overwrite() {
    let mut m: OwnedStrMap<char> = StrMap::new();
    m.put("bob", 'h');
    m.put("bob", 'x');
    assert_eq!(m.len(), 1);
    assert_eq!(*m.get("bob"), 'x');
}

// Test: word counting over borrowed input.
// Assumes: the input outlives the map.
// Verifies: get-with-default plus put accumulates counts; iteration is in
// first-seen order.
#[test]
fn borrowed_word_count() {
    let text = String::from("the quick brown fox jumps over the lazy dog the end");
    let mut counts: BorrowedStrMap<'_, u32> = StrMap::new();
    for w in text.split(' ') {
        let n = *counts.get(w);
        counts.put(w, n + 1);
    }
    assert_eq!(*counts.get("the"), 3);
    assert_eq!(*counts.get("cat"), 0);
    assert_eq!(counts.len(), 9);
    let first: Vec<&str> = counts.keys().take(3).collect();
    assert_eq!(first, vec!["the", "quick", "brown"]);
}

// Test: keys built on the fly.
// Assumes: the caller's buffer is reused between inserts.
// Verifies: owned and arena maps keep their own copies.
#[test]
fn copies_survive_buffer_reuse() {
    let mut owned: OwnedStrMap<usize> = StrMap::new();
    let mut arena: ArenaStrMap<usize> = StrMap::new();
    let mut buf = String::new();
    for i in 0..1000 {
        buf.clear();
        buf.push_str("item/");
        buf.push_str(&i.to_string());
        owned.put(&buf, i);
        arena.put(&buf, i);
    }
    for i in (0..1000).step_by(37) {
        let k = format!("item/{i}");
        assert_eq!(owned.get_checked(&k), Some(&i));
        assert_eq!(arena.get_checked(&k), Some(&i));
    }
    assert!(arena.arena().block_count() > 1);
}

// Test: arena accounting across delete and clear.
// Verifies: delete never returns bytes; clear drops every block.
#[test]
fn arena_accounting() {
    let mut m: ArenaStrMap<u8> = StrMap::new();
    for i in 0..500 {
        m.put(&format!("{i:04}"), 1);
    }
    let reserved = m.arena().bytes_reserved();
    for i in 0..500 {
        assert!(m.delete(&format!("{i:04}")));
    }
    assert!(m.is_empty());
    assert_eq!(m.arena().bytes_reserved(), reserved);
    m.clear();
    assert_eq!(m.arena().bytes_reserved(), 0);
}

// Test: removing returns the stored key.
// Verifies: remove_entry hands back the owned key; the moved last record
// stays reachable.
#[test]
fn remove_entry_returns_key() {
    let mut m: OwnedStrMap<i32> = StrMap::new();
    m.put("a", 1);
    m.put("b", 2);
    m.put("c", 3);
    let (k, v) = m.remove_entry("a").unwrap();
    assert_eq!((&*k, v), ("a", 1));
    assert_eq!(m.entry_at(0), Some(("c", &3)));
    assert_eq!(*m.get("c"), 3);
    assert_eq!(m.remove("zzz"), None);
}

// Test: the arena used standalone.
// Verifies: handles resolve until reset, then stop resolving.
#[test]
fn standalone_arena() {
    let mut a = StringArena::new();
    let hs: Vec<_> = (0..100).map(|i| a.intern(&format!("s{i}"))).collect();
    for (i, h) in hs.iter().enumerate() {
        assert_eq!(a.get(*h), Some(format!("s{i}").as_str()));
    }
    a.reset();
    assert!(hs.iter().all(|h| a.get(*h).is_none()));
}
