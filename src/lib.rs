//! arrmap: growable arrays and insertion-ordered hash maps built from a
//! dense record array plus a bucketed open-addressing index.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small family of containers whose layers can be reasoned about
//!   one at a time.
//! - Layers:
//!   - GrowArray<T>: contiguous storage that doubles (minimum 4) only when
//!     an append would overflow, with O(1) swap-delete.
//!   - HashIndex: maps stored hashes to record positions. Buckets of 8
//!     slots (4 with `small-buckets`), quadratic probing over buckets,
//!     tombstones on delete, and grow/shrink/rebuild-in-place driven by a
//!     `LoadPolicy`.
//!   - ArrayMap<K, V, S>: a GrowArray of `(key, value, hash)` records plus a
//!     lazily created HashIndex. Missing keys read as a per-map default.
//!   - StrMap<K, V, S>: the same facade for string keys, with the key
//!     representation choosing the ownership mode: borrowed `&str`,
//!     owned `Box<str>`, or interned `ArenaStr` in a map-owned
//!     StringArena.
//!
//! Constraints
//! - Records are dense and in insertion order until a delete; delete moves
//!   the last record into the hole and patches its index slot.
//! - The index never hashes a key after insertion. Rebuilds reuse the
//!   stored hashes and the table seed.
//! - `used + tombstones < slot_count` for every table, so probes always
//!   meet an empty slot. Probe sequences are also bounded by `slot_count`.
//! - Hash values 0 and 1 are reserved for empty and deleted slots;
//!   computed hashes below 2 are nudged up by 2.
//!
//! Seeds
//! - Each table draws one seed from its `SeedSource` when first created
//!   and keeps it for life. The default `GlobalSeed` advances a
//!   process-wide LCG; `LcgSeed` and `FixedSeed` make layouts
//!   reproducible or let callers supply a strong seed.
//!
//! Errors
//! - `try_*` methods report allocation failure and capacity overflow as
//!   `Error`; the plain names abort through `handle_alloc_error` like
//!   `Vec` does. A missing key is never an error.
//!
//! Ownership
//! - Reads take `&self` and mutation `&mut self`; a reference into a map or
//!   array cannot outlive the next call that might relocate storage.
//! - Nothing here uses interior mutability except `LcgSeed`, so maps are
//!   `Send`/`Sync` whenever their key, value and seed types are.
//!
//! Notes and non-goals
//! - Hash values are not stable across crate versions; do not persist them.
//! - No concurrent mutation, no ordered iteration across deletes, no
//!   deduplication of interned strings.

pub mod arena;
pub mod array;
pub mod error;
pub mod hash;
pub mod index;
pub mod map;
mod map_proptest;
pub mod seed;
pub mod str_map;

// Public surface
pub use arena::{ArenaStr, StringArena};
pub use array::GrowArray;
pub use error::{Error, Result};
pub use hash::HashKey;
pub use index::{IndexStats, LoadPolicy};
pub use map::ArrayMap;
pub use seed::{FixedSeed, GlobalSeed, LcgSeed, SeedSource};
pub use str_map::{ArenaStrMap, BorrowedStrMap, OwnedStrMap, StrKey, StrMap};
