//! StringArena: append-only storage for interned map keys.
//!
//! Strings are carved from the end of the active block's free span. When a
//! string does not fit, the next block is allocated from a size-class
//! sequence (512, 512, 1024, 1024, 2048, ... capped at 1 MiB) so that a large
//! arena is made of O(log n) blocks. A string larger than the current class
//! gets a dedicated block of its own and the active block keeps its free
//! space. Individual strings are never freed; `reset` drops everything.

use crate::error::{Error, Result};
use core::fmt;
use tracing::trace;

pub const BLOCK_SIZE_MIN: usize = 512;
pub const BLOCK_SIZE_MAX: usize = 1 << 20;

/// Handle to a string stored in a [`StringArena`].
///
/// Handles carry the arena generation they were minted in; after a `reset`
/// they no longer resolve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ArenaStr {
    generation: u64,
    block: usize,
    offset: usize,
    len: usize,
}

impl ArenaStr {
    /// Length of the string in bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

enum Grown {
    Active(usize),
    Dedicated(ArenaStr),
}

/// Block-based store of NUL-terminated strings, addressed by [`ArenaStr`].
#[derive(Clone, Default)]
pub struct StringArena {
    // Blocks in allocation order; indices are stable until reset.
    blocks: Vec<Box<[u8]>>,
    active: Option<usize>,
    remaining: usize,
    class: u32,
    generation: u64,
}

fn try_alloc_block(size: usize) -> Result<Box<[u8]>> {
    let mut v: Vec<u8> = Vec::new();
    v.try_reserve_exact(size)
        .map_err(|_| Error::alloc_failed::<u8>(size))?;
    v.resize(size, 0);
    Ok(v.into_boxed_slice())
}

fn write_terminated(dst: &mut [u8], s: &str) {
    let n = s.len();
    dst[..n].copy_from_slice(s.as_bytes());
    dst[n] = 0;
}

impl StringArena {
    pub const fn new() -> Self {
        Self {
            blocks: Vec::new(),
            active: None,
            remaining: 0,
            class: 0,
            generation: 0,
        }
    }

    /// Copy `s` into the arena and return a handle to the copy.
    ///
    /// The copy is NUL-terminated. Fails with [`Error::AllocFailed`] when a
    /// new block cannot be allocated, leaving the arena unchanged.
    pub fn try_intern(&mut self, s: &str) -> Result<ArenaStr> {
        // Each string is stored NUL-terminated.
        let need = s.len().checked_add(1).ok_or(Error::CapacityOverflow)?;
        let block = match self.active {
            Some(b) if need <= self.remaining => b,
            _ => match self.grow(s, need)? {
                Grown::Active(b) => b,
                Grown::Dedicated(h) => return Ok(h),
            },
        };

        debug_assert!(need <= self.remaining);
        let offset = self.remaining - need;
        self.remaining = offset;
        write_terminated(&mut self.blocks[block][offset..offset + need], s);
        Ok(ArenaStr {
            generation: self.generation,
            block,
            offset,
            len: s.len(),
        })
    }

    /// Like [`StringArena::try_intern`], aborting on allocation failure.
    pub fn intern(&mut self, s: &str) -> ArenaStr {
        crate::error::infallible(self.try_intern(s))
    }

    fn grow(&mut self, s: &str, need: usize) -> Result<Grown> {
        let block_size = BLOCK_SIZE_MIN << (self.class >> 1);
        self.blocks
            .try_reserve(1)
            .map_err(|_| Error::alloc_failed::<Box<[u8]>>(self.blocks.len() + 1))?;

        if need > block_size {
            let mut block = try_alloc_block(need)?;
            write_terminated(&mut block, s);
            let idx = self.blocks.len();
            self.blocks.push(block);
            self.advance_class(block_size);
            trace!(bytes = need, block = idx, "string arena: dedicated block");
            return Ok(Grown::Dedicated(ArenaStr {
                generation: self.generation,
                block: idx,
                offset: 0,
                len: s.len(),
            }));
        }

        let block = try_alloc_block(block_size)?;
        let idx = self.blocks.len();
        self.blocks.push(block);
        self.advance_class(block_size);
        self.active = Some(idx);
        self.remaining = block_size;
        trace!(bytes = block_size, block = idx, "string arena: new block");
        Ok(Grown::Active(idx))
    }

    // Dedicated blocks advance the class too.
    fn advance_class(&mut self, block_size: usize) {
        if block_size < BLOCK_SIZE_MAX {
            self.class += 1;
        }
    }

    /// Resolve a handle minted by this arena. Returns `None` for stale
    /// handles and for handles that do not land on this arena's text.
    pub fn get(&self, h: ArenaStr) -> Option<&str> {
        core::str::from_utf8(self.get_bytes(h)?).ok()
    }

    /// Text of a handle this arena minted since its last reset, without
    /// re-validating UTF-8.
    ///
    /// Panics if the handle is stale or out of range.
    pub(crate) fn get_minted(&self, h: ArenaStr) -> &str {
        let Some(bytes) = self.get_bytes(h) else {
            panic!("arena handle {h:?} does not resolve");
        };
        debug_assert!(core::str::from_utf8(bytes).is_ok());
        // SAFETY: a handle minted here spans exactly the bytes of the `&str`
        // copied in by `try_intern`, and blocks are never written again
        // until `reset`, which invalidates the handle's generation.
        unsafe { core::str::from_utf8_unchecked(bytes) }
    }

    /// Raw bytes of a handle, excluding the terminator.
    pub fn get_bytes(&self, h: ArenaStr) -> Option<&[u8]> {
        if h.generation != self.generation {
            return None;
        }
        self.blocks
            .get(h.block)?
            .get(h.offset..h.offset.checked_add(h.len)?)
    }

    /// Free every block. Handles minted before the reset stop resolving.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::new();
        self.generation = generation;
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Sizes of the allocated blocks, in allocation order.
    pub fn block_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks.iter().map(|b| b.len())
    }

    /// Free bytes left in the active block.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Total bytes held by all blocks, used or not.
    pub fn bytes_reserved(&self) -> usize {
        self.block_sizes().sum()
    }
}

impl fmt::Debug for StringArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringArena")
            .field("blocks", &self.blocks.len())
            .field("bytes_reserved", &self.bytes_reserved())
            .field("remaining", &self.remaining)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_resolve() {
        let mut a = StringArena::new();
        let h1 = a.intern("hello");
        let h2 = a.intern("");
        let h3 = a.intern("wörld");
        assert_eq!(a.get(h1), Some("hello"));
        assert_eq!(a.get(h2), Some(""));
        assert_eq!(a.get(h3), Some("wörld"));
        assert!(h2.is_empty());
        assert_eq!(h3.len(), "wörld".len());
        assert_eq!(a.block_count(), 1);
    }

    /// Strings are carved from the end of the free span, each followed by a
    /// terminator byte.
    #[test]
    fn carves_from_end_of_block() {
        let mut a = StringArena::new();
        let h = a.intern("abc");
        assert_eq!(h.offset, BLOCK_SIZE_MIN - 4);
        assert_eq!(a.remaining(), BLOCK_SIZE_MIN - 4);
        assert_eq!(a.blocks[0][BLOCK_SIZE_MIN - 1], 0);
        let h2 = a.intern("de");
        assert_eq!(h2.offset, BLOCK_SIZE_MIN - 7);
    }

    /// Block sizes follow the paired doubling sequence.
    #[test]
    fn block_size_classes_double_in_pairs() {
        let mut a = StringArena::new();
        let s = "x".repeat(BLOCK_SIZE_MIN - 1);
        for _ in 0..7 {
            a.intern(&s);
        }
        let sizes: Vec<usize> = a.block_sizes().collect();
        assert_eq!(sizes, vec![512, 512, 1024, 1024, 2048]);
        // Each 1024 block held two strings exactly; the 2048 block holds one.
        assert_eq!(a.remaining(), 2048 - 512);
    }

    /// An oversized string gets its own block and the active block keeps
    /// its free space.
    #[test]
    fn oversized_string_keeps_active_block() {
        let mut a = StringArena::new();
        let small = a.intern("x");
        let before = a.remaining();
        let big = "y".repeat(4000);
        let hb = a.intern(&big);
        assert_eq!(a.remaining(), before);
        assert_eq!(a.block_count(), 2);
        assert_eq!(a.get(hb), Some(big.as_str()));
        let next = a.intern("z");
        assert_eq!(next.block, small.block);
        assert_eq!(a.get(small), Some("x"));
    }

    #[test]
    fn minted_handles_resolve_without_checks() {
        let mut a = StringArena::new();
        let hs: Vec<_> = ["", "ä", "日本語", "x"].iter().map(|s| a.intern(s)).collect();
        let back: Vec<&str> = hs.iter().map(|&h| a.get_minted(h)).collect();
        assert_eq!(back, vec!["", "ä", "日本語", "x"]);
    }

    #[test]
    #[should_panic]
    fn minted_lookup_of_stale_handle_panics() {
        let mut a = StringArena::new();
        let h = a.intern("gone");
        a.reset();
        a.get_minted(h);
    }

    #[test]
    fn oversized_string_into_empty_arena() {
        let mut a = StringArena::new();
        let big = "q".repeat(600);
        let h = a.intern(&big);
        assert_eq!(a.block_sizes().collect::<Vec<_>>(), vec![601]);
        assert_eq!(a.remaining(), 0);
        assert_eq!(a.get(h), Some(big.as_str()));
        // Class advanced once; next regular block is still the minimum size.
        a.intern("r");
        assert_eq!(a.block_sizes().collect::<Vec<_>>(), vec![601, 512]);
    }

    #[test]
    fn block_size_is_capped() {
        let mut a = StringArena::new();
        a.class = 22;
        a.intern("x");
        assert_eq!(a.block_sizes().last(), Some(BLOCK_SIZE_MAX));
        assert_eq!(a.class, 22);
    }

    /// Reset frees everything and invalidates outstanding handles.
    #[test]
    fn reset_invalidates_handles() {
        let mut a = StringArena::new();
        let h = a.intern("gone");
        a.reset();
        assert_eq!(a.block_count(), 0);
        assert_eq!(a.remaining(), 0);
        assert_eq!(a.get(h), None);
        let h2 = a.intern("gone");
        assert_eq!(a.get(h2), Some("gone"));
        assert_ne!(h, h2);
    }

    /// Interning the same content twice stores two copies.
    #[test]
    fn no_deduplication() {
        let mut a = StringArena::new();
        let h1 = a.intern("dup");
        let h2 = a.intern("dup");
        assert_ne!(h1, h2);
        assert_eq!(a.remaining(), BLOCK_SIZE_MIN - 8);
    }
}
