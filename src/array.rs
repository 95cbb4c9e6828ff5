//! GrowArray: the storage tier. A contiguous buffer that grows geometrically
//! (double, minimum 4) exactly when an append would exceed its capacity and
//! never shrinks on its own.
//!
//! Growth may relocate the buffer; since every mutating method takes
//! `&mut self`, the borrow checker rules out references that outlive it.

use crate::error::{infallible, Error, Result};
use core::ops::{Deref, DerefMut};

/// Smallest capacity allocated on first growth.
pub const MIN_CAPACITY: usize = 4;

/// Capacity after growing an array of capacity `cap` so that it can hold
/// `needed` elements.
#[inline]
pub fn grown_capacity(cap: usize, needed: usize) -> usize {
    if needed <= cap {
        return cap;
    }
    needed.max(cap.saturating_mul(2)).max(MIN_CAPACITY)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GrowArray<T> {
    buf: Vec<T>,
}

impl<T> Default for GrowArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GrowArray<T> {
    /// Empty array; nothing is allocated until the first append.
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Empty array with room for at least `n` elements.
    pub fn with_capacity(n: usize) -> Self {
        let mut a = Self::new();
        a.set_capacity(n);
        a
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Make room for `additional` more elements using the growth policy.
    fn try_grow_for(&mut self, additional: usize) -> Result<()> {
        let needed = self
            .buf
            .len()
            .checked_add(additional)
            .ok_or(Error::CapacityOverflow)?;
        self.try_set_capacity(needed)
    }

    /// Ensure capacity for at least `n` elements. Never shrinks.
    pub fn try_set_capacity(&mut self, n: usize) -> Result<()> {
        let cap = self.buf.capacity();
        if n <= cap {
            return Ok(());
        }
        let new_cap = grown_capacity(cap, n);
        self.buf
            .try_reserve_exact(new_cap - self.buf.len())
            .map_err(|_| Error::alloc_failed::<T>(new_cap))
    }

    pub fn set_capacity(&mut self, n: usize) {
        infallible(self.try_set_capacity(n))
    }

    pub fn try_push(&mut self, value: T) -> Result<()> {
        self.try_grow_for(1)?;
        self.buf.push(value);
        Ok(())
    }

    pub fn push(&mut self, value: T) {
        infallible(self.try_push(value))
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Result<T> {
        self.buf.pop().ok_or(Error::Empty)
    }

    pub fn last(&self) -> Option<&T> {
        self.buf.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.buf.last_mut()
    }

    /// Insert `value` at `index`, shifting later elements right.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<()> {
        let len = self.buf.len();
        if index > len {
            return Err(Error::OutOfBounds { index, len });
        }
        self.try_grow_for(1)?;
        self.buf.insert(index, value);
        Ok(())
    }

    pub fn insert(&mut self, index: usize, value: T) {
        infallible(self.try_insert(index, value))
    }

    /// Remove the element at `index`, shifting later elements left.
    pub fn delete(&mut self, index: usize) -> Result<T> {
        let len = self.buf.len();
        if index >= len {
            return Err(Error::OutOfBounds { index, len });
        }
        Ok(self.buf.remove(index))
    }

    /// Remove `n` elements starting at `index`, shifting later elements
    /// left. O(elements after the range).
    pub fn delete_range(&mut self, index: usize, n: usize) -> Result<()> {
        let len = self.buf.len();
        let end = index.checked_add(n).ok_or(Error::CapacityOverflow)?;
        if end > len {
            return Err(Error::OutOfBounds { index: end, len });
        }
        self.buf.drain(index..end);
        Ok(())
    }

    /// Remove the element at `index` by moving the last element into its
    /// place. O(1); does not preserve order.
    pub fn delete_swap(&mut self, index: usize) -> Result<T> {
        let len = self.buf.len();
        if index >= len {
            return Err(Error::OutOfBounds { index, len });
        }
        Ok(self.buf.swap_remove(index))
    }

    /// Drop all elements, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Drop all elements and release the allocation.
    pub fn free(&mut self) {
        self.buf = Vec::new();
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buf
    }
}

impl<T: Default> GrowArray<T> {
    /// Append `n` default elements; returns the index of the first one.
    pub fn try_add_n(&mut self, n: usize) -> Result<usize> {
        let first = self.buf.len();
        self.try_grow_for(n)?;
        self.buf.resize_with(first + n, T::default);
        Ok(first)
    }

    pub fn add_n(&mut self, n: usize) -> usize {
        infallible(self.try_add_n(n))
    }

    /// Set the length to `n`, growing capacity if needed. New slots are
    /// default-initialized; shortening drops the tail but keeps capacity.
    pub fn try_set_len(&mut self, n: usize) -> Result<()> {
        self.try_set_capacity(n)?;
        self.buf.resize_with(n, T::default);
        Ok(())
    }

    pub fn set_len(&mut self, n: usize) {
        infallible(self.try_set_len(n))
    }
}

impl<T> Deref for GrowArray<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.buf
    }
}

impl<T> DerefMut for GrowArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.buf
    }
}

impl<T> Extend<T> for GrowArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl<T> FromIterator<T> for GrowArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut a = Self::new();
        a.extend(iter);
        a
    }
}

impl<T> IntoIterator for GrowArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a GrowArray<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut GrowArray<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Growth policy: double, minimum 4, or exactly what is needed when that
    /// is larger.
    #[test]
    fn grown_capacity_policy() {
        assert_eq!(grown_capacity(0, 1), 4);
        assert_eq!(grown_capacity(4, 5), 8);
        assert_eq!(grown_capacity(8, 9), 16);
        assert_eq!(grown_capacity(4, 100), 100);
        assert_eq!(grown_capacity(16, 3), 16);
        assert_eq!(grown_capacity(usize::MAX / 2 + 1, usize::MAX), usize::MAX);
    }

    /// Capacity only changes when `len + 1 > capacity`.
    #[test]
    fn push_grows_only_on_overflow() {
        let mut a: GrowArray<u32> = GrowArray::new();
        assert_eq!(a.capacity(), 0);
        a.push(1);
        let c = a.capacity();
        assert!(c >= 4);
        while a.len() < c {
            a.push(0);
            assert_eq!(a.capacity(), c);
        }
        a.push(0);
        assert!(a.capacity() >= 2 * c);
        assert!(a.len() <= a.capacity());
    }

    #[test]
    fn pop_on_empty_is_an_error() {
        let mut a: GrowArray<u8> = GrowArray::new();
        assert_eq!(a.pop(), Err(Error::Empty));
        a.push(9);
        assert_eq!(a.pop(), Ok(9));
        assert_eq!(a.pop(), Err(Error::Empty));
    }

    #[test]
    fn delete_range_shifts_tail_left() {
        let mut a: GrowArray<i32> = (0..10).collect();
        a.delete_range(2, 3).unwrap();
        assert_eq!(a.as_slice(), &[0, 1, 5, 6, 7, 8, 9]);
        assert_eq!(
            a.delete_range(5, 3),
            Err(Error::OutOfBounds { index: 8, len: 7 })
        );
        a.delete_range(7, 0).unwrap();
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn delete_swap_moves_last_into_hole() {
        let mut a: GrowArray<&str> = ["a", "b", "c", "d"].into_iter().collect();
        assert_eq!(a.delete_swap(1), Ok("b"));
        assert_eq!(a.as_slice(), &["a", "d", "c"]);
        assert_eq!(a.delete_swap(2), Ok("c"));
        assert_eq!(a.as_slice(), &["a", "d"]);
        assert!(a.delete_swap(2).is_err());
    }

    #[test]
    fn insert_and_delete_preserve_order() {
        let mut a: GrowArray<i32> = [1, 3].into_iter().collect();
        a.insert(1, 2);
        a.insert(3, 4);
        assert_eq!(a.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(a.delete(0), Ok(1));
        assert_eq!(a.as_slice(), &[2, 3, 4]);
        assert_eq!(
            a.try_insert(9, 0),
            Err(Error::OutOfBounds { index: 9, len: 3 })
        );
    }

    /// `set_len` grows with defaults and shortens without releasing capacity.
    #[test]
    fn set_len_grows_and_truncates() {
        let mut a: GrowArray<u64> = GrowArray::new();
        a.set_len(10);
        assert_eq!(a.len(), 10);
        assert!(a.iter().all(|&x| x == 0));
        let cap = a.capacity();
        a.set_len(3);
        assert_eq!(a.len(), 3);
        assert_eq!(a.capacity(), cap);
    }

    #[test]
    fn add_n_returns_first_new_index() {
        let mut a: GrowArray<u8> = [7].into_iter().collect();
        assert_eq!(a.add_n(3), 1);
        assert_eq!(a.as_slice(), &[7, 0, 0, 0]);
        assert_eq!(a.last(), Some(&0));
        *a.last_mut().unwrap() = 5;
        assert_eq!(a[3], 5);
    }

    #[test]
    fn clear_keeps_capacity_free_releases() {
        let mut a: GrowArray<u32> = GrowArray::with_capacity(32);
        assert!(a.capacity() >= 32);
        a.extend(0..20);
        a.clear();
        assert!(a.is_empty());
        assert!(a.capacity() >= 32);
        a.free();
        assert_eq!(a.capacity(), 0);
    }

    #[test]
    fn reserving_absurd_capacity_fails_cleanly() {
        let mut a: GrowArray<u64> = GrowArray::new();
        let err = a.try_set_capacity(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityOverflow | Error::AllocFailed { .. }
        ));
        assert_eq!(a.len(), 0);
    }
}
