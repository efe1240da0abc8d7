//! Growable array over a pluggable [`Allocator`].
//!
//! ```text
//!   push_back on a full array (capacity doubles, minimum 1):
//!
//!   before  [ 1 │ 2 │ 3 │ 4 ]                      len 4, cap 4
//!   after   [ 1 │ 2 │ 3 │ 4 │ 5 │ · │ · │ · ]      len 5, cap 8
//! ```
//!
//! Any operation that relocates or shifts elements invalidates outstanding
//! pointers into the array; the borrow checker rules out references.

use std::{
  cmp::{self, Ordering},
  fmt,
  hash::{Hash, Hasher},
  iter::FusedIterator,
  mem,
  ops::{Bound, Deref, DerefMut, RangeBounds},
  ptr, slice,
};

use crate::{
  allocator::{Allocator, SystemAllocator},
  buffer::OwnedBuffer,
  error::{ContainerError, Result},
};

/// Contiguous, growable sequence whose storage comes from `A`.
///
/// Checked accessors ([`at`](Self::at), [`front`](Self::front), ...) report
/// [`ContainerError`]s. Indexing with `[]` goes through the slice and panics
/// out of bounds; [`get_unchecked`](Self::get_unchecked) skips the check.
///
/// Not synchronized: mutation from several threads needs outside locking.
pub struct DynArray<T, A: Allocator = SystemAllocator> {
  buf: OwnedBuffer<T, A>,
}

impl<T> DynArray<T> {
  /// Empty array, no storage.
  pub const fn new() -> Self {
    Self::new_in(SystemAllocator)
  }

  pub fn with_capacity(capacity: usize) -> Result<Self> {
    Self::with_capacity_in(capacity, SystemAllocator)
  }

  /// `len` default values; `len() == capacity() == len`.
  pub fn with_len(len: usize) -> Result<Self>
  where
    T: Default,
  {
    Self::with_len_in(len, SystemAllocator)
  }

  /// Clones `values` into a tightly sized array.
  pub fn from_slice(values: &[T]) -> Result<Self>
  where
    T: Clone,
  {
    Self::from_slice_in(values, SystemAllocator)
  }
}

impl<T, A: Allocator> DynArray<T, A> {
  pub const fn new_in(alloc: A) -> Self {
    Self {
      buf: OwnedBuffer::new_in(alloc),
    }
  }

  /// Empty array with exactly `capacity` raw slots.
  pub fn with_capacity_in(
    capacity: usize,
    alloc: A,
  ) -> Result<Self> {
    Ok(Self {
      buf: OwnedBuffer::with_capacity_in(capacity, alloc)?,
    })
  }

  pub fn with_len_in(
    len: usize,
    alloc: A,
  ) -> Result<Self>
  where
    T: Default,
  {
    let mut array = Self::with_capacity_in(len, alloc)?;

    for _ in 0..len {
      unsafe { array.buf.write_next(T::default()) };
    }

    Ok(array)
  }

  pub fn from_slice_in(
    values: &[T],
    alloc: A,
  ) -> Result<Self>
  where
    T: Clone,
  {
    let mut array = Self::with_capacity_in(values.len(), alloc)?;

    for value in values {
      unsafe { array.buf.write_next(value.clone()) };
    }

    Ok(array)
  }

  /// Deep copy with `capacity() == len()` and a clone of the allocator.
  pub fn try_clone(&self) -> Result<Self>
  where
    T: Clone,
    A: Clone,
  {
    Self::from_slice_in(self.as_slice(), self.allocator().clone())
  }

  /// Moves the contents out, leaving `self` empty and without storage.
  pub fn take(&mut self) -> Self
  where
    A: Clone,
  {
    let empty = Self::new_in(self.allocator().clone());
    mem::replace(self, empty)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.buf.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.buf.capacity()
  }

  #[inline]
  pub fn allocator(&self) -> &A {
    self.buf.allocator()
  }

  #[inline]
  pub fn as_slice(&self) -> &[T] {
    self.buf.as_slice()
  }

  #[inline]
  pub fn as_mut_slice(&mut self) -> &mut [T] {
    self.buf.as_mut_slice()
  }

  #[inline]
  pub fn as_ptr(&self) -> *const T {
    self.buf.as_ptr()
  }

  // =============================================================================
  // Element access
  // =============================================================================

  /// Checked access.
  pub fn at(
    &self,
    index: usize,
  ) -> Result<&T> {
    let len = self.len();
    self
      .as_slice()
      .get(index)
      .ok_or(ContainerError::IndexOutOfRange { index, len })
  }

  pub fn at_mut(
    &mut self,
    index: usize,
  ) -> Result<&mut T> {
    let len = self.len();
    self
      .as_mut_slice()
      .get_mut(index)
      .ok_or(ContainerError::IndexOutOfRange { index, len })
  }

  /// Unchecked access.
  ///
  /// # Safety
  ///
  /// `index < len()`; anything else is undefined behavior.
  #[inline]
  pub unsafe fn get_unchecked(
    &self,
    index: usize,
  ) -> &T {
    debug_assert!(index < self.len());
    unsafe { self.buf.slot(index).as_ref() }
  }

  /// # Safety
  ///
  /// `index < len()`; anything else is undefined behavior.
  #[inline]
  pub unsafe fn get_unchecked_mut(
    &mut self,
    index: usize,
  ) -> &mut T {
    debug_assert!(index < self.len());
    unsafe { self.buf.slot(index).as_mut() }
  }

  pub fn front(&self) -> Result<&T> {
    self.as_slice().first().ok_or(ContainerError::EmptyContainer)
  }

  pub fn front_mut(&mut self) -> Result<&mut T> {
    self.as_mut_slice().first_mut().ok_or(ContainerError::EmptyContainer)
  }

  pub fn back(&self) -> Result<&T> {
    self.as_slice().last().ok_or(ContainerError::EmptyContainer)
  }

  pub fn back_mut(&mut self) -> Result<&mut T> {
    self.as_mut_slice().last_mut().ok_or(ContainerError::EmptyContainer)
  }

  // =============================================================================
  // Capacity
  // =============================================================================

  /// Grows storage to exactly `capacity` slots. Never shrinks.
  pub fn reserve(
    &mut self,
    capacity: usize,
  ) -> Result<()> {
    if capacity <= self.capacity() {
      return Ok(());
    }

    self.buf.relocate(capacity)
  }

  /// Reallocates to exactly `len()` slots when there is slack.
  pub fn shrink_to_fit(&mut self) -> Result<()> {
    if self.capacity() == self.len() {
      return Ok(());
    }

    self.buf.relocate(self.len())
  }

  /// Makes room for `additional` more values, doubling when it has to grow.
  fn grow_for(
    &mut self,
    additional: usize,
  ) -> Result<()> {
    let required = self
      .len()
      .checked_add(additional)
      .ok_or(ContainerError::CapacityOverflow)?;

    if required <= self.capacity() {
      return Ok(());
    }

    self.grow_to(required)
  }

  #[cold]
  #[inline(never)]
  fn grow_to(
    &mut self,
    required: usize,
  ) -> Result<()> {
    let doubled = self.capacity().saturating_mul(2).max(1);
    self.buf.relocate(cmp::max(doubled, required))
  }

  // =============================================================================
  // Mutation
  // =============================================================================

  /// Appends `value`. Amortized O(1). On allocation failure `value` is dropped.
  pub fn push_back(
    &mut self,
    value: T,
  ) -> Result<()> {
    self.grow_for(1)?;
    unsafe { self.buf.write_next(value) };

    Ok(())
  }

  /// Appends the value produced by `make`, which only runs once storage
  /// for it is secured.
  pub fn emplace_back_with<F>(
    &mut self,
    make: F,
  ) -> Result<&mut T>
  where
    F: FnOnce() -> T,
  {
    self.grow_for(1)?;
    unsafe { self.buf.write_next(make()) };

    let index = self.len() - 1;
    Ok(unsafe { self.get_unchecked_mut(index) })
  }

  /// Prepends `value`, shifting every element one slot right. O(n).
  pub fn push_front(
    &mut self,
    value: T,
  ) -> Result<()> {
    self.insert(0, value)
  }

  /// Inserts `value` at `index`, shifting `[index, len)` right.
  /// `index == len()` appends.
  pub fn insert(
    &mut self,
    index: usize,
    value: T,
  ) -> Result<()> {
    self.emplace_with(index, || value).map(|_| ())
  }

  /// Like [`insert`](Self::insert), but the value is built only after the
  /// position was validated and storage secured.
  pub fn emplace_with<F>(
    &mut self,
    index: usize,
    make: F,
  ) -> Result<&mut T>
  where
    F: FnOnce() -> T,
  {
    let len = self.len();
    if index > len {
      return Err(ContainerError::IndexOutOfRange { index, len });
    }

    self.grow_for(1)?;
    let value = make();

    unsafe {
      let slot = self.buf.slot(index);
      ptr::copy(slot.as_ptr(), slot.as_ptr().add(1), len - index);
      self.buf.allocator().construct_at(slot, value);
      self.buf.set_len(len + 1);

      Ok(self.get_unchecked_mut(index))
    }
  }

  /// Removes and returns the last element. Capacity is kept.
  pub fn pop_back(&mut self) -> Result<T> {
    let len = self.len();
    if len == 0 {
      return Err(ContainerError::EmptyContainer);
    }

    unsafe {
      self.buf.set_len(len - 1);
      Ok(self.buf.allocator().move_out(self.buf.slot(len - 1)))
    }
  }

  /// Removes and returns the first element, shifting the rest left. O(n).
  pub fn pop_front(&mut self) -> Result<T> {
    if self.is_empty() {
      return Err(ContainerError::EmptyContainer);
    }

    self.remove(0)
  }

  /// Removes and returns the element at `index`, closing the gap.
  pub fn remove(
    &mut self,
    index: usize,
  ) -> Result<T> {
    let len = self.len();
    if index >= len {
      return Err(ContainerError::IndexOutOfRange { index, len });
    }

    unsafe {
      let slot = self.buf.slot(index);
      let value = self.buf.allocator().move_out(slot);
      ptr::copy(slot.as_ptr().add(1), slot.as_ptr(), len - index - 1);
      self.buf.set_len(len - 1);

      Ok(value)
    }
  }

  /// Destroys the element at `index` in place, closing the gap.
  pub fn erase(
    &mut self,
    index: usize,
  ) -> Result<()> {
    let len = self.len();
    if index >= len {
      return Err(ContainerError::IndexOutOfRange { index, len });
    }

    self.erase_range(index..index + 1)
  }

  /// Destroys the elements in `range`, shifting the tail left.
  ///
  /// Fails with [`ContainerError::InvalidRange`] when `start > end` or
  /// `end > len()`. Capacity is kept.
  pub fn erase_range<R>(
    &mut self,
    range: R,
  ) -> Result<()>
  where
    R: RangeBounds<usize>,
  {
    let len = self.len();
    let (start, end) = resolve_range(&range, len)?;

    if start == end {
      return Ok(());
    }

    unsafe {
      // Leak rather than double-drop if a destructor panics.
      self.buf.set_len(start);
      self.buf.destroy_range(start, end);

      let base = self.buf.slot(0).as_ptr();
      ptr::copy(base.add(end), base.add(start), len - end);
      self.buf.set_len(len - (end - start));
    }

    Ok(())
  }

  /// Destroys the elements past `len`. No-op if already shorter.
  pub fn truncate(
    &mut self,
    len: usize,
  ) {
    let old_len = self.len();
    if len >= old_len {
      return;
    }

    unsafe {
      self.buf.set_len(len);
      self.buf.destroy_range(len, old_len);
    }
  }

  /// Keeps only the elements for which `keep` returns `true`, in order.
  pub fn retain<F>(
    &mut self,
    mut keep: F,
  ) where
    F: FnMut(&T) -> bool,
  {
    let len = self.len();
    let mut kept = 0;

    unsafe {
      self.buf.set_len(0);

      for index in 0..len {
        let slot = self.buf.slot(index);

        if keep(slot.as_ref()) {
          if kept != index {
            ptr::copy_nonoverlapping(slot.as_ptr(), self.buf.slot(kept).as_ptr(), 1);
          }
          kept += 1;
        } else {
          self.buf.allocator().destroy_at(slot);
        }
      }

      self.buf.set_len(kept);
    }
  }

  /// Destroys every element and releases the storage.
  pub fn clear(&mut self) {
    self.buf.reset();
  }

  /// Resizes to `len`, filling new slots with `T::default()`.
  pub fn resize(
    &mut self,
    len: usize,
  ) -> Result<()>
  where
    T: Default,
  {
    self.resize_with(len, T::default)
  }

  /// Resizes to `len`, filling new slots with clones of `value`.
  pub fn resize_with_value(
    &mut self,
    len: usize,
    value: T,
  ) -> Result<()>
  where
    T: Clone,
  {
    self.resize_with(len, || value.clone())
  }

  /// Resizes to `len`. Shrinking destroys the tail; growing reserves
  /// at least `len` slots and fills them from `fill`.
  pub fn resize_with<F>(
    &mut self,
    len: usize,
    mut fill: F,
  ) -> Result<()>
  where
    F: FnMut() -> T,
  {
    if len <= self.len() {
      self.truncate(len);
      return Ok(());
    }

    self.reserve(len)?;

    while self.len() < len {
      unsafe { self.buf.write_next(fill()) };
    }

    Ok(())
  }

  /// Appends clones of `values`, growing at most once.
  pub fn extend_from_slice(
    &mut self,
    values: &[T],
  ) -> Result<()>
  where
    T: Clone,
  {
    self.grow_for(values.len())?;

    for value in values {
      unsafe { self.buf.write_next(value.clone()) };
    }

    Ok(())
  }

  /// Exchanges contents, capacity and allocator with `other` in O(1).
  pub fn swap(
    &mut self,
    other: &mut Self,
  ) {
    mem::swap(&mut self.buf, &mut other.buf);
  }

  pub fn iter(&self) -> slice::Iter<'_, T> {
    self.as_slice().iter()
  }

  pub fn iter_mut(&mut self) -> slice::IterMut<'_, T> {
    self.as_mut_slice().iter_mut()
  }
}

pub(crate) fn resolve_range<R>(
  range: &R,
  len: usize,
) -> Result<(usize, usize)>
where
  R: RangeBounds<usize>,
{
  let start = match range.start_bound() {
    Bound::Included(&start) => Some(start),
    Bound::Excluded(&start) => start.checked_add(1),
    Bound::Unbounded => Some(0),
  };
  let end = match range.end_bound() {
    Bound::Included(&end) => end.checked_add(1),
    Bound::Excluded(&end) => Some(end),
    Bound::Unbounded => Some(len),
  };

  match (start, end) {
    (Some(start), Some(end)) if start <= end && end <= len => Ok((start, end)),
    (start, end) => Err(ContainerError::InvalidRange {
      start: start.unwrap_or(usize::MAX),
      end: end.unwrap_or(usize::MAX),
      len,
    }),
  }
}

#[cold]
fn allocation_panic(err: ContainerError) -> ! {
  panic!("{err}")
}

impl<T> Default for DynArray<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T, A: Allocator> Deref for DynArray<T, A> {
  type Target = [T];

  fn deref(&self) -> &Self::Target {
    self.as_slice()
  }
}

impl<T, A: Allocator> DerefMut for DynArray<T, A> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    self.as_mut_slice()
  }
}

/// # Panics
///
/// Panics if the allocator cannot provide the copy's storage; use
/// [`DynArray::try_clone`] to handle that case.
impl<T: Clone, A: Allocator + Clone> Clone for DynArray<T, A> {
  fn clone(&self) -> Self {
    self.try_clone().unwrap_or_else(|err| allocation_panic(err))
  }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for DynArray<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<T, U, A, B> PartialEq<DynArray<U, B>> for DynArray<T, A>
where
  T: PartialEq<U>,
  A: Allocator,
  B: Allocator,
{
  fn eq(
    &self,
    other: &DynArray<U, B>,
  ) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: Eq, A: Allocator> Eq for DynArray<T, A> {}

impl<T, U, A, const N: usize> PartialEq<[U; N]> for DynArray<T, A>
where
  T: PartialEq<U>,
  A: Allocator,
{
  fn eq(
    &self,
    other: &[U; N],
  ) -> bool {
    self.as_slice() == other
  }
}

impl<T: PartialOrd, A: Allocator> PartialOrd for DynArray<T, A> {
  fn partial_cmp(
    &self,
    other: &Self,
  ) -> Option<Ordering> {
    self.as_slice().partial_cmp(other.as_slice())
  }
}

impl<T: Ord, A: Allocator> Ord for DynArray<T, A> {
  fn cmp(
    &self,
    other: &Self,
  ) -> Ordering {
    self.as_slice().cmp(other.as_slice())
  }
}

impl<T: Hash, A: Allocator> Hash for DynArray<T, A> {
  fn hash<H: Hasher>(
    &self,
    state: &mut H,
  ) {
    self.as_slice().hash(state);
  }
}

impl<T, const N: usize> From<[T; N]> for DynArray<T> {
  /// # Panics
  ///
  /// Panics if storage for `N` values cannot be acquired.
  fn from(values: [T; N]) -> Self {
    let mut array = Self::with_capacity(N).unwrap_or_else(|err| allocation_panic(err));

    for value in values {
      unsafe { array.buf.write_next(value) };
    }

    array
  }
}

impl<T> FromIterator<T> for DynArray<T> {
  /// # Panics
  ///
  /// Panics if the allocator runs out of storage.
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut array = Self::new();
    array.extend(iter);
    array
  }
}

impl<T, A: Allocator> Extend<T> for DynArray<T, A> {
  /// # Panics
  ///
  /// Panics if the allocator runs out of storage.
  fn extend<I: IntoIterator<Item = T>>(
    &mut self,
    iter: I,
  ) {
    let iter = iter.into_iter();
    let (lower, _) = iter.size_hint();

    if let Err(err) = self.grow_for(lower) {
      allocation_panic(err);
    }

    for value in iter {
      if let Err(err) = self.push_back(value) {
        allocation_panic(err);
      }
    }
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a DynArray<T, A> {
  type Item = &'a T;
  type IntoIter = slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut DynArray<T, A> {
  type Item = &'a mut T;
  type IntoIter = slice::IterMut<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter_mut()
  }
}

impl<T, A: Allocator> IntoIterator for DynArray<T, A> {
  type Item = T;
  type IntoIter = IntoIter<T, A>;

  fn into_iter(mut self) -> Self::IntoIter {
    let tail = self.len();

    // The iterator owns the live range from here on; the buffer only
    // keeps the storage.
    unsafe { self.buf.set_len(0) };

    let DynArray { buf } = self;
    IntoIter { buf, head: 0, tail }
  }
}

/// Owning iterator over a [`DynArray`]; storage is released when it drops.
pub struct IntoIter<T, A: Allocator = SystemAllocator> {
  buf: OwnedBuffer<T, A>,
  head: usize,
  tail: usize,
}

impl<T, A: Allocator> IntoIter<T, A> {
  pub fn as_slice(&self) -> &[T] {
    unsafe { slice::from_raw_parts(self.buf.slot(self.head).as_ptr(), self.tail - self.head) }
  }
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
  type Item = T;

  fn next(&mut self) -> Option<T> {
    if self.head == self.tail {
      return None;
    }

    let slot = unsafe { self.buf.slot(self.head) };
    self.head += 1;

    Some(unsafe { self.buf.allocator().move_out(slot) })
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = self.tail - self.head;
    (remaining, Some(remaining))
  }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
  fn next_back(&mut self) -> Option<T> {
    if self.head == self.tail {
      return None;
    }

    self.tail -= 1;
    let slot = unsafe { self.buf.slot(self.tail) };

    Some(unsafe { self.buf.allocator().move_out(slot) })
  }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
  fn drop(&mut self) {
    let (head, tail) = (self.head, self.tail);
    self.head = tail;

    unsafe { self.buf.destroy_range(head, tail) };
  }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for IntoIter<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::Cell, rc::Rc};

  use super::*;
  use crate::tracking::{TrackingAllocator, TrackingBehaviour};

  /// Counts clones so tests can tell copies from relocations.
  #[derive(Debug)]
  struct Counted {
    value: i32,
    clones: Rc<Cell<usize>>,
  }

  impl Counted {
    fn new(
      value: i32,
      clones: &Rc<Cell<usize>>,
    ) -> Self {
      Self {
        value,
        clones: Rc::clone(clones),
      }
    }
  }

  impl Clone for Counted {
    fn clone(&self) -> Self {
      self.clones.set(self.clones.get() + 1);
      Self {
        value: self.value,
        clones: Rc::clone(&self.clones),
      }
    }
  }

  fn tracked(values: &[i32]) -> (DynArray<i32, TrackingAllocator>, TrackingAllocator) {
    let allocator = TrackingAllocator::new();
    let array = DynArray::from_slice_in(values, allocator.clone()).unwrap();
    (array, allocator)
  }

  // =============================================================================
  // construction
  // =============================================================================

  #[test]
  fn test_new_is_empty_without_storage() {
    let array: DynArray<u8> = DynArray::new();

    assert_eq!(array.len(), 0);
    assert_eq!(array.capacity(), 0);
    assert!(array.is_empty());
  }

  #[test]
  fn test_with_len_default_constructs() {
    let allocator = TrackingAllocator::new();
    let array = DynArray::<String, _>::with_len_in(3, allocator.clone()).unwrap();

    assert_eq!(array.len(), 3);
    assert_eq!(array.capacity(), 3);
    assert!(array.iter().all(String::is_empty));
    assert_eq!(allocator.stats().constructs, 3);
  }

  #[test]
  fn test_from_slice_is_tight() {
    let array = DynArray::from_slice(&[1, 2, 3, 4, 5]).unwrap();

    assert_eq!(array, [1, 2, 3, 4, 5]);
    assert_eq!(array.capacity(), 5);
  }

  #[test]
  fn test_clone_is_tight_and_independent() {
    let mut original = DynArray::from_slice(&[1, 2, 3]).unwrap();
    original.reserve(16).unwrap();

    let mut copy = original.clone();
    assert_eq!(copy.capacity(), 3);

    copy.push_back(4).unwrap();
    copy[0] = 100;

    assert_eq!(original, [1, 2, 3]);
    assert_eq!(copy, [100, 2, 3, 4]);
  }

  #[test]
  fn test_take_leaves_source_empty_and_reusable() {
    let (mut source, allocator) = tracked(&[7, 8, 9]);

    let moved = source.take();

    assert_eq!(moved, [7, 8, 9]);
    assert_eq!(source.len(), 0);
    assert_eq!(source.capacity(), 0);

    source.push_back(1).unwrap();
    assert_eq!(source, [1]);

    drop(source);
    drop(moved);
    assert!(allocator.stats().is_balanced());
  }

  #[test]
  fn test_from_array_and_iterator() {
    let from_array = DynArray::from([1, 2, 3]);
    let collected: DynArray<i32> = (1..=3).collect();

    assert_eq!(from_array, collected);
  }

  // =============================================================================
  // access
  // =============================================================================

  #[test]
  fn test_at_bounds() {
    let array = DynArray::from_slice(&[10, 20, 30]).unwrap();

    assert_eq!(array.at(2), Ok(&30));
    assert_eq!(array.at(3), Err(ContainerError::IndexOutOfRange { index: 3, len: 3 }));
  }

  #[test]
  fn test_at_mut_writes_through() {
    let mut array = DynArray::from_slice(&[1, 2]).unwrap();
    *array.at_mut(1).unwrap() = 5;

    assert_eq!(array, [1, 5]);
    assert!(array.at_mut(2).is_err());
  }

  #[test]
  fn test_front_back() {
    let mut array = DynArray::from_slice(&[1, 2, 3]).unwrap();

    assert_eq!(array.front(), Ok(&1));
    assert_eq!(array.back(), Ok(&3));

    *array.back_mut().unwrap() = 9;
    *array.front_mut().unwrap() = 0;
    assert_eq!(array, [0, 2, 9]);

    let empty: DynArray<i32> = DynArray::new();
    assert_eq!(empty.front(), Err(ContainerError::EmptyContainer));
    assert_eq!(empty.back(), Err(ContainerError::EmptyContainer));
  }

  #[test]
  fn test_get_unchecked_within_bounds() {
    let array = DynArray::from_slice(&['a', 'b']).unwrap();

    unsafe {
      assert_eq!(*array.get_unchecked(0), 'a');
      assert_eq!(*array.get_unchecked(1), 'b');
    }
  }

  // =============================================================================
  // capacity
  // =============================================================================

  #[test]
  fn test_push_back_doubles_capacity() {
    let mut array = DynArray::new();
    let mut capacities = Vec::new();

    for i in 0..9 {
      array.push_back(i).unwrap();
      capacities.push(array.capacity());
    }

    assert_eq!(capacities, [1, 2, 4, 4, 8, 8, 8, 8, 16]);
  }

  #[test]
  fn test_reserve_is_exact_and_never_shrinks() {
    let mut array: DynArray<u32> = DynArray::new();

    array.reserve(10).unwrap();
    assert_eq!(array.capacity(), 10);
    assert_eq!(array.len(), 0);

    array.reserve(2).unwrap();
    assert_eq!(array.capacity(), 10);
  }

  #[test]
  fn test_shrink_to_fit_is_idempotent() {
    let mut array = DynArray::from_slice(&[1, 2, 3]).unwrap();
    array.reserve(32).unwrap();

    array.shrink_to_fit().unwrap();
    assert_eq!(array.capacity(), 3);

    array.shrink_to_fit().unwrap();
    assert_eq!(array.capacity(), 3);
    assert_eq!(array, [1, 2, 3]);
  }

  #[test]
  fn test_failed_growth_keeps_contents() {
    let (mut array, allocator) = tracked(&[1, 2]);
    allocator.change_behaviour(TrackingBehaviour::FailAtAcquire);

    let result = array.push_back(3);

    assert!(matches!(result, Err(ContainerError::AllocationFailure { .. })));
    assert_eq!(array, [1, 2]);
    assert_eq!(array.capacity(), 2);

    allocator.change_behaviour(TrackingBehaviour::None);
    array.push_back(3).unwrap();
    assert_eq!(array, [1, 2, 3]);

    drop(array);
    assert!(allocator.stats().is_balanced());
  }

  #[test]
  fn test_failed_insert_reserve_and_shrink_keep_state() {
    let (mut array, allocator) = tracked(&[1, 2, 3]);
    allocator.change_behaviour(TrackingBehaviour::FailAtAcquire);

    assert!(array.insert(1, 9).is_err());
    assert_eq!(array, [1, 2, 3]);
    assert_eq!(array.capacity(), 3);

    assert!(array.reserve(10).is_err());
    assert_eq!(array.capacity(), 3);

    allocator.change_behaviour(TrackingBehaviour::None);
    array.reserve(8).unwrap();
    allocator.change_behaviour(TrackingBehaviour::FailAtAcquire);

    assert!(array.shrink_to_fit().is_err());
    assert_eq!(array, [1, 2, 3]);
    assert_eq!(array.capacity(), 8);

    drop(array);
    assert!(allocator.stats().is_balanced());
  }

  #[test]
  fn test_growth_fails_after_budget() {
    let allocator = TrackingAllocator::new();
    allocator.change_behaviour(TrackingBehaviour::FailAfter(2));
    let mut array = DynArray::new_in(allocator.clone());

    array.push_back(String::from("a")).unwrap();
    array.push_back(String::from("b")).unwrap();
    let result = array.push_back(String::from("c"));

    assert!(matches!(result, Err(ContainerError::AllocationFailure { .. })));
    assert_eq!(array, ["a", "b"]);
    assert_eq!(array.capacity(), 2);
    assert_eq!(allocator.stats().failed_acquires, 1);

    drop(array);
    assert!(allocator.stats().is_balanced());
  }

  #[test]
  fn test_failed_copy_releases_everything() {
    let allocator = TrackingAllocator::new();
    let words = ["x", "y", "z"].map(String::from);

    allocator.change_behaviour(TrackingBehaviour::FailAfter(0));
    assert!(DynArray::from_slice_in(&words, allocator.clone()).is_err());
    assert!(allocator.stats().is_balanced());

    allocator.change_behaviour(TrackingBehaviour::None);
    let array = DynArray::from_slice_in(&words, allocator.clone()).unwrap();

    allocator.change_behaviour(TrackingBehaviour::FailAtAcquire);
    assert!(array.try_clone().is_err());
    assert_eq!(allocator.stats().live_values(), 3);

    drop(array);
    assert!(allocator.stats().is_balanced());
  }

  // =============================================================================
  // mutation
  // =============================================================================

  #[test]
  fn test_push_front() {
    let mut array = DynArray::from_slice(&[1, 2, 3, 4, 5]).unwrap();

    array.push_front(0).unwrap();

    assert_eq!(array, [0, 1, 2, 3, 4, 5]);
    assert_eq!(array.len(), 6);
  }

  #[test]
  fn test_pop_back_keeps_capacity() {
    let (mut array, allocator) = tracked(&[1, 2, 3]);
    let acquires = allocator.stats().acquires;

    assert_eq!(array.pop_back(), Ok(3));
    assert_eq!(array.pop_back(), Ok(2));

    assert_eq!(array, [1]);
    assert_eq!(array.capacity(), 3);
    assert_eq!(allocator.stats().acquires, acquires);
  }

  #[test]
  fn test_pop_on_empty() {
    let mut array: DynArray<i32> = DynArray::new();

    assert_eq!(array.pop_back(), Err(ContainerError::EmptyContainer));
    assert_eq!(array.pop_front(), Err(ContainerError::EmptyContainer));
  }

  #[test]
  fn test_pop_front_shifts_left() {
    let mut array = DynArray::from_slice(&[1, 2, 3]).unwrap();

    assert_eq!(array.pop_front(), Ok(1));
    assert_eq!(array, [2, 3]);
  }

  #[test]
  fn test_insert_middle() {
    let mut array = DynArray::from_slice(&[1, 2, 4, 5]).unwrap();

    array.insert(2, 3).unwrap();

    assert_eq!(array, [1, 2, 3, 4, 5]);
  }

  #[test]
  fn test_insert_at_end_and_out_of_range() {
    let mut array = DynArray::from_slice(&[1, 2]).unwrap();

    array.insert(2, 3).unwrap();
    assert_eq!(array, [1, 2, 3]);

    assert_eq!(array.insert(5, 9), Err(ContainerError::IndexOutOfRange { index: 5, len: 3 }));
    assert_eq!(array, [1, 2, 3]);
  }

  #[test]
  fn test_emplace_runs_maker_only_on_success() {
    let mut array: DynArray<String> = DynArray::new();
    let mut called = false;

    let result = array.emplace_with(1, || {
      called = true;
      String::from("x")
    });

    assert!(result.is_err());
    assert!(!called);

    array.emplace_back_with(|| String::from("b")).unwrap().push('!');
    array.emplace_with(0, || String::from("a")).unwrap();
    assert_eq!(array, ["a", "b!"]);
  }

  #[test]
  fn test_erase_single() {
    let mut array = DynArray::from_slice(&[1, 2, 3, 4, 5]).unwrap();

    array.erase(1).unwrap();

    assert_eq!(array, [1, 3, 4, 5]);
    assert_eq!(array.capacity(), 5);
    assert_eq!(array.erase(4), Err(ContainerError::IndexOutOfRange { index: 4, len: 4 }));
  }

  #[test]
  fn test_erase_range() {
    let (mut array, allocator) = tracked(&[0, 1, 2, 3, 4, 5, 6]);

    array.erase_range(2..5).unwrap();
    assert_eq!(array, [0, 1, 5, 6]);

    array.erase_range(..1).unwrap();
    assert_eq!(array, [1, 5, 6]);

    array.erase_range(1..).unwrap();
    assert_eq!(array, [1]);

    array.erase_range(0..0).unwrap();
    assert_eq!(array, [1]);

    drop(array);
    assert!(allocator.stats().is_balanced());
  }

  #[test]
  #[allow(clippy::reversed_empty_ranges)]
  fn test_erase_invalid_range() {
    let mut array = DynArray::from_slice(&[1, 2, 3]).unwrap();

    assert_eq!(
      array.erase_range(2..1),
      Err(ContainerError::InvalidRange {
        start: 2,
        end: 1,
        len: 3
      })
    );
    assert_eq!(
      array.erase_range(1..=3),
      Err(ContainerError::InvalidRange {
        start: 1,
        end: 4,
        len: 3
      })
    );
    assert_eq!(array, [1, 2, 3]);
  }

  #[test]
  fn test_remove_returns_value() {
    let mut array = DynArray::from_slice(&["a", "b", "c"]).unwrap();

    assert_eq!(array.remove(1), Ok("b"));
    assert_eq!(array, ["a", "c"]);
    assert!(array.remove(2).is_err());
  }

  #[test]
  fn test_clear_releases_storage() {
    let (mut array, allocator) = tracked(&[1, 2, 3]);

    array.clear();

    assert_eq!(array.len(), 0);
    assert_eq!(array.capacity(), 0);
    assert!(allocator.stats().is_balanced());
  }

  #[test]
  fn test_resize_both_ways() {
    let mut array = DynArray::from_slice(&[1, 2, 3, 4]).unwrap();

    array.resize(2).unwrap();
    assert_eq!(array, [1, 2]);
    assert_eq!(array.capacity(), 4);

    array.resize(6).unwrap();
    assert_eq!(array, [1, 2, 0, 0, 0, 0]);
    assert_eq!(array.capacity(), 6);

    array.resize_with_value(8, 7).unwrap();
    assert_eq!(array, [1, 2, 0, 0, 0, 0, 7, 7]);
  }

  #[test]
  fn test_truncate_and_retain() {
    let (mut array, allocator) = tracked(&[1, 2, 3, 4, 5, 6]);

    array.retain(|value| value % 2 == 0);
    assert_eq!(array, [2, 4, 6]);

    array.truncate(1);
    assert_eq!(array, [2]);

    array.truncate(10);
    assert_eq!(array, [2]);

    drop(array);
    assert!(allocator.stats().is_balanced());
  }

  #[test]
  fn test_extend_from_slice_grows_once() {
    let (mut array, allocator) = tracked(&[1]);

    array.extend_from_slice(&[2, 3, 4, 5]).unwrap();

    assert_eq!(array, [1, 2, 3, 4, 5]);
    assert_eq!(array.capacity(), 5);
    assert_eq!(allocator.stats().acquires, 2);
  }

  #[test]
  fn test_swap_moves_nothing() {
    let clones = Rc::new(Cell::new(0));
    let allocator = TrackingAllocator::new();

    let mut first = DynArray::new_in(allocator.clone());
    for value in [1, 2, 3] {
      first.push_back(Counted::new(value, &clones)).unwrap();
    }
    let mut second = DynArray::new_in(allocator.clone());
    for value in [4, 5, 6, 7] {
      second.push_back(Counted::new(value, &clones)).unwrap();
    }

    let before = allocator.stats();
    first.swap(&mut second);

    let values = |array: &DynArray<Counted, TrackingAllocator>| {
      array.iter().map(|counted| counted.value).collect::<Vec<_>>()
    };
    assert_eq!(values(&first), [4, 5, 6, 7]);
    assert_eq!(values(&second), [1, 2, 3]);
    assert_eq!(clones.get(), 0);
    assert_eq!(allocator.stats(), before);
  }

  #[test]
  fn test_growth_relocates_without_cloning() {
    let clones = Rc::new(Cell::new(0));
    let mut array = DynArray::new();

    for value in 0..100 {
      array.push_back(Counted::new(value, &clones)).unwrap();
    }
    array.insert(50, Counted::new(-1, &clones)).unwrap();
    array.shrink_to_fit().unwrap();

    assert_eq!(clones.get(), 0);
    assert_eq!(array[50].value, -1);
    assert_eq!(array[100].value, 99);
  }

  // =============================================================================
  // comparison, iteration
  // =============================================================================

  #[test]
  fn test_lexicographic_order() {
    let short = DynArray::from_slice(&[1, 2]).unwrap();
    let long = DynArray::from_slice(&[1, 2, 3]).unwrap();
    let bigger = DynArray::from_slice(&[1, 3]).unwrap();

    assert!(short < long);
    assert!(long < bigger);
    assert_eq!(short.cmp(&short.clone()), Ordering::Equal);
    assert_ne!(short, long);
  }

  #[test]
  fn test_reverse_and_mutable_iteration() {
    let mut array = DynArray::from_slice(&[1, 2, 3]).unwrap();

    for value in &mut array {
      *value *= 10;
    }

    let reversed: Vec<_> = array.iter().rev().copied().collect();
    assert_eq!(reversed, [30, 20, 10]);
  }

  #[test]
  fn test_into_iter_releases_rest() {
    let allocator = TrackingAllocator::new();
    let mut array = DynArray::new_in(allocator.clone());
    for word in ["a", "b", "c", "d"] {
      array.push_back(String::from(word)).unwrap();
    }

    let mut iter = array.into_iter();
    assert_eq!(iter.len(), 4);
    assert_eq!(iter.next().as_deref(), Some("a"));
    assert_eq!(iter.next_back().as_deref(), Some("d"));
    assert_eq!(iter.as_slice(), ["b", "c"]);
    drop(iter);

    assert!(allocator.stats().is_balanced());
  }

  #[test]
  fn test_debug_lists_elements() {
    let array = DynArray::from_slice(&[1, 2]).unwrap();

    assert_eq!(format!("{array:?}"), "[1, 2]");
  }

  #[test]
  fn test_drop_balances_everything() {
    let allocator = TrackingAllocator::new();

    {
      let mut array = DynArray::new_in(allocator.clone());
      for i in 0..20 {
        array.push_back(vec![i; 3]).unwrap();
      }
      array.erase_range(3..7).unwrap();
      array.pop_front().unwrap();
      array.insert(2, vec![]).unwrap();
      array.shrink_to_fit().unwrap();
    }

    assert!(allocator.stats().is_balanced());
  }
}
