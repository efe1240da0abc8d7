use std::{
  cmp::Ordering,
  fmt,
  hash::{Hash, Hasher},
  mem,
  ops::{Deref, DerefMut},
  slice,
};

use crate::{
  allocator::{Allocator, SystemAllocator},
  buffer::OwnedBuffer,
  error::{ContainerError, Result},
};

/// Exactly `N` values in allocator-acquired storage. Never grows.
///
/// ```rust
/// use rcontainers::{ContainerError, FixedArray};
///
/// let mut array = FixedArray::<u32, 4>::from_slice(&[1, 2]).unwrap();
/// assert_eq!(array.as_slice(), [1, 2, 0, 0]);
///
/// array.fill(7);
/// assert_eq!(array.at(3), Ok(&7));
/// assert!(matches!(array.at(4), Err(ContainerError::IndexOutOfRange { .. })));
///
/// let too_long = FixedArray::<u32, 1>::from_slice(&[1, 2]);
/// assert!(matches!(too_long, Err(ContainerError::CapacityExceeded { .. })));
/// ```
pub struct FixedArray<T, const N: usize, A: Allocator = SystemAllocator> {
  buf: OwnedBuffer<T, A>,
}

impl<T, const N: usize> FixedArray<T, N> {
  /// `N` default values.
  pub fn new() -> Result<Self>
  where
    T: Default,
  {
    Self::new_in(SystemAllocator)
  }

  pub fn filled(value: T) -> Result<Self>
  where
    T: Clone,
  {
    Self::filled_in(value, SystemAllocator)
  }

  /// Clones `values` into the front and pads the rest with `T::default()`.
  pub fn from_slice(values: &[T]) -> Result<Self>
  where
    T: Clone + Default,
  {
    Self::from_slice_in(values, SystemAllocator)
  }
}

impl<T, const N: usize, A: Allocator> FixedArray<T, N, A> {
  pub fn new_in(alloc: A) -> Result<Self>
  where
    T: Default,
  {
    Self::from_fn_in(alloc, |_| T::default())
  }

  pub fn filled_in(
    value: T,
    alloc: A,
  ) -> Result<Self>
  where
    T: Clone,
  {
    Self::from_fn_in(alloc, |_| value.clone())
  }

  pub fn from_slice_in(
    values: &[T],
    alloc: A,
  ) -> Result<Self>
  where
    T: Clone + Default,
  {
    if values.len() > N {
      return Err(ContainerError::CapacityExceeded {
        capacity: N,
        requested: values.len(),
      });
    }

    Self::from_fn_in(alloc, |index| values.get(index).cloned().unwrap_or_default())
  }

  /// Builds slot `i` from `make(i)`.
  pub fn from_fn_in<F>(
    alloc: A,
    mut make: F,
  ) -> Result<Self>
  where
    F: FnMut(usize) -> T,
  {
    let mut buf = OwnedBuffer::with_capacity_in(N, alloc)?;

    for index in 0..N {
      unsafe { buf.write_next(make(index)) };
    }

    Ok(Self { buf })
  }

  pub fn try_clone(&self) -> Result<Self>
  where
    T: Clone,
    A: Clone,
  {
    let values = self.as_slice();
    Self::from_fn_in(self.allocator().clone(), |index| values[index].clone())
  }

  #[inline]
  pub const fn len(&self) -> usize {
    N
  }

  #[inline]
  pub const fn is_empty(&self) -> bool {
    N == 0
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

  pub fn at(
    &self,
    index: usize,
  ) -> Result<&T> {
    self
      .as_slice()
      .get(index)
      .ok_or(ContainerError::IndexOutOfRange { index, len: N })
  }

  pub fn at_mut(
    &mut self,
    index: usize,
  ) -> Result<&mut T> {
    self
      .as_mut_slice()
      .get_mut(index)
      .ok_or(ContainerError::IndexOutOfRange { index, len: N })
  }

  /// # Safety
  ///
  /// `index < N`; anything else is undefined behavior.
  #[inline]
  pub unsafe fn get_unchecked(
    &self,
    index: usize,
  ) -> &T {
    debug_assert!(index < N);
    unsafe { self.buf.slot(index).as_ref() }
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

  /// Assigns a clone of `value` to every slot.
  pub fn fill(
    &mut self,
    value: T,
  ) where
    T: Clone,
  {
    self.as_mut_slice().fill(value);
  }

  /// Exchanges storage with `other` in O(1).
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

impl<T, const N: usize, A: Allocator> Deref for FixedArray<T, N, A> {
  type Target = [T];

  fn deref(&self) -> &Self::Target {
    self.as_slice()
  }
}

impl<T, const N: usize, A: Allocator> DerefMut for FixedArray<T, N, A> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    self.as_mut_slice()
  }
}

/// # Panics
///
/// Panics if the allocator cannot provide the copy's storage.
impl<T: Clone, const N: usize, A: Allocator + Clone> Clone for FixedArray<T, N, A> {
  fn clone(&self) -> Self {
    self.try_clone().unwrap_or_else(|err| panic!("{err}"))
  }
}

impl<T: fmt::Debug, const N: usize, A: Allocator> fmt::Debug for FixedArray<T, N, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<T: PartialEq, const N: usize, A: Allocator, B: Allocator> PartialEq<FixedArray<T, N, B>>
  for FixedArray<T, N, A>
{
  fn eq(
    &self,
    other: &FixedArray<T, N, B>,
  ) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: Eq, const N: usize, A: Allocator> Eq for FixedArray<T, N, A> {}

impl<T: PartialOrd, const N: usize, A: Allocator> PartialOrd for FixedArray<T, N, A> {
  fn partial_cmp(
    &self,
    other: &Self,
  ) -> Option<Ordering> {
    self.as_slice().partial_cmp(other.as_slice())
  }
}

impl<T: Ord, const N: usize, A: Allocator> Ord for FixedArray<T, N, A> {
  fn cmp(
    &self,
    other: &Self,
  ) -> Ordering {
    self.as_slice().cmp(other.as_slice())
  }
}

impl<T: Hash, const N: usize, A: Allocator> Hash for FixedArray<T, N, A> {
  fn hash<H: Hasher>(
    &self,
    state: &mut H,
  ) {
    self.as_slice().hash(state);
  }
}

impl<'a, T, const N: usize, A: Allocator> IntoIterator for &'a FixedArray<T, N, A> {
  type Item = &'a T;
  type IntoIter = slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<'a, T, const N: usize, A: Allocator> IntoIterator for &'a mut FixedArray<T, N, A> {
  type Item = &'a mut T;
  type IntoIter = slice::IterMut<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter_mut()
  }
}
