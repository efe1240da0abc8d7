//! Move-only owner of an allocator-backed run of slots.

use std::{
  marker::PhantomData,
  mem,
  ptr::{self, NonNull},
  slice,
};

use log::debug;

use crate::{allocator::Allocator, error::Result};

/// Pointer, length, capacity and allocator bundled as one owning value.
///
/// ```text
///   ptr ──▶ [ live │ live │ live │ raw │ raw ]
///            ◀──── len ────────▶
///            ◀──────────── cap ─────────────▶
/// ```
///
/// Slots `[0, len)` hold live values; `[len, cap)` are acquired but raw.
/// Dropping the buffer destroys the live values, then releases the storage.
pub struct OwnedBuffer<T, A: Allocator> {
  ptr: NonNull<T>,
  len: usize,
  cap: usize,
  alloc: A,
  _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for OwnedBuffer<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for OwnedBuffer<T, A> {}

impl<T, A: Allocator> OwnedBuffer<T, A> {
  pub const fn new_in(alloc: A) -> Self {
    Self {
      ptr: NonNull::dangling(),
      len: 0,
      cap: 0,
      alloc,
      _marker: PhantomData,
    }
  }

  pub fn with_capacity_in(
    cap: usize,
    alloc: A,
  ) -> Result<Self> {
    let ptr = alloc.acquire::<T>(cap)?;

    Ok(Self {
      ptr,
      len: 0,
      cap,
      alloc,
      _marker: PhantomData,
    })
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn capacity(&self) -> usize {
    self.cap
  }

  #[inline]
  pub fn allocator(&self) -> &A {
    &self.alloc
  }

  #[inline]
  pub fn as_ptr(&self) -> *const T {
    self.ptr.as_ptr()
  }

  #[inline]
  pub fn as_slice(&self) -> &[T] {
    unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
  }

  #[inline]
  pub fn as_mut_slice(&mut self) -> &mut [T] {
    unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
  }

  /// Pointer to slot `index`.
  ///
  /// # Safety
  ///
  /// `index <= cap`.
  #[inline]
  pub unsafe fn slot(
    &self,
    index: usize,
  ) -> NonNull<T> {
    debug_assert!(index <= self.cap);
    unsafe { self.ptr.add(index) }
  }

  /// # Safety
  ///
  /// `len <= cap` and slots `[0, len)` must be live.
  #[inline]
  pub unsafe fn set_len(
    &mut self,
    len: usize,
  ) {
    debug_assert!(len <= self.cap);
    self.len = len;
  }

  /// Constructs `value` in the first raw slot.
  ///
  /// # Safety
  ///
  /// `len < cap`.
  #[inline]
  pub unsafe fn write_next(
    &mut self,
    value: T,
  ) {
    debug_assert!(self.len < self.cap);
    unsafe {
      self.alloc.construct_at(self.slot(self.len), value);
    }
    self.len += 1;
  }

  /// Destroys the live values in `[start, end)` through the allocator.
  ///
  /// # Safety
  ///
  /// The range must be live and outside `[0, len)`, so a panicking
  /// destructor can only leak.
  pub unsafe fn destroy_range(
    &self,
    start: usize,
    end: usize,
  ) {
    debug_assert!(self.len <= start);
    for index in start..end {
      unsafe { self.alloc.destroy_at(self.slot(index)) };
    }
  }

  /// Moves the live values into fresh storage of exactly `new_cap` slots.
  ///
  /// The new storage is acquired before anything is touched, so a failure
  /// leaves the buffer as it was. The old storage is released only after
  /// the values are in place.
  pub fn relocate(
    &mut self,
    new_cap: usize,
  ) -> Result<()> {
    debug_assert!(new_cap >= self.len);

    let new_ptr = self.alloc.acquire::<T>(new_cap)?;

    debug!("relocating {} values: capacity {} -> {}", self.len, self.cap, new_cap);

    unsafe {
      ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
      self.alloc.release(self.ptr, self.cap);
    }

    self.ptr = new_ptr;
    self.cap = new_cap;

    Ok(())
  }

  /// Destroys every live value and releases the storage, leaving an
  /// empty buffer without storage.
  pub fn reset(&mut self) {
    let len = mem::replace(&mut self.len, 0);
    let cap = mem::replace(&mut self.cap, 0);
    let ptr = mem::replace(&mut self.ptr, NonNull::dangling());

    unsafe {
      for index in 0..len {
        self.alloc.destroy_at(ptr.add(index));
      }
      self.alloc.release(ptr, cap);
    }
  }
}

impl<T, A: Allocator> Drop for OwnedBuffer<T, A> {
  fn drop(&mut self) {
    self.reset();
  }
}
