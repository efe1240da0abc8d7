//! The allocator capability every container is built on.
//!
//! ```text
//!   container ──acquire(n)──▶ allocator ──▶ raw slots [ ? ? ? ? ]
//!             ──construct_at──────────────▶ live slot [ v ? ? ? ]
//!             ──destroy_at / move_out─────▶ raw slot  [ ? ? ? ? ]
//!             ──release(ptr, n)───────────▶ storage returned
//! ```
//!
//! `acquire`/`release` and `construct_at`/`destroy_at` are always paired by
//! the containers. Storage is never released while it still holds live
//! elements.

use std::{
  alloc::{self, Layout},
  ptr::{self, NonNull},
};

use log::trace;

use crate::error::{ContainerError, Result};

/// Layout for `n` consecutive values of `T`.
pub(crate) fn array_layout<T>(n: usize) -> Result<Layout> {
  Layout::array::<T>(n).map_err(|_| ContainerError::CapacityOverflow)
}

/// Strategy that hands out raw storage and builds/tears down values in it.
///
/// Implementors provide the byte-level pair [`acquire_bytes`](Allocator::acquire_bytes)
/// and [`release_bytes`](Allocator::release_bytes); the typed operations are
/// derived from them. Zero-sized requests never reach the byte-level pair.
pub trait Allocator {
  /// Obtains storage for `layout`. `layout.size()` is never zero.
  fn acquire_bytes(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>>;

  /// Returns storage obtained from [`acquire_bytes`](Allocator::acquire_bytes).
  ///
  /// # Safety
  ///
  /// `ptr` must come from `acquire_bytes` on this allocator with the same
  /// `layout`, and must not be released twice.
  unsafe fn release_bytes(
    &self,
    ptr: NonNull<u8>,
    layout: Layout,
  );

  /// Acquires uninitialized storage for `n` values of `T`.
  ///
  /// A zero-sized request yields a dangling pointer without touching the backend.
  fn acquire<T>(
    &self,
    n: usize,
  ) -> Result<NonNull<T>> {
    let layout = array_layout::<T>(n)?;

    if layout.size() == 0 {
      return Ok(NonNull::dangling());
    }

    self.acquire_bytes(layout).map(NonNull::cast)
  }

  /// Releases storage for `n` values of `T`.
  ///
  /// # Safety
  ///
  /// `ptr` and `n` must match a prior [`acquire`](Allocator::acquire) and the
  /// slots must not hold live values.
  unsafe fn release<T>(
    &self,
    ptr: NonNull<T>,
    n: usize,
  ) {
    let Ok(layout) = Layout::array::<T>(n) else {
      return;
    };

    if layout.size() == 0 {
      return;
    }

    unsafe { self.release_bytes(ptr.cast(), layout) }
  }

  /// Moves `value` into the raw slot at `ptr`.
  ///
  /// # Safety
  ///
  /// `ptr` must be acquired, aligned and not hold a live value.
  unsafe fn construct_at<T>(
    &self,
    ptr: NonNull<T>,
    value: T,
  ) {
    unsafe { ptr.as_ptr().write(value) }
  }

  /// Runs the destructor of the value at `ptr`, leaving the slot raw.
  ///
  /// # Safety
  ///
  /// `ptr` must hold a live value that is not used afterwards.
  unsafe fn destroy_at<T>(
    &self,
    ptr: NonNull<T>,
  ) {
    unsafe { ptr::drop_in_place(ptr.as_ptr()) }
  }

  /// Hands the value at `ptr` to the caller, leaving the slot raw.
  ///
  /// # Safety
  ///
  /// Same as [`destroy_at`](Allocator::destroy_at).
  unsafe fn move_out<T>(
    &self,
    ptr: NonNull<T>,
  ) -> T {
    unsafe { ptr.as_ptr().read() }
  }
}

impl<A: Allocator> Allocator for &A {
  fn acquire_bytes(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    (**self).acquire_bytes(layout)
  }

  unsafe fn release_bytes(
    &self,
    ptr: NonNull<u8>,
    layout: Layout,
  ) {
    unsafe { (**self).release_bytes(ptr, layout) }
  }

  fn acquire<T>(
    &self,
    n: usize,
  ) -> Result<NonNull<T>> {
    (**self).acquire(n)
  }

  unsafe fn release<T>(
    &self,
    ptr: NonNull<T>,
    n: usize,
  ) {
    unsafe { (**self).release(ptr, n) }
  }

  unsafe fn construct_at<T>(
    &self,
    ptr: NonNull<T>,
    value: T,
  ) {
    unsafe { (**self).construct_at(ptr, value) }
  }

  unsafe fn destroy_at<T>(
    &self,
    ptr: NonNull<T>,
  ) {
    unsafe { (**self).destroy_at(ptr) }
  }

  unsafe fn move_out<T>(
    &self,
    ptr: NonNull<T>,
  ) -> T {
    unsafe { (**self).move_out(ptr) }
  }
}

/// The process-wide heap behind `std::alloc`. Default for every container.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
  fn acquire_bytes(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    let addr = unsafe { alloc::alloc(layout) };

    trace!("system acquire {} bytes (align {}) at {:?}", layout.size(), layout.align(), addr);

    NonNull::new(addr).ok_or(ContainerError::AllocationFailure {
      size: layout.size(),
      align: layout.align(),
    })
  }

  unsafe fn release_bytes(
    &self,
    ptr: NonNull<u8>,
    layout: Layout,
  ) {
    trace!("system release {} bytes at {:?}", layout.size(), ptr);

    unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
  }
}
