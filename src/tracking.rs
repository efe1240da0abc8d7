//! Allocator wrapper that counts every call and can be told to fail.
//!
//! Containers are verified against it: after a scenario finishes and the
//! container is dropped, [`AllocStats::is_balanced`] must hold.

use std::{
  alloc::Layout,
  cell::Cell,
  fmt,
  ptr::NonNull,
  rc::Rc,
};

use log::trace;

use crate::{
  allocator::{Allocator, SystemAllocator},
  error::{ContainerError, Result},
};

/// Failure injection for [`TrackingAllocator`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TrackingBehaviour {
  /// Forward every request.
  #[default]
  None,
  /// Refuse every acquisition.
  FailAtAcquire,
  /// Let the next `n` acquisitions through, then refuse.
  FailAfter(usize),
}

/// Counters kept by a [`TrackingAllocator`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
  pub acquires: usize,
  pub releases: usize,
  pub failed_acquires: usize,
  pub constructs: usize,
  pub destroys: usize,
  pub live_bytes: usize,
  pub peak_bytes: usize,
}

impl AllocStats {
  /// Every acquire was released and every construct was destroyed.
  pub fn is_balanced(&self) -> bool {
    self.acquires == self.releases && self.constructs == self.destroys && self.live_bytes == 0
  }

  /// Values currently constructed and not yet destroyed.
  pub fn live_values(&self) -> usize {
    self.constructs - self.destroys
  }
}

#[derive(Default)]
struct Shared {
  stats: Cell<AllocStats>,
  behaviour: Cell<TrackingBehaviour>,
}

impl Shared {
  fn update(
    &self,
    f: impl FnOnce(&mut AllocStats),
  ) {
    let mut stats = self.stats.get();
    f(&mut stats);
    self.stats.set(stats);
  }
}

/// Wraps an allocator and records acquire/release and construct/destroy
/// pairs. Clones share the same counters and compare equal.
#[derive(Clone)]
pub struct TrackingAllocator<A: Allocator = SystemAllocator> {
  inner: A,
  shared: Rc<Shared>,
}

impl TrackingAllocator {
  pub fn new() -> Self {
    Self::wrap(SystemAllocator)
  }
}

impl<A: Allocator> TrackingAllocator<A> {
  pub fn wrap(inner: A) -> Self {
    Self {
      inner,
      shared: Rc::default(),
    }
  }

  pub fn stats(&self) -> AllocStats {
    self.shared.stats.get()
  }

  pub fn behaviour(&self) -> TrackingBehaviour {
    self.shared.behaviour.get()
  }

  pub fn change_behaviour(
    &self,
    behaviour: TrackingBehaviour,
  ) {
    self.shared.behaviour.set(behaviour);
  }

  fn admit(&self) -> bool {
    match self.shared.behaviour.get() {
      TrackingBehaviour::None => true,
      TrackingBehaviour::FailAtAcquire | TrackingBehaviour::FailAfter(0) => false,
      TrackingBehaviour::FailAfter(n) => {
        self.shared.behaviour.set(TrackingBehaviour::FailAfter(n - 1));
        true
      }
    }
  }
}

impl Default for TrackingAllocator {
  fn default() -> Self {
    Self::new()
  }
}

impl<A: Allocator> PartialEq for TrackingAllocator<A> {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    Rc::ptr_eq(&self.shared, &other.shared)
  }
}

impl<A: Allocator> Eq for TrackingAllocator<A> {}

impl<A: Allocator> fmt::Debug for TrackingAllocator<A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("TrackingAllocator")
      .field("stats", &self.stats())
      .field("behaviour", &self.behaviour())
      .finish()
  }
}

impl<A: Allocator> Allocator for TrackingAllocator<A> {
  fn acquire_bytes(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    if !self.admit() {
      trace!("tracking refused {} bytes", layout.size());
      self.shared.update(|stats| stats.failed_acquires += 1);

      return Err(ContainerError::AllocationFailure {
        size: layout.size(),
        align: layout.align(),
      });
    }

    let ptr = self.inner.acquire_bytes(layout)?;

    self.shared.update(|stats| {
      stats.acquires += 1;
      stats.live_bytes += layout.size();
      stats.peak_bytes = stats.peak_bytes.max(stats.live_bytes);
    });

    Ok(ptr)
  }

  unsafe fn release_bytes(
    &self,
    ptr: NonNull<u8>,
    layout: Layout,
  ) {
    self.shared.update(|stats| {
      stats.releases += 1;
      stats.live_bytes -= layout.size();
    });

    unsafe { self.inner.release_bytes(ptr, layout) }
  }

  unsafe fn construct_at<T>(
    &self,
    ptr: NonNull<T>,
    value: T,
  ) {
    self.shared.update(|stats| stats.constructs += 1);

    unsafe { self.inner.construct_at(ptr, value) }
  }

  unsafe fn destroy_at<T>(
    &self,
    ptr: NonNull<T>,
  ) {
    self.shared.update(|stats| stats.destroys += 1);

    unsafe { self.inner.destroy_at(ptr) }
  }

  unsafe fn move_out<T>(
    &self,
    ptr: NonNull<T>,
  ) -> T {
    self.shared.update(|stats| stats.destroys += 1);

    unsafe { self.inner.move_out(ptr) }
  }
}
