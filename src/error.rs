//! Error type shared by every container and allocator in the crate.

use thiserror::Error;

/// Errors reported by checked container operations and by allocators.
///
/// All variants describe either a broken caller contract (bad index, empty
/// container) or resource exhaustion. Nothing is retried internally.
#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
pub enum ContainerError {
  /// Checked access, insert or erase position beyond the valid bounds.
  #[error("index {index} out of range for length {len}")]
  IndexOutOfRange { index: usize, len: usize },

  /// `pop`, `front` or `back` on a container without elements.
  #[error("container is empty")]
  EmptyContainer,

  /// Range with `start > end` or reaching past the end of the container.
  #[error("invalid range {start}..{end} for length {len}")]
  InvalidRange {
    start: usize,
    end: usize,
    len: usize,
  },

  /// The allocator could not provide the requested storage.
  #[error("allocation of {size} bytes (align {align}) failed")]
  AllocationFailure { size: usize, align: usize },

  /// More elements than a fixed capacity allows.
  #[error("capacity {capacity} exceeded by request for {requested} elements")]
  CapacityExceeded { capacity: usize, requested: usize },

  /// The requested element count does not fit in a memory layout.
  #[error("capacity overflow")]
  CapacityOverflow,
}

/// Result alias used throughout the crate.
pub type Result<T, E = ContainerError> = core::result::Result<T, E>;
