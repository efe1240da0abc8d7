//! # rcontainers - Containers over a Pluggable Allocator
//!
//! This crate provides a **growable array**, a **fixed array** and a
//! **doubly linked list** whose storage is obtained from a user-supplied
//! [`Allocator`] instead of the global heap.
//!
//! ## Overview
//!
//! Every container is generic over its allocator, with [`SystemAllocator`]
//! as the default. Storage and element lifetimes both go through it:
//!
//! ```text
//!   Container / Allocator Split:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │   DynArray<T, A>          FixedArray<T, N, A>      LinkedList<T, A>  │
//!   │         │                        │                        │          │
//!   │         └────────────┬───────────┘                        │          │
//!   │                      ▼                                    │          │
//!   │              OwnedBuffer<T, A>                            │          │
//!   │        (ptr, len, capacity, alloc)                        │          │
//!   │                      │                                    │          │
//!   │                      └──────────────┬─────────────────────┘          │
//!   │                                     ▼                                │
//!   │                               A: Allocator                           │
//!   │         acquire / release   construct_at / destroy_at / move_out     │
//!   │                                     │                                │
//!   │              ┌──────────────────────┼──────────────────────┐         │
//!   │              ▼                      ▼                      ▼         │
//!   │       SystemAllocator         BumpAllocator      TrackingAllocator   │
//!   │         (std heap)              (sbrk)          (counts + failures)  │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rcontainers
//!   ├── align        - Alignment macros (align!, align_to!)
//!   ├── allocator    - Allocator trait and SystemAllocator
//!   ├── block        - Block metadata for the sbrk allocator (internal)
//!   ├── bump         - BumpAllocator implementation (unix)
//!   ├── tracking     - TrackingAllocator for leak and failure testing
//!   ├── buffer       - OwnedBuffer: move-only storage bundle
//!   ├── dyn_array    - DynArray growable array
//!   ├── fixed_array  - FixedArray with compile-time length
//!   ├── linked_list  - LinkedList and its cursor
//!   └── error        - ContainerError and Result
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rcontainers::{ContainerError, DynArray, LinkedList};
//!
//! let mut values = DynArray::new();
//! for value in [1, 2, 3] {
//!   values.push_back(value).unwrap();
//! }
//! assert_eq!(values.capacity(), 4);
//! assert_eq!(values.at(7), Err(ContainerError::IndexOutOfRange { index: 7, len: 3 }));
//!
//! let mut list: LinkedList<_> = values.into_iter().collect();
//! list.reverse();
//! assert_eq!(list.pop_front(), Ok(3));
//! ```
//!
//! ## Growth
//!
//! ```text
//!   push_back into a full DynArray:
//!
//!   before  ┌───┬───┬───┬───┐
//!           │ a │ b │ c │ d │             len 4, capacity 4
//!           └───┴───┴───┴───┘
//!   after   ┌───┬───┬───┬───┬───┬───┬───┬───┐
//!           │ a │ b │ c │ d │ e │   │   │   │   len 5, capacity 8
//!           └───┴───┴───┴───┴───┴───┴───┴───┘
//!
//!   New storage is acquired first; the old one is released only after the
//!   values were moved. A failed acquire leaves the array untouched.
//! ```
//!
//! ## Limitations
//!
//! - **Not thread-safe allocators**: `TrackingAllocator` and `BumpAllocator`
//!   use interior mutability without locking
//! - **Shared program break**: `BumpAllocator` serializes only its own sbrk
//!   calls. libc's `malloc` can move the break between the check and the
//!   shrink when a freed tail block is trimmed
//! - **No automatic shrinking**: erasing never gives storage back; call
//!   `shrink_to_fit`
//! - **Unix-only bump allocator**: `BumpAllocator` requires `libc` and `sbrk`
//!
//! ## Safety
//!
//! The containers are safe to use. Unsafe code is confined to the allocator
//! implementations, [`OwnedBuffer`], the list's node links, and the
//! `get_unchecked` accessors.

pub mod align;
mod allocator;
#[cfg(unix)]
mod block;
mod buffer;
#[cfg(unix)]
mod bump;
pub mod dyn_array;
mod error;
mod fixed_array;
pub mod linked_list;
mod tracking;

pub use allocator::{Allocator, SystemAllocator};
pub use buffer::OwnedBuffer;
#[cfg(unix)]
pub use bump::BumpAllocator;
pub use dyn_array::DynArray;
pub use error::{ContainerError, Result};
pub use fixed_array::FixedArray;
pub use linked_list::{CursorMut, LinkedList};
pub use tracking::{AllocStats, TrackingAllocator, TrackingBehaviour};
