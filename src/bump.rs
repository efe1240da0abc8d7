use std::{
  alloc::Layout,
  cell::Cell,
  fmt, mem,
  ptr::{self, NonNull},
  sync::Mutex,
};

use libc::{c_void, intptr_t, sbrk};
use log::trace;

use crate::{
  align, align_to,
  allocator::Allocator,
  block::{BACK_POINTER, Block},
  error::{ContainerError, Result},
};

/// Serializes the sbrk calls made by this crate. libc's malloc moves the same
/// break without taking it.
static SBRK_LOCK: Mutex<()> = Mutex::new(());

/// Allocator that grows the data segment with `sbrk(2)` and keeps a
/// singly linked list of the regions it carved out.
///
/// Freed regions are reused first-fit. A freed region at the end of the list
/// is handed back to the OS when nothing else moved the program break
/// after it.
///
/// The block list is not synchronized: one instance must stay on one thread
/// (the type is `!Sync`). Share it between containers by reference.
///
/// Trimming checks `sbrk(0)` and then shrinks the break in two calls. A
/// `malloc` on another thread that grows the break through its main arena
/// in between would have its memory handed back to the OS, so do not free
/// through this allocator while other threads may `sbrk` concurrently.
pub struct BumpAllocator {
  first: Cell<*mut Block>,
  last: Cell<*mut Block>,
}

impl BumpAllocator {
  pub const fn new() -> Self {
    Self {
      first: Cell::new(ptr::null_mut()),
      last: Cell::new(ptr::null_mut()),
    }
  }

  /// Number of regions currently tracked, free or not.
  pub fn blocks(&self) -> usize {
    let mut count = 0;
    let mut current = self.first.get();

    while !current.is_null() {
      count += 1;
      current = unsafe { (*current).next };
    }

    count
  }

  unsafe fn find_free_block(
    &self,
    layout: Layout,
  ) -> Option<(*mut Block, usize)> {
    unsafe {
      let mut current: *mut Block = self.first.get();

      while !current.is_null() {
        if (*current).is_free {
          if let Some(data) = (*current).fit(layout.size(), layout.align()) {
            return Some((current, data));
          }
        }
        current = (*current).next;
      }

      None
    }
  }

  /// Returns a pointer to `layout.size()` bytes aligned to `layout.align()`,
  /// or null when the program break cannot move.
  ///
  /// # Safety
  ///
  /// The memory comes straight from the data segment; the caller is
  /// responsible for initialization and for handing it back through
  /// [`deallocate`](Self::deallocate) on this same instance.
  pub unsafe fn allocate(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    unsafe {
      if let Some((block, data)) = self.find_free_block(layout) {
        (*block).is_free = false;
        Self::write_back_pointer(data, block);

        trace!("bump reuse block {:?} for {} bytes at {:#x}", block, layout.size(), data);

        return data as *mut u8;
      }

      let Some(payload) = BACK_POINTER
        .checked_add(layout.align() - 1)
        .and_then(|bytes| bytes.checked_add(layout.size()))
      else {
        return ptr::null_mut();
      };
      // One extra word leaves room to align the header itself.
      let Some(total_size) = payload.checked_add(mem::size_of::<Block>() + mem::size_of::<usize>())
      else {
        return ptr::null_mut();
      };
      let size: usize = align!(total_size);

      let _guard = SBRK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

      let address = sbrk(size as intptr_t);

      if address == usize::MAX as *mut c_void {
        return ptr::null_mut();
      }

      let region_end = address as usize + size;
      let block = align_to!(address as usize, mem::align_of::<Block>()) as *mut Block;
      block.write(Block::new(
        region_end - block as usize - mem::size_of::<Block>(),
        false,
        ptr::null_mut(),
      ));

      let last = self.last.get();
      if last.is_null() {
        self.first.set(block);
      } else {
        (*last).next = block;
      }
      self.last.set(block);

      trace!("bump grew program break by {} bytes, block {:?}", size, block);

      match (*block).fit(layout.size(), layout.align()) {
        Some(data) => {
          Self::write_back_pointer(data, block);
          data as *mut u8
        }
        None => ptr::null_mut(),
      }
    }
  }

  /// Marks the region behind `address` free and trims free regions off the
  /// end of the data segment.
  ///
  /// # Safety
  ///
  /// `address` must come from [`allocate`](Self::allocate) on this instance
  /// and must not be deallocated twice. Null is ignored.
  pub unsafe fn deallocate(
    &self,
    address: *mut u8,
  ) {
    unsafe {
      if address.is_null() {
        return;
      }

      let block = self.find_block(address);
      (*block).is_free = true;

      trace!("bump free block {:?}", block);

      self.trim();
    }
  }

  unsafe fn trim(&self) {
    unsafe {
      let _guard = SBRK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

      loop {
        let last = self.last.get();

        if last.is_null() || !(*last).is_free {
          return;
        }

        // Someone else owns the memory above us; leave the break alone.
        if sbrk(0) as usize != (*last).end() {
          return;
        }

        let mut previous: *mut Block = ptr::null_mut();
        let mut current: *mut Block = self.first.get();
        while current != last {
          previous = current;
          current = (*current).next;
        }

        let decrement = (*last).end() - last as usize;

        if previous.is_null() {
          self.first.set(ptr::null_mut());
        } else {
          (*previous).next = ptr::null_mut();
        }
        self.last.set(previous);

        sbrk(-(decrement as intptr_t));

        trace!("bump returned {} bytes to the OS", decrement);
      }
    }
  }

  unsafe fn write_back_pointer(
    data: usize,
    block: *mut Block,
  ) {
    unsafe { ((data - BACK_POINTER) as *mut *mut Block).write_unaligned(block) }
  }

  unsafe fn find_block(
    &self,
    address: *mut u8,
  ) -> *mut Block {
    unsafe { (address.sub(BACK_POINTER) as *mut *mut Block).read_unaligned() }
  }
}

impl Default for BumpAllocator {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for BumpAllocator {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("BumpAllocator")
      .field("first", &self.first.get())
      .field("last", &self.last.get())
      .field("blocks", &self.blocks())
      .finish()
  }
}

/// Two bump allocators are interchangeable only if they are the same instance.
impl PartialEq for BumpAllocator {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    ptr::eq(self, other)
  }
}

impl Eq for BumpAllocator {}

impl Allocator for BumpAllocator {
  fn acquire_bytes(
    &self,
    layout: Layout,
  ) -> Result<NonNull<u8>> {
    let address = unsafe { self.allocate(layout) };

    NonNull::new(address).ok_or(ContainerError::AllocationFailure {
      size: layout.size(),
      align: layout.align(),
    })
  }

  unsafe fn release_bytes(
    &self,
    ptr: NonNull<u8>,
    _layout: Layout,
  ) {
    unsafe { self.deallocate(ptr.as_ptr()) }
  }
}
