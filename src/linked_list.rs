//! Doubly linked list whose nodes are acquired one by one from an [`Allocator`].
//!
//! ```text
//!            head                                  tail
//!             │                                     │
//!             ▼                                     ▼
//!          ┌──────┐  next  ┌──────┐  next  ┌──────┐
//!   None ◀─│  a   │───────▶│  b   │───────▶│  c   │──▶ None
//!          └──────┘◀───────└──────┘◀───────└──────┘
//!                    prev            prev
//! ```
//!
//! `next` is the owning chain: teardown walks it from `head`. `prev` is a
//! back-reference used for traversal and relinking only.

use std::{
  cmp::Ordering,
  fmt,
  hash::{Hash, Hasher},
  iter::{self, FusedIterator},
  marker::PhantomData,
  mem,
  ops::RangeBounds,
  ptr::{self, NonNull},
};

use log::debug;

use crate::{
  allocator::{Allocator, SystemAllocator},
  dyn_array::resolve_range,
  error::{ContainerError, Result},
};

type Link<T> = Option<NonNull<Node<T>>>;

/// Detached run of nodes: first, last and how many.
type Chain<T> = (NonNull<Node<T>>, NonNull<Node<T>>, usize);

struct Node<T> {
  value: T,
  next: Link<T>,
  prev: Link<T>,
}

/// Doubly linked sequence with O(1) operations at both ends and at a
/// [`CursorMut`].
pub struct LinkedList<T, A: Allocator = SystemAllocator> {
  head: Link<T>,
  tail: Link<T>,
  len: usize,
  alloc: A,
  _marker: PhantomData<Box<Node<T>>>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for LinkedList<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for LinkedList<T, A> {}

impl<T> LinkedList<T> {
  pub const fn new() -> Self {
    Self::new_in(SystemAllocator)
  }

  /// `len` clones of `value`.
  pub fn from_elem(
    len: usize,
    value: T,
  ) -> Result<Self>
  where
    T: Clone,
  {
    let mut list = Self::new();
    list.resize_with_value(len, value)?;
    Ok(list)
  }
}

impl<T, A: Allocator> LinkedList<T, A> {
  pub const fn new_in(alloc: A) -> Self {
    Self {
      head: None,
      tail: None,
      len: 0,
      alloc,
      _marker: PhantomData,
    }
  }

  pub fn from_slice_in(
    values: &[T],
    alloc: A,
  ) -> Result<Self>
  where
    T: Clone,
  {
    let mut list = Self::new_in(alloc);
    for value in values {
      list.push_back(value.clone())?;
    }
    Ok(list)
  }

  pub fn try_clone(&self) -> Result<Self>
  where
    T: Clone,
    A: Clone,
  {
    let mut list = Self::new_in(self.alloc.clone());
    for value in self {
      list.push_back(value.clone())?;
    }
    Ok(list)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  #[inline]
  pub fn allocator(&self) -> &A {
    &self.alloc
  }

  // =============================================================================
  // Node management
  // =============================================================================

  fn create_node(
    &self,
    value: T,
  ) -> Result<NonNull<Node<T>>> {
    let node = self.alloc.acquire::<Node<T>>(1)?;

    unsafe {
      self.alloc.construct_at(
        node,
        Node {
          value,
          next: None,
          prev: None,
        },
      );
    }

    Ok(node)
  }

  /// # Safety
  ///
  /// `node` must be unlinked and acquired by this list's allocator.
  unsafe fn take_node(
    &self,
    node: NonNull<Node<T>>,
  ) -> T {
    unsafe {
      let Node { value, .. } = self.alloc.move_out(node);
      self.alloc.release(node, 1);
      value
    }
  }

  /// # Safety
  ///
  /// Same as [`take_node`](Self::take_node).
  unsafe fn destroy_node(
    &self,
    node: NonNull<Node<T>>,
  ) {
    unsafe {
      self.alloc.destroy_at(node);
      self.alloc.release(node, 1);
    }
  }

  fn link_front(
    &mut self,
    node: NonNull<Node<T>>,
  ) {
    unsafe {
      (*node.as_ptr()).next = self.head;
      (*node.as_ptr()).prev = None;

      match self.head {
        Some(head) => (*head.as_ptr()).prev = Some(node),
        None => self.tail = Some(node),
      }
    }

    self.head = Some(node);
    self.len += 1;
  }

  fn link_back(
    &mut self,
    node: NonNull<Node<T>>,
  ) {
    unsafe {
      (*node.as_ptr()).prev = self.tail;
      (*node.as_ptr()).next = None;

      match self.tail {
        Some(tail) => (*tail.as_ptr()).next = Some(node),
        None => self.head = Some(node),
      }
    }

    self.tail = Some(node);
    self.len += 1;
  }

  /// # Safety
  ///
  /// `successor` must belong to this list.
  unsafe fn link_before(
    &mut self,
    successor: NonNull<Node<T>>,
    node: NonNull<Node<T>>,
  ) {
    unsafe {
      let prev = (*successor.as_ptr()).prev;
      (*node.as_ptr()).prev = prev;
      (*node.as_ptr()).next = Some(successor);
      (*successor.as_ptr()).prev = Some(node);

      match prev {
        Some(prev) => (*prev.as_ptr()).next = Some(node),
        None => self.head = Some(node),
      }
    }

    self.len += 1;
  }

  /// # Safety
  ///
  /// `predecessor` must belong to this list.
  unsafe fn link_after(
    &mut self,
    predecessor: NonNull<Node<T>>,
    node: NonNull<Node<T>>,
  ) {
    unsafe {
      let next = (*predecessor.as_ptr()).next;
      (*node.as_ptr()).next = next;
      (*node.as_ptr()).prev = Some(predecessor);
      (*predecessor.as_ptr()).next = Some(node);

      match next {
        Some(next) => (*next.as_ptr()).prev = Some(node),
        None => self.tail = Some(node),
      }
    }

    self.len += 1;
  }

  /// # Safety
  ///
  /// `node` must belong to this list.
  unsafe fn unlink(
    &mut self,
    node: NonNull<Node<T>>,
  ) {
    unsafe {
      let next = (*node.as_ptr()).next;
      let prev = (*node.as_ptr()).prev;

      match prev {
        Some(prev) => (*prev.as_ptr()).next = next,
        None => self.head = next,
      }
      match next {
        Some(next) => (*next.as_ptr()).prev = prev,
        None => self.tail = prev,
      }

      (*node.as_ptr()).next = None;
      (*node.as_ptr()).prev = None;
    }

    self.len -= 1;
  }

  /// Node at `index`, walking from whichever end is closer.
  fn node_at(
    &self,
    index: usize,
  ) -> Link<T> {
    if index >= self.len {
      return None;
    }

    unsafe {
      if index <= self.len / 2 {
        let mut current = self.head;
        for _ in 0..index {
          current = (*current?.as_ptr()).next;
        }
        current
      } else {
        let mut current = self.tail;
        for _ in index + 1..self.len {
          current = (*current?.as_ptr()).prev;
        }
        current
      }
    }
  }

  /// Rebuilds `prev` links, `tail` and `len` after the `next` chain starting
  /// at `head` was rearranged.
  fn relink(
    &mut self,
    head: Link<T>,
  ) {
    let mut prev: Link<T> = None;
    let mut current = head;
    let mut len = 0;

    unsafe {
      while let Some(node) = current {
        (*node.as_ptr()).prev = prev;
        prev = Some(node);
        current = (*node.as_ptr()).next;
        len += 1;
      }
    }

    self.head = head;
    self.tail = prev;
    self.len = len;
  }

  // =============================================================================
  // Ends
  // =============================================================================

  /// O(1). On allocation failure `value` is dropped.
  pub fn push_front(
    &mut self,
    value: T,
  ) -> Result<()> {
    let node = self.create_node(value)?;
    self.link_front(node);
    Ok(())
  }

  /// O(1). On allocation failure `value` is dropped.
  pub fn push_back(
    &mut self,
    value: T,
  ) -> Result<()> {
    let node = self.create_node(value)?;
    self.link_back(node);
    Ok(())
  }

  pub fn pop_front(&mut self) -> Result<T> {
    let node = self.head.ok_or(ContainerError::EmptyContainer)?;

    unsafe {
      self.unlink(node);
      Ok(self.take_node(node))
    }
  }

  pub fn pop_back(&mut self) -> Result<T> {
    let node = self.tail.ok_or(ContainerError::EmptyContainer)?;

    unsafe {
      self.unlink(node);
      Ok(self.take_node(node))
    }
  }

  pub fn front(&self) -> Result<&T> {
    let node = self.head.ok_or(ContainerError::EmptyContainer)?;
    Ok(unsafe { &(*node.as_ptr()).value })
  }

  pub fn front_mut(&mut self) -> Result<&mut T> {
    let node = self.head.ok_or(ContainerError::EmptyContainer)?;
    Ok(unsafe { &mut (*node.as_ptr()).value })
  }

  pub fn back(&self) -> Result<&T> {
    let node = self.tail.ok_or(ContainerError::EmptyContainer)?;
    Ok(unsafe { &(*node.as_ptr()).value })
  }

  pub fn back_mut(&mut self) -> Result<&mut T> {
    let node = self.tail.ok_or(ContainerError::EmptyContainer)?;
    Ok(unsafe { &mut (*node.as_ptr()).value })
  }

  // =============================================================================
  // By index, O(n)
  // =============================================================================

  pub fn get(
    &self,
    index: usize,
  ) -> Option<&T> {
    self
      .node_at(index)
      .map(|node| unsafe { &(*node.as_ptr()).value })
  }

  pub fn get_mut(
    &mut self,
    index: usize,
  ) -> Option<&mut T> {
    self
      .node_at(index)
      .map(|node| unsafe { &mut (*node.as_ptr()).value })
  }

  pub fn at(
    &self,
    index: usize,
  ) -> Result<&T> {
    let len = self.len;
    self
      .get(index)
      .ok_or(ContainerError::IndexOutOfRange { index, len })
  }

  /// Inserts `value` so that it ends up at `index`. `index == len()` appends.
  pub fn insert(
    &mut self,
    index: usize,
    value: T,
  ) -> Result<()> {
    let len = self.len;
    if index > len {
      return Err(ContainerError::IndexOutOfRange { index, len });
    }

    match self.node_at(index) {
      Some(successor) => {
        let node = self.create_node(value)?;
        unsafe { self.link_before(successor, node) };
        Ok(())
      }
      None => self.push_back(value),
    }
  }

  /// Removes and returns the value at `index`.
  pub fn remove(
    &mut self,
    index: usize,
  ) -> Result<T> {
    let len = self.len;
    let node = self
      .node_at(index)
      .ok_or(ContainerError::IndexOutOfRange { index, len })?;

    unsafe {
      self.unlink(node);
      Ok(self.take_node(node))
    }
  }

  /// Destroys the value at `index`.
  pub fn erase(
    &mut self,
    index: usize,
  ) -> Result<()> {
    let len = self.len;
    let node = self
      .node_at(index)
      .ok_or(ContainerError::IndexOutOfRange { index, len })?;

    unsafe {
      self.unlink(node);
      self.destroy_node(node);
    }

    Ok(())
  }

  /// Destroys the values in `range`.
  ///
  /// Fails with [`ContainerError::InvalidRange`] when `start > end` or
  /// `end > len()`.
  pub fn erase_range<R>(
    &mut self,
    range: R,
  ) -> Result<()>
  where
    R: RangeBounds<usize>,
  {
    let (start, end) = resolve_range(&range, self.len)?;
    let mut current = self.node_at(start);

    for _ in start..end {
      let Some(node) = current else {
        break;
      };

      unsafe {
        current = (*node.as_ptr()).next;
        self.unlink(node);
        self.destroy_node(node);
      }
    }

    Ok(())
  }

  // =============================================================================
  // Whole-list operations
  // =============================================================================

  /// Destroys every node.
  pub fn clear(&mut self) {
    let mut current = self.head.take();
    self.tail = None;
    self.len = 0;

    while let Some(node) = current {
      unsafe {
        current = (*node.as_ptr()).next;
        self.destroy_node(node);
      }
    }
  }

  /// Replaces the contents with `count` clones of `value`.
  pub fn assign(
    &mut self,
    count: usize,
    value: T,
  ) -> Result<()>
  where
    T: Clone,
  {
    self.assign_iter(iter::repeat_n(value, count))
  }

  /// Replaces the contents with the values of `values`.
  ///
  /// The new nodes are built before the old ones are destroyed, so on
  /// allocation failure the list is left as it was.
  pub fn assign_iter<I>(
    &mut self,
    values: I,
  ) -> Result<()>
  where
    I: IntoIterator<Item = T>,
  {
    let mut staged = LinkedList::new_in(&self.alloc);
    for value in values {
      staged.push_back(value)?;
    }
    let chain = staged.detach();
    drop(staged);

    self.clear();
    if let Some((head, tail, len)) = chain {
      self.head = Some(head);
      self.tail = Some(tail);
      self.len = len;
    }

    Ok(())
  }

  /// Drops trailing nodes so that at most `len` remain.
  pub fn truncate(
    &mut self,
    len: usize,
  ) {
    while self.len > len {
      if let Some(node) = self.tail {
        unsafe {
          self.unlink(node);
          self.destroy_node(node);
        }
      }
    }
  }

  pub fn resize(
    &mut self,
    len: usize,
  ) -> Result<()>
  where
    T: Default,
  {
    self.resize_with(len, T::default)
  }

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

  pub fn resize_with<F>(
    &mut self,
    len: usize,
    mut fill: F,
  ) -> Result<()>
  where
    F: FnMut() -> T,
  {
    self.truncate(len);

    while self.len < len {
      self.push_back(fill())?;
    }

    Ok(())
  }

  /// Exchanges nodes and allocator with `other` in O(1).
  pub fn swap(
    &mut self,
    other: &mut Self,
  ) {
    mem::swap(self, other);
  }

  /// Reverses the order by swapping every node's links. O(n).
  pub fn reverse(&mut self) {
    let mut current = self.head;

    unsafe {
      while let Some(node) = current {
        let node = &mut *node.as_ptr();
        mem::swap(&mut node.next, &mut node.prev);
        current = node.prev;
      }
    }

    mem::swap(&mut self.head, &mut self.tail);
  }

  pub fn contains(
    &self,
    value: &T,
  ) -> bool
  where
    T: PartialEq,
  {
    self.iter().any(|item| item == value)
  }

  /// Keeps only the values for which `keep` returns `true`.
  pub fn retain<F>(
    &mut self,
    mut keep: F,
  ) where
    F: FnMut(&T) -> bool,
  {
    self.remove_if(|value| !keep(value));
  }

  /// Destroys every value equal to `value`; returns how many.
  pub fn remove_value(
    &mut self,
    value: &T,
  ) -> usize
  where
    T: PartialEq,
  {
    self.remove_if(|item| item == value)
  }

  /// Destroys every value matching `predicate`; returns how many.
  pub fn remove_if<F>(
    &mut self,
    mut predicate: F,
  ) -> usize
  where
    F: FnMut(&T) -> bool,
  {
    let mut removed = 0;
    let mut current = self.head;

    while let Some(node) = current {
      unsafe {
        current = (*node.as_ptr()).next;

        if predicate(&(*node.as_ptr()).value) {
          self.unlink(node);
          self.destroy_node(node);
          removed += 1;
        }
      }
    }

    removed
  }

  /// Collapses runs of equal consecutive values to their first element;
  /// returns how many were destroyed.
  pub fn unique(&mut self) -> usize
  where
    T: PartialEq,
  {
    self.unique_by(|a, b| a == b)
  }

  pub fn unique_by<F>(
    &mut self,
    mut same: F,
  ) -> usize
  where
    F: FnMut(&T, &T) -> bool,
  {
    let mut removed = 0;
    let Some(mut kept) = self.head else {
      return 0;
    };

    unsafe {
      while let Some(node) = (*kept.as_ptr()).next {
        if same(&(*kept.as_ptr()).value, &(*node.as_ptr()).value) {
          self.unlink(node);
          self.destroy_node(node);
          removed += 1;
        } else {
          kept = node;
        }
      }
    }

    removed
  }

  // =============================================================================
  // Sorting and splicing
  // =============================================================================

  pub fn sort(&mut self)
  where
    T: Ord,
  {
    self.sort_by(T::cmp);
  }

  /// Stable merge sort. O(n log n) comparisons, no allocation.
  pub fn sort_by<F>(
    &mut self,
    mut compare: F,
  ) where
    F: FnMut(&T, &T) -> Ordering,
  {
    if self.len < 2 {
      return;
    }

    let sorted = unsafe { merge_sort(self.head, self.len, &mut compare) };
    self.relink(sorted);
  }

  /// Merges the sorted `other` into this sorted list, leaving `other` empty.
  /// Equal values from `self` stay ahead of those from `other`.
  ///
  /// When the allocators differ the values move into fresh nodes of this
  /// list's allocator; if those cannot all be acquired, both lists are left
  /// untouched.
  pub fn merge(
    &mut self,
    other: &mut Self,
  ) -> Result<()>
  where
    T: Ord,
    A: PartialEq,
  {
    self.merge_by(other, T::cmp)
  }

  pub fn merge_by<F>(
    &mut self,
    other: &mut Self,
    mut compare: F,
  ) -> Result<()>
  where
    F: FnMut(&T, &T) -> Ordering,
    A: PartialEq,
  {
    let Some((first, _, _)) = self.take_chain(other)? else {
      return Ok(());
    };

    let merged = unsafe { merge_chains(self.head, Some(first), &mut compare) };
    self.relink(merged);

    Ok(())
  }

  /// Moves every node of `other` to the end of this list.
  pub fn append(
    &mut self,
    other: &mut Self,
  ) -> Result<()>
  where
    A: PartialEq,
  {
    let len = self.len;
    self.splice(len, other)
  }

  /// Moves every node of `other` in front of position `index`.
  ///
  /// Same failure behaviour as [`merge`](Self::merge).
  pub fn splice(
    &mut self,
    index: usize,
    other: &mut Self,
  ) -> Result<()>
  where
    A: PartialEq,
  {
    let len = self.len;
    if index > len {
      return Err(ContainerError::IndexOutOfRange { index, len });
    }

    let Some((first, last, moved)) = self.take_chain(other)? else {
      return Ok(());
    };

    unsafe {
      let before = if index == 0 {
        None
      } else {
        self.node_at(index - 1)
      };
      let after = match before {
        Some(node) => (*node.as_ptr()).next,
        None => self.head,
      };

      (*first.as_ptr()).prev = before;
      (*last.as_ptr()).next = after;

      match before {
        Some(node) => (*node.as_ptr()).next = Some(first),
        None => self.head = Some(first),
      }
      match after {
        Some(node) => (*node.as_ptr()).prev = Some(last),
        None => self.tail = Some(last),
      }
    }

    self.len += moved;
    debug!("spliced {} nodes at {}", moved, index);

    Ok(())
  }

  /// Empties `other` into a detached `(first, last, len)` chain whose nodes
  /// belong to this list's allocator.
  fn take_chain(
    &self,
    other: &mut Self,
  ) -> Result<Option<Chain<T>>>
  where
    A: PartialEq,
  {
    if self.alloc == other.alloc {
      return Ok(other.detach());
    }

    // Nodes must go back to the allocator that acquired them.
    let mut spare = self.acquire_nodes(other.len)?;
    let mut head: Link<T> = None;
    let mut tail: Link<T> = None;
    let mut len = 0;

    while let Some(node) = spare {
      let Ok(value) = other.pop_front() else {
        break;
      };

      unsafe {
        spare = ptr::addr_of!((*node.as_ptr()).next).read();
        self.alloc.construct_at(
          node,
          Node {
            value,
            next: None,
            prev: tail,
          },
        );

        match tail {
          Some(tail) => (*tail.as_ptr()).next = Some(node),
          None => head = Some(node),
        }
      }

      tail = Some(node);
      len += 1;
    }

    self.release_nodes(spare);
    debug!("moved {} values across allocators", len);

    Ok(head.zip(tail).map(|(head, tail)| (head, tail, len)))
  }

  /// Acquires `count` raw nodes threaded through their `next` field, or none.
  fn acquire_nodes(
    &self,
    count: usize,
  ) -> Result<Link<T>> {
    let mut stack: Link<T> = None;

    for _ in 0..count {
      match self.alloc.acquire::<Node<T>>(1) {
        Ok(node) => {
          unsafe { ptr::addr_of_mut!((*node.as_ptr()).next).write(stack) };
          stack = Some(node);
        }
        Err(err) => {
          self.release_nodes(stack);
          return Err(err);
        }
      }
    }

    Ok(stack)
  }

  /// Releases raw nodes threaded by [`acquire_nodes`](Self::acquire_nodes).
  fn release_nodes(
    &self,
    mut stack: Link<T>,
  ) {
    while let Some(node) = stack {
      unsafe {
        stack = ptr::addr_of!((*node.as_ptr()).next).read();
        self.alloc.release(node, 1);
      }
    }
  }

  /// Unhooks every node, leaving the list empty.
  fn detach(&mut self) -> Option<Chain<T>> {
    let head = self.head.take();
    let tail = self.tail.take();
    let len = mem::replace(&mut self.len, 0);

    head.zip(tail).map(|(head, tail)| (head, tail, len))
  }

  // =============================================================================
  // Traversal
  // =============================================================================

  pub fn iter(&self) -> Iter<'_, T> {
    Iter {
      head: self.head,
      tail: self.tail,
      len: self.len,
      _marker: PhantomData,
    }
  }

  pub fn iter_mut(&mut self) -> IterMut<'_, T> {
    IterMut {
      head: self.head,
      tail: self.tail,
      len: self.len,
      _marker: PhantomData,
    }
  }

  /// Cursor on the first node, or on the "ghost" position when empty.
  pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T, A> {
    CursorMut {
      current: self.head,
      index: 0,
      list: self,
    }
  }

  /// Cursor on the last node, or on the "ghost" position when empty.
  pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T, A> {
    let index = self.len.saturating_sub(1);

    CursorMut {
      current: self.tail,
      index,
      list: self,
    }
  }

  #[cfg(test)]
  fn assert_links(&self) {
    let mut count = 0;
    let mut prev: Link<T> = None;
    let mut current = self.head;

    unsafe {
      while let Some(node) = current {
        assert_eq!((*node.as_ptr()).prev, prev);
        prev = Some(node);
        current = (*node.as_ptr()).next;
        count += 1;
      }
    }

    assert_eq!(self.tail, prev);
    assert_eq!(self.len, count);
  }
}

/// Sorts the `len`-node chain at `head` and returns its new head.
///
/// # Safety
///
/// `head` must start a `next` chain of exactly `len` nodes ending in `None`.
unsafe fn merge_sort<T, F>(
  head: Link<T>,
  len: usize,
  compare: &mut F,
) -> Link<T>
where
  F: FnMut(&T, &T) -> Ordering,
{
  if len < 2 {
    return head;
  }

  let middle = len / 2;

  unsafe {
    let Some(mut left_last) = head else {
      return None;
    };
    for _ in 1..middle {
      match (*left_last.as_ptr()).next {
        Some(next) => left_last = next,
        None => break,
      }
    }

    let right = (*left_last.as_ptr()).next.take();

    let left = merge_sort(head, middle, compare);
    let right = merge_sort(right, len - middle, compare);

    merge_chains(left, right, compare)
  }
}

/// Merges two sorted `next` chains, taking from `left` on ties.
///
/// # Safety
///
/// Both chains must be disjoint and end in `None`.
unsafe fn merge_chains<T, F>(
  mut left: Link<T>,
  mut right: Link<T>,
  compare: &mut F,
) -> Link<T>
where
  F: FnMut(&T, &T) -> Ordering,
{
  let mut head: Link<T> = None;
  let mut tail: Link<T> = None;

  unsafe {
    loop {
      let taken = match (left, right) {
        (Some(l), Some(r)) => {
          if compare(&(*r.as_ptr()).value, &(*l.as_ptr()).value) == Ordering::Less {
            right = (*r.as_ptr()).next;
            r
          } else {
            left = (*l.as_ptr()).next;
            l
          }
        }
        (Some(rest), None) | (None, Some(rest)) => {
          match tail {
            Some(tail) => (*tail.as_ptr()).next = Some(rest),
            None => head = Some(rest),
          }
          break;
        }
        (None, None) => break,
      };

      match tail {
        Some(tail) => (*tail.as_ptr()).next = Some(taken),
        None => head = Some(taken),
      }
      tail = Some(taken);
    }
  }

  head
}

impl<T, A: Allocator> Drop for LinkedList<T, A> {
  fn drop(&mut self) {
    self.clear();
  }
}

impl<T> Default for LinkedList<T> {
  fn default() -> Self {
    Self::new()
  }
}

/// # Panics
///
/// Panics if the allocator cannot provide a node for the copy.
impl<T: Clone, A: Allocator + Clone> Clone for LinkedList<T, A> {
  fn clone(&self) -> Self {
    self.try_clone().unwrap_or_else(|err| panic!("{err}"))
  }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for LinkedList<T, A> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

impl<T: PartialEq, A: Allocator, B: Allocator> PartialEq<LinkedList<T, B>> for LinkedList<T, A> {
  fn eq(
    &self,
    other: &LinkedList<T, B>,
  ) -> bool {
    self.len == other.len && self.iter().eq(other.iter())
  }
}

impl<T: Eq, A: Allocator> Eq for LinkedList<T, A> {}

impl<T: PartialOrd, A: Allocator> PartialOrd for LinkedList<T, A> {
  fn partial_cmp(
    &self,
    other: &Self,
  ) -> Option<Ordering> {
    self.iter().partial_cmp(other.iter())
  }
}

impl<T: Ord, A: Allocator> Ord for LinkedList<T, A> {
  fn cmp(
    &self,
    other: &Self,
  ) -> Ordering {
    self.iter().cmp(other.iter())
  }
}

impl<T: Hash, A: Allocator> Hash for LinkedList<T, A> {
  fn hash<H: Hasher>(
    &self,
    state: &mut H,
  ) {
    state.write_usize(self.len);
    for value in self {
      value.hash(state);
    }
  }
}

impl<T> FromIterator<T> for LinkedList<T> {
  /// # Panics
  ///
  /// Panics if the allocator runs out of storage.
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut list = Self::new();
    list.extend(iter);
    list
  }
}

impl<T, A: Allocator> Extend<T> for LinkedList<T, A> {
  /// # Panics
  ///
  /// Panics if the allocator runs out of storage.
  fn extend<I: IntoIterator<Item = T>>(
    &mut self,
    iter: I,
  ) {
    for value in iter {
      if let Err(err) = self.push_back(value) {
        panic!("{err}");
      }
    }
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a LinkedList<T, A> {
  type Item = &'a T;
  type IntoIter = Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut LinkedList<T, A> {
  type Item = &'a mut T;
  type IntoIter = IterMut<'a, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter_mut()
  }
}

impl<T, A: Allocator> IntoIterator for LinkedList<T, A> {
  type Item = T;
  type IntoIter = IntoIter<T, A>;

  fn into_iter(self) -> Self::IntoIter {
    IntoIter { list: self }
  }
}

pub struct Iter<'a, T> {
  head: Link<T>,
  tail: Link<T>,
  len: usize,
  _marker: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
  type Item = &'a T;

  fn next(&mut self) -> Option<&'a T> {
    if self.len == 0 {
      return None;
    }

    self.head.map(|node| unsafe {
      let node = &*node.as_ptr();
      self.len -= 1;
      self.head = node.next;
      &node.value
    })
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.len, Some(self.len))
  }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
  fn next_back(&mut self) -> Option<Self::Item> {
    if self.len == 0 {
      return None;
    }

    self.tail.map(|node| unsafe {
      let node = &*node.as_ptr();
      self.len -= 1;
      self.tail = node.prev;
      &node.value
    })
  }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
  fn clone(&self) -> Self {
    Self { ..*self }
  }
}

pub struct IterMut<'a, T> {
  head: Link<T>,
  tail: Link<T>,
  len: usize,
  _marker: PhantomData<&'a mut Node<T>>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
  type Item = &'a mut T;

  fn next(&mut self) -> Option<&'a mut T> {
    if self.len == 0 {
      return None;
    }

    self.head.map(|node| unsafe {
      let node = &mut *node.as_ptr();
      self.len -= 1;
      self.head = node.next;
      &mut node.value
    })
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.len, Some(self.len))
  }
}

impl<T> DoubleEndedIterator for IterMut<'_, T> {
  fn next_back(&mut self) -> Option<Self::Item> {
    if self.len == 0 {
      return None;
    }

    self.tail.map(|node| unsafe {
      let node = &mut *node.as_ptr();
      self.len -= 1;
      self.tail = node.prev;
      &mut node.value
    })
  }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

impl<T> FusedIterator for IterMut<'_, T> {}

/// Owning iterator; unvisited nodes are destroyed with the list.
pub struct IntoIter<T, A: Allocator = SystemAllocator> {
  list: LinkedList<T, A>,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
  type Item = T;

  fn next(&mut self) -> Option<T> {
    self.list.pop_front().ok()
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.list.len, Some(self.list.len))
  }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
  fn next_back(&mut self) -> Option<T> {
    self.list.pop_back().ok()
  }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

/// A position in a [`LinkedList`] that supports O(1) edits around it.
///
/// Besides the nodes there is one "ghost" position between the tail and the
/// head, where [`current`](Self::current) is `None`. Moving past either end
/// lands on it; moving again wraps around.
pub struct CursorMut<'a, T, A: Allocator = SystemAllocator> {
  current: Link<T>,
  index: usize,
  list: &'a mut LinkedList<T, A>,
}

impl<T, A: Allocator> CursorMut<'_, T, A> {
  /// Index of the current node, `None` on the ghost position.
  pub fn index(&self) -> Option<usize> {
    self.current.map(|_| self.index)
  }

  pub fn current(&mut self) -> Option<&mut T> {
    self
      .current
      .map(|node| unsafe { &mut (*node.as_ptr()).value })
  }

  pub fn peek_next(&mut self) -> Option<&mut T> {
    let next = match self.current {
      Some(node) => unsafe { (*node.as_ptr()).next },
      None => self.list.head,
    };
    next.map(|node| unsafe { &mut (*node.as_ptr()).value })
  }

  pub fn peek_prev(&mut self) -> Option<&mut T> {
    let prev = match self.current {
      Some(node) => unsafe { (*node.as_ptr()).prev },
      None => self.list.tail,
    };
    prev.map(|node| unsafe { &mut (*node.as_ptr()).value })
  }

  pub fn move_next(&mut self) {
    match self.current {
      Some(node) => {
        self.current = unsafe { (*node.as_ptr()).next };
        self.index += 1;
      }
      None => {
        self.current = self.list.head;
        self.index = 0;
      }
    }
  }

  pub fn move_prev(&mut self) {
    match self.current {
      Some(node) => {
        self.current = unsafe { (*node.as_ptr()).prev };
        self.index = self.index.saturating_sub(1);
      }
      None => {
        self.current = self.list.tail;
        self.index = self.list.len.saturating_sub(1);
      }
    }
  }

  /// Inserts before the current node; on the ghost position, at the back.
  pub fn insert_before(
    &mut self,
    value: T,
  ) -> Result<()> {
    let node = self.list.create_node(value)?;

    match self.current {
      Some(current) => {
        unsafe { self.list.link_before(current, node) };
        self.index += 1;
      }
      None => self.list.link_back(node),
    }

    Ok(())
  }

  /// Inserts after the current node; on the ghost position, at the front.
  pub fn insert_after(
    &mut self,
    value: T,
  ) -> Result<()> {
    let node = self.list.create_node(value)?;

    match self.current {
      Some(current) => unsafe { self.list.link_after(current, node) },
      None => self.list.link_front(node),
    }

    Ok(())
  }

  /// Removes the current node and moves to its successor.
  pub fn remove_current(&mut self) -> Option<T> {
    let node = self.current?;

    unsafe {
      self.current = (*node.as_ptr()).next;
      self.list.unlink(node);
      Some(self.list.take_node(node))
    }
  }
}
