/// Rounds `value` up to a multiple of `size_of::<usize>()`, the granularity
/// the sbrk allocator requests memory in.
///
/// ```rust
/// use rcontainers::align;
///
/// let word = std::mem::size_of::<usize>();
/// assert_eq!(align!(1), word);
/// assert_eq!(align!(word), word);
/// assert_eq!(align!(word + 1), 2 * word);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `align`, which must be a power of two.
///
/// # Examples
///
/// ```rust
/// use rcontainers::align_to;
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(32, 16), 32);
/// assert_eq!(align_to!(5, 1), 5);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}
