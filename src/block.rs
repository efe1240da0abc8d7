use std::mem;

/// Bytes reserved right before every payload for the pointer back to its block.
pub const BACK_POINTER: usize = mem::size_of::<*mut Block>();

/// Header at the start of every region carved from the program break.
///
/// ```text
///   ┌────────────┬──────────┬───────────┬────────────────┬─────────┐
///   │   Block    │ padding  │ *mut Block│   user data    │  slack  │
///   └────────────┴──────────┴───────────┴────────────────┴─────────┘
///   ▲            ◀──────────────────── size ─────────────────────────▶
///   region start                        ▲
///                                       └── returned pointer (aligned)
/// ```
pub struct Block {
  pub size: usize,
  pub is_free: bool,
  pub next: *mut Block,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: *mut Block,
  ) -> Self {
    Self { size, is_free, next }
  }

  /// First byte after the header.
  pub fn payload(&self) -> usize {
    self as *const Block as usize + mem::size_of::<Block>()
  }

  /// One past the last byte of the region.
  pub fn end(&self) -> usize {
    self.payload() + self.size
  }

  /// Address where data with `size` bytes and `align` alignment would start
  /// inside this region, if it fits.
  pub fn fit(
    &self,
    size: usize,
    align: usize,
  ) -> Option<usize> {
    let data = crate::align_to!(self.payload() + BACK_POINTER, align);

    if data.checked_add(size)? <= self.end() {
      Some(data)
    } else {
      None
    }
  }
}
