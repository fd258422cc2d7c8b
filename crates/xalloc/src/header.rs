//! Block header codec.
//!
//! Every block handed out by this crate is laid out as
//!
//! ```text
//! raw ──► ┌──────────────┬──────────────┬─ pad ─┬───────────────────────┐
//!         │ magic: u64   │ size: usize  │       │ user bytes (size)     │
//!         └──────────────┴──────────────┴───────┴───────────────────────┘
//!                                               ▲ user pointer
//! ```
//!
//! The codec only converts between the raw and user representations and
//! reads/writes header fields. Deciding whether a header is acceptable is
//! the allocator's job.

use core::mem::size_of;
use core::ptr::NonNull;

/// Minimum alignment the system allocator guarantees (max_align_t on 64-bit).
pub const MIN_ALIGN: usize = 16;

/// Sentinel stored in every live header.
pub const HEADER_MAGIC: u64 = 0x5841_4c4c_4f43_0042;

/// Sentinel written over `HEADER_MAGIC` just before a block is released.
pub const RELEASED_MAGIC: u64 = 0x5841_4c4c_4f43_dead;

/// Bytes reserved in front of every user region.
pub const HEADER_SIZE: usize = align_up(size_of::<BlockHeader>(), MIN_ALIGN);

/// Metadata stored immediately before the user region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct BlockHeader {
    pub magic: u64,
    pub size: usize,
}

impl BlockHeader {
    pub const fn live(size: usize) -> Self {
        BlockHeader {
            magic: HEADER_MAGIC,
            size,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.magic == HEADER_MAGIC
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.magic == RELEASED_MAGIC
    }
}

/// Align `value` up to the next multiple of `align` (a power of two).
#[inline(always)]
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Underlying allocation size for `requested` usable bytes.
#[inline]
pub const fn total_size(requested: usize) -> Option<usize> {
    requested.checked_add(HEADER_SIZE)
}

/// User pointer for a raw block.
///
/// # Safety
/// `raw` must point to an allocation of at least `HEADER_SIZE` bytes.
#[inline]
pub unsafe fn user_ptr(raw: NonNull<u8>) -> NonNull<u8> {
    NonNull::new_unchecked(raw.as_ptr().add(HEADER_SIZE))
}

/// Header (raw block) pointer for a user pointer.
///
/// Only the arithmetic is performed; nothing is dereferenced.
#[inline]
pub fn header_ptr(user: *mut u8) -> *mut BlockHeader {
    user.wrapping_sub(HEADER_SIZE).cast()
}

/// Read the header in front of `user`.
///
/// # Safety
/// The `HEADER_SIZE` bytes before `user` must be readable.
#[inline]
pub unsafe fn read(user: *const u8) -> BlockHeader {
    header_ptr(user as *mut u8).read_unaligned()
}

/// Write a live header at the start of `raw` and return the user pointer.
///
/// # Safety
/// `raw` must point to a writable allocation of at least `HEADER_SIZE` bytes.
#[inline]
pub unsafe fn write(raw: NonNull<u8>, size: usize) -> NonNull<u8> {
    raw.as_ptr()
        .cast::<BlockHeader>()
        .write_unaligned(BlockHeader::live(size));
    user_ptr(raw)
}

/// Overwrite the sentinel with `RELEASED_MAGIC`.
///
/// # Safety
/// The header in front of `user` must be writable.
#[inline]
pub unsafe fn invalidate(user: *mut u8) {
    let header = header_ptr(user);
    core::ptr::addr_of_mut!((*header).magic).write_unaligned(RELEASED_MAGIC);
}
