/// Byte written over user data of a released block when poisoning is on.
pub const POISON_BYTE: u8 = 0xFE;

/// Fill a memory region with poison bytes.
///
/// # Safety
/// `ptr` must point to a valid writable region of at least `size` bytes.
#[inline]
pub unsafe fn poison_region(ptr: *mut u8, size: usize) {
    core::ptr::write_bytes(ptr, POISON_BYTE, size);
}

/// Check that a memory region still contains poison bytes.
///
/// # Safety
/// `ptr` must point to a valid readable region of at least `size` bytes.
pub unsafe fn check_poison(ptr: *const u8, size: usize) -> bool {
    core::slice::from_raw_parts(ptr, size)
        .iter()
        .all(|&b| b == POISON_BYTE)
}
