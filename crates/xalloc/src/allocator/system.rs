//! System allocator seam.
//!
//! The instrumented allocator never manages memory itself: every reservation,
//! resize and release is forwarded to an implementation of [`SystemAlloc`].
//! Production code uses [`Libc`]; tests plug in allocators that fail on
//! demand or keep released blocks around for inspection.

use core::ffi::c_void;
use core::ptr::NonNull;

/// The process-wide allocator this layer sits on.
///
/// # Safety
/// Implementations must behave like `malloc`/`realloc`/`free`:
/// - `reserve` returns a block of at least `size` bytes aligned to
///   [`MIN_ALIGN`](crate::header::MIN_ALIGN), or `None`.
/// - `resize` returns a block of at least `size` bytes holding the old
///   contents up to the smaller of both sizes, or `None` leaving the original
///   block valid and unchanged.
/// - `release` accepts any block returned by `reserve`/`resize` exactly once.
pub unsafe trait SystemAlloc: Send + Sync {
    fn reserve(&self, size: usize) -> Option<NonNull<u8>>;

    /// # Safety
    /// `ptr` must be a live block from this allocator.
    unsafe fn resize(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>>;

    /// # Safety
    /// `ptr` must be a live block from this allocator; it is dead afterwards.
    unsafe fn release(&self, ptr: NonNull<u8>);
}

/// The C library allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Libc;

unsafe impl SystemAlloc for Libc {
    #[inline]
    fn reserve(&self, size: usize) -> Option<NonNull<u8>> {
        NonNull::new(unsafe { libc::malloc(size) }.cast())
    }

    #[inline]
    unsafe fn resize(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>> {
        // realloc leaves the original block untouched when it fails.
        NonNull::new(libc::realloc(ptr.as_ptr() as *mut c_void, size).cast())
    }

    #[inline]
    unsafe fn release(&self, ptr: NonNull<u8>) {
        libc::free(ptr.as_ptr() as *mut c_void);
    }
}

unsafe impl<S: SystemAlloc + ?Sized> SystemAlloc for &S {
    #[inline]
    fn reserve(&self, size: usize) -> Option<NonNull<u8>> {
        (**self).reserve(size)
    }

    #[inline]
    unsafe fn resize(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>> {
        (**self).resize(ptr, size)
    }

    #[inline]
    unsafe fn release(&self, ptr: NonNull<u8>) {
        (**self).release(ptr)
    }
}
