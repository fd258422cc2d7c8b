//! Owning handle over a block from the global allocator.
//!
//! `XBox` is the move-only face of the allocator: the block is released when
//! the handle is dropped, and a dropped or consumed handle cannot be named
//! again, so the stale-pointer checks of the raw API are never reached
//! through it.

use crate::error::AllocError;
use crate::init::global;
use crate::site::CallSite;
use core::fmt;
use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;
use core::slice;

/// Zero-initialized, resizable byte buffer backed by [`global()`](crate::global).
pub struct XBox {
    ptr: NonNull<u8>,
}

// The handle owns its block exclusively.
unsafe impl Send for XBox {}
unsafe impl Sync for XBox {}

impl XBox {
    /// Allocate `len` zeroed bytes, aborting on exhaustion.
    #[track_caller]
    pub fn new(len: usize) -> Self {
        XBox {
            ptr: global().malloc(len, &CallSite::caller()),
        }
    }

    /// Allocate `len` zeroed bytes, returning exhaustion to the caller.
    #[track_caller]
    pub fn try_new(len: usize) -> Result<Self, AllocError> {
        let ptr = global().try_malloc(len, &CallSite::caller())?;
        Ok(XBox { ptr })
    }

    /// Resize to `new_len`, zero-filling any added bytes. Aborts on exhaustion.
    #[track_caller]
    pub fn resize(&mut self, new_len: usize) {
        let mut raw = self.ptr.as_ptr();
        self.ptr = unsafe { global().realloc(&mut raw, new_len, &CallSite::caller()) };
    }

    /// Resize to `new_len`; on exhaustion the buffer is left untouched.
    #[track_caller]
    pub fn try_resize(&mut self, new_len: usize) -> Result<(), AllocError> {
        let mut raw = self.ptr.as_ptr();
        unsafe {
            global().try_realloc(&mut raw, new_len, &CallSite::caller())?;
            self.ptr = NonNull::new_unchecked(raw);
        }
        Ok(())
    }

    /// Usable size recorded in the block header.
    #[track_caller]
    pub fn len(&self) -> usize {
        unsafe { global().size(self.ptr.as_ptr(), &CallSite::caller()) }
    }

    #[track_caller]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Give up ownership of the block without releasing it.
    pub fn into_raw(self) -> NonNull<u8> {
        ManuallyDrop::new(self).ptr
    }

    /// Take ownership of a block from the global allocator.
    ///
    /// # Safety
    /// `ptr` must be a live user pointer from [`global()`](crate::global)
    /// that nothing else will release.
    pub unsafe fn from_raw(ptr: NonNull<u8>) -> Self {
        XBox { ptr }
    }
}

impl Deref for XBox {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }
}

impl DerefMut for XBox {
    fn deref_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), len) }
    }
}

impl Drop for XBox {
    fn drop(&mut self) {
        let mut raw = self.ptr.as_ptr();
        unsafe { global().free(&mut raw, &CallSite::caller()) };
    }
}

impl Clone for XBox {
    fn clone(&self) -> Self {
        let mut copy = XBox::new(self.len());
        copy.copy_from_slice(self);
        copy
    }
}

impl From<&[u8]> for XBox {
    #[track_caller]
    fn from(bytes: &[u8]) -> Self {
        let mut buf = XBox::new(bytes.len());
        buf.copy_from_slice(bytes);
        buf
    }
}

impl fmt::Debug for XBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XBox")
            .field("ptr", &self.ptr)
            .field("len", &self.len())
            .finish()
    }
}
