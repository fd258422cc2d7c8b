//! System allocators used by the integration tests.

#![allow(dead_code)]

use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use xalloc::{Libc, SystemAlloc};

/// Delegates to libc until `fail` is switched on, then reports exhaustion
/// for every reserve and resize.
#[derive(Default)]
pub struct FailingSystem {
    fail: AtomicBool,
}

impl FailingSystem {
    pub fn failing() -> Self {
        FailingSystem {
            fail: AtomicBool::new(true),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

unsafe impl SystemAlloc for FailingSystem {
    fn reserve(&self, size: usize) -> Option<NonNull<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return None;
        }
        Libc.reserve(size)
    }

    unsafe fn resize(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>> {
        if self.fail.load(Ordering::SeqCst) {
            return None;
        }
        Libc.resize(ptr, size)
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        Libc.release(ptr)
    }
}

/// Never returns memory to libc while alive: released blocks are parked so
/// tests can inspect what the allocator left behind. Resizes always move
/// the block, which exercises the relocation path.
#[derive(Default)]
pub struct ParkingSystem {
    parked: Mutex<Vec<usize>>,
}

impl ParkingSystem {
    pub fn parked(&self) -> usize {
        self.parked.lock().unwrap().len()
    }
}

unsafe impl SystemAlloc for ParkingSystem {
    fn reserve(&self, size: usize) -> Option<NonNull<u8>> {
        Libc.reserve(size)
    }

    unsafe fn resize(&self, ptr: NonNull<u8>, size: usize) -> Option<NonNull<u8>> {
        let fresh = Libc.reserve(size)?;
        let old = libc::malloc_usable_size(ptr.as_ptr().cast());
        std::ptr::copy_nonoverlapping(ptr.as_ptr(), fresh.as_ptr(), old.min(size));
        self.release(ptr);
        Some(fresh)
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        self.parked.lock().unwrap().push(ptr.as_ptr() as usize);
    }
}

impl Drop for ParkingSystem {
    fn drop(&mut self) {
        for addr in self.parked.get_mut().unwrap().drain(..) {
            unsafe { Libc.release(NonNull::new_unchecked(addr as *mut u8)) };
        }
    }
}
