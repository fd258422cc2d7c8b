use crate::allocator::system::{Libc, SystemAlloc};
use crate::config::Config;
use crate::error::AllocError;
use crate::hardening::{fatal, poison};
use crate::header::{self, BlockHeader};
use crate::site::CallSite;
use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Snapshot of allocator counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Blocks allocated and not yet released.
    pub live_blocks: usize,
    /// Usable bytes across live blocks.
    pub live_bytes: usize,
    /// Requests the system allocator could not satisfy.
    pub exhausted: usize,
}

/// The instrumented allocator: header-checked, zero-filling wrapper around a
/// [`SystemAlloc`].
///
/// Two operation families are exposed. The strict ones (`malloc`, `realloc`)
/// abort the process when the system allocator fails; the `try_` ones hand
/// the failure back as an [`AllocError`]. A bad block header aborts in both.
pub struct Xalloc<S = Libc> {
    sys: S,
    config: Config,
    /// System-allocator requests issued so far (fault injection only).
    requests: AtomicU64,
    live_blocks: AtomicUsize,
    live_bytes: AtomicUsize,
    exhausted: AtomicUsize,
}

impl Xalloc<Libc> {
    /// Allocator over the C library with default config.
    pub const fn new() -> Self {
        Self::from_parts(
            Libc,
            Config {
                poison_released: false,
                fail_after: None,
            },
        )
    }
}

impl Default for Xalloc<Libc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: SystemAlloc> Xalloc<S> {
    pub fn with_system(sys: S) -> Self {
        Self::with_config(sys, Config::default())
    }

    pub fn with_config(sys: S, config: Config) -> Self {
        Self::from_parts(sys, config)
    }

    const fn from_parts(sys: S, config: Config) -> Self {
        Xalloc {
            sys,
            config,
            requests: AtomicU64::new(0),
            live_blocks: AtomicUsize::new(0),
            live_bytes: AtomicUsize::new(0),
            exhausted: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn system(&self) -> &S {
        &self.sys
    }

    pub fn stats(&self) -> Stats {
        Stats {
            live_blocks: self.live_blocks.load(Ordering::Relaxed),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }

    // ========================================================================
    // Strict and fallible allocation
    // ========================================================================

    /// Allocate `size` zeroed bytes. Never returns on failure: logs the call
    /// site and aborts.
    pub fn malloc(&self, size: usize, site: &CallSite<'_>) -> NonNull<u8> {
        match self.alloc_block(size) {
            Ok(user) => {
                log::trace!("{site}: xmalloc({size}) = {user:p}");
                user
            }
            Err(err) => {
                self.exhausted.fetch_add(1, Ordering::Relaxed);
                fatal!(site, "xmalloc({size}) failed: {err}")
            }
        }
    }

    /// Allocate `size` zeroed bytes, reporting exhaustion to the caller.
    pub fn try_malloc(&self, size: usize, site: &CallSite<'_>) -> Result<NonNull<u8>, AllocError> {
        match self.alloc_block(size) {
            Ok(user) => {
                log::trace!("{site}: try_xmalloc({size}) = {user:p}");
                Ok(user)
            }
            Err(err) => {
                self.exhausted.fetch_add(1, Ordering::Relaxed);
                log::warn!("{site}: try_xmalloc({size}): {err}");
                Err(err)
            }
        }
    }

    // ========================================================================
    // Resize
    // ========================================================================

    /// Resize the block held in `*ptr` to `new_size` bytes, store the
    /// (possibly moved) pointer back into `*ptr` and return it.
    ///
    /// A null `*ptr` is allocated as by [`malloc`](Self::malloc). When the
    /// block grows, bytes past the old size are zeroed. Exhaustion aborts.
    ///
    /// # Safety
    /// `*ptr` must be null or point `HEADER_SIZE` bytes past readable memory;
    /// pointers not produced by this allocator are detected and abort, as
    /// long as the bytes in front of them can be read.
    pub unsafe fn realloc<T>(
        &self,
        ptr: &mut *mut T,
        new_size: usize,
        site: &CallSite<'_>,
    ) -> NonNull<T> {
        let Some(user) = NonNull::new((*ptr).cast::<u8>()) else {
            let fresh = self.malloc(new_size, site).cast::<T>();
            *ptr = fresh.as_ptr();
            return fresh;
        };

        let old = self.checked_header(user.as_ptr(), "xrealloc", site);
        match self.resize_block(user, old, new_size) {
            Ok(moved) => {
                log::trace!(
                    "{site}: xrealloc({user:p}, {} -> {new_size}) = {moved:p}",
                    old.size
                );
                *ptr = moved.as_ptr().cast();
                moved.cast()
            }
            Err(err) => {
                self.exhausted.fetch_add(1, Ordering::Relaxed);
                fatal!(site, "xrealloc({user:p}, {new_size}) failed: {err}")
            }
        }
    }

    /// Fallible [`realloc`](Self::realloc).
    ///
    /// On exhaustion `*ptr`, the block it points to and the block's contents
    /// are left exactly as they were.
    ///
    /// # Safety
    /// Same as [`realloc`](Self::realloc).
    pub unsafe fn try_realloc<T>(
        &self,
        ptr: &mut *mut T,
        new_size: usize,
        site: &CallSite<'_>,
    ) -> Result<(), AllocError> {
        let Some(user) = NonNull::new((*ptr).cast::<u8>()) else {
            *ptr = self.try_malloc(new_size, site)?.as_ptr().cast();
            return Ok(());
        };

        let old = self.checked_header(user.as_ptr(), "try_xrealloc", site);
        match self.resize_block(user, old, new_size) {
            Ok(moved) => {
                log::trace!(
                    "{site}: try_xrealloc({user:p}, {} -> {new_size}) = {moved:p}",
                    old.size
                );
                *ptr = moved.as_ptr().cast();
                Ok(())
            }
            Err(err) => {
                self.exhausted.fetch_add(1, Ordering::Relaxed);
                log::warn!("{site}: try_xrealloc({user:p}, {new_size}): {err}");
                Err(err)
            }
        }
    }

    // ========================================================================
    // Release and size query
    // ========================================================================

    /// Release the block held in `*ptr` and set `*ptr` to null.
    ///
    /// Releasing a null variable does nothing, so a variable that was
    /// already released through this call can be released again safely. A
    /// stale copy of the pointer held elsewhere is still caught as a bad
    /// header.
    ///
    /// # Safety
    /// Same as [`realloc`](Self::realloc).
    pub unsafe fn free<T>(&self, ptr: &mut *mut T, site: &CallSite<'_>) {
        let Some(user) = NonNull::new((*ptr).cast::<u8>()) else {
            return;
        };

        let header = self.checked_header(user.as_ptr(), "xfree", site);
        if self.config.poison_released {
            poison::poison_region(user.as_ptr(), header.size);
        }
        header::invalidate(user.as_ptr());
        self.sys.release(raw_block(user));
        self.note_released(header.size);
        *ptr = ptr::null_mut();

        log::trace!("{site}: xfree({user:p}) released {} bytes", header.size);
    }

    /// Usable size recorded for the block at `ptr`.
    ///
    /// # Safety
    /// Same as [`realloc`](Self::realloc). A null pointer aborts.
    pub unsafe fn size<T>(&self, ptr: *const T, site: &CallSite<'_>) -> usize {
        self.checked_header(ptr as *mut u8, "xsize", site).size
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Recover and validate the header in front of `user`, aborting on any
    /// mismatch.
    unsafe fn checked_header(&self, user: *mut u8, op: &str, site: &CallSite<'_>) -> BlockHeader {
        if user.is_null() {
            fatal!(site, "{op}: invalid block header: null pointer");
        }
        let header = header::read(user);
        if header.is_live() {
            return header;
        }
        if header.is_released() {
            fatal!(site, "{op}({user:p}): invalid block header: block already released");
        }
        fatal!(
            site,
            "{op}({user:p}): invalid block header: bad magic {:#018x} (foreign pointer or overwritten header)",
            header.magic
        )
    }

    fn alloc_block(&self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let total = header::total_size(size).ok_or(AllocError::SizeOverflow { requested: size })?;
        let raw = self
            .reserve(total)
            .ok_or(AllocError::OutOfMemory { requested: size })?;
        unsafe {
            let user = header::write(raw, size);
            ptr::write_bytes(user.as_ptr(), 0, size);
            self.live_blocks.fetch_add(1, Ordering::Relaxed);
            self.live_bytes.fetch_add(size, Ordering::Relaxed);
            Ok(user)
        }
    }

    /// Resize a validated block. On error nothing has been touched.
    unsafe fn resize_block(
        &self,
        user: NonNull<u8>,
        old: BlockHeader,
        new_size: usize,
    ) -> Result<NonNull<u8>, AllocError> {
        let total = header::total_size(new_size).ok_or(AllocError::SizeOverflow {
            requested: new_size,
        })?;
        let raw = self
            .resize_raw(raw_block(user), total)
            .ok_or(AllocError::OutOfMemory {
                requested: new_size,
            })?;

        let moved = header::write(raw, new_size);
        if new_size > old.size {
            ptr::write_bytes(moved.as_ptr().add(old.size), 0, new_size - old.size);
        }
        self.live_bytes.fetch_add(new_size, Ordering::Relaxed);
        self.live_bytes.fetch_sub(old.size, Ordering::Relaxed);
        Ok(moved)
    }

    fn note_released(&self, size: usize) {
        self.live_blocks.fetch_sub(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(size, Ordering::Relaxed);
    }

    fn reserve(&self, total: usize) -> Option<NonNull<u8>> {
        if self.injected_failure() {
            return None;
        }
        self.sys.reserve(total)
    }

    unsafe fn resize_raw(&self, raw: NonNull<u8>, total: usize) -> Option<NonNull<u8>> {
        if self.injected_failure() {
            return None;
        }
        self.sys.resize(raw, total)
    }

    #[inline]
    fn injected_failure(&self) -> bool {
        match self.config.fail_after {
            None => false,
            Some(limit) => self.requests.fetch_add(1, Ordering::Relaxed) >= limit,
        }
    }
}

/// Raw block pointer for a validated user pointer.
#[inline]
fn raw_block(user: NonNull<u8>) -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(header::header_ptr(user.as_ptr()).cast()) }
}
